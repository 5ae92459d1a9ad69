//! Command-line front end for `pubcheck`.

pub mod cli;
pub mod logging;
