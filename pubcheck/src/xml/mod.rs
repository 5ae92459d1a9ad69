//! XML event protocol and the parse-and-validate driver.
//!
//! The driver ([`XmlParser`]) owns a single forward pass over a document and
//! fans every event out to one structural handler and any number of
//! validator sessions. It never interprets the events itself.

mod element;
mod location;
mod parser;

pub use element::{OPS_NS, XHTML_NS, XmlAttribute, XmlElement};
pub use location::LineIndex;
pub use parser::{ParseOutcome, XmlParser};

use crate::context::ValidationContext;

/// Observer of parse events.
///
/// Implemented by the mandatory structural handler of a check and by the
/// per-pass sessions of validators. `end_element` receives the same element
/// that was passed to the matching `start_element`.
pub trait XmlHandler {
    fn start_element(&mut self, _context: &ValidationContext, _element: &XmlElement) {}

    fn end_element(&mut self, _context: &ValidationContext, _element: &XmlElement) {}

    fn characters(&mut self, _context: &ValidationContext, _text: &str) {}

    /// Called once after the last element closed, unless the pass aborted.
    fn end_document(&mut self, _context: &ValidationContext) {}
}
