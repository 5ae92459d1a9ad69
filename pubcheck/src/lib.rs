//! # pubcheck
//!
//! Validation pipeline for navigation documents of packaged publications.
//!
//! A [`NavChecker`] is bound to one [`ValidationContext`] (document path,
//! media type, format version, profile, publication types, declared
//! properties, container and report). It checks that the document exists
//! and is readable, then runs a single parse pass that feeds a structural
//! handler and the validators selected for the context. Findings go to the
//! shared [`Report`]; the verdict is whether the pass added any.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use pubcheck::{CheckConfig, ContentChecker, DirContainer, MemoryReport, NavChecker};
//!
//! let config = CheckConfig::from_path(Path::new("check.yaml")).unwrap();
//! let container = Arc::new(DirContainer::open(Path::new("book"), &config.encrypted).unwrap());
//! let report = Arc::new(MemoryReport::new());
//!
//! for path in config.nav_paths() {
//!     let context = config
//!         .context_builder(&path, container.clone(), report.clone())
//!         .build();
//!     NavChecker::new(context).unwrap().run_checks();
//! }
//! println!("OK: {}", report.summary().ok);
//! ```

mod checker;
mod config;
pub mod container;
mod context;
mod error;
pub mod messages;
pub mod nav;
pub mod output;
mod report;
pub mod validators;
pub mod xml;

pub use checker::{ContentChecker, DocumentValidator, check_all};
pub use config::{CheckConfig, DEFAULT_NAV_PATH};
pub use container::{Container, DirContainer, MemoryContainer};
pub use context::{
    DC_TYPE_EDUPUB, FormatVersion, Profile, PublicationTypes, ValidationContext,
    ValidationContextBuilder,
};
pub use error::{ConfigError, ContainerError, ContextError};
pub use messages::{Message, MessageId, MessageLocation, Severity};
pub use nav::{NAV_MEDIA_TYPE, NavChecker, NavLink, NavOutcome, select_validators};
pub use report::{MemoryReport, Report, ReportCounts, ReportSummary};
pub use validators::ValidatorId;

pub use pubcheck_vocab::{EpubCheckProperty, PropertyFlagSet};
