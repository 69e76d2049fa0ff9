//! This module contains all configuration-relevant code, including
//! the full configuration structure as well as methods needed to load
//! and validate it.
//!
//! Your starting point should probably be [`Configuration::load_from_path`].
//!
//! # Internals
//! The entire configuration structure is based on the concept of
//! unvalidated ("unresolved") and validated configuration structures.
//!
//! For example, even though we're interacting with [`Configuration`],
//! it internally attempts to load the configuration file and deserialize it
//! into the [`UnresolvedConfiguration`] structure.
//! It will then call its `resolve`
//! method, which will recursively turn it
//! (and potentially its fields) into validated ("resolved") versions.
//!
//! The output will then be the [`Configuration`]. Duplicate instance names,
//! empty required fields and malformed dates are rejected at that point.
//! Files referenced by path fields (passwords, queries, templates) are not
//! read during loading; see [`DeferredFileText`].
//!
//! Once an instance is loaded, [`FieldResolutionPolicy`] decides which value
//! each work item field gets for a given message.

#![allow(rustdoc::private_intra_doc_links)]

mod deferred;
mod error;
mod policy;
mod structure;
mod traits;
mod utilities;

pub use deferred::{DeferredFileText, FileSystemTextSource, TextSource};
pub use error::ConfigurationError;
pub use policy::{EffectiveValue, FieldResolutionPolicy, MessageSummary, MessageView, ValueSource};
pub use structure::*;
pub use utilities::get_default_configuration_file_path;
