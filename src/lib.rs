//! Configuration engine for a tool that turns incoming mail into work items.
//!
//! A configuration document describes any number of independent instances,
//! each with its own tracking server, work item field policy and mailbox.
//! See the [`configuration`] module.

pub mod configuration;
