//! Common types for the tsgen declaration generator.
//!
//! This crate provides the foundational types shared by every pipeline
//! crate:
//! - Diagnostics (`Severity`, `Diagnostic`, `DiagnosticsSink`) and the
//!   stable diagnostic code table
//! - Pipeline configuration (`PipelineOptions`)
//! - The fatal internal-error channel (`InternalError`)

pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticsSink, Severity, codes};

pub mod options;
pub use options::PipelineOptions;

pub mod internal;
pub use internal::InternalError;
