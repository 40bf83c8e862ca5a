//! Pipeline driver and CLI plumbing for the tsgen declaration generator.
//!
//! The driver sequences the phases over one immutable graph snapshot per
//! phase; the loader and writer adapt the JSON interfaces to the external
//! reflection front end and declaration emitter.

pub mod args;
pub use args::CliArgs;

pub mod driver;
pub use driver::{BuildOutcome, run_pipeline};

pub mod loader;
pub mod render;
pub mod writer;
