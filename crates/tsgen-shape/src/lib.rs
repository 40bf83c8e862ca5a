//! Shape passes and name reservation for the tsgen declaration generator.
//!
//! Phase 3 rewrites the raw symbol graph into a TypeScript-semantic shape:
//! interfaces flattened, explicit implementations materialized, diamonds
//! resolved, overload returns reconciled, views planned, indexers elided.
//! Phase 3.5 reserves lexically valid, unique emission names for every
//! surviving symbol.

pub mod passes;
pub use passes::{ShapeContext, ShapePass, default_passes, run_shape_passes};

pub mod reserve;
pub use reserve::{NameReserver, ScopeKey, apply_names, audit_names};
