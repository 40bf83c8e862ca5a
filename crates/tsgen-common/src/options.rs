//! Pipeline configuration.
//!
//! This module lives in tsgen-common so that the shape passes and the
//! planners can reference `PipelineOptions` without depending on the CLI.

/// Options consumed by the symbol-graph pipeline.
///
/// These are the only runtime knobs exposed to the core; everything else
/// is fixed behavior.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// When true, overload sets with diverging return types are widened to
    /// a common nominal supertype where one exists; when false, divergent
    /// overloads are always demoted.
    pub widen_overload_returns: bool,
    /// When true, an import cycle between namespaces is an error instead
    /// of a warning.
    pub treat_namespace_cycle_as_error: bool,
    /// Maximum number of distinct return types an overload set may carry
    /// and still be widened.
    pub max_overload_return_union: usize,
    /// When true, interfaces internal to the base class library are kept
    /// in the graph instead of being filtered out.
    pub emit_internal_interfaces: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            widen_overload_returns: true,
            treat_namespace_cycle_as_error: false,
            max_overload_return_union: 4,
            emit_internal_interfaces: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = PipelineOptions::default();
        assert!(options.widen_overload_returns);
        assert!(!options.treat_namespace_cycle_as_error);
        assert_eq!(options.max_overload_return_union, 4);
        assert!(!options.emit_internal_interfaces);
    }
}
