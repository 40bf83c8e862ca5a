use clap::Parser;
use std::path::PathBuf;

use tsgen_common::PipelineOptions;

/// CLI arguments for the tsgen binary.
#[derive(Parser, Debug)]
#[command(
    name = "tsgen",
    version,
    about = "TypeScript declaration planner for CLR assembly metadata"
)]
pub struct CliArgs {
    /// Symbol graph JSON produced by the reflection loader.
    pub input: PathBuf,

    /// Directory for the emission plan and diagnostics JSON. When
    /// omitted, nothing is written and diagnostics go to stdout only.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Disable widening of diverging overload return types; divergent
    /// overloads are demoted instead.
    #[arg(long = "noWidenOverloadReturns", alias = "no-widen-overload-returns")]
    pub no_widen_overload_returns: bool,

    /// Treat an import cycle between namespaces as an error.
    #[arg(long = "namespaceCycleIsError", alias = "namespace-cycle-is-error")]
    pub namespace_cycle_is_error: bool,

    /// Maximum number of distinct return types an overload set may carry
    /// and still be widened.
    #[arg(
        long = "maxOverloadReturnUnion",
        alias = "max-overload-return-union",
        default_value_t = 4
    )]
    pub max_overload_return_union: usize,

    /// Keep interfaces internal to the base class library instead of
    /// filtering them out.
    #[arg(long = "emitInternalInterfaces", alias = "emit-internal-interfaces")]
    pub emit_internal_interfaces: bool,

    /// Suppress per-diagnostic output; only the summary line is printed.
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliArgs {
    pub fn to_options(&self) -> PipelineOptions {
        PipelineOptions {
            widen_overload_returns: !self.no_widen_overload_returns,
            treat_namespace_cycle_as_error: self.namespace_cycle_is_error,
            max_overload_return_union: self.max_overload_return_union,
            emit_internal_interfaces: self.emit_internal_interfaces,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_defaults() {
        let args = CliArgs::parse_from(["tsgen", "graph.json"]);
        let options = args.to_options();
        let defaults = PipelineOptions::default();
        assert_eq!(options.widen_overload_returns, defaults.widen_overload_returns);
        assert_eq!(
            options.treat_namespace_cycle_as_error,
            defaults.treat_namespace_cycle_as_error
        );
        assert_eq!(options.max_overload_return_union, defaults.max_overload_return_union);
        assert_eq!(options.emit_internal_interfaces, defaults.emit_internal_interfaces);
    }

    #[test]
    fn test_flags_invert_and_override() {
        let args = CliArgs::parse_from([
            "tsgen",
            "graph.json",
            "--noWidenOverloadReturns",
            "--maxOverloadReturnUnion",
            "2",
        ]);
        let options = args.to_options();
        assert!(!options.widen_overload_returns);
        assert_eq!(options.max_overload_return_union, 2);
    }
}
