//! Human-readable diagnostic rendering.

use colored::Colorize;
use tsgen_common::{Diagnostic, DiagnosticsSink, Severity};

pub fn render_diagnostic(diagnostic: &Diagnostic) -> String {
    let severity = match diagnostic.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Info => "info".blue(),
    };
    let location = [
        diagnostic.namespace.as_deref(),
        diagnostic.type_id.as_deref(),
        diagnostic.member.as_deref(),
    ]
    .into_iter()
    .flatten()
    .last()
    .map(|loc| format!(" ({loc})"))
    .unwrap_or_default();

    format!(
        "{severity}[{}]: {}{location}",
        diagnostic.code, diagnostic.message
    )
}

pub fn render_summary(sink: &DiagnosticsSink) -> String {
    let errors = sink.error_count();
    let warnings = sink
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    format!("{} diagnostics ({errors} errors, {warnings} warnings)", sink.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsgen_common::diagnostics::codes;

    #[test]
    fn test_render_includes_code_and_innermost_location() {
        let diagnostic = Diagnostic::new(Severity::Error, codes::GATE_NAME_COLLIDE, "collision")
            .with_namespace("N")
            .with_type("N.C")
            .with_member("Run");
        let rendered = render_diagnostic(&diagnostic);
        assert!(rendered.contains("GATE-NAME-COLLIDE"));
        assert!(rendered.contains("(Run)"));
    }

    #[test]
    fn test_summary_counts() {
        let mut sink = DiagnosticsSink::new();
        sink.warning(codes::PLAN_NS_CYCLE, "cycle");
        sink.error(codes::GATE_NAME_COLLIDE, "collision");
        let summary = render_summary(&sink);
        assert!(summary.contains("2 diagnostics"));
        assert!(summary.contains("1 errors"));
        assert!(summary.contains("1 warnings"));
    }
}
