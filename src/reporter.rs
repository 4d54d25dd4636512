//! Reporting of run results.
//!
//! The aggregator drives a [`TestReporter`]: one callback per module, in order, and one for the final aggregate.
//! [`ConsoleReporter`] is the default; other formats implement the trait.

use std::io::{self, Write};
use std::path::Path;

use miette::{GraphicalReportHandler, GraphicalTheme};

use crate::error::StructuralError;
use crate::host::{ActualValue, GroupResult, ModuleResult, PerformanceStats, TestResult};
use crate::run::RunAggregate;

// ============================================================================
// Test Reporter Trait
// ============================================================================

/// Receives results as a run progresses.
pub trait TestReporter {
    /// Called once, before the first module is loaded
    fn on_run_start(&mut self, _module_count: usize) {}

    /// Called before an entry file is loaded
    fn on_module_start(&mut self, _entry: &Path) {}

    /// Called with each module's result tree, in run order
    fn on_module_complete(&mut self, module: &ModuleResult);

    /// Called when the run is over, including after a structural error
    fn on_run_complete(&mut self, aggregate: &RunAggregate);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct EmptyReporter;

impl TestReporter for EmptyReporter {
    fn on_module_complete(&mut self, _module: &ModuleResult) {}

    fn on_run_complete(&mut self, _aggregate: &RunAggregate) {}
}

// ============================================================================
// Console Reporter
// ============================================================================

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Human-readable output.
pub struct ConsoleReporter<W: Write = io::Stderr> {
    out: W,
    verbose: bool,
    colors: bool,
}

impl ConsoleReporter {
    pub fn stderr(verbose: bool) -> Self {
        Self::new(io::stderr(), verbose)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            out,
            verbose,
            colors: true,
        }
    }

    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()) {
            tracing::warn!(%err, "could not write report");
        }
    }
}

impl<W: Write> TestReporter for ConsoleReporter<W> {
    fn on_run_start(&mut self, module_count: usize) {
        if module_count == 0 {
            self.emit("No test files found\n");
        }
    }

    fn on_module_complete(&mut self, module: &ModuleResult) {
        let text = render_module(module, self.verbose, self.colors);
        self.emit(&text);
    }

    fn on_run_complete(&mut self, aggregate: &RunAggregate) {
        let mut text = String::new();
        for error in &aggregate.errors {
            text.push_str(&render_error(error, self.colors));
            text.push('\n');
        }
        text.push_str(&render_summary(aggregate, self.colors));
        text.push('\n');
        self.emit(&text);
    }
}

fn paint(text: &str, color: &str, colors: bool) -> String {
    if colors {
        format!("{color}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// One module's result tree.
pub fn render_module(module: &ModuleResult, verbose: bool, colors: bool) -> String {
    let mut out = format!("{}\n", module.file);
    for group in &module.groups {
        render_group(&mut out, group, verbose, colors);
    }
    out
}

fn render_group(out: &mut String, group: &GroupResult, verbose: bool, colors: bool) {
    let name = if group.name.is_empty() { "(top level)" } else { group.name.as_str() };
    out.push_str(&format!("  {name}\n"));

    for log in &group.logs {
        out.push_str(&format!("    log: {}\n", log.message));
    }
    for test in &group.tests {
        render_test(out, test, verbose, colors);
    }
    for todo in &group.todos {
        out.push_str(&format!("    {} todo: {todo}\n", paint("○", YELLOW, colors)));
    }
    if let Some(failure) = &group.hook_failure {
        out.push_str(&format!("    {} hook failed: {}\n", paint("✖", RED, colors), failure.message));
        push_value(out, "actual:  ", group.hook_actual.as_ref());
        push_value(out, "expected:", group.hook_expected.as_ref());
        push_indented(out, &failure.stack, 8);
    }
}

fn render_test(out: &mut String, test: &TestResult, verbose: bool, colors: bool) {
    let mark = if test.pass { paint("✔", GREEN, colors) } else { paint("✖", RED, colors) };
    let label = if test.negated {
        format!("{} (throws)", test.name)
    } else {
        test.name.clone()
    };
    if verbose {
        let timing = format!("({:.2}ms)", test.duration());
        out.push_str(&format!("    {mark} {label} {}\n", paint(&timing, DIM, colors)));
    } else {
        out.push_str(&format!("    {mark} {label}\n"));
    }

    if !test.pass {
        match &test.failure {
            Some(failure) => {
                out.push_str(&format!("        {}\n", failure.message));
                push_value(out, "actual:  ", test.actual.as_ref());
                push_value(out, "expected:", test.expected.as_ref());
                push_indented(out, &failure.stack, 8);
            }
            None if test.negated => out.push_str("        expected to throw, but it did not\n"),
            None => {}
        }
    }

    for log in &test.logs {
        out.push_str(&format!("        log: {}\n", log.message));
    }
    if let Some(stats) = &test.performance {
        out.push_str(&format!("        {}\n", render_performance(stats)));
    }
}

fn push_value(out: &mut String, label: &str, value: Option<&ActualValue>) {
    if let Some(value) = value {
        let not = if value.negated { "not " } else { "" };
        out.push_str(&format!("        {label} {not}{}\n", value.message));
    }
}

fn push_indented(out: &mut String, text: &str, width: usize) {
    for line in text.lines() {
        out.push_str(&format!("{:width$}{line}\n", ""));
    }
}

fn render_performance(stats: &PerformanceStats) -> String {
    let fields = [
        ("average", stats.average),
        ("median", stats.median),
        ("std dev", stats.std_dev),
        ("max", stats.max),
        ("min", stats.min),
        ("variance", stats.variance),
    ];
    let mut parts = vec![format!("samples: {}", stats.samples)];
    parts.extend(
        fields
            .iter()
            .filter_map(|(name, value)| value.map(|v| format!("{name}: {v}ms"))),
    );
    parts.join(", ")
}

/// A structural error as a miette diagnostic.
pub fn render_error(error: &StructuralError, colors: bool) -> String {
    let handler = if colors {
        GraphicalReportHandler::new()
    } else {
        GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
    };
    let mut out = String::new();
    if handler.render_report(&mut out, error).is_err() {
        out = format!("error: {error}\n");
    }
    out
}

/// The closing `====== ... ======` line.
pub fn render_summary(aggregate: &RunAggregate, colors: bool) -> String {
    let mut parts = Vec::new();
    if aggregate.success_count > 0 {
        parts.push(paint(&format!("{} passed", aggregate.success_count), GREEN, colors));
    }
    if aggregate.failed_count() > 0 {
        parts.push(paint(&format!("{} failed", aggregate.failed_count()), RED, colors));
    }
    if aggregate.todo_count > 0 {
        parts.push(paint(&format!("{} todo", aggregate.todo_count), YELLOW, colors));
    }
    if !aggregate.errors.is_empty() {
        let noun = if aggregate.errors.len() == 1 { "error" } else { "errors" };
        parts.push(paint(&format!("{} {noun}", aggregate.errors.len()), RED, colors));
    }
    if parts.is_empty() {
        parts.push("no tests ran".to_string());
    }

    format!(
        "====== {} ({} of {} groups passed) in {:.2}s ======",
        parts.join(", "),
        aggregate.group_success_count,
        aggregate.group_count,
        aggregate.duration.as_secs_f64()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Failure, ValueKind};

    fn failing_test() -> TestResult {
        let mut test = TestResult::new("subtracts");
        test.failure = Some(Failure {
            message: "Expected values to be equal.".to_string(),
            stack: "abort: Expected values to be equal.\n    at math subtracts".to_string(),
        });
        test.actual = Some(ActualValue::new(ValueKind::Number, "3", ""));
        test.expected = Some(ActualValue::new(ValueKind::Number, "2", "").with_negated(true));
        test
    }

    #[test]
    fn test_failure_details() {
        let mut out = String::new();
        render_test(&mut out, &failing_test(), false, false);
        assert!(out.contains("✖ subtracts"));
        assert!(out.contains("actual:   3"));
        assert!(out.contains("expected: not 2"));
        assert!(out.contains("            at math subtracts"));
    }

    #[test]
    fn test_negated_pass_is_labelled() {
        let mut test = TestResult::new("rejects");
        test.negated = true;
        test.pass = true;
        let mut out = String::new();
        render_test(&mut out, &test, false, false);
        assert_eq!(out, "    ✔ rejects (throws)\n");
    }

    #[test]
    fn test_negated_test_that_did_not_throw() {
        let mut test = TestResult::new("rejects");
        test.negated = true;
        test.call_succeeded = true;
        let mut out = String::new();
        render_test(&mut out, &test, false, false);
        assert!(out.contains("expected to throw, but it did not"));
    }

    #[test]
    fn test_hook_failure_shows_reported_values() {
        let mut group = GroupResult::new("db", 0.0);
        group.pass = false;
        group.hook_failure = Some(Failure {
            message: "Expected values to be equal.".to_string(),
            stack: String::new(),
        });
        group.hook_actual = Some(ActualValue::new(ValueKind::Number, "0", ""));
        group.hook_expected = Some(ActualValue::new(ValueKind::Number, "1", ""));
        let mut out = String::new();
        render_group(&mut out, &group, false, false);
        assert!(out.contains("✖ hook failed: Expected values to be equal.\n        actual:   0\n        expected: 1\n"));
    }

    #[test]
    fn test_colors_are_optional() {
        assert_eq!(paint("ok", GREEN, false), "ok");
        assert_eq!(paint("ok", GREEN, true), "\x1b[32mok\x1b[0m");
    }

    #[test]
    fn test_empty_summary() {
        let summary = render_summary(&RunAggregate::default(), false);
        assert_eq!(summary, "====== no tests ran (0 of 0 groups passed) in 0.00s ======");
    }

    #[test]
    fn test_error_rendering_names_the_code() {
        let error = StructuralError::MissingExport {
            file: "a.spec".to_string(),
            export: "__call".to_string(),
        };
        let text = render_error(&error, false);
        assert!(text.contains("probe::missing_export"));
        assert!(text.contains("does not export `__call`"));
    }

    #[test]
    fn test_console_reporter_writes_to_its_sink() {
        let mut reporter = ConsoleReporter::new(Vec::new(), false).with_colors(false);
        reporter.on_run_start(0);
        reporter.on_run_complete(&RunAggregate::default());
        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(text.starts_with("No test files found\n"));
        assert!(text.ends_with("======\n"));
    }
}
