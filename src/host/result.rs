//! The result tree one module run produces.

use serde::Serialize;

use super::performance::PerformanceStats;
use super::value::ActualValue;

/// Why a guest callable failed: the abort message (or the trap text) and its filtered stack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub message: String,
    pub stack: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub name: String,
    /// Outcome after negation.
    pub pass: bool,
    pub negated: bool,
    /// Whether the body completed without trapping.
    pub call_succeeded: bool,
    pub start: f64,
    pub end: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<ActualValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<ActualValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<ActualValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceStats>,
}

impl TestResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pass: false,
            negated: false,
            call_succeeded: false,
            start: 0.0,
            end: 0.0,
            failure: None,
            actual: None,
            expected: None,
            logs: Vec::new(),
            performance: None,
        }
    }

    /// Wall-clock duration of the first run, in milliseconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResult {
    pub name: String,
    pub tests: Vec<TestResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub todos: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<ActualValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_failure: Option<Failure>,
    /// Values reported by the assertion that failed the hook.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_actual: Option<ActualValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_expected: Option<ActualValue>,
    /// Every included test passed and no hook failed.
    pub pass: bool,
    pub start: f64,
    pub end: f64,
}

impl GroupResult {
    pub fn new(name: impl Into<String>, start: f64) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
            todos: Vec::new(),
            logs: Vec::new(),
            hook_failure: None,
            hook_actual: None,
            hook_expected: None,
            pass: true,
            start,
            end: start,
        }
    }

    pub fn passed_tests(&self) -> usize {
        self.tests.iter().filter(|t| t.pass).count()
    }
}

/// Everything one module produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleResult {
    pub file: String,
    pub groups: Vec<GroupResult>,
    pub start: f64,
    pub end: f64,
}

impl ModuleResult {
    pub fn test_count(&self) -> usize {
        self.groups.iter().map(|g| g.tests.len()).sum()
    }

    pub fn success_count(&self) -> usize {
        self.groups.iter().map(GroupResult::passed_tests).sum()
    }

    pub fn todo_count(&self) -> usize {
        self.groups.iter().map(|g| g.todos.len()).sum()
    }

    pub fn pass(&self) -> bool {
        self.groups.iter().all(|g| g.pass)
    }
}
