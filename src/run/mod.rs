//! The run aggregator.
//!
//! Loads each entry file, instantiates it against a fresh [`TestContext`], runs it and folds its result tree into a
//! [`RunAggregate`]. Any structural error stops the run; modules processed before it keep their results.

pub mod artifacts;
pub mod discovery;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use probe_core::ModuleLoader;

pub use artifacts::ArtifactWriter;
pub use discovery::{EntryDiscovery, GlobDiscovery, StaticDiscovery};

use crate::config::Configuration;
use crate::error::StructuralError;
use crate::host::{CustomImports, ModuleResult, NameFilter, PerformanceConfig, TestContext};
use crate::reporter::TestReporter;

/// Everything a module run needs beyond the module itself.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub group_filter: NameFilter,
    pub test_filter: NameFilter,
    pub performance: PerformanceConfig,
    pub imports: CustomImports,
    pub output_binary: bool,
    /// `false` loads (and writes artifacts) without running anything.
    pub run_tests: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            group_filter: NameFilter::all(),
            test_filter: NameFilter::all(),
            performance: PerformanceConfig::default(),
            imports: CustomImports::new(),
            output_binary: false,
            run_tests: true,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Configuration) -> Self {
        Self {
            performance: config.performance.clone(),
            imports: CustomImports::from_constants(&config.imports),
            output_binary: config.output_binary,
            ..Self::default()
        }
    }

    pub fn with_group_filter(mut self, filter: NameFilter) -> Self {
        self.group_filter = filter;
        self
    }

    pub fn with_test_filter(mut self, filter: NameFilter) -> Self {
        self.test_filter = filter;
        self
    }

    pub fn with_performance(mut self, performance: PerformanceConfig) -> Self {
        self.performance = performance;
        self
    }

    pub fn with_imports(mut self, imports: CustomImports) -> Self {
        self.imports = imports;
        self
    }

    pub fn with_output_binary(mut self, output_binary: bool) -> Self {
        self.output_binary = output_binary;
        self
    }

    pub fn with_run_tests(mut self, run_tests: bool) -> Self {
        self.run_tests = run_tests;
        self
    }
}

/// Totals across every module of a run.
#[derive(Debug, Default)]
pub struct RunAggregate {
    pub test_count: usize,
    pub success_count: usize,
    pub group_count: usize,
    pub group_success_count: usize,
    pub todo_count: usize,
    pub errors: Vec<StructuralError>,
    pub modules: Vec<ModuleResult>,
    pub duration: Duration,
}

impl RunAggregate {
    /// Every test and every group passed, and nothing structural went wrong.
    pub fn passed(&self) -> bool {
        self.success_count == self.test_count && self.group_success_count == self.group_count && self.errors.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.test_count - self.success_count
    }

    fn fold(&mut self, module: ModuleResult) {
        self.test_count += module.test_count();
        self.success_count += module.success_count();
        self.group_count += module.groups.len();
        self.group_success_count += module.groups.iter().filter(|g| g.pass).count();
        self.todo_count += module.todo_count();
        self.modules.push(module);
    }
}

/// What happened to one entry file.
enum ModuleOutcome {
    Ran {
        result: ModuleResult,
        errors: Vec<StructuralError>,
    },
    LoadedOnly,
    Rejected(Vec<StructuralError>),
}

/// Run every entry in order and report as modules complete.
pub fn run_entries(
    entries: &[PathBuf],
    loader: &mut dyn ModuleLoader,
    reporter: &mut dyn TestReporter,
    options: &RunOptions,
) -> RunAggregate {
    let started = Instant::now();
    let mut aggregate = RunAggregate::default();
    let mut writer = if options.output_binary {
        match ArtifactWriter::new() {
            Ok(writer) => Some(writer),
            Err(source) => {
                aggregate.errors.push(StructuralError::Artifact {
                    path: PathBuf::new(),
                    source,
                });
                None
            }
        }
    } else {
        None
    };

    reporter.on_run_start(entries.len());
    for entry in entries {
        if !aggregate.errors.is_empty() {
            break;
        }
        reporter.on_module_start(entry);
        match run_module(entry, loader, options, writer.as_mut()) {
            ModuleOutcome::Ran { result, errors } => {
                reporter.on_module_complete(&result);
                aggregate.fold(result);
                aggregate.errors.extend(errors);
            }
            ModuleOutcome::LoadedOnly => {}
            ModuleOutcome::Rejected(errors) => aggregate.errors.extend(errors),
        }
    }

    if let Some(writer) = writer {
        aggregate.errors.extend(writer.finish());
    }
    aggregate.duration = started.elapsed();

    tracing::info!(
        tests = aggregate.test_count,
        passed = aggregate.success_count,
        groups = aggregate.group_count,
        errors = aggregate.errors.len(),
        "run complete"
    );
    reporter.on_run_complete(&aggregate);
    aggregate
}

#[tracing::instrument(skip_all, fields(file = %entry.display()))]
fn run_module(
    entry: &Path,
    loader: &mut dyn ModuleLoader,
    options: &RunOptions,
    writer: Option<&mut ArtifactWriter>,
) -> ModuleOutcome {
    let file = entry.display().to_string();

    let loaded = match loader.load(entry) {
        Ok(loaded) => loaded,
        Err(source) => return ModuleOutcome::Rejected(vec![StructuralError::Load { file, source }]),
    };

    if let Some(writer) = writer {
        for artifact in loaded.artifacts {
            writer.write(artifact.output_path(entry), artifact.contents);
        }
    }

    let imports = match CustomImports::for_entry(entry, &options.imports) {
        Ok(imports) => imports,
        Err(source) => return ModuleOutcome::Rejected(vec![StructuralError::Imports { file, source }]),
    };

    let mut module = loaded.module;
    let mut context = TestContext::new(file)
        .with_group_filter(options.group_filter.clone())
        .with_test_filter(options.test_filter.clone())
        .with_performance(options.performance.clone())
        .with_imports(imports);

    if !context.instantiate(module.as_ref()) {
        let (_, errors) = context.into_result();
        return ModuleOutcome::Rejected(errors);
    }
    if !options.run_tests {
        tracing::debug!("not running");
        return ModuleOutcome::LoadedOnly;
    }

    context.run(module.as_mut());
    let (result, errors) = context.into_result();
    ModuleOutcome::Ran { result, errors }
}
