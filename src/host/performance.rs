//! Performance sampling for passing tests.
//!
//! A test that passes is re-run while the sampler asks for more samples. The sampler stops once either the sample
//! count or the accumulated run time reaches its limit. Statistics are computed and rounded when the test ends.

use probe_core::PerfOverride;
use serde::{Deserialize, Serialize};

/// Hard upper bound on samples per test.
pub const MAX_SAMPLES: u32 = 10_000;
/// Hard upper bound on accumulated sampling time per test, in milliseconds.
pub const MAX_TEST_RUN_TIME: f64 = 5_000.0;
/// Hard upper bound on rounding precision.
pub const MAX_DECIMAL_PLACES: u32 = 8;

/// Sampling and reporting options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PerformanceConfig {
    pub enabled: bool,
    pub max_samples: u32,
    /// Milliseconds.
    pub max_test_run_time: f64,
    pub round_decimal_places: u32,
    pub report_average: bool,
    pub report_median: bool,
    pub report_std_dev: bool,
    pub report_max: bool,
    pub report_min: bool,
    pub report_variance: bool,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_samples: MAX_SAMPLES,
            max_test_run_time: 2_000.0,
            round_decimal_places: 3,
            report_average: true,
            report_median: true,
            report_std_dev: true,
            report_max: true,
            report_min: true,
            report_variance: false,
        }
    }
}

impl PerformanceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_max_samples(mut self, max_samples: u32) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn with_max_test_run_time(mut self, millis: f64) -> Self {
        self.max_test_run_time = millis;
        self
    }

    pub fn with_round_decimal_places(mut self, places: u32) -> Self {
        self.round_decimal_places = places;
        self
    }

    /// Clamp every limit into its permitted range.
    pub fn clamped(mut self) -> Self {
        self.max_samples = self.max_samples.min(MAX_SAMPLES);
        self.max_test_run_time = if self.max_test_run_time.is_nan() {
            0.0
        } else {
            self.max_test_run_time.clamp(0.0, MAX_TEST_RUN_TIME)
        };
        self.round_decimal_places = self.round_decimal_places.min(MAX_DECIMAL_PLACES);
        self
    }

    /// Apply a guest override, keeping limits clamped.
    pub fn apply(&mut self, option: PerfOverride) {
        match option {
            PerfOverride::Enabled(v) => self.enabled = v,
            PerfOverride::MaxSamples(v) => self.max_samples = v,
            PerfOverride::MaxTestRunTime(v) => self.max_test_run_time = v,
            PerfOverride::RoundDecimalPlaces(v) => self.round_decimal_places = v,
            PerfOverride::ReportAverage(v) => self.report_average = v,
            PerfOverride::ReportMedian(v) => self.report_median = v,
            PerfOverride::ReportStdDev(v) => self.report_std_dev = v,
            PerfOverride::ReportMax(v) => self.report_max = v,
            PerfOverride::ReportMin(v) => self.report_min = v,
            PerfOverride::ReportVariance(v) => self.report_variance = v,
        }
        *self = self.clone().clamped();
    }
}

/// Rounded statistics of one test's samples. Fields are `None` when not requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub samples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variance: Option<f64>,
}

/// Collects samples for the in-flight test.
#[derive(Debug, Clone)]
pub struct Sampler {
    config: PerformanceConfig,
    samples: Vec<f64>,
    total: f64,
}

impl Sampler {
    pub fn new(config: PerformanceConfig) -> Self {
        Self {
            config: config.clamped(),
            samples: Vec::new(),
            total: 0.0,
        }
    }

    pub fn config(&self) -> &PerformanceConfig {
        &self.config
    }

    pub fn apply(&mut self, option: PerfOverride) {
        self.config.apply(option);
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Record one run's duration. Returns whether another run is wanted.
    pub fn collect(&mut self, elapsed: f64) -> bool {
        if !self.config.enabled {
            return false;
        }
        self.samples.push(elapsed);
        self.total += elapsed;
        (self.samples.len() as u64) < u64::from(self.config.max_samples) && self.total < self.config.max_test_run_time
    }

    /// Summarize the collected samples. `None` when sampling was off or nothing was collected.
    pub fn finish(&self) -> Option<PerformanceStats> {
        if !self.config.enabled || self.samples.is_empty() {
            return None;
        }
        Some(summarize(&self.samples, &self.config))
    }
}

fn summarize(samples: &[f64], config: &PerformanceConfig) -> PerformanceStats {
    let places = config.round_decimal_places;
    let count = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / count;
    let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / count;

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    let min = sorted.first().copied().unwrap_or(0.0);
    let max = sorted.last().copied().unwrap_or(0.0);

    let pick = |enabled: bool, value: f64| enabled.then(|| round(value, places));
    PerformanceStats {
        samples: samples.len(),
        average: pick(config.report_average, mean),
        median: pick(config.report_median, median),
        std_dev: pick(config.report_std_dev, variance.sqrt()),
        max: pick(config.report_max, max),
        min: pick(config.report_min, min),
        variance: pick(config.report_variance, variance),
    }
}

fn round(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places.min(MAX_DECIMAL_PLACES) as i32);
    (value * factor).round() / factor
}
