//! Moving-average sensor filter with outlier rejection.
//!
//! History lives in a fixed-capacity `heapless::Deque`; the configured
//! window may be anything up to [`MAX_WINDOW`].  The mean is recomputed
//! from the retained samples on every read so it never drifts from the
//! history it describes.
//!
//! Two readiness tiers gate the rules that consume a filter:
//!
//! - [`SensorFilter::ready`]: at least half the window is filled.
//! - [`SensorFilter::fast_ready`]: at least two samples, for rules where
//!   reacting late is worse than reacting on a short history.

use heapless::Deque;

/// Largest window any filter can be configured with.
pub const MAX_WINDOW: usize = 64;

/// Window used when the configuration does not say otherwise.
pub const DEFAULT_WINDOW: usize = 10;

/// Samples needed before the outlier test applies.
const MIN_SAMPLES_FOR_OUTLIER: usize = 3;

/// Rejection threshold, in standard deviations from the mean.
const OUTLIER_SIGMA: f32 = 3.0;

/// Samples needed for [`SensorFilter::fast_ready`].
const FAST_READY_SAMPLES: usize = 2;

/// Why a sample was discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// Physical quantities here are never negative.
    Negative,
    /// NaN or infinity.
    NotFinite,
    /// Deviates from the mean by more than three standard deviations.
    Outlier { mean: f32, std_dev: f32 },
}

impl core::fmt::Display for Rejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Negative => write!(f, "negative"),
            Self::NotFinite => write!(f, "not finite"),
            Self::Outlier { mean, std_dev } => {
                write!(f, "outlier (mean={mean:.2}, std={std_dev:.2})")
            }
        }
    }
}

/// Result of [`SensorFilter::add`].  Either way `mean()` is the current mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    Accepted { mean: f32 },
    Rejected { mean: f32, reason: Rejection },
}

impl SampleOutcome {
    pub fn mean(&self) -> f32 {
        match *self {
            Self::Accepted { mean } | Self::Rejected { mean, .. } => mean,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

#[derive(Debug, Clone)]
pub struct SensorFilter {
    window: usize,
    history: Deque<f32, MAX_WINDOW>,
    rejected: u32,
}

impl Default for SensorFilter {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl SensorFilter {
    /// Create an empty filter.  `window` is clamped to `1..=MAX_WINDOW`.
    pub fn new(window: usize) -> Self {
        Self {
            window: window.clamp(1, MAX_WINDOW),
            history: Deque::new(),
            rejected: 0,
        }
    }

    /// Ingest one raw sample and return the outcome with the updated mean.
    pub fn add(&mut self, value: f32) -> SampleOutcome {
        if let Some(reason) = self.check(value) {
            self.rejected = self.rejected.saturating_add(1);
            return SampleOutcome::Rejected {
                mean: self.get(),
                reason,
            };
        }

        if self.history.len() >= self.window {
            self.history.pop_front();
        }
        // Cannot fail: len < window <= MAX_WINDOW after the eviction above.
        let _ = self.history.push_back(value);

        SampleOutcome::Accepted { mean: self.get() }
    }

    /// Current mean of the retained samples, 0.0 when empty.
    pub fn get(&self) -> f32 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<f32>() / self.history.len() as f32
    }

    /// Population standard deviation of the retained samples.
    pub fn std_dev(&self) -> f32 {
        let n = self.history.len();
        if n == 0 {
            return 0.0;
        }
        let mean = self.get();
        let var = self
            .history
            .iter()
            .map(|x| (x - mean) * (x - mean))
            .sum::<f32>()
            / n as f32;
        var.sqrt()
    }

    /// At least half the window is filled.
    pub fn ready(&self) -> bool {
        self.history.len() >= self.window / 2
    }

    /// At least two samples are held.
    pub fn fast_ready(&self) -> bool {
        self.history.len() >= FAST_READY_SAMPLES
    }

    /// Number of samples currently retained.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Samples discarded since creation or the last reset.
    pub fn rejected_count(&self) -> u32 {
        self.rejected
    }

    /// Iterate retained samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = f32> + '_ {
        self.history.iter().copied()
    }

    /// Drop all history and counters.
    pub fn reset(&mut self) {
        self.history.clear();
        self.rejected = 0;
    }

    fn check(&self, value: f32) -> Option<Rejection> {
        if !value.is_finite() {
            return Some(Rejection::NotFinite);
        }
        if value < 0.0 {
            return Some(Rejection::Negative);
        }
        if self.history.len() >= MIN_SAMPLES_FOR_OUTLIER {
            let mean = self.get();
            let std_dev = self.std_dev();
            // A flat history has no spread to measure against.
            if std_dev > 0.0 && (value - mean).abs() > OUTLIER_SIGMA * std_dev {
                return Some(Rejection::Outlier { mean, std_dev });
            }
        }
        None
    }
}
