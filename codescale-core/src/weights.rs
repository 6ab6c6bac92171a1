//! Weight calculation for the overall score.
//!
//! The evaluator depends only on the [`WeightProvider`] trait.  A provider
//! supplies the *base* weights used when a request carries no priority list;
//! priority-ordered weights are derived the same way for every provider, by
//! exponential decay over the cleaned list.
//!
//! [`StaticWeights`] is the built-in equal split.  [`ConfiguredWeights`]
//! carries a validated override from [`crate::config::ScoringConfig`].

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::report::MetricId;

/// Metric id to weight.  Weights are non-negative and sum to 1.
pub type WeightVector = BTreeMap<MetricId, f64>;

/// Ratio between the raw weights of adjacent priority positions.
pub const DECAY_RATE: f64 = 0.7;

/// Tolerance for treating a weight sum as 1.
pub const SUM_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// WeightProvider
// ---------------------------------------------------------------------------

pub trait WeightProvider: Send + Sync {
    /// Weights used when the caller gives no usable priority list.
    fn base_weights(&self) -> WeightVector;

    /// Effective weights for one request.
    ///
    /// Unknown ids and later duplicates are dropped from `priority`; when
    /// nothing is left the base weights apply.
    fn weights(&self, priority: Option<&[String]>) -> WeightVector {
        let cleaned = priority.map(clean_priority).unwrap_or_default();
        match priority_weights(&cleaned) {
            Some(weights) => {
                debug!(priority = ?cleaned, "using priority weights");
                weights
            }
            None => {
                debug!("using base weights");
                self.base_weights()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// StaticWeights: equal split
// ---------------------------------------------------------------------------

/// Every metric weighted `1/5`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticWeights;

impl WeightProvider for StaticWeights {
    fn base_weights(&self) -> WeightVector {
        let share = 1.0 / MetricId::all().len() as f64;
        MetricId::all().iter().map(|&m| (m, share)).collect()
    }
}

// ---------------------------------------------------------------------------
// ConfiguredWeights: validated override
// ---------------------------------------------------------------------------

/// Base weights taken from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfiguredWeights {
    weights: WeightVector,
}

impl ConfiguredWeights {
    /// Wrap an override, or `None` if it is not a valid weight vector.
    pub fn new(weights: WeightVector) -> Option<Self> {
        is_valid(&weights).then_some(Self { weights })
    }
}

impl WeightProvider for ConfiguredWeights {
    fn base_weights(&self) -> WeightVector {
        self.weights.clone()
    }
}

/// Non-empty, finite, non-negative, summing to 1 within [`SUM_TOLERANCE`].
pub fn is_valid(weights: &WeightVector) -> bool {
    !weights.is_empty()
        && weights.values().all(|w| w.is_finite() && *w >= 0.0)
        && (weights.values().sum::<f64>() - 1.0).abs() <= SUM_TOLERANCE
}

// ---------------------------------------------------------------------------
// Priority mode
// ---------------------------------------------------------------------------

/// Parse a caller-supplied priority list.
///
/// Unknown ids are dropped with a warning; a repeated id keeps its first
/// position.
pub fn clean_priority<S: AsRef<str>>(priority: &[S]) -> Vec<MetricId> {
    let mut seen = HashSet::new();
    let mut cleaned = Vec::with_capacity(priority.len());
    for raw in priority {
        let raw = raw.as_ref();
        match raw.parse::<MetricId>() {
            Ok(metric) => {
                if seen.insert(metric) {
                    cleaned.push(metric);
                } else {
                    debug!(metric = raw, "ignoring repeated priority entry");
                }
            }
            Err(_) => warn!(metric = raw, "ignoring unknown metric in priority list"),
        }
    }
    cleaned
}

/// Decay-weighted vector over `priority`, `None` for an empty list.
///
/// Metrics missing from the list are absent from the result.
pub fn priority_weights(priority: &[MetricId]) -> Option<WeightVector> {
    let raw: Vec<f64> = (0..priority.len())
        .map(|i| DECAY_RATE.powi(i as i32))
        .collect();
    let total: f64 = raw.iter().sum();
    if total <= 0.0 {
        return None;
    }
    Some(
        priority
            .iter()
            .zip(raw)
            .map(|(&metric, r)| (metric, r / total))
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
