//! Simulated driving metrics and the coaching tip derived from them.
//!
//! Every score is a uniform draw from a per-metric inclusive range. The random
//! source is always passed in by the caller so runs can be reproduced with a
//! seeded generator.

use std::fmt;
use std::ops::RangeInclusive;

use rand::Rng;
use thiserror::Error;

/// The six scored driving behaviours, in report order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    SmartDriving,
    SmoothTurns,
    SafeStops,
    FocusWhileDriving,
    SpeedCompliance,
    FuelEfficiency,
}

impl Metric {
    /// All metrics in the order they are generated, charted and printed.
    pub const ALL: [Metric; 6] = [
        Metric::SmartDriving,
        Metric::SmoothTurns,
        Metric::SafeStops,
        Metric::FocusWhileDriving,
        Metric::SpeedCompliance,
        Metric::FuelEfficiency,
    ];

    /// Human readable label used on charts and in the report.
    pub fn label(self) -> &'static str {
        match self {
            Metric::SmartDriving => "Smart Driving",
            Metric::SmoothTurns => "Smooth Turns",
            Metric::SafeStops => "Safe Stops",
            Metric::FocusWhileDriving => "Focus While Driving",
            Metric::SpeedCompliance => "Speed Compliance",
            Metric::FuelEfficiency => "Fuel Efficiency",
        }
    }

    /// Inclusive range the simulated score is drawn from.
    pub fn range(self) -> RangeInclusive<u8> {
        match self {
            Metric::SmartDriving => 60..=100,
            Metric::SmoothTurns => 40..=100,
            Metric::SafeStops => 50..=100,
            Metric::FocusWhileDriving => 30..=100,
            Metric::SpeedCompliance => 70..=100,
            Metric::FuelEfficiency => 50..=100,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered mapping from metric name to percentage score.
///
/// Insertion order is preserved and drives chart colours, report line order and
/// tie-breaking in [`select_tip`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricSet {
    scores: Vec<(String, u8)>,
}

impl MetricSet {
    /// Draws a fresh score for each of the six [`Metric`]s.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let scores = Metric::ALL
            .iter()
            .map(|metric| (metric.label().to_owned(), rng.gen_range(metric.range())))
            .collect();
        Self { scores }
    }

    /// Builds a set from arbitrary `(name, value)` pairs, keeping their order.
    pub fn from_scores<I, N>(scores: I) -> Self
    where
        I: IntoIterator<Item = (N, u8)>,
        N: Into<String>,
    {
        Self {
            scores: scores
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> + '_ {
        self.scores.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Returns the score recorded for `name`, if any.
    pub fn get(&self, name: &str) -> Option<u8> {
        self.iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Sum of all scores, used for pie chart shares.
    pub fn total(&self) -> u32 {
        self.scores.iter().map(|(_, value)| u32::from(*value)).sum()
    }

    /// Lowest scoring entry; the first one wins when several share the minimum.
    pub fn weakest(&self) -> Option<(&str, u8)> {
        self.iter().fold(None, |lowest, entry| match lowest {
            Some((_, value)) if value <= entry.1 => lowest,
            _ => Some(entry),
        })
    }
}

/// Coaching message naming the weakest metric.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tip {
    metric: String,
    value: u8,
}

impl Tip {
    /// Name of the metric the tip refers to.
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Score of the metric the tip refers to.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// The full message, e.g. `Tip: Focus on improving Safe Stops (52%)`.
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Tip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tip: Focus on improving {} ({}%)", self.metric, self.value)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TipError {
    #[error("cannot derive a tip from an empty metric set")]
    EmptyMetrics,
}

/// Picks the metric with the smallest score and phrases a tip about it.
pub fn select_tip(metrics: &MetricSet) -> Result<Tip, TipError> {
    metrics
        .weakest()
        .map(|(metric, value)| Tip {
            metric: metric.to_owned(),
            value,
        })
        .ok_or(TipError::EmptyMetrics)
}
