//! Ordered threshold tables.
//!
//! Every scorer in this crate turns a measurement into a contribution or a
//! band by walking a short list of cut points. A `Ladder` holds those cut
//! points as data so each tier can be checked on its own.

use std::fmt;

use serde::Serialize;

/// Which side of a threshold a value must fall on for a step to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Step matches when `value > threshold`. Steps are listed high to low.
    Above,
    /// Step matches when `value < threshold`. Steps are listed low to high.
    Below,
}

/// Sorted `(threshold, outcome)` pairs; the first matching step wins.
#[derive(Debug, Clone, Copy)]
pub struct Ladder<T: 'static> {
    direction: Direction,
    steps: &'static [(f64, T)],
}

impl<T: Copy + 'static> Ladder<T> {
    pub const fn above(steps: &'static [(f64, T)]) -> Self {
        Self {
            direction: Direction::Above,
            steps,
        }
    }

    pub const fn below(steps: &'static [(f64, T)]) -> Self {
        Self {
            direction: Direction::Below,
            steps,
        }
    }

    /// Outcome of the first step `value` clears, if any.
    pub fn lookup(&self, value: f64) -> Option<T> {
        self.steps
            .iter()
            .find(|(threshold, _)| match self.direction {
                Direction::Above => value > *threshold,
                Direction::Below => value < *threshold,
            })
            .map(|(_, outcome)| *outcome)
    }

    /// Outcome of the first matching step, else `otherwise(value)`.
    pub fn lookup_or_else(&self, value: f64, otherwise: impl FnOnce(f64) -> T) -> T {
        self.lookup(value).unwrap_or_else(|| otherwise(value))
    }

    /// Outcome of the first matching step, else `fallback`.
    pub fn lookup_or(&self, value: f64, fallback: T) -> T {
        self.lookup(value).unwrap_or(fallback)
    }
}

/// Qualitative hazard band shared by the fire, flood and planting scorers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Extreme,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Extreme => "Extreme",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A level together with its map color.
pub type Band = (RiskLevel, &'static str);
