// Reads raw solver values back as domain quantities

use crate::domain::models::{Solution, VarId};
use log::warn;

/// Binary variables whose value exceeds this threshold are read as 1.
pub const BINARY_THRESHOLD: f64 = 0.5;

/// Largest distance from an integer tolerated before a warning is logged.
pub const INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// View over an optimal [`Solution`] with consistent rounding rules.
pub struct Extractor<'s> {
    solution: &'s Solution,
}

impl<'s> Extractor<'s> {
    /// Returns `None` unless the solution is optimal. A model without
    /// variables is optimal with no values.
    pub fn new(solution: &'s Solution) -> Option<Self> {
        if !solution.is_optimal() {
            return None;
        }
        if solution.quality.max_integrality_violation > INTEGRALITY_TOLERANCE {
            warn!(
                "Integer variables deviate from integrality by up to {:e}; rounding at {}",
                solution.quality.max_integrality_violation, BINARY_THRESHOLD
            );
        }
        Some(Self { solution })
    }

    pub fn value(&self, var: VarId) -> f64 {
        self.solution.value(var).unwrap_or(0.0)
    }

    /// Binary value as a boolean.
    pub fn flag(&self, var: VarId) -> bool {
        self.value(var) > BINARY_THRESHOLD
    }

    /// Integer value rounded to the nearest whole number.
    pub fn count(&self, var: VarId) -> u64 {
        self.value(var).round().max(0.0) as u64
    }

    /// Index of the first selected option among mutually exclusive binaries.
    pub fn selected(&self, options: &[VarId]) -> Option<usize> {
        options.iter().position(|&var| self.flag(var))
    }

    pub fn objective(&self) -> f64 {
        self.solution.optimal_value.unwrap_or(0.0)
    }
}
