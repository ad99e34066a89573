use thiserror::Error;

use crate::data::SolveStats;

/// Categorized failures of the solve pipeline.
///
/// Capacity-class errors are raised by the arithmetic precheck and never
/// reach the search engine; `NoSolutionFound` and `Timeout` come out of the
/// search itself, so callers can tell a proof of infeasibility apart from an
/// exhausted budget.
#[derive(Debug, Clone, Error)]
pub enum SolveError {
    /// Aggregate target sum exceeds best-case working capacity.
    #[error(
        "demand ({demand}) exceeds capacity ({capacity}); reduce student interview counts or add interviewers"
    )]
    InfeasibleDemand { demand: u64, capacity: u64 },

    /// Virtual quota sum exceeds best-case virtual capacity.
    #[error(
        "virtual demand ({virtual_demand}) exceeds virtual capacity ({virtual_capacity}); add virtual interviewers or reduce the minimum virtual requirement"
    )]
    InfeasibleVirtualDemand {
        virtual_demand: u64,
        virtual_capacity: u64,
    },

    /// The search proved that no schedule satisfies the constraints.
    #[error("no schedule satisfies the constraints; relax quotas or add capacity")]
    NoSolutionFound,

    /// The budget ran out before a schedule or an infeasibility proof.
    #[error("search budget of {budget_secs}s exhausted without a schedule or an infeasibility proof")]
    Timeout { budget_secs: f64 },

    /// A concrete schedule breaches one or more constraints.
    #[error("schedule violates {} constraint(s)", .violations.len())]
    ValidationViolation { violations: Vec<String> },

    /// Input rejected before any model was built.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}

impl SolveError {
    /// Stable identifier for the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            SolveError::InfeasibleDemand { .. } => "INFEASIBLE_DEMAND",
            SolveError::InfeasibleVirtualDemand { .. } => "INFEASIBLE_VIRTUAL_DEMAND",
            SolveError::NoSolutionFound => "NO_SOLUTION_FOUND",
            SolveError::Timeout { .. } => "TIMEOUT",
            SolveError::ValidationViolation { .. } => "VALIDATION_VIOLATION",
            SolveError::InvalidScenario(_) => "INVALID_SCENARIO",
        }
    }
}

/// A failed solve, carrying whatever stats were computed before the failure.
///
/// `stats` is `None` only when the input was rejected before the capacity
/// figures existed.
#[derive(Debug, Clone)]
pub struct SolveFailure {
    pub error: SolveError,
    pub stats: Option<SolveStats>,
}

impl std::fmt::Display for SolveFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for SolveFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_figures() {
        let err = SolveError::InfeasibleDemand {
            demand: 9,
            capacity: 6,
        };
        let msg = err.to_string();
        assert!(msg.contains("9") && msg.contains("6"), "{msg}");
        assert_eq!(err.kind(), "INFEASIBLE_DEMAND");
    }

    #[test]
    fn violation_count_in_message() {
        let err = SolveError::ValidationViolation {
            violations: vec!["a".into(), "b".into()],
        };
        assert!(err.to_string().contains("2"));
        assert_eq!(err.kind(), "VALIDATION_VIOLATION");
    }
}
