use std::collections::HashSet;

use crate::data::{Interviewer, Student};
use crate::error::SolveError;

/// Upper bound on students x interviewers x slots before a model is built.
/// Solver state is one boolean per cell, so this caps memory and search size.
pub const MAX_MODEL_CELLS: u64 = 5_000_000;

/// Upper bound on the total number of interviews in one scenario.
pub const MAX_TOTAL_INTERVIEWS: u64 = 10_000;

/// Normalized quota configuration: a fixed count is the degenerate range
/// with min = max.
#[derive(Debug, Clone, Copy)]
pub struct QuotaConfig {
    pub num_slots: usize,
    pub breaks_min: usize,
    pub breaks_max: usize,
    pub min_virtual: usize,
    pub max_virtual: usize,
}

impl QuotaConfig {
    pub fn new(
        num_slots: u32,
        breaks_min: u32,
        breaks_max: Option<u32>,
        min_virtual: u32,
        max_virtual: Option<u32>,
    ) -> Self {
        Self {
            num_slots: num_slots as usize,
            breaks_min: breaks_min as usize,
            breaks_max: breaks_max.unwrap_or(breaks_min) as usize,
            min_virtual: min_virtual as usize,
            max_virtual: max_virtual.unwrap_or(min_virtual) as usize,
        }
    }

    /// Best-case working slots per interviewer, taking only required breaks.
    pub fn working_slots(&self) -> usize {
        self.num_slots.saturating_sub(self.breaks_min)
    }
}

/// Index-addressed scenario. Every student and interviewer gets a stable
/// index at construction time; the name tables exist only for the
/// boundaries, never for solver-side lookups.
#[derive(Debug, Clone)]
pub struct SolveModel {
    pub student_names: Vec<String>,
    /// Per-student interview targets; mutated only by auto-balance.
    pub targets: Vec<usize>,
    pub interviewer_names: Vec<String>,
    pub is_virtual: Vec<bool>,
    pub quotas: QuotaConfig,
}

impl SolveModel {
    pub fn build(
        students: &[Student],
        interviewers: &[Interviewer],
        quotas: QuotaConfig,
    ) -> Result<Self, SolveError> {
        if quotas.breaks_max < quotas.breaks_min {
            return Err(SolveError::InvalidScenario(format!(
                "breaksMax ({}) is below breaksMin ({})",
                quotas.breaks_max, quotas.breaks_min
            )));
        }
        if quotas.max_virtual < quotas.min_virtual {
            return Err(SolveError::InvalidScenario(format!(
                "maxVirtualPerStudent ({}) is below minVirtualPerStudent ({})",
                quotas.max_virtual, quotas.min_virtual
            )));
        }

        let cells = (students.len() as u64)
            .saturating_mul(interviewers.len() as u64)
            .saturating_mul(quotas.num_slots as u64);
        if cells > MAX_MODEL_CELLS {
            return Err(SolveError::InvalidScenario(format!(
                "model needs {cells} assignment cells, limit is {MAX_MODEL_CELLS}"
            )));
        }
        let demand: u64 = students.iter().map(|s| u64::from(s.target)).sum();
        if demand > MAX_TOTAL_INTERVIEWS {
            return Err(SolveError::InvalidScenario(format!(
                "total demand of {demand} interviews exceeds the supported maximum {MAX_TOTAL_INTERVIEWS}"
            )));
        }

        let mut seen = HashSet::new();
        for student in students {
            if !seen.insert(student.name.as_str()) {
                return Err(SolveError::InvalidScenario(format!(
                    "duplicate student name '{}'",
                    student.name
                )));
            }
        }
        let mut seen = HashSet::new();
        for interviewer in interviewers {
            if !seen.insert(interviewer.name.as_str()) {
                return Err(SolveError::InvalidScenario(format!(
                    "duplicate interviewer name '{}'",
                    interviewer.name
                )));
            }
        }

        Ok(Self {
            student_names: students.iter().map(|s| s.name.clone()).collect(),
            targets: students.iter().map(|s| s.target as usize).collect(),
            interviewer_names: interviewers.iter().map(|i| i.name.clone()).collect(),
            is_virtual: interviewers.iter().map(|i| i.is_virtual).collect(),
            quotas,
        })
    }

    pub fn num_students(&self) -> usize {
        self.student_names.len()
    }

    pub fn num_interviewers(&self) -> usize {
        self.interviewer_names.len()
    }

    pub fn virtual_count(&self) -> usize {
        self.is_virtual.iter().filter(|v| **v).count()
    }

    pub fn demand(&self) -> u64 {
        self.targets.iter().map(|&t| t as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn students(names: &[(&str, u32)]) -> Vec<Student> {
        names
            .iter()
            .map(|&(name, target)| Student {
                name: name.into(),
                target,
            })
            .collect()
    }

    fn interviewers(names: &[(&str, bool)]) -> Vec<Interviewer> {
        names
            .iter()
            .map(|&(name, is_virtual)| Interviewer {
                name: name.into(),
                is_virtual,
            })
            .collect()
    }

    #[test]
    fn builds_index_tables() {
        let model = SolveModel::build(
            &students(&[("Ana", 2), ("Ben", 3)]),
            &interviewers(&[("P1", false), ("V1", true)]),
            QuotaConfig::new(4, 1, None, 1, None),
        )
        .unwrap();

        assert_eq!(model.targets, vec![2, 3]);
        assert_eq!(model.is_virtual, vec![false, true]);
        assert_eq!(model.virtual_count(), 1);
        assert_eq!(model.demand(), 5);
        assert_eq!(model.quotas.working_slots(), 3);
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = SolveModel::build(
            &students(&[("Ana", 2), ("Ana", 3)]),
            &interviewers(&[("P1", false)]),
            QuotaConfig::new(4, 0, None, 0, None),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "INVALID_SCENARIO");
        assert!(err.to_string().contains("Ana"));
    }

    #[test]
    fn rejects_inverted_ranges() {
        let err = SolveModel::build(
            &students(&[]),
            &interviewers(&[]),
            QuotaConfig::new(4, 2, Some(1), 0, None),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "INVALID_SCENARIO");
    }

    #[test]
    fn rejects_oversized_models() {
        let many_students: Vec<Student> = (0..200)
            .map(|n| Student {
                name: format!("S{n}"),
                target: 0,
            })
            .collect();
        let many_interviewers: Vec<Interviewer> = (0..200)
            .map(|n| Interviewer {
                name: format!("I{n}"),
                is_virtual: false,
            })
            .collect();
        let err = SolveModel::build(
            &many_students,
            &many_interviewers,
            QuotaConfig::new(200, 0, None, 0, None),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "INVALID_SCENARIO");
        assert!(err.to_string().contains("cells"));
    }
}
