use std::collections::{HashMap, HashSet};

use crate::data::{Interviewer, InterviewerGrid, InterviewerSlot, Student, StudentGrid};
use crate::error::SolveError;
use crate::model::QuotaConfig;

/// Recomputes every scheduling invariant from a concrete schedule.
///
/// The schedule may come from a fresh solve or from storage; nothing here
/// reuses solver state. When the interviewer grid is missing (externally
/// stored schedules may only have kept the student grid) the break-side
/// checks are skipped and all student-side invariants are still enforced.
/// Returns human-readable violations; an empty list means the schedule is
/// valid.
pub fn check(
    schedule: &StudentGrid,
    interviewer_schedule: Option<&InterviewerGrid>,
    students: &[Student],
    interviewers: &[Interviewer],
    quotas: &QuotaConfig,
) -> Vec<String> {
    let mut errors = Vec::new();
    let num_slots = quotas.num_slots;
    let known: HashSet<&str> = interviewers.iter().map(|i| i.name.as_str()).collect();
    let virtual_names: HashSet<&str> = interviewers
        .iter()
        .filter(|i| i.is_virtual)
        .map(|i| i.name.as_str())
        .collect();
    let targets: HashMap<&str, usize> = students
        .iter()
        .map(|s| (s.name.as_str(), s.target as usize))
        .collect();

    // roster and row-shape sanity
    for (name, slots) in schedule {
        if !targets.contains_key(name.as_str()) {
            errors.push(format!("{name}: not in the student roster"));
        }
        if slots.len() != num_slots {
            errors.push(format!(
                "{name}: schedule row has {} slots, expected {num_slots}",
                slots.len()
            ));
        }
        for interviewer in slots.iter().flatten() {
            if !known.contains(interviewer.as_str()) {
                errors.push(format!("{name}: unknown interviewer '{interviewer}'"));
            }
        }
    }
    for student in students {
        if !schedule.contains_key(&student.name) {
            errors.push(format!("{}: missing from the schedule", student.name));
        }
    }

    // exact interview counts
    for (name, slots) in schedule {
        let Some(&expected) = targets.get(name.as_str()) else {
            continue;
        };
        let actual = slots.iter().flatten().count();
        if actual != expected {
            errors.push(format!(
                "{name}: got {actual} interviews, expected {expected}"
            ));
        }
    }

    // virtual quota window
    for (name, slots) in schedule {
        let virt = slots
            .iter()
            .flatten()
            .filter(|i| virtual_names.contains(i.as_str()))
            .count();
        if virt < quotas.min_virtual {
            errors.push(format!(
                "{name}: only {virt} virtual interviews, need at least {}",
                quotas.min_virtual
            ));
        } else if virt > quotas.max_virtual {
            errors.push(format!(
                "{name}: {virt} virtual interviews, allowed at most {}",
                quotas.max_virtual
            ));
        }
    }

    // no student sees the same interviewer twice
    for (name, slots) in schedule {
        let mut seen = HashSet::new();
        for interviewer in slots.iter().flatten() {
            if !seen.insert(interviewer.as_str()) {
                errors.push(format!("{name}: sees {interviewer} more than once"));
            }
        }
    }

    // per-slot distinctness, and nobody assigned to an interviewer on break
    for t in 0..num_slots {
        let mut used: HashSet<&str> = HashSet::new();
        for (name, slots) in schedule {
            let Some(Some(interviewer)) = slots.get(t) else {
                continue;
            };
            if !used.insert(interviewer.as_str()) {
                errors.push(format!("Slot #{}: {interviewer} is double-booked", t + 1));
            }
            if let Some(grid) = interviewer_schedule {
                let cell = grid.get(interviewer.as_str()).and_then(|row| row.get(t));
                if cell == Some(&InterviewerSlot::Break) {
                    errors.push(format!(
                        "Slot #{}: {name} is assigned to {interviewer} during a break",
                        t + 1
                    ));
                }
            }
        }
    }

    if let Some(grid) = interviewer_schedule {
        // break counts
        for (name, row) in grid {
            if row.len() != num_slots {
                errors.push(format!(
                    "{name}: interviewer row has {} slots, expected {num_slots}",
                    row.len()
                ));
            }
            let breaks = row
                .iter()
                .filter(|cell| **cell == InterviewerSlot::Break)
                .count();
            if breaks < quotas.breaks_min || breaks > quotas.breaks_max {
                errors.push(format!(
                    "{name}: {breaks} break(s), expected between {} and {}",
                    quotas.breaks_min, quotas.breaks_max
                ));
            }
        }

        // the two grids must describe the same assignments
        for (student, slots) in schedule {
            for (t, cell) in slots.iter().enumerate() {
                if let Some(interviewer) = cell {
                    let cross = grid.get(interviewer.as_str()).and_then(|row| row.get(t));
                    if cross != Some(&InterviewerSlot::Busy(student.clone())) {
                        errors.push(format!(
                            "Slot #{}: {student} lists {interviewer}, but the interviewer grid disagrees",
                            t + 1
                        ));
                    }
                }
            }
        }
        for (interviewer, row) in grid {
            for (t, cell) in row.iter().enumerate() {
                if let InterviewerSlot::Busy(student) = cell {
                    let cross = schedule
                        .get(student.as_str())
                        .and_then(|slots| slots.get(t))
                        .and_then(|c| c.as_deref());
                    if cross != Some(interviewer.as_str()) {
                        errors.push(format!(
                            "Slot #{}: {interviewer} lists {student}, but the student grid disagrees",
                            t + 1
                        ));
                    }
                }
            }
        }
    }

    errors
}

/// Like [`check`], but folds any violations into a hard error.
pub fn check_strict(
    schedule: &StudentGrid,
    interviewer_schedule: Option<&InterviewerGrid>,
    students: &[Student],
    interviewers: &[Interviewer],
    quotas: &QuotaConfig,
) -> Result<(), SolveError> {
    let violations = check(schedule, interviewer_schedule, students, interviewers, quotas);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(SolveError::ValidationViolation { violations })
    }
}
