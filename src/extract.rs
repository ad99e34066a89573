use itertools::Itertools;
use std::collections::BTreeMap;

use crate::data::{InterviewerAssignment, InterviewerGrid, InterviewerSlot, StudentGrid};
use crate::model::SolveModel;
use crate::search::Assignment;

/// Bijective base-26 table letters: 0 -> A, 25 -> Z, 26 -> AA, 27 -> AB.
pub fn table_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).expect("table letters are ASCII")
}

/// Display ids in first-seen order: physical interviewers get table letters,
/// virtual ones get Z-1, Z-2, ...
pub fn display_ids(is_virtual: &[bool]) -> Vec<String> {
    let mut physicals = 0usize;
    let mut virtuals = 0usize;
    is_virtual
        .iter()
        .map(|&v| {
            if v {
                virtuals += 1;
                format!("Z-{virtuals}")
            } else {
                let id = table_letter(physicals);
                physicals += 1;
                id
            }
        })
        .collect()
}

/// Name-keyed views of a solved assignment.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub schedule_data: StudentGrid,
    pub interviewer_schedule: InterviewerGrid,
    pub interviewer_assignments: Vec<InterviewerAssignment>,
}

pub fn extract(model: &SolveModel, assignment: &Assignment) -> Extraction {
    let mut schedule_data = BTreeMap::new();
    for (s, name) in model.student_names.iter().enumerate() {
        let row: Vec<Option<String>> = assignment.student_slots[s]
            .iter()
            .map(|cell| cell.map(|i| model.interviewer_names[i].clone()))
            .collect();
        schedule_data.insert(name.clone(), row);
    }

    let ids = display_ids(&model.is_virtual);
    let mut interviewer_schedule = BTreeMap::new();
    let mut interviewer_assignments = Vec::with_capacity(model.num_interviewers());
    for (i, name) in model.interviewer_names.iter().enumerate() {
        let row: Vec<InterviewerSlot> = (0..model.quotas.num_slots)
            .map(|t| {
                if assignment.breaks[i][t] {
                    InterviewerSlot::Break
                } else {
                    match assignment.interviewer_slots[i][t] {
                        Some(s) => InterviewerSlot::Busy(model.student_names[s].clone()),
                        None => InterviewerSlot::Free,
                    }
                }
            })
            .collect();

        let break_slots: Vec<u32> = row
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == InterviewerSlot::Break)
            .map(|(t, _)| t as u32 + 1)
            .collect();
        let break_display = if break_slots.is_empty() {
            "None".to_string()
        } else {
            break_slots.iter().join(", ")
        };

        interviewer_assignments.push(InterviewerAssignment {
            name: name.clone(),
            id: ids[i].clone(),
            is_virtual: model.is_virtual[i],
            break_slots,
            break_display,
        });
        interviewer_schedule.insert(name.clone(), row);
    }

    // lexicographic on the display id puts the letters before the Z- ids
    interviewer_assignments.sort_by(|a, b| a.id.cmp(&b.id));

    Extraction {
        schedule_data,
        interviewer_schedule,
        interviewer_assignments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Interviewer, Student};
    use crate::model::QuotaConfig;

    #[test]
    fn table_letters_roll_over_like_spreadsheet_columns() {
        assert_eq!(table_letter(0), "A");
        assert_eq!(table_letter(1), "B");
        assert_eq!(table_letter(25), "Z");
        assert_eq!(table_letter(26), "AA");
        assert_eq!(table_letter(27), "AB");
        assert_eq!(table_letter(51), "AZ");
        assert_eq!(table_letter(52), "BA");
    }

    #[test]
    fn ids_follow_first_seen_order() {
        let ids = display_ids(&[false, true, false, true]);
        assert_eq!(ids, vec!["A", "Z-1", "B", "Z-2"]);
    }

    #[test]
    fn grids_and_summaries_from_an_assignment() {
        let model = SolveModel::build(
            &[Student {
                name: "Ana".into(),
                target: 1,
            }],
            &[
                Interviewer {
                    name: "Pat".into(),
                    is_virtual: false,
                },
                Interviewer {
                    name: "Zoom 1".into(),
                    is_virtual: true,
                },
            ],
            QuotaConfig::new(2, 1, None, 0, Some(1)),
        )
        .unwrap();

        let assignment = Assignment {
            student_slots: vec![vec![Some(0), None]],
            interviewer_slots: vec![vec![Some(0), None], vec![None, None]],
            breaks: vec![vec![false, true], vec![true, false]],
        };

        let extraction = extract(&model, &assignment);

        assert_eq!(
            extraction.schedule_data["Ana"],
            vec![Some("Pat".to_string()), None]
        );
        assert_eq!(
            extraction.interviewer_schedule["Pat"],
            vec![InterviewerSlot::Busy("Ana".into()), InterviewerSlot::Break]
        );
        assert_eq!(
            extraction.interviewer_schedule["Zoom 1"],
            vec![InterviewerSlot::Break, InterviewerSlot::Free]
        );

        // summary sorted by display id: "A" before "Z-1"
        let summary = &extraction.interviewer_assignments;
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].id, "A");
        assert_eq!(summary[0].break_slots, vec![2]);
        assert_eq!(summary[0].break_display, "2");
        assert_eq!(summary[1].id, "Z-1");
        assert_eq!(summary[1].break_slots, vec![1]);
        assert!(summary[1].is_virtual);
    }
}
