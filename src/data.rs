use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SolveError;
use crate::model::QuotaConfig;

/// Marker stored in interviewer grids for a break slot.
pub const BREAK_MARKER: &str = "BREAK";

/// A student and the exact number of interviews they must receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub name: String,
    pub target: u32,
}

/// An interviewer; virtual interviewers are tracked against a separate quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interviewer {
    pub name: String,
    #[serde(default)]
    pub is_virtual: bool,
}

/// Student name -> one entry per slot, an interviewer name or empty (waiting).
pub type StudentGrid = BTreeMap<String, Vec<Option<String>>>;

/// Interviewer name -> one entry per slot.
pub type InterviewerGrid = BTreeMap<String, Vec<InterviewerSlot>>;

/// One cell of an interviewer's row: a student, a break, or nothing.
///
/// On the wire a student is their name, a break is `"BREAK"`, and a free
/// slot is `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterviewerSlot {
    Busy(String),
    Break,
    Free,
}

impl Serialize for InterviewerSlot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            InterviewerSlot::Busy(name) => serializer.serialize_str(name),
            InterviewerSlot::Break => serializer.serialize_str(BREAK_MARKER),
            InterviewerSlot::Free => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for InterviewerSlot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match Option::<String>::deserialize(deserializer)? {
            None => InterviewerSlot::Free,
            Some(s) if s == BREAK_MARKER => InterviewerSlot::Break,
            Some(s) => InterviewerSlot::Busy(s),
        })
    }
}

fn default_num_slots() -> u32 {
    13
}

fn default_one() -> u32 {
    1
}

fn default_time_limit() -> f64 {
    30.0
}

/// The complete input for one solve request.
///
/// A fixed break count or virtual count is expressed by leaving the matching
/// `*Max` field absent; it collapses to the minimum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    pub students: Vec<Student>,
    pub interviewers: Vec<Interviewer>,
    #[serde(default = "default_num_slots")]
    pub num_slots: u32,
    #[serde(default = "default_one")]
    pub breaks_min: u32,
    #[serde(default)]
    pub breaks_max: Option<u32>,
    #[serde(default = "default_one")]
    pub min_virtual_per_student: u32,
    #[serde(default)]
    pub max_virtual_per_student: Option<u32>,
    /// Generated (and reported back) when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub auto_balance: bool,
    #[serde(default = "default_time_limit")]
    pub time_limit_secs: f64,
}

impl SolveRequest {
    pub fn quotas(&self) -> QuotaConfig {
        QuotaConfig::new(
            self.num_slots,
            self.breaks_min,
            self.breaks_max,
            self.min_virtual_per_student,
            self.max_virtual_per_student,
        )
    }
}

/// Input for validating a schedule that did not necessarily come from a
/// fresh solve. The interviewer grid is optional: externally stored
/// schedules may only have kept the student grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub schedule_data: StudentGrid,
    #[serde(default)]
    pub interviewer_schedule: Option<InterviewerGrid>,
    pub students: Vec<Student>,
    pub interviewers: Vec<Interviewer>,
    #[serde(default = "default_num_slots")]
    pub num_slots: u32,
    #[serde(default = "default_one")]
    pub breaks_min: u32,
    #[serde(default)]
    pub breaks_max: Option<u32>,
    #[serde(default = "default_one")]
    pub min_virtual_per_student: u32,
    #[serde(default)]
    pub max_virtual_per_student: Option<u32>,
}

impl ValidateRequest {
    pub fn quotas(&self) -> QuotaConfig {
        QuotaConfig::new(
            self.num_slots,
            self.breaks_min,
            self.breaks_max,
            self.min_virtual_per_student,
            self.max_virtual_per_student,
        )
    }
}

/// Per-interviewer summary line: display id and break positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewerAssignment {
    pub name: String,
    pub id: String,
    pub is_virtual: bool,
    /// 1-based slot indices marked as breaks.
    pub break_slots: Vec<u32>,
    /// "None" or e.g. "3, 11", ready for spreadsheet rendering.
    pub break_display: String,
}

/// Terminal solver status. There is no objective, so an optimal and a merely
/// feasible assignment are the same thing and both report `FEASIBLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Feasible,
    Infeasible,
    Timeout,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveStats {
    pub capacity: u64,
    pub demand: u64,
    pub virtual_capacity: u64,
    pub virtual_demand: u64,
    pub total_interviews: u64,
    pub solve_time_secs: f64,
    pub status: SolveStatus,
}

/// The final output of a successful solve.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveOutput {
    pub schedule_data: StudentGrid,
    pub interviewer_schedule: InterviewerGrid,
    pub interviewer_assignments: Vec<InterviewerAssignment>,
    pub stats: SolveStats,
    /// Advisory: the independent validator's findings on this schedule.
    pub validation_errors: Vec<String>,
    pub seed_used: u64,
    /// Effective targets, after any auto-balance reductions.
    pub students_used: Vec<Student>,
}

impl SolveOutput {
    /// Turns any advisory validation findings into a hard error.
    pub fn ensure_valid(&self) -> Result<(), SolveError> {
        if self.validation_errors.is_empty() {
            Ok(())
        } else {
            Err(SolveError::ValidationViolation {
                violations: self.validation_errors.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn interviewer_slot_wire_shape() {
        let busy = serde_json::to_value(InterviewerSlot::Busy("Cami Adams".into())).unwrap();
        assert_eq!(busy, json!("Cami Adams"));
        let brk = serde_json::to_value(InterviewerSlot::Break).unwrap();
        assert_eq!(brk, json!("BREAK"));
        let free = serde_json::to_value(InterviewerSlot::Free).unwrap();
        assert_eq!(free, Value::Null);

        let cells: Vec<InterviewerSlot> =
            serde_json::from_value(json!(["Cami Adams", "BREAK", null])).unwrap();
        assert_eq!(
            cells,
            vec![
                InterviewerSlot::Busy("Cami Adams".into()),
                InterviewerSlot::Break,
                InterviewerSlot::Free,
            ]
        );
    }

    #[test]
    fn solve_request_defaults() {
        let request: SolveRequest = serde_json::from_value(json!({
            "students": [{"name": "Ana", "target": 6}],
            "interviewers": [{"name": "Table 1"}, {"name": "Zoom 1", "isVirtual": true}],
        }))
        .unwrap();

        assert_eq!(request.num_slots, 13);
        assert!(!request.interviewers[0].is_virtual);
        assert!(request.interviewers[1].is_virtual);
        assert!(request.seed.is_none());
        assert!(!request.auto_balance);

        let quotas = request.quotas();
        assert_eq!(quotas.breaks_min, 1);
        assert_eq!(quotas.breaks_max, 1);
        assert_eq!(quotas.min_virtual, 1);
        assert_eq!(quotas.max_virtual, 1);
    }

    #[test]
    fn fixed_counts_collapse_to_ranges() {
        let request: SolveRequest = serde_json::from_value(json!({
            "students": [],
            "interviewers": [],
            "numSlots": 8,
            "breaksMin": 1,
            "breaksMax": 3,
            "minVirtualPerStudent": 0,
            "maxVirtualPerStudent": 2,
        }))
        .unwrap();

        let quotas = request.quotas();
        assert_eq!((quotas.breaks_min, quotas.breaks_max), (1, 3));
        assert_eq!((quotas.min_virtual, quotas.max_virtual), (0, 2));
    }
}
