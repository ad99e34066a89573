use std::time::{Duration, Instant};

use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::balance;
use crate::capacity::{self, CapacitySummary};
use crate::data::{SolveOutput, SolveRequest, SolveStats, SolveStatus, Student};
use crate::error::{SolveError, SolveFailure};
use crate::extract;
use crate::model::SolveModel;
use crate::search::{self, SearchOutcome};
use crate::validate;

/// Fallback search budget when the request carries a nonsensical one.
const DEFAULT_TIME_LIMIT_SECS: f64 = 30.0;
const MAX_TIME_LIMIT_SECS: f64 = 600.0;

/// Runs one complete solve: structural validation, capacity precheck,
/// optional auto-balance, search, extraction, and the post-hoc validation
/// of the produced schedule.
///
/// All state is local to the call, so concurrent solves never share a model
/// or a random generator.
pub fn solve(request: &SolveRequest) -> Result<SolveOutput, SolveFailure> {
    let start = Instant::now();
    let seed = request
        .seed
        .unwrap_or_else(|| rand::rng().random_range(0..100_000));
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let quotas = request.quotas();

    let mut model = SolveModel::build(&request.students, &request.interviewers, quotas)
        .map_err(|error| SolveFailure { error, stats: None })?;

    info!(
        "scenario: {} students, {} interviewers ({} virtual), {} slots, seed {seed}",
        model.num_students(),
        model.num_interviewers(),
        model.virtual_count(),
        quotas.num_slots
    );

    let mut summary = capacity::summarize(&model);

    if request.auto_balance && summary.demand > summary.capacity {
        let deficit = summary.demand - summary.capacity;
        info!(
            "auto-balance: shedding {deficit} interviews (demand {} > capacity {})",
            summary.demand, summary.capacity
        );
        let report = balance::reduce_targets(&mut model.targets, deficit, &mut rng);
        info!("auto-balance: applied {} reduction(s)", report.reductions.len());
        if report.residual_deficit > 0 {
            warn!(
                "auto-balance ran out of candidates with {} interview(s) still over capacity",
                report.residual_deficit
            );
        }
        summary = capacity::summarize(&model);
    }

    if let Err(error) = capacity::precheck(&summary) {
        return Err(SolveFailure {
            stats: Some(make_stats(&summary, SolveStatus::Infeasible, 0, start.elapsed())),
            error,
        });
    }

    let budget = search_budget(request.time_limit_secs);
    let result = search::run(&model, &mut rng, budget);
    let elapsed = start.elapsed();

    let assignment = match result.outcome {
        SearchOutcome::Feasible => result
            .assignment
            .expect("a feasible search carries an assignment"),
        SearchOutcome::Infeasible => {
            info!("search proved infeasibility in {elapsed:.2?}");
            return Err(SolveFailure {
                error: SolveError::NoSolutionFound,
                stats: Some(make_stats(&summary, SolveStatus::Infeasible, 0, elapsed)),
            });
        }
        SearchOutcome::Timeout => {
            warn!("search budget of {:.1}s exhausted", budget.as_secs_f64());
            return Err(SolveFailure {
                error: SolveError::Timeout {
                    budget_secs: budget.as_secs_f64(),
                },
                stats: Some(make_stats(&summary, SolveStatus::Timeout, 0, elapsed)),
            });
        }
    };
    info!("schedule found in {elapsed:.2?}");

    let students_used: Vec<Student> = model
        .student_names
        .iter()
        .zip(&model.targets)
        .map(|(name, &target)| Student {
            name: name.clone(),
            target: target as u32,
        })
        .collect();

    let extraction = extract::extract(&model, &assignment);
    let validation_errors = validate::check(
        &extraction.schedule_data,
        Some(&extraction.interviewer_schedule),
        &students_used,
        &request.interviewers,
        &quotas,
    );
    if !validation_errors.is_empty() {
        warn!(
            "post-hoc validation reported {} violation(s)",
            validation_errors.len()
        );
    }

    let total_interviews: u64 = extraction
        .schedule_data
        .values()
        .map(|row| row.iter().flatten().count() as u64)
        .sum();

    Ok(SolveOutput {
        schedule_data: extraction.schedule_data,
        interviewer_schedule: extraction.interviewer_schedule,
        interviewer_assignments: extraction.interviewer_assignments,
        stats: make_stats(
            &summary,
            SolveStatus::Feasible,
            total_interviews,
            start.elapsed(),
        ),
        validation_errors,
        seed_used: seed,
        students_used,
    })
}

fn search_budget(requested_secs: f64) -> Duration {
    let secs = if requested_secs.is_finite() {
        requested_secs.clamp(0.0, MAX_TIME_LIMIT_SECS)
    } else {
        DEFAULT_TIME_LIMIT_SECS
    };
    Duration::from_secs_f64(secs)
}

fn make_stats(
    summary: &CapacitySummary,
    status: SolveStatus,
    total_interviews: u64,
    elapsed: Duration,
) -> SolveStats {
    SolveStats {
        capacity: summary.capacity,
        demand: summary.demand,
        virtual_capacity: summary.virtual_capacity,
        virtual_demand: summary.virtual_demand,
        total_interviews,
        solve_time_secs: elapsed.as_secs_f64(),
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Interviewer;

    fn request(students: &[(&str, u32)], interviewers: &[(&str, bool)]) -> SolveRequest {
        SolveRequest {
            students: students
                .iter()
                .map(|&(name, target)| Student {
                    name: name.into(),
                    target,
                })
                .collect(),
            interviewers: interviewers
                .iter()
                .map(|&(name, is_virtual)| Interviewer {
                    name: name.into(),
                    is_virtual,
                })
                .collect(),
            num_slots: 4,
            breaks_min: 1,
            breaks_max: None,
            min_virtual_per_student: 1,
            max_virtual_per_student: None,
            seed: Some(42),
            auto_balance: false,
            time_limit_secs: 10.0,
        }
    }

    fn zero_slack() -> SolveRequest {
        request(
            &[("S1", 2), ("S2", 2), ("S3", 2)],
            &[("P", false), ("V", true)],
        )
    }

    #[test]
    fn zero_slack_scenario_solves_cleanly() {
        let output = solve(&zero_slack()).unwrap();

        assert_eq!(output.stats.capacity, 6);
        assert_eq!(output.stats.demand, 6);
        assert_eq!(output.stats.total_interviews, 6);
        assert_eq!(output.stats.status, SolveStatus::Feasible);
        assert_eq!(output.seed_used, 42);
        assert!(output.validation_errors.is_empty(), "{:?}", output.validation_errors);
        output.ensure_valid().unwrap();

        for row in output.schedule_data.values() {
            assert_eq!(row.len(), 4);
            assert_eq!(row.iter().flatten().count(), 2);
        }
        // display ids: one physical table, one virtual
        let ids: Vec<&str> = output
            .interviewer_assignments
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["A", "Z-1"]);
        for assignment in &output.interviewer_assignments {
            assert_eq!(assignment.break_slots.len(), 1);
        }
    }

    #[test]
    fn excess_demand_fails_before_the_search() {
        let mut req = zero_slack();
        for student in &mut req.students {
            student.target = 3;
        }
        let failure = solve(&req).unwrap_err();
        assert!(matches!(
            failure.error,
            SolveError::InfeasibleDemand {
                demand: 9,
                capacity: 6
            }
        ));
        let stats = failure.stats.unwrap();
        assert_eq!(stats.status, SolveStatus::Infeasible);
        assert_eq!(stats.total_interviews, 0);
    }

    #[test]
    fn auto_balance_reduces_demand_to_capacity() {
        let mut req = zero_slack();
        for student in &mut req.students {
            student.target = 3;
        }
        req.auto_balance = true;
        req.seed = Some(7);

        let output = solve(&req).unwrap();
        let used: Vec<u32> = output.students_used.iter().map(|s| s.target).collect();
        assert_eq!(used.iter().sum::<u32>(), 6);
        // shedding 3 from [3, 3, 3] always lands on [2, 2, 2]
        assert_eq!(used, vec![2, 2, 2]);
        assert!(output.validation_errors.is_empty());
    }

    #[test]
    fn auto_balance_with_no_candidates_still_fails_the_precheck() {
        // every target already at 1, deficit cannot be shed
        let mut req = request(&[("S1", 1), ("S2", 1)], &[("V", true)]);
        req.num_slots = 2;
        req.auto_balance = true;
        let failure = solve(&req).unwrap_err();
        assert_eq!(failure.error.kind(), "INFEASIBLE_DEMAND");
    }

    #[test]
    fn search_infeasibility_is_distinguished_from_capacity() {
        // capacity admits the demand, but one student cannot take two
        // interviews in the single existing slot
        let mut req = request(&[("S1", 2)], &[("A", false), ("B", false)]);
        req.num_slots = 1;
        req.breaks_min = 0;
        req.min_virtual_per_student = 0;
        let failure = solve(&req).unwrap_err();
        assert_eq!(failure.error.kind(), "NO_SOLUTION_FOUND");
        assert_eq!(failure.stats.unwrap().status, SolveStatus::Infeasible);
    }

    #[test]
    fn zero_budget_reports_timeout() {
        let mut req = zero_slack();
        req.time_limit_secs = 0.0;
        let failure = solve(&req).unwrap_err();
        assert_eq!(failure.error.kind(), "TIMEOUT");
        assert_eq!(failure.stats.unwrap().status, SolveStatus::Timeout);
    }

    #[test]
    fn duplicate_names_are_rejected_without_stats() {
        let req = request(&[("S1", 1), ("S1", 1)], &[("P", false), ("V", true)]);
        let failure = solve(&req).unwrap_err();
        assert_eq!(failure.error.kind(), "INVALID_SCENARIO");
        assert!(failure.stats.is_none());
    }

    #[test]
    fn same_seed_reproduces_the_schedule() {
        let a = solve(&zero_slack()).unwrap();
        let b = solve(&zero_slack()).unwrap();
        assert_eq!(a.schedule_data, b.schedule_data);
        assert_eq!(a.interviewer_schedule, b.interviewer_schedule);
    }

    #[test]
    fn generated_seed_is_reported_and_reusable() {
        let mut req = zero_slack();
        req.seed = None;
        let first = solve(&req).unwrap();

        req.seed = Some(first.seed_used);
        let replay = solve(&req).unwrap();
        assert_eq!(first.schedule_data, replay.schedule_data);
    }
}
