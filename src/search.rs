use std::time::{Duration, Instant};

use log::{debug, trace};
use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::model::SolveModel;

/// Terminal state of one search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Feasible,
    /// Proven: no assignment satisfies the model.
    Infeasible,
    /// Budget exhausted, feasibility unknown.
    Timeout,
}

/// A satisfying assignment in index space.
#[derive(Debug, Clone)]
pub struct Assignment {
    /// student x slot -> interviewer index
    pub student_slots: Vec<Vec<Option<usize>>>,
    /// interviewer x slot -> student index
    pub interviewer_slots: Vec<Vec<Option<usize>>>,
    /// interviewer x slot -> break marker
    pub breaks: Vec<Vec<bool>>,
}

#[derive(Debug)]
pub struct SearchResult {
    pub outcome: SearchOutcome,
    pub assignment: Option<Assignment>,
}

impl SearchResult {
    fn terminal(outcome: SearchOutcome) -> Self {
        Self {
            outcome,
            assignment: None,
        }
    }
}

/// Finds any satisfying assignment, or proves there is none, within the
/// wall-clock budget.
///
/// The search runs in two stages. Stage one picks each student's set of
/// distinct interviewers (the no-repeat constraint is structural there) by
/// backtracking, under per-interviewer load caps of
/// `num_slots - breaks_min` and the per-student virtual quota window; the
/// deadline is checked at every node. Stage two spreads the chosen meetings
/// over slots. The meetings form a bipartite graph of maximum degree at most
/// `num_slots`, so a conflict-free placement always exists and is built
/// directly by alternating-chain recoloring; exhausting stage one therefore
/// proves the whole model infeasible. Breaks land on free slots afterwards.
pub fn run(model: &SolveModel, rng: &mut ChaCha8Rng, budget: Duration) -> SearchResult {
    let deadline = Instant::now() + budget;
    if Instant::now() >= deadline {
        return SearchResult::terminal(SearchOutcome::Timeout);
    }

    if let Some(reason) = structurally_infeasible(model) {
        debug!("infeasible without search: {reason}");
        return SearchResult::terminal(SearchOutcome::Infeasible);
    }

    let num_students = model.num_students();
    let num_interviewers = model.num_interviewers();

    // most-constrained students first; seeded keys break interviewer ties
    let mut order: Vec<usize> = (0..num_students).collect();
    order.sort_by_key(|&s| std::cmp::Reverse(model.targets[s]));
    let tiebreak: Vec<u64> = (0..num_interviewers).map(|_| rng.random()).collect();
    let mut slot_pref: Vec<usize> = (0..model.quotas.num_slots).collect();
    slot_pref.shuffle(rng);

    let suffix_vmin: Vec<usize> = (0..=num_students)
        .map(|pos| (num_students - pos) * model.quotas.min_virtual)
        .collect();

    let mut search = MeetingSearch {
        model,
        deadline,
        order,
        suffix_vmin,
        tiebreak,
        load: vec![0; num_interviewers],
        chosen: vec![Vec::new(); num_students],
        nodes: 0,
        timed_out: false,
    };

    let found = search.assign_from(0);
    trace!("meeting search explored {} nodes", search.nodes);
    if search.timed_out {
        return SearchResult::terminal(SearchOutcome::Timeout);
    }
    if !found {
        return SearchResult::terminal(SearchOutcome::Infeasible);
    }

    let (student_slots, interviewer_slots) = place_slots(model, &search.chosen, &slot_pref);
    let breaks = place_breaks(model, &interviewer_slots, rng);
    SearchResult {
        outcome: SearchOutcome::Feasible,
        assignment: Some(Assignment {
            student_slots,
            interviewer_slots,
            breaks,
        }),
    }
}

/// Cheap proofs of infeasibility that need no search at all.
fn structurally_infeasible(model: &SolveModel) -> Option<String> {
    let q = &model.quotas;
    if q.breaks_min > q.num_slots {
        return Some(format!(
            "{} required breaks cannot fit into {} slots",
            q.breaks_min, q.num_slots
        ));
    }
    let total = model.num_interviewers();
    let virtuals = model.virtual_count();
    let physicals = total - virtuals;
    for (s, &target) in model.targets.iter().enumerate() {
        let name = &model.student_names[s];
        if target > q.num_slots {
            return Some(format!(
                "{name} needs {target} interviews but only {} slots exist",
                q.num_slots
            ));
        }
        if target > total {
            return Some(format!(
                "{name} needs {target} distinct interviewers but only {total} exist"
            ));
        }
        if q.min_virtual > target {
            return Some(format!(
                "{name} must take {} virtual interviews but only targets {target}",
                q.min_virtual
            ));
        }
        if target > 0 && q.min_virtual > virtuals {
            return Some(format!(
                "{name} needs {} distinct virtual interviewers but only {virtuals} exist",
                q.min_virtual
            ));
        }
        if target.saturating_sub(q.max_virtual) > physicals {
            return Some(format!(
                "{name} needs at least {} physical interviewers but only {physicals} exist",
                target - q.max_virtual
            ));
        }
    }
    None
}

/// Stage one: backtracking selection of each student's interviewer set.
struct MeetingSearch<'a> {
    model: &'a SolveModel,
    deadline: Instant,
    /// student processing order, highest target first
    order: Vec<usize>,
    /// outstanding virtual demand from each order position onwards
    suffix_vmin: Vec<usize>,
    /// seeded per-interviewer keys for deterministic tie-breaking
    tiebreak: Vec<u64>,
    /// meetings committed per interviewer so far
    load: Vec<usize>,
    /// interviewer indices committed per student
    chosen: Vec<Vec<usize>>,
    nodes: u64,
    timed_out: bool,
}

impl MeetingSearch<'_> {
    fn past_deadline(&mut self) -> bool {
        if !self.timed_out && Instant::now() >= self.deadline {
            self.timed_out = true;
        }
        self.timed_out
    }

    fn assign_from(&mut self, pos: usize) -> bool {
        if self.past_deadline() {
            return false;
        }
        let Some(&s) = self.order.get(pos) else {
            return true;
        };
        self.nodes += 1;

        let need = self.model.targets[s];
        if need == 0 {
            // min_virtual is zero here, or the structural check would have
            // rejected the scenario
            return self.assign_from(pos + 1);
        }

        let cap = self.model.quotas.working_slots();
        let mut cands: Vec<usize> = (0..self.model.num_interviewers())
            .filter(|&i| self.load[i] < cap)
            .collect();
        cands.sort_by_key(|&i| (self.load[i], self.tiebreak[i]));
        if cands.len() < need {
            return false;
        }

        // outstanding virtual demand must still fit into spare virtual seats
        let virt_spare: usize = cands
            .iter()
            .filter(|&&i| self.model.is_virtual[i])
            .map(|&i| cap - self.load[i])
            .sum();
        if virt_spare < self.suffix_vmin[pos] {
            return false;
        }

        // virtual candidates remaining at or after each list position, for
        // quota pruning during enumeration
        let mut virt_tail = vec![0usize; cands.len() + 1];
        for ci in (0..cands.len()).rev() {
            virt_tail[ci] = virt_tail[ci + 1] + usize::from(self.model.is_virtual[cands[ci]]);
        }

        self.pick(pos, s, &cands, &virt_tail, 0, need, 0)
    }

    /// Enumerates `need`-subsets of `cands[from..]` in preference order,
    /// keeping the student's virtual count inside the quota window.
    #[allow(clippy::too_many_arguments)]
    fn pick(
        &mut self,
        pos: usize,
        s: usize,
        cands: &[usize],
        virt_tail: &[usize],
        from: usize,
        need: usize,
        nvirt: usize,
    ) -> bool {
        if need == 0 {
            if nvirt < self.model.quotas.min_virtual {
                return false;
            }
            return self.assign_from(pos + 1);
        }
        if self.past_deadline() {
            return false;
        }
        if cands.len() - from < need {
            return false;
        }
        for ci in from..cands.len() {
            if cands.len() - ci < need {
                break;
            }
            // the virtual minimum is out of reach from here on
            if nvirt + need.min(virt_tail[ci]) < self.model.quotas.min_virtual {
                break;
            }
            let i = cands[ci];
            let is_virtual = self.model.is_virtual[i];
            if is_virtual && nvirt == self.model.quotas.max_virtual {
                continue;
            }
            self.chosen[s].push(i);
            self.load[i] += 1;
            if self.pick(
                pos,
                s,
                cands,
                virt_tail,
                ci + 1,
                need - 1,
                nvirt + usize::from(is_virtual),
            ) {
                return true;
            }
            self.load[i] -= 1;
            self.chosen[s].pop();
            if self.timed_out {
                return false;
            }
        }
        false
    }
}

/// Stage two: place every chosen meeting into a slot with no student or
/// interviewer double-booked.
///
/// Meetings are inserted one by one. When a meeting has no slot free on both
/// sides, there is a slot `alpha` free for the student and a slot `beta`
/// free for the interviewer; swapping `alpha` and `beta` along the
/// alternating chain that starts at the interviewer frees `alpha` on both
/// sides. In a bipartite graph that chain can never reach the student, so
/// insertion always succeeds while both sides still have spare slots.
fn place_slots(
    model: &SolveModel,
    chosen: &[Vec<usize>],
    slot_pref: &[usize],
) -> (Vec<Vec<Option<usize>>>, Vec<Vec<Option<usize>>>) {
    let num_slots = model.quotas.num_slots;
    let mut student_slots = vec![vec![None; num_slots]; model.num_students()];
    let mut interviewer_slots = vec![vec![None; num_slots]; model.num_interviewers()];

    for (s, meetings) in chosen.iter().enumerate() {
        for &i in meetings {
            let common = slot_pref
                .iter()
                .copied()
                .find(|&t| student_slots[s][t].is_none() && interviewer_slots[i][t].is_none());
            if let Some(t) = common {
                student_slots[s][t] = Some(i);
                interviewer_slots[i][t] = Some(s);
                continue;
            }

            let alpha = slot_pref
                .iter()
                .copied()
                .find(|&t| student_slots[s][t].is_none())
                .expect("student still has a free slot while a meeting is unplaced");
            let beta = slot_pref
                .iter()
                .copied()
                .find(|&t| interviewer_slots[i][t].is_none())
                .expect("interviewer still has a free slot while a meeting is unplaced");

            // walk the alpha/beta chain from the interviewer, then swap the
            // two slots along it
            let mut path: Vec<(usize, usize, usize)> = Vec::new();
            let mut want = alpha;
            let mut at_interviewer = true;
            let mut vertex = i;
            loop {
                let next = if at_interviewer {
                    interviewer_slots[vertex][want]
                } else {
                    student_slots[vertex][want]
                };
                let Some(other) = next else { break };
                let (pi, ps) = if at_interviewer {
                    (vertex, other)
                } else {
                    (other, vertex)
                };
                path.push((pi, ps, want));
                want = if want == alpha { beta } else { alpha };
                vertex = other;
                at_interviewer = !at_interviewer;
            }
            for &(pi, ps, t) in &path {
                interviewer_slots[pi][t] = None;
                student_slots[ps][t] = None;
            }
            for &(pi, ps, t) in &path {
                let swapped = if t == alpha { beta } else { alpha };
                interviewer_slots[pi][swapped] = Some(ps);
                student_slots[ps][swapped] = Some(pi);
            }

            student_slots[s][alpha] = Some(i);
            interviewer_slots[i][alpha] = Some(s);
        }
    }

    (student_slots, interviewer_slots)
}

/// Marks the required minimum of breaks on seeded-chosen free slots. Any
/// count inside `[breaks_min, breaks_max]` satisfies the model, and stage
/// one guarantees at least `breaks_min` free slots per interviewer.
fn place_breaks(
    model: &SolveModel,
    interviewer_slots: &[Vec<Option<usize>>],
    rng: &mut ChaCha8Rng,
) -> Vec<Vec<bool>> {
    let num_slots = model.quotas.num_slots;
    let mut breaks = vec![vec![false; num_slots]; model.num_interviewers()];
    for (i, row) in interviewer_slots.iter().enumerate() {
        let mut free: Vec<usize> = (0..num_slots).filter(|&t| row[t].is_none()).collect();
        free.shuffle(rng);
        for &t in free.iter().take(model.quotas.breaks_min) {
            breaks[i][t] = true;
        }
    }
    breaks
}
