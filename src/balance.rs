use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// One auto-balance decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    pub student: usize,
    pub new_target: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReport {
    pub reductions: Vec<Reduction>,
    /// Demand that could not be shed because every candidate was already
    /// down to one interview. The caller folds this back into the capacity
    /// precheck instead of treating it as its own failure.
    pub residual_deficit: u64,
}

/// Sheds `deficit` interviews from the targets: each round picks uniformly
/// among the students tied at the current maximum target (only targets above
/// one are candidates) and decrements the pick. Deterministic for a given
/// generator state, which is why the generator lives in the request scope.
pub fn reduce_targets(
    targets: &mut [usize],
    deficit: u64,
    rng: &mut ChaCha8Rng,
) -> BalanceReport {
    let mut reductions = Vec::new();
    let mut remaining = deficit;
    while remaining > 0 {
        let Some(max_target) = targets.iter().copied().filter(|&t| t > 1).max() else {
            break;
        };
        let tied: Vec<usize> = targets
            .iter()
            .enumerate()
            .filter(|&(_, &t)| t == max_target)
            .map(|(s, _)| s)
            .collect();
        let victim = tied[rng.random_range(0..tied.len())];
        targets[victim] -= 1;
        reductions.push(Reduction {
            student: victim,
            new_target: targets[victim],
        });
        remaining -= 1;
    }
    BalanceReport {
        reductions,
        residual_deficit: remaining,
    }
}
