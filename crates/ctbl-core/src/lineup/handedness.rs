// Handedness balancing: penalize runs of same-side batters and reduce the
// penalty with small, value-preserving swaps.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::OptimizerConfig;
use crate::lineup::slots::SlottedPlayer;

/// Batting side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Handedness {
    #[serde(rename = "L", alias = "l")]
    Left,
    #[default]
    #[serde(rename = "R", alias = "r")]
    Right,
    #[serde(rename = "S", alias = "s")]
    Switch,
}

impl Handedness {
    pub fn display_str(&self) -> &'static str {
        match self {
            Handedness::Left => "L",
            Handedness::Right => "R",
            Handedness::Switch => "S",
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Penalty
// ---------------------------------------------------------------------------

/// Penalty for consecutive same-handed batters.
///
/// The second batter of a run costs 1; every later batter in the same run
/// costs 2. A change of side resets the run. `[R, R, R]` scores 3 and
/// `[R, R, L, L]` scores 2.
pub fn handedness_penalty<I>(order: I) -> u32
where
    I: IntoIterator<Item = Handedness>,
{
    let mut penalty = 0;
    let mut repeats = 0;
    let mut prev: Option<Handedness> = None;
    for current in order {
        if prev == Some(current) {
            repeats += 1;
            penalty += if repeats >= 2 { 2 } else { 1 };
        } else {
            repeats = 0;
        }
        prev = Some(current);
    }
    penalty
}

fn lineup_penalty(order: &[SlottedPlayer]) -> u32 {
    handedness_penalty(order.iter().map(|p| p.player.handedness))
}

// ---------------------------------------------------------------------------
// Local search
// ---------------------------------------------------------------------------

/// One accepted swap. Slots are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Swap {
    pub first_slot: usize,
    pub second_slot: usize,
    pub penalty_after: u32,
    /// `|Δvalue(i)| + |Δvalue(j)|` for the two slots involved.
    pub degradation: f64,
}

/// Result of [`optimize_handedness`].
#[derive(Debug, Clone)]
pub struct Optimized {
    pub order: Vec<SlottedPlayer>,
    pub swaps: Vec<Swap>,
    pub initial_penalty: u32,
    pub final_penalty: u32,
}

/// Scan unordered index pairs `(i, j)`, `i < j`, in lexicographic order and
/// return the first swap that lowers the penalty below `best` within the
/// offset and degradation bounds. Fixed slots never move.
fn first_improving_swap(
    order: &[SlottedPlayer],
    best: u32,
    settings: &OptimizerConfig,
) -> Option<Swap> {
    let n = order.len();
    let mut hands: Vec<Handedness> = order.iter().map(|p| p.player.handedness).collect();

    for i in 0..n {
        if order[i].fixed {
            continue;
        }
        let last = i.saturating_add(settings.max_offset).min(n.saturating_sub(1));
        for j in (i + 1)..=last {
            if order[j].fixed {
                continue;
            }
            let value_i = order[i].player.batting_value;
            let value_j = order[j].player.batting_value;
            // After the swap slot i holds value_j and slot j holds value_i.
            let degradation = (value_j - value_i).abs() + (value_i - value_j).abs();
            if degradation > settings.max_perf_drop {
                continue;
            }

            hands.swap(i, j);
            let penalty = handedness_penalty(hands.iter().copied());
            hands.swap(i, j);

            if penalty < best {
                return Some(Swap {
                    first_slot: i + 1,
                    second_slot: j + 1,
                    penalty_after: penalty,
                    degradation,
                });
            }
        }
    }
    None
}

/// Greedy hill-climb over pairwise swaps of non-fixed slots.
///
/// Each pass takes the first improving swap and restarts from the top; the
/// search ends after a full pass accepts nothing. The penalty strictly
/// decreases with every accepted swap, so the loop is bounded by the
/// initial penalty. The input is not modified.
pub fn optimize_handedness(order: &[SlottedPlayer], settings: &OptimizerConfig) -> Optimized {
    let mut current = order.to_vec();
    let initial_penalty = lineup_penalty(&current);
    let mut best = initial_penalty;
    let mut swaps = Vec::new();

    while let Some(swap) = first_improving_swap(&current, best, settings) {
        let (i, j) = (swap.first_slot - 1, swap.second_slot - 1);
        current.swap(i, j);
        current[i].slot = swap.first_slot;
        current[j].slot = swap.second_slot;
        debug!(
            "swapped slots {} and {}: penalty {} -> {} (value cost {:.4})",
            swap.first_slot, swap.second_slot, best, swap.penalty_after, swap.degradation
        );
        best = swap.penalty_after;
        swaps.push(swap);
    }

    Optimized {
        order: current,
        swaps,
        initial_penalty,
        final_penalty: best,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
