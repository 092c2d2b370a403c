// Batting-order construction: score, apply overrides, balance handedness.

pub mod handedness;
pub mod score;
pub mod slots;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::LineupConfig;
use crate::metrics::{qualified_players, MetricsBatch, Stat};

use self::handedness::{optimize_handedness, Handedness, Swap};
use self::score::score_roster;
use self::slots::{assign_slots, SlottedPlayer};

/// Slots 1..=9 bat; everyone after is on the bench.
pub const ACTIVE_SLOTS: usize = 9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineupError {
    #[error("batting-value weights sum to {sum}, expected 1.0")]
    InvalidWeights { sum: f64 },

    #[error("override puts `{name}` in slot {slot}, outside 1..={roster_size}")]
    SlotOutOfRange {
        name: String,
        slot: usize,
        roster_size: usize,
    },

    #[error("slot {slot} requested for both `{first}` and `{second}`")]
    DuplicateSlot {
        slot: usize,
        first: String,
        second: String,
    },
}

/// One line of the printed lineup card. Stats are rounded to 3 places.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupSlot {
    pub slot: usize,
    pub handedness: Handedness,
    pub name: String,
    pub avg: f64,
    pub obp: f64,
    pub slg: f64,
    pub ops: f64,
    pub woba: f64,
    pub wraa: f64,
    pub batting_value: f64,
    pub fixed: bool,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

impl From<&SlottedPlayer> for LineupSlot {
    fn from(slotted: &SlottedPlayer) -> Self {
        let m = &slotted.player.player.metrics;
        LineupSlot {
            slot: slotted.slot,
            handedness: slotted.player.handedness,
            name: slotted.player.name().to_string(),
            avg: round3(m.display(Stat::Avg)),
            obp: round3(m.display(Stat::Obp)),
            slg: round3(m.display(Stat::Slg)),
            ops: round3(m.display(Stat::Ops)),
            woba: round3(m.display(Stat::Woba)),
            wraa: round3(m.display(Stat::Wraa)),
            batting_value: round3(slotted.player.batting_value),
            fixed: slotted.fixed,
        }
    }
}

/// Final batting order for one team.
#[derive(Debug, Clone, Serialize)]
pub struct Lineup {
    pub team: String,
    pub slots: Vec<LineupSlot>,
    pub initial_penalty: u32,
    pub final_penalty: u32,
    pub swaps: Vec<Swap>,
}

impl Lineup {
    pub fn active(&self) -> &[LineupSlot] {
        &self.slots[..self.slots.len().min(ACTIVE_SLOTS)]
    }

    pub fn bench(&self) -> &[LineupSlot] {
        &self.slots[self.slots.len().min(ACTIVE_SLOTS)..]
    }
}

#[derive(Debug, Clone)]
pub enum LineupOutcome {
    Ready(Lineup),
    /// The team has no player meeting the plate-appearance minimum.
    NoQualifiedPlayers,
}

/// Build the batting order for `config.team` from an already computed batch.
///
/// Pipeline: qualify, score and rank, apply overrides, then the
/// handedness hill-climb. Weights that do not sum to 1.0 or an invalid
/// override map reject the whole request.
pub fn build_lineup(
    batch: &MetricsBatch,
    config: &LineupConfig,
    min_pa: u32,
) -> Result<LineupOutcome, LineupError> {
    if !config.weights.is_normalized() {
        return Err(LineupError::InvalidWeights {
            sum: config.weights.sum(),
        });
    }

    let roster = qualified_players(batch.for_team(Some(config.team.as_str())), min_pa);
    if roster.is_empty() {
        info!("No qualified players for {} (min PA {})", config.team, min_pa);
        return Ok(LineupOutcome::NoQualifiedPlayers);
    }

    let ranked = score_roster(&roster, config);
    let assigned = assign_slots(&ranked, &config.overrides)?;
    let optimized = optimize_handedness(&assigned, &config.optimizer);
    info!(
        "Lineup for {}: {} players, handedness penalty {} -> {} after {} swaps",
        config.team,
        optimized.order.len(),
        optimized.initial_penalty,
        optimized.final_penalty,
        optimized.swaps.len()
    );

    Ok(LineupOutcome::Ready(Lineup {
        team: config.team.clone(),
        slots: optimized.order.iter().map(LineupSlot::from).collect(),
        initial_penalty: optimized.initial_penalty,
        final_penalty: optimized.final_penalty,
        swaps: optimized.swaps,
    }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::handedness::Handedness;
    use super::score::{ScoredPlayer, StatScores};
    use crate::metrics::{DerivedMetrics, PlayerMetrics};
    use crate::roster::PlayerRecord;

    /// A scored player with empty stats and the given batting value.
    pub(crate) fn scored(name: &str, handedness: Handedness, batting_value: f64) -> ScoredPlayer {
        ScoredPlayer {
            player: PlayerMetrics {
                record: PlayerRecord {
                    name: name.into(),
                    team: "Test".into(),
                    pa: 0,
                    ab: 0,
                    h: 0,
                    doubles: 0,
                    triples: 0,
                    hr: 0,
                    bb: 0,
                    hbp: 0,
                    so: 0,
                },
                metrics: DerivedMetrics {
                    singles: 0,
                    total_bases: 0,
                    avg: None,
                    obp: None,
                    slg: None,
                    ops: None,
                    woba: None,
                    wraa: None,
                },
            },
            handedness,
            scores: StatScores::default(),
            batting_value,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
