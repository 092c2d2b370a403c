// Composite batting-value score.
//
// Each rate stat is scaled against the best qualified teammate, then the
// scaled stats and a contact proxy are blended with `BattingWeights`.

use serde::Serialize;

use crate::config::LineupConfig;
use crate::lineup::handedness::Handedness;
use crate::metrics::{PlayerMetrics, Stat};

/// Per-stat scores relative to the team maximum, plus the contact proxy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatScores {
    pub avg: f64,
    pub obp: f64,
    pub slg: f64,
    pub ops: f64,
    pub woba: f64,
    pub wraa: f64,
    pub contact: f64,
}

/// A qualified player ready for slotting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPlayer {
    pub player: PlayerMetrics,
    pub handedness: Handedness,
    pub scores: StatScores,
    pub batting_value: f64,
}

impl ScoredPlayer {
    pub fn name(&self) -> &str {
        &self.player.record.name
    }
}

/// Scale each value by the maximum of the slice. A maximum at or below zero
/// scores everyone 0.
pub fn normalize_to_max(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| v / max).collect()
}

/// `1 - SO/PA`, with PA of zero treated as 1.
pub fn contact_score(player: &PlayerMetrics) -> f64 {
    let pa = player.record.pa.max(1);
    1.0 - player.record.so as f64 / pa as f64
}

/// Score a team's qualified roster and rank it by batting value, best first.
///
/// Ties keep roster order. Undefined stats count as 0, matching what the
/// leaderboards show. Expects `config.weights` to sum to 1.0; `build_lineup`
/// rejects weights that do not.
pub fn score_roster(roster: &[&PlayerMetrics], config: &LineupConfig) -> Vec<ScoredPlayer> {
    let weights = &config.weights;

    let column = |stat: Stat| -> Vec<f64> {
        let values: Vec<f64> = roster.iter().map(|p| p.metrics.display(stat)).collect();
        normalize_to_max(&values)
    };
    let avg = column(Stat::Avg);
    let obp = column(Stat::Obp);
    let slg = column(Stat::Slg);
    let ops = column(Stat::Ops);
    let woba = column(Stat::Woba);
    let wraa = column(Stat::Wraa);

    let mut scored: Vec<ScoredPlayer> = roster
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let scores = StatScores {
                avg: avg[idx],
                obp: obp[idx],
                slg: slg[idx],
                ops: ops[idx],
                woba: woba[idx],
                wraa: wraa[idx],
                contact: contact_score(p),
            };
            let batting_value = weights.obp * scores.obp
                + weights.slg * scores.slg
                + weights.ops * scores.ops
                + weights.wraa * scores.wraa
                + weights.woba * scores.woba
                + weights.avg * scores.avg
                + weights.contact * scores.contact;
            ScoredPlayer {
                player: (*p).clone(),
                handedness: config.handedness_of(&p.record.name),
                scores,
                batting_value,
            }
        })
        .collect();

    // Vec::sort_by is stable.
    scored.sort_by(|a, b| {
        b.batting_value
            .partial_cmp(&a.batting_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
