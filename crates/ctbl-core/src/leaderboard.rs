// Team and league stat leaders.

use serde::Serialize;

use crate::metrics::{qualified_players, MetricsBatch, Stat};

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderRow {
    pub name: String,
    pub team: String,
    pub pa: u32,
    pub value: f64,
}

/// A single stat's leaderboard.
#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub stat: Stat,
    pub rows: Vec<LeaderRow>,
}

/// Top `top_n` qualified players by `stat`, best first.
///
/// `team = None` ranks the whole league. Undefined values rank as 0, and
/// equal values keep dataset order. Returns an empty vector when nobody
/// qualifies.
pub fn leaders(
    batch: &MetricsBatch,
    team: Option<&str>,
    stat: Stat,
    min_pa: u32,
    top_n: usize,
) -> Vec<LeaderRow> {
    let mut rows: Vec<LeaderRow> = qualified_players(batch.for_team(team), min_pa)
        .into_iter()
        .map(|p| LeaderRow {
            name: p.record.name.clone(),
            team: p.record.team.clone(),
            pa: p.record.pa,
            value: p.metrics.display(stat),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows.truncate(top_n);
    rows
}

/// One leaderboard per stat for `team`, in `Stat::ALL` order. Empty when the
/// team has no qualified player.
pub fn team_leaders(batch: &MetricsBatch, team: &str, min_pa: u32, top_n: usize) -> Vec<Leaderboard> {
    let boards: Vec<Leaderboard> = Stat::ALL
        .iter()
        .map(|&stat| Leaderboard {
            stat,
            rows: leaders(batch, Some(team), stat, min_pa, top_n),
        })
        .collect();
    if boards.iter().all(|b| b.rows.is_empty()) {
        return Vec::new();
    }
    boards
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
