// Rate stats and linear-weights run values computed from raw counting stats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::config::StatsConfig;
use crate::roster::PlayerRecord;

// ---------------------------------------------------------------------------
// wOBA linear weights
// ---------------------------------------------------------------------------

pub const WEIGHT_BB: f64 = 0.69;
pub const WEIGHT_HBP: f64 = 0.72;
pub const WEIGHT_1B: f64 = 0.89;
pub const WEIGHT_2B: f64 = 1.27;
pub const WEIGHT_3B: f64 = 1.62;
pub const WEIGHT_HR: f64 = 2.10;

// ---------------------------------------------------------------------------
// Stat selector
// ---------------------------------------------------------------------------

/// The six rate/value stats shown on leaderboards and lineup cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    #[serde(rename = "AVG")]
    Avg,
    #[serde(rename = "OBP")]
    Obp,
    #[serde(rename = "SLG")]
    Slg,
    #[serde(rename = "OPS")]
    Ops,
    #[serde(rename = "wOBA")]
    Woba,
    #[serde(rename = "wRAA")]
    Wraa,
}

impl Stat {
    /// Presentation order.
    pub const ALL: [Stat; 6] = [
        Stat::Avg,
        Stat::Obp,
        Stat::Slg,
        Stat::Ops,
        Stat::Woba,
        Stat::Wraa,
    ];

    pub fn display_str(&self) -> &'static str {
        match self {
            Stat::Avg => "AVG",
            Stat::Obp => "OBP",
            Stat::Slg => "SLG",
            Stat::Ops => "OPS",
            Stat::Woba => "wOBA",
            Stat::Wraa => "wRAA",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.display_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stat `{0}` (expected one of AVG, OBP, SLG, OPS, wOBA, wRAA)")]
pub struct UnknownStat(pub String);

impl FromStr for Stat {
    type Err = UnknownStat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AVG" | "BA" => Ok(Stat::Avg),
            "OBP" => Ok(Stat::Obp),
            "SLG" => Ok(Stat::Slg),
            "OPS" => Ok(Stat::Ops),
            "WOBA" => Ok(Stat::Woba),
            "WRAA" => Ok(Stat::Wraa),
            _ => Err(UnknownStat(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Derived metrics
// ---------------------------------------------------------------------------

/// Stats derived from one `PlayerRecord`.
///
/// `None` means the stat is undefined (zero denominator, or no league
/// baseline for wRAA). It is never collapsed to zero here; use
/// [`DerivedMetrics::display`] at the presentation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    /// Singles. Negative when a row's hit breakdown is inconsistent.
    pub singles: i64,
    pub total_bases: i64,
    pub avg: Option<f64>,
    pub obp: Option<f64>,
    pub slg: Option<f64>,
    pub ops: Option<f64>,
    pub woba: Option<f64>,
    pub wraa: Option<f64>,
}

impl DerivedMetrics {
    pub fn get(&self, stat: Stat) -> Option<f64> {
        match stat {
            Stat::Avg => self.avg,
            Stat::Obp => self.obp,
            Stat::Slg => self.slg,
            Stat::Ops => self.ops,
            Stat::Woba => self.woba,
            Stat::Wraa => self.wraa,
        }
    }

    /// Value shown to leaderboard and lineup consumers: undefined reads as 0.
    pub fn display(&self, stat: Stat) -> f64 {
        self.get(stat).unwrap_or(0.0)
    }
}

/// A player record with its derived metrics attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerMetrics {
    pub record: PlayerRecord,
    pub metrics: DerivedMetrics,
}

/// Output of one metrics computation over a whole dataset.
#[derive(Debug, Clone)]
pub struct MetricsBatch {
    pub players: Vec<PlayerMetrics>,
    /// Mean wOBA of qualified players; `None` if nobody qualified.
    pub league_woba: Option<f64>,
}

impl MetricsBatch {
    /// Players on `team` (all teams when `None`), in dataset order.
    pub fn for_team<'a>(&'a self, team: Option<&'a str>) -> impl Iterator<Item = &'a PlayerMetrics> + 'a {
        self.players
            .iter()
            .filter(move |p| team.map_or(true, |t| p.record.team == t))
    }
}

// ---------------------------------------------------------------------------
// Formulas
// ---------------------------------------------------------------------------

fn ratio(numerator: f64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator / denominator as f64)
    }
}

/// Sum of counting stats, widened so no combination of `u32` cells wraps.
fn count_sum(counts: &[u32]) -> u64 {
    counts.iter().map(|&c| u64::from(c)).sum()
}

pub fn singles(r: &PlayerRecord) -> i64 {
    r.h as i64 - r.doubles as i64 - r.triples as i64 - r.hr as i64
}

pub fn total_bases(r: &PlayerRecord) -> i64 {
    singles(r) + 2 * r.doubles as i64 + 3 * r.triples as i64 + 4 * r.hr as i64
}

/// wOBA, or `None` when AB + BB + HBP is zero.
pub fn woba(r: &PlayerRecord) -> Option<f64> {
    let numerator = WEIGHT_BB * r.bb as f64
        + WEIGHT_HBP * r.hbp as f64
        + WEIGHT_1B * singles(r) as f64
        + WEIGHT_2B * r.doubles as f64
        + WEIGHT_3B * r.triples as f64
        + WEIGHT_HR * r.hr as f64;
    ratio(numerator, count_sum(&[r.ab, r.bb, r.hbp]))
}

/// `((wOBA - league wOBA) / scale) * PA`; undefined if either wOBA is.
pub fn wraa(woba: Option<f64>, league_woba: Option<f64>, woba_scale: f64, pa: u32) -> Option<f64> {
    match (woba, league_woba) {
        (Some(w), Some(lg)) => Some(((w - lg) / woba_scale) * pa as f64),
        _ => None,
    }
}

/// Arithmetic mean of the defined wOBA values among players with
/// `PA >= min_pa`. Order-independent up to float summation.
pub fn league_average_woba(records: &[PlayerRecord], min_pa: u32) -> Option<f64> {
    let values: Vec<f64> = qualify(records, min_pa)
        .filter_map(|r| woba(r))
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Everything except wRAA, which needs the league baseline.
fn base_metrics(r: &PlayerRecord) -> DerivedMetrics {
    let singles = singles(r);
    let total_bases = total_bases(r);
    let avg = ratio(r.h as f64, u64::from(r.ab));
    let obp = ratio(
        count_sum(&[r.h, r.bb, r.hbp]) as f64,
        count_sum(&[r.ab, r.bb, r.hbp]),
    );
    let slg = ratio(total_bases as f64, u64::from(r.ab));
    let ops = match (obp, slg) {
        (Some(o), Some(s)) => Some(o + s),
        _ => None,
    };
    DerivedMetrics {
        singles,
        total_bases,
        avg,
        obp,
        slg,
        ops,
        woba: woba(r),
        wraa: None,
    }
}

// ---------------------------------------------------------------------------
// Qualification
// ---------------------------------------------------------------------------

/// Records with at least `min_pa` plate appearances, input order preserved.
pub fn qualify(records: &[PlayerRecord], min_pa: u32) -> impl Iterator<Item = &PlayerRecord> {
    records.iter().filter(move |r| r.pa >= min_pa)
}

/// Computed players with at least `min_pa` plate appearances.
pub fn qualified_players<'a, I>(players: I, min_pa: u32) -> Vec<&'a PlayerMetrics>
where
    I: IntoIterator<Item = &'a PlayerMetrics>,
{
    players
        .into_iter()
        .filter(|p| p.record.pa >= min_pa)
        .collect()
}

// ---------------------------------------------------------------------------
// Top-level entry point
// ---------------------------------------------------------------------------

/// Compute derived metrics for every record.
///
/// The league wOBA baseline is derived from this batch only and is never
/// carried over to another call.
pub fn compute_batch(records: &[PlayerRecord], config: &StatsConfig) -> MetricsBatch {
    let league_woba = league_average_woba(records, config.min_pa);
    debug!(
        "league wOBA over {} records (min PA {}): {:?}",
        records.len(),
        config.min_pa,
        league_woba
    );

    let players = records
        .iter()
        .map(|r| {
            let mut metrics = base_metrics(r);
            metrics.wraa = wraa(metrics.woba, league_woba, config.woba_scale, r.pa);
            PlayerMetrics {
                record: r.clone(),
                metrics,
            }
        })
        .collect();

    MetricsBatch {
        players,
        league_woba,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
