// Manager overrides: pin named players to batting slots and fill the rest
// in ranking order.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

use crate::lineup::score::ScoredPlayer;
use crate::lineup::LineupError;

/// A ranked player bound to a 1-based batting slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlottedPlayer {
    pub slot: usize,
    /// Placed by an override; the optimizer must not move it.
    pub fixed: bool,
    pub player: ScoredPlayer,
}

/// Drop overrides for players who are not on the roster, then reject the
/// whole map if any slot falls outside `1..=roster_size` or is requested
/// twice.
fn effective_overrides<'a>(
    ranked: &[ScoredPlayer],
    overrides: &'a BTreeMap<String, usize>,
) -> Result<BTreeMap<&'a str, usize>, LineupError> {
    let roster: HashSet<&str> = ranked.iter().map(|p| p.name()).collect();
    let roster_size = ranked.len();

    let mut by_slot: BTreeMap<usize, &str> = BTreeMap::new();
    let mut effective = BTreeMap::new();
    for (name, &slot) in overrides {
        if !roster.contains(name.as_str()) {
            warn!("ignoring override for '{}': not on the qualified roster", name);
            continue;
        }
        if slot == 0 || slot > roster_size {
            return Err(LineupError::SlotOutOfRange {
                name: name.clone(),
                slot,
                roster_size,
            });
        }
        if let Some(first) = by_slot.insert(slot, name.as_str()) {
            return Err(LineupError::DuplicateSlot {
                slot,
                first: first.to_string(),
                second: name.clone(),
            });
        }
        effective.insert(name.as_str(), slot);
    }
    Ok(effective)
}

/// Bind every ranked player to exactly one slot in `1..=N`.
///
/// Overridden players take their requested slot. Everyone else keeps their
/// ranking order and fills the unclaimed slots from the lowest upward.
/// The result is ordered by slot.
pub fn assign_slots(
    ranked: &[ScoredPlayer],
    overrides: &BTreeMap<String, usize>,
) -> Result<Vec<SlottedPlayer>, LineupError> {
    let fixed = effective_overrides(ranked, overrides)?;
    let claimed: HashSet<usize> = fixed.values().copied().collect();
    let mut open_slots = (1..=ranked.len()).filter(|s| !claimed.contains(s));

    let mut assigned: Vec<SlottedPlayer> = Vec::with_capacity(ranked.len());
    for player in ranked {
        let (slot, is_fixed) = match fixed.get(player.name()) {
            Some(&slot) => (slot, true),
            None => match open_slots.next() {
                Some(slot) => (slot, false),
                // Unreachable: N players, N slots, claimed slots are distinct.
                None => continue,
            },
        };
        assigned.push(SlottedPlayer {
            slot,
            fixed: is_fixed,
            player: player.clone(),
        });
    }

    assigned.sort_by_key(|p| p.slot);
    Ok(assigned)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
