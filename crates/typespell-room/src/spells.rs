//! Spell resolution: turning intermission selections into the next
//! round's `activeSpells` map.
//!
//! Runs exactly once per intermission→racing transition. Targeting is
//! positional: players are ranked by cumulative time, a buff lands on
//! its caster, and an attack lands on the player one rank ahead of the
//! caster — second place attacks first, third attacks second. The
//! leader has no one ahead, so a leader's attack fizzles. Every
//! processed selection is cleared, landed or not.

use tracing::{debug, info};
use typespell_protocol::ActiveSpells;

use crate::ranking::cmp_durations;
use crate::state::Player;

/// Resolves all selections against the current standings and clears
/// them. Returns the map of target → ordered spells for the round.
pub fn resolve_spells(players: &mut [Player]) -> ActiveSpells {
    // Standings by cumulative time; index 0 is the current leader.
    let mut order: Vec<usize> = (0..players.len()).collect();
    order.sort_by(|&a, &b| {
        cmp_durations(
            Some(players[a].total_duration),
            Some(players[b].total_duration),
        )
    });

    let mut active = ActiveSpells::new();

    for (rank, &idx) in order.iter().enumerate() {
        let Some(spell) = players[idx].selected_spell.take() else {
            continue;
        };

        if spell.is_buff() {
            info!(
                caster = %players[idx].id,
                %spell,
                "buff applied to caster"
            );
            active.entry(players[idx].id).or_default().push(spell);
        } else if rank > 0 {
            let target = players[order[rank - 1]].id;
            info!(
                caster = %players[idx].id,
                %target,
                %spell,
                "attack applied to the player one rank ahead"
            );
            active.entry(target).or_default().push(spell);
        } else {
            // The leader has no one in front; the attack is wasted.
            debug!(caster = %players[idx].id, %spell, "attack wasted");
        }
    }

    active
}
