//! Pure ranking over a duration key.
//!
//! Rankings drive three things: the scoreboard between rounds, spell
//! targeting (who is "immediately ahead"), and the final leaderboard.
//! All three use the same rule: ascending by the chosen duration,
//! did-not-finish (`None`) after every finisher, ties broken by the
//! players' original order (the sort is stable, no secondary key).

use std::cmp::Ordering;

use typespell_protocol::PlayerSnapshot;

use crate::state::Player;

/// Which duration field to rank by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankKey {
    /// This round's elapsed time — per-round standings.
    RoundDuration,
    /// Cumulative time — the authoritative game ranking.
    TotalDuration,
}

fn duration_key(player: &Player, key: RankKey) -> Option<u64> {
    match key {
        RankKey::RoundDuration => player.round_duration,
        RankKey::TotalDuration => Some(player.total_duration),
    }
}

/// Ascending with `None` ordered after every `Some`.
pub(crate) fn cmp_durations(a: Option<u64>, b: Option<u64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.cmp(&b),
    }
}

/// Ranks players by the chosen key and returns snapshots in rank order.
pub fn rank_players(players: &[Player], key: RankKey) -> Vec<PlayerSnapshot> {
    let mut ranked: Vec<&Player> = players.iter().collect();
    ranked.sort_by(|a, b| {
        cmp_durations(duration_key(a, key), duration_key(b, key))
    });
    ranked.into_iter().map(Player::snapshot).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use typespell_protocol::PlayerId;

    fn player(id: u64, round: Option<u64>, total: u64) -> Player {
        let mut p = Player::new(PlayerId(id), format!("p{id}"), false);
        p.round_duration = round;
        p.total_duration = total;
        p
    }

    #[test]
    fn test_ranks_ascending_by_total() {
        let players = vec![
            player(1, None, 9000),
            player(2, None, 5000),
            player(3, None, 7000),
        ];
        let ranked = rank_players(&players, RankKey::TotalDuration);
        let ids: Vec<u64> = ranked.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_dnf_players_rank_after_all_finishers() {
        let players = vec![
            player(1, None, 0),
            player(2, Some(9000), 0),
            player(3, Some(4000), 0),
        ];
        let ranked = rank_players(&players, RankKey::RoundDuration);
        let ids: Vec<u64> = ranked.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_ties_keep_original_order() {
        let players = vec![
            player(1, None, 5000),
            player(2, None, 5000),
            player(3, None, 5000),
        ];
        let ranked = rank_players(&players, RankKey::TotalDuration);
        let ids: Vec<u64> = ranked.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_adjacent_pairs_are_non_decreasing() {
        let players = vec![
            player(1, Some(300), 0),
            player(2, None, 0),
            player(3, Some(100), 0),
            player(4, Some(200), 0),
            player(5, None, 0),
        ];
        let ranked = rank_players(&players, RankKey::RoundDuration);
        for pair in ranked.windows(2) {
            match (pair[0].round_duration, pair[1].round_duration) {
                (Some(a), Some(b)) => assert!(a <= b),
                (None, Some(_)) => panic!("DNF ranked before a finisher"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_ranking_does_not_mutate_input() {
        let players = vec![player(1, None, 9000), player(2, None, 1000)];
        let _ = rank_players(&players, RankKey::TotalDuration);
        assert_eq!(players[0].id, PlayerId(1));
        assert_eq!(players[1].id, PlayerId(2));
    }
}
