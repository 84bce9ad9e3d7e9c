//! Where a freshly loaded conversation starts.
//!
//! Roughly half of a script is shown as history that "already happened". The
//! split point is pushed forward past assistant turns so the history never
//! ends halfway through a reply and the next thing to do is a user turn.

use crate::state::Turn;

/// A script cut into visible history and the turns still to play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    pub history: &'a [Turn],
    pub remainder: &'a [Turn],
}

/// Index of the first turn that has not happened yet.
///
/// Always either a `user` turn or `turns.len()`.
pub fn split_point(turns: &[Turn]) -> usize {
    let mut cutoff = turns.len() / 2;
    while cutoff < turns.len() && !turns[cutoff].is_user() {
        cutoff += 1;
    }
    cutoff
}

pub fn split(turns: &[Turn]) -> Split<'_> {
    let (history, remainder) = turns.split_at(split_point(turns));
    Split { history, remainder }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(roles: &str) -> Vec<Turn> {
        roles
            .chars()
            .enumerate()
            .map(|(i, r)| match r {
                'u' => Turn::user(format!("u{i}")),
                _ => Turn::assistant(format!("a{i}")),
            })
            .collect()
    }

    #[test]
    fn test_empty_script() {
        let split = split(&[]);
        assert!(split.history.is_empty());
        assert!(split.remainder.is_empty());
    }

    #[test]
    fn test_cutoff_lands_on_user_turn() {
        // len 6, half = 3 is assistant, 4 is assistant, 5 is user
        let turns = script("uaaaau");
        assert_eq!(split_point(&turns), 5);
    }

    #[test]
    fn test_half_point_already_user() {
        let turns = script("auaua");
        assert_eq!(split_point(&turns), 3);
    }

    #[test]
    fn test_trailing_assistant_turns_become_history() {
        let turns = script("uaaa");
        let split = split(&turns);
        assert_eq!(split.history.len(), 4);
        assert!(split.remainder.is_empty());
    }

    #[test]
    fn test_cutoff_is_user_or_end_for_every_shape() {
        // Every role pattern up to length 8
        for len in 0..=8u32 {
            for bits in 0..(1u32 << len) {
                let roles: String = (0..len)
                    .map(|i| if bits & (1 << i) != 0 { 'u' } else { 'a' })
                    .collect();
                let turns = script(&roles);
                let cutoff = split_point(&turns);
                assert!(cutoff >= turns.len() / 2);
                assert!(cutoff == turns.len() || turns[cutoff].is_user(), "{roles}");
                assert!(turns[turns.len() / 2..cutoff].iter().all(|t| !t.is_user()));
            }
        }
    }
}
