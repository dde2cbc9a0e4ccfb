use crate::domain::post::VoteLedger;

/// Derived metrics of a vote ledger: the post's score and the share of
/// votes that are positive.
///
/// The percentage truncates toward zero, matching the stored contract:
/// 2 upvotes out of 3 is 66, not 67.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub score: i64,
    pub upvote_percentage: u32,
}

impl Tally {
    /// Recompute score and upvote percentage from the current ledger.
    ///
    /// A pure function of the final vote list, so interleaved recomputes by
    /// concurrent voters converge once the last one lands.
    pub fn of(votes: &VoteLedger) -> Self {
        let score = votes.iter().map(|v| i64::from(v.vote)).sum();
        let total = votes.len();
        let positive = votes.iter().filter(|v| v.vote > 0).count();

        let upvote_percentage = if total == 0 {
            0
        } else {
            (positive as f32 / total as f32 * 100.0) as u32
        };

        Self {
            score,
            upvote_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(entries: &[(&str, i8)]) -> VoteLedger {
        let mut votes = VoteLedger::default();
        for (user, value) in entries {
            votes.set(user, *value);
        }
        votes
    }

    #[test]
    fn empty_ledger_tallies_to_zero() {
        let tally = Tally::of(&VoteLedger::default());

        assert_eq!(tally.score, 0);
        assert_eq!(tally.upvote_percentage, 0);
    }

    #[test]
    fn percentage_truncates() {
        let tally = Tally::of(&ledger(&[("a", 1), ("b", 1), ("c", -1)]));

        assert_eq!(tally.score, 1);
        assert_eq!(tally.upvote_percentage, 66);
    }

    #[test]
    fn split_ledger_is_half_upvoted() {
        let tally = Tally::of(&ledger(&[("a", 1), ("b", -1)]));

        assert_eq!(tally.score, 0);
        assert_eq!(tally.upvote_percentage, 50);
    }

    #[test]
    fn all_downvotes() {
        let tally = Tally::of(&ledger(&[("a", -1), ("b", -1)]));

        assert_eq!(tally.score, -2);
        assert_eq!(tally.upvote_percentage, 0);
    }
}
