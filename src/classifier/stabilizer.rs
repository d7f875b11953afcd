use std::collections::VecDeque;

use crate::config::StabilizerConfig;

/// Outcome of a plurality vote over recent raw labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    /// Winning label, present only when it has enough votes.
    pub stable: Option<String>,
    /// Share of non-null history held by the leading label.
    pub confidence: f32,
    pub votes: usize,
    pub non_null: usize,
}

/// Majority vote over the last few raw labels.
///
/// Nulls occupy history slots but never vote. Among equally frequent labels,
/// the one that appears earliest in history leads.
#[derive(Debug, Clone)]
pub struct Stabilizer {
    history: VecDeque<Option<String>>,
    history_len: usize,
    min_votes: usize,
}

impl Stabilizer {
    pub fn new(config: &StabilizerConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.history_len),
            history_len: config.history_len,
            min_votes: config.min_votes,
        }
    }

    /// Record a raw label and return the current vote.
    pub fn push(&mut self, raw: Option<String>) -> Vote {
        if self.history.len() == self.history_len {
            self.history.pop_front();
        }
        self.history.push_back(raw);
        self.vote()
    }

    pub fn vote(&self) -> Vote {
        // Tally in order of first appearance.
        let mut tally: Vec<(&str, usize)> = Vec::new();
        let mut non_null = 0;

        for label in self.history.iter().flatten() {
            non_null += 1;
            match tally.iter_mut().find(|(seen, _)| *seen == label.as_str()) {
                Some((_, count)) => *count += 1,
                None => tally.push((label.as_str(), 1)),
            }
        }

        let leader = tally
            .into_iter()
            .fold(None, |best: Option<(&str, usize)>, (label, count)| match best {
                Some((_, top)) if top >= count => best,
                _ => Some((label, count)),
            });

        match leader {
            Some((label, votes)) => Vote {
                stable: (votes >= self.min_votes).then(|| label.to_string()),
                confidence: votes as f32 / non_null as f32,
                votes,
                non_null,
            },
            None => Vote {
                stable: None,
                confidence: 0.0,
                votes: 0,
                non_null: 0,
            },
        }
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stabilizer() -> Stabilizer {
        Stabilizer::new(&StabilizerConfig {
            history_len: 7,
            min_votes: 4,
        })
    }

    fn feed(s: &mut Stabilizer, labels: &[Option<&str>]) -> Vote {
        let mut last = s.vote();
        for label in labels {
            last = s.push(label.map(str::to_string));
        }
        last
    }

    #[test]
    fn plurality_with_nulls() {
        let mut s = stabilizer();
        let a = Some("А");
        let vote = feed(&mut s, &[a, a, a, None, Some("Б"), a, a]);
        assert_eq!(vote.stable.as_deref(), Some("А"));
        assert!((vote.confidence - 5.0 / 6.0).abs() < 1e-6);
        assert_eq!((vote.votes, vote.non_null), (5, 6));
    }

    #[test]
    fn too_few_votes_is_unstable() {
        let mut s = stabilizer();
        let vote = feed(&mut s, &[Some("А"), Some("Б"), Some("А"), Some("Б"), None]);
        assert_eq!(vote.stable, None);
    }

    #[test]
    fn old_labels_fall_out_of_history() {
        let mut s = stabilizer();
        feed(&mut s, &[Some("1"); 7]);
        let vote = feed(&mut s, &[None, None, None, None]);
        assert_eq!(vote.stable, None);
        assert_eq!(vote.votes, 3);
    }

    #[test]
    fn tie_goes_to_earliest_label_in_history() {
        let mut s = Stabilizer::new(&StabilizerConfig {
            history_len: 7,
            min_votes: 2,
        });
        // Б reaches two votes first, but А appears first.
        let vote = feed(&mut s, &[Some("А"), Some("Б"), Some("Б"), Some("А")]);
        assert_eq!(vote.stable.as_deref(), Some("А"));
        assert_eq!((vote.votes, vote.non_null), (2, 4));
        assert!((vote.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn tie_ignores_which_label_is_most_recent() {
        let mut s = Stabilizer::new(&StabilizerConfig {
            history_len: 8,
            min_votes: 4,
        });
        let vote = feed(
            &mut s,
            &[Some("Б"), Some("А"), Some("Б"), Some("Б"), Some("А"), Some("Б"), Some("А"), Some("А")],
        );
        assert_eq!(vote.stable.as_deref(), Some("Б"));
        assert!((vote.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn earliest_label_can_fall_out_of_history() {
        let mut s = Stabilizer::new(&StabilizerConfig {
            history_len: 4,
            min_votes: 2,
        });
        // Once the leading А is evicted, Б appears first.
        let vote = feed(&mut s, &[Some("А"), Some("Б"), Some("А"), Some("Б"), Some("А")]);
        assert_eq!(vote.stable.as_deref(), Some("Б"));
        assert_eq!(vote.votes, 2);
    }

    #[test]
    fn empty_history_votes_nothing() {
        let s = stabilizer();
        let vote = s.vote();
        assert_eq!(vote.stable, None);
        assert_eq!(vote.confidence, 0.0);
    }
}
