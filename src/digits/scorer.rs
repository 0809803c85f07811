//! Digit-frequency opportunity scoring
//!
//! The over/under dual-leg wins when the settling digit lands outside the
//! dead zone between the two barriers. A symbol qualifies when both the
//! printing digit and the least-frequent digit sit inside the dead zone
//! while the most-frequent digit sits outside it.

use super::{DigitStats, SymbolOpportunity};
use crate::config::DigitConfig;
use rust_decimal::Decimal;

/// Scores digit distributions against the dual-leg entry conditions
pub struct DigitScorer {
    config: DigitConfig,
}

impl DigitScorer {
    /// Create a scorer with the given digit configuration
    pub fn new(config: DigitConfig) -> Self {
        Self { config }
    }

    /// Digits that lose both legs: [under_barrier, over_barrier]
    fn in_dead_zone(&self, digit: u8) -> bool {
        digit >= self.config.under_barrier && digit <= self.config.over_barrier
    }

    /// Score one symbol's distribution
    pub fn score(&self, stats: &DigitStats) -> SymbolOpportunity {
        let ready = stats.sample_size >= self.config.min_sample;
        let least = stats.least_frequent();
        let most = stats.most_frequent();

        let meets_conditions = ready
            && self.in_dead_zone(stats.current_last_digit)
            && self.in_dead_zone(least)
            && !self.in_dead_zone(most);

        let score = if meets_conditions {
            let spread = Decimal::from(stats.count(most)) - Decimal::from(stats.count(least));
            spread * Decimal::from(stats.sample_size as u64) / Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        SymbolOpportunity {
            symbol: stats.symbol.clone(),
            ready,
            meets_conditions,
            least_digit: least,
            most_digit: most,
            score,
        }
    }

    /// Score every symbol in the universe
    pub fn score_universe<'a>(
        &self,
        universe: impl IntoIterator<Item = &'a DigitStats>,
    ) -> Vec<SymbolOpportunity> {
        universe.into_iter().map(|s| self.score(s)).collect()
    }

    /// Highest-scoring qualified opportunity; ties favor the first seen
    pub fn best<'a>(
        &self,
        opportunities: &'a [SymbolOpportunity],
    ) -> Option<&'a SymbolOpportunity> {
        opportunities
            .iter()
            .filter(|o| o.meets_conditions)
            .fold(None, |best: Option<&SymbolOpportunity>, candidate| {
                match best {
                    Some(b) if candidate.score > b.score => Some(candidate),
                    Some(b) => Some(b),
                    None => Some(candidate),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn scorer() -> DigitScorer {
        DigitScorer::new(DigitConfig::default())
    }

    /// counts with digit 4 least (2), digit 9 most (20), rest 9-10 each
    fn qualifying_stats(current: u8) -> DigitStats {
        DigitStats {
            symbol: "R_100".to_string(),
            current_last_digit: current,
            counts: [10, 10, 10, 10, 2, 9, 10, 10, 9, 20],
            sample_size: 100,
        }
    }

    #[test]
    fn test_qualifying_symbol_scores() {
        let opportunity = scorer().score(&qualifying_stats(5));

        assert!(opportunity.ready);
        assert!(opportunity.meets_conditions);
        assert_eq!(opportunity.least_digit, 4);
        assert_eq!(opportunity.most_digit, 9);
        // (20 - 2) * 100 / 100
        assert_eq!(opportunity.score, dec!(18));
    }

    #[test]
    fn test_current_digit_outside_dead_zone_fails() {
        let opportunity = scorer().score(&qualifying_stats(3));
        assert!(!opportunity.meets_conditions);
        assert_eq!(opportunity.score, dec!(0));
    }

    #[test]
    fn test_small_sample_not_ready() {
        let mut stats = qualifying_stats(5);
        stats.sample_size = 19;
        let opportunity = scorer().score(&stats);

        assert!(!opportunity.ready);
        assert!(!opportunity.meets_conditions);
    }

    #[test]
    fn test_least_digit_outside_dead_zone_fails() {
        let mut stats = qualifying_stats(5);
        stats.counts[0] = 1; // digit 0 now least frequent
        let opportunity = scorer().score(&stats);
        assert!(!opportunity.meets_conditions);
    }

    #[test]
    fn test_most_digit_in_dead_zone_fails() {
        let mut stats = qualifying_stats(5);
        stats.counts[5] = 30; // digit 5 now most frequent
        let opportunity = scorer().score(&stats);
        assert!(!opportunity.meets_conditions);
    }

    #[test]
    fn test_score_scales_with_sample_size() {
        let mut stats = qualifying_stats(4);
        stats.sample_size = 50;
        let opportunity = scorer().score(&stats);
        // (20 - 2) * 50 / 100
        assert_eq!(opportunity.score, dec!(9));
    }

    #[test]
    fn test_best_picks_highest_score() {
        let scorer = scorer();
        let mut low = qualifying_stats(5);
        low.symbol = "R_50".to_string();
        low.sample_size = 50;
        let high = qualifying_stats(4);

        let opportunities = scorer.score_universe([&low, &high]);
        let best = scorer.best(&opportunities).unwrap();
        assert_eq!(best.symbol, "R_100");
    }

    #[test]
    fn test_best_tie_favors_first() {
        let scorer = scorer();
        let mut a = qualifying_stats(5);
        a.symbol = "R_25".to_string();
        let b = qualifying_stats(5);

        let opportunities = scorer.score_universe([&a, &b]);
        let best = scorer.best(&opportunities).unwrap();
        assert_eq!(best.symbol, "R_25");
    }

    #[test]
    fn test_best_none_when_nothing_qualifies() {
        let scorer = scorer();
        let opportunities = scorer.score_universe([&qualifying_stats(0), &qualifying_stats(9)]);
        assert!(scorer.best(&opportunities).is_none());
    }
}
