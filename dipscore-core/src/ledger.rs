//! Centre-count ledger - yearly supply-centre counts for one game
//!
//! Records are keyed by (year, power). Writing an existing key corrects it
//! in place; nothing is ever appended over an earlier entry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ProgressionRule, ValidationError};
use crate::power::{GreatPower, START_YEAR, TOTAL_CENTRES, WINNING_CENTRES};

/// Centres held by one power at the end of one year
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CentreCount {
    pub power: GreatPower,
    pub year: u16,
    pub count: u8,
}

/// Yearly centre counts for a single game
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CentreCountLedger {
    years: BTreeMap<u16, BTreeMap<GreatPower, u8>>,
}

impl CentreCountLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger holding every power's starting count for the start year
    pub fn with_starting_counts() -> Self {
        let start = GreatPower::ALL
            .iter()
            .map(|&p| (p, p.starting_centres()))
            .collect();
        let mut years = BTreeMap::new();
        years.insert(START_YEAR, start);
        Self { years }
    }

    /// Check a record against range limits and the counts either side of it.
    ///
    /// `round_final_year` is the last year the owning round plays, if fixed.
    pub fn validate(
        &self,
        power: GreatPower,
        year: u16,
        count: u8,
        round_final_year: Option<u16>,
    ) -> Result<(), ValidationError> {
        if year < START_YEAR {
            return Err(ValidationError::InvalidYear {
                year,
                earliest: START_YEAR,
            });
        }
        if let Some(final_year) = round_final_year {
            if year > final_year {
                return Err(ValidationError::YearAfterRoundEnd { year, final_year });
            }
        }
        if count > TOTAL_CENTRES {
            return Err(ValidationError::InvalidCount {
                count,
                max: TOTAL_CENTRES,
            });
        }

        // A missing neighbour year is either the first data point or a gap
        if let Some(previous) = self.count(power, year - 1) {
            check_progression(power, year, previous, count)?;
        }
        // A correction must still lead into the year after it
        if let Some(next) = year.checked_add(1).and_then(|y| self.count(power, y)) {
            check_progression(power, year + 1, count, next)?;
        }
        Ok(())
    }

    /// Validate and store a record, returning the value it replaced (if any)
    pub fn record(
        &mut self,
        power: GreatPower,
        year: u16,
        count: u8,
        round_final_year: Option<u16>,
    ) -> Result<Option<u8>, ValidationError> {
        self.validate(power, year, count, round_final_year)?;
        Ok(self.years.entry(year).or_default().insert(power, count))
    }

    /// Count for one power in one year, if recorded
    pub fn count(&self, power: GreatPower, year: u16) -> Option<u8> {
        self.years.get(&year).and_then(|c| c.get(&power)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Distinct recorded years, ascending
    pub fn years_played(&self) -> impl Iterator<Item = u16> + '_ {
        self.years.keys().copied()
    }

    /// Most recent recorded year
    pub fn final_year(&self) -> Option<u16> {
        self.years.keys().next_back().copied()
    }

    /// Most recent recorded year that is not after `year`
    pub fn latest_year_not_after(&self, year: u16) -> Option<u16> {
        self.years.range(..=year).next_back().map(|(&y, _)| y)
    }

    /// Records for one year, largest count first (canonical order within ties)
    pub fn year_counts(&self, year: u16) -> Vec<CentreCount> {
        let mut counts: Vec<CentreCount> = self
            .years
            .get(&year)
            .map(|c| {
                c.iter()
                    .map(|(&power, &count)| CentreCount { power, year, count })
                    .collect()
            })
            .unwrap_or_default();
        // Stable sort keeps canonical power order among equal counts
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts
    }

    /// Every power's count for `year`, largest first.
    ///
    /// A power with no record that year keeps its most recent earlier count.
    /// Powers never recorded are left out.
    pub fn carried_counts(&self, year: u16) -> Vec<CentreCount> {
        let mut counts: Vec<CentreCount> = GreatPower::ALL
            .iter()
            .filter_map(|&power| {
                self.count_carried(power, year)
                    .map(|count| CentreCount { power, year, count })
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts
    }

    /// Carried counts for the final year, largest first
    pub fn final_year_counts(&self) -> Vec<CentreCount> {
        self.final_year()
            .map(|y| self.carried_counts(y))
            .unwrap_or_default()
    }

    /// True when every power still in the game has a record for `year`.
    ///
    /// A power already on zero before `year` can never regain a centre.
    pub fn year_complete(&self, year: u16) -> bool {
        GreatPower::ALL.iter().all(|&power| {
            self.count(power, year).is_some()
                || self.count_carried(power, year.saturating_sub(1)) == Some(0)
        })
    }

    /// Every record, ordered by year then canonical power order
    pub fn iter(&self) -> impl Iterator<Item = CentreCount> + '_ {
        self.years.iter().flat_map(|(&year, counts)| {
            counts
                .iter()
                .map(move |(&power, &count)| CentreCount { power, year, count })
        })
    }

    /// Centres owned by no power at the end of `year` (final year when `None`).
    ///
    /// A power with no record for the year is taken to hold its most recent
    /// earlier count.
    pub fn neutrals(&self, year: Option<u16>) -> Option<u8> {
        let year = match year {
            Some(y) => y,
            None => self.final_year()?,
        };
        let owned: u16 = GreatPower::ALL
            .iter()
            .map(|&p| u16::from(self.count_carried(p, year).unwrap_or(0)))
            .sum();
        let neutral = u16::from(TOTAL_CENTRES).saturating_sub(owned);
        // Bounded by TOTAL_CENTRES
        Some(neutral as u8)
    }

    /// Count in `year`, or the most recent earlier one if that year is missing
    fn count_carried(&self, power: GreatPower, year: u16) -> Option<u8> {
        self.years
            .range(..=year)
            .rev()
            .find_map(|(_, counts)| counts.get(&power).copied())
    }

    /// Power holding a winning count in the final year
    pub fn soloer(&self) -> Option<CentreCount> {
        self.final_year_counts()
            .into_iter()
            .next()
            .filter(|cc| cc.count >= WINNING_CENTRES)
    }

    /// Records for the power(s) tied on the highest count in the final year
    pub fn board_toppers(&self) -> Vec<CentreCount> {
        let counts = self.final_year_counts();
        let Some(top) = counts.first().map(|cc| cc.count) else {
            return Vec::new();
        };
        counts.into_iter().take_while(|cc| cc.count == top).collect()
    }
}

/// Doubling and zero-recovery rules between consecutive years
fn check_progression(
    power: GreatPower,
    year: u16,
    previous: u8,
    count: u8,
) -> Result<(), ValidationError> {
    let rule = if previous == 0 && count > 0 {
        ProgressionRule::RecoveredFromZero
    } else if u16::from(count) > 2 * u16::from(previous) {
        ProgressionRule::MoreThanDoubled
    } else {
        return Ok(());
    };
    Err(ValidationError::InvalidProgression {
        power,
        year,
        previous,
        count,
        rule,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use GreatPower::*;

    #[test]
    fn test_starting_counts() {
        let ledger = CentreCountLedger::with_starting_counts();
        assert_eq!(ledger.final_year(), Some(START_YEAR));
        assert_eq!(ledger.count(Russia, START_YEAR), Some(4));
        assert_eq!(ledger.count(France, START_YEAR), Some(3));
        assert_eq!(ledger.neutrals(None), Some(12));
    }

    #[test]
    fn test_more_than_doubling_rejected() {
        let mut ledger = CentreCountLedger::new();
        ledger.record(Austria, 1903, 4, None).unwrap();
        let err = ledger.record(Austria, 1904, 10, None).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidProgression {
                power: Austria,
                year: 1904,
                previous: 4,
                count: 10,
                rule: ProgressionRule::MoreThanDoubled,
            }
        );
        assert_eq!(ledger.count(Austria, 1904), None);

        // Exactly double is fine
        assert!(ledger.record(Austria, 1904, 8, None).is_ok());
    }

    #[test]
    fn test_recovery_from_zero_rejected() {
        let mut ledger = CentreCountLedger::new();
        ledger.record(Italy, 1905, 0, None).unwrap();
        let err = ledger.record(Italy, 1906, 5, None).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidProgression {
                rule: ProgressionRule::RecoveredFromZero,
                previous: 0,
                count: 5,
                ..
            }
        ));
        assert!(ledger.record(Italy, 1906, 0, None).is_ok());
    }

    #[test]
    fn test_gap_skips_progression_check() {
        let mut ledger = CentreCountLedger::new();
        ledger.record(Turkey, 1901, 2, None).unwrap();
        // 1902 missing, so 1903 is not compared against anything
        assert!(ledger.record(Turkey, 1903, 9, None).is_ok());
    }

    #[test]
    fn test_range_checks() {
        let mut ledger = CentreCountLedger::new();
        assert!(matches!(
            ledger.record(England, 1899, 3, None),
            Err(ValidationError::InvalidYear { year: 1899, .. })
        ));
        assert!(matches!(
            ledger.record(England, 1901, 35, None),
            Err(ValidationError::InvalidCount { count: 35, .. })
        ));
        assert!(matches!(
            ledger.record(England, 1908, 3, Some(1907)),
            Err(ValidationError::YearAfterRoundEnd { year: 1908, final_year: 1907 })
        ));
        assert!(ledger.record(England, 1900, 3, None).is_ok());
        assert!(ledger.record(England, 1901, 34, None).is_err());
        assert!(!ledger.is_empty());
    }

    #[test]
    fn test_correction_in_place() {
        let mut ledger = CentreCountLedger::with_starting_counts();
        assert_eq!(ledger.record(France, 1901, 5, None).unwrap(), None);
        assert_eq!(ledger.record(France, 1901, 4, None).unwrap(), Some(5));
        assert_eq!(ledger.count(France, 1901), Some(4));
        assert_eq!(ledger.years_played().collect::<Vec<_>>(), vec![1900, 1901]);
        // Restartable
        assert_eq!(ledger.years_played().count(), 2);
    }

    #[test]
    fn test_correction_checked_against_next_year() {
        let mut ledger = CentreCountLedger::new();
        ledger.record(Austria, 1901, 4, None).unwrap();
        ledger.record(Austria, 1902, 8, None).unwrap();

        let err = ledger.record(Austria, 1901, 0, None).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidProgression {
                power: Austria,
                year: 1902,
                previous: 0,
                count: 8,
                rule: ProgressionRule::RecoveredFromZero,
            }
        );
        assert!(matches!(
            ledger.record(Austria, 1901, 3, None),
            Err(ValidationError::InvalidProgression {
                rule: ProgressionRule::MoreThanDoubled,
                ..
            })
        ));
        assert_eq!(ledger.count(Austria, 1901), Some(4));

        // Still a valid lead-in to 1902
        assert_eq!(ledger.record(Austria, 1901, 5, None).unwrap(), Some(4));
    }

    #[test]
    fn test_year_counts_sorted_descending() {
        let mut ledger = CentreCountLedger::new();
        ledger.record(Turkey, 1901, 5, None).unwrap();
        ledger.record(Austria, 1901, 3, None).unwrap();
        ledger.record(England, 1901, 5, None).unwrap();
        let counts: Vec<_> = ledger
            .year_counts(1901)
            .iter()
            .map(|cc| (cc.power, cc.count))
            .collect();
        assert_eq!(counts, vec![(England, 5), (Turkey, 5), (Austria, 3)]);
    }

    #[test]
    fn test_neutrals_carry_forward_missing_powers() {
        let mut ledger = CentreCountLedger::with_starting_counts();
        for power in GreatPower::ALL {
            let count = if power == Russia { 6 } else { 4 };
            ledger.record(power, 1901, count, None).unwrap();
        }
        assert_eq!(ledger.neutrals(Some(1901)), Some(34 - 30));
        // Only Austria recorded in 1902: the rest keep their 1901 counts
        ledger.record(Austria, 1902, 5, None).unwrap();
        assert_eq!(ledger.neutrals(Some(1902)), Some(34 - 31));
    }

    #[test]
    fn test_final_year_counts_carry_missing_powers() {
        let mut ledger = CentreCountLedger::with_starting_counts();
        ledger.record(Austria, 1901, 6, None).unwrap();
        let counts: Vec<_> = ledger
            .final_year_counts()
            .iter()
            .map(|cc| (cc.power, cc.year, cc.count))
            .collect();
        assert_eq!(counts.len(), 7);
        assert_eq!(counts[0], (Austria, 1901, 6));
        assert_eq!(counts[1], (Russia, 1901, 4));
        assert!(counts[2..].iter().all(|&(_, _, count)| count == 3));

        // Never-recorded powers stay out
        let mut bare = CentreCountLedger::new();
        bare.record(Italy, 1905, 7, None).unwrap();
        assert_eq!(bare.final_year_counts().len(), 1);
    }

    #[test]
    fn test_year_complete_skips_eliminated_powers() {
        let mut ledger = CentreCountLedger::with_starting_counts();
        for power in GreatPower::ALL {
            let count = if power == Italy { 0 } else { 4 };
            ledger.record(power, 1901, count, None).unwrap();
        }
        assert!(ledger.year_complete(1901));
        assert!(!ledger.year_complete(1902));

        for power in [Austria, England, France, Germany, Russia] {
            ledger.record(power, 1902, 5, None).unwrap();
        }
        assert!(!ledger.year_complete(1902));
        ledger.record(Turkey, 1902, 3, None).unwrap();
        assert!(ledger.year_complete(1902));
    }

    #[test]
    fn test_soloer_and_board_toppers() {
        let mut ledger = CentreCountLedger::new();
        ledger.record(Germany, 1910, 17, None).unwrap();
        ledger.record(Russia, 1910, 17, None).unwrap();
        assert!(ledger.soloer().is_none());
        let toppers: Vec<_> = ledger.board_toppers().iter().map(|c| c.power).collect();
        assert_eq!(toppers, vec![Germany, Russia]);

        ledger.record(Germany, 1911, 18, None).unwrap();
        assert_eq!(ledger.soloer().map(|c| c.power), Some(Germany));
    }

    #[test]
    fn test_latest_year_not_after() {
        let mut ledger = CentreCountLedger::with_starting_counts();
        ledger.record(Austria, 1903, 3, None).unwrap();
        assert_eq!(ledger.latest_year_not_after(1902), Some(1900));
        assert_eq!(ledger.latest_year_not_after(1905), Some(1903));
        assert_eq!(ledger.latest_year_not_after(1899), None);
    }
}
