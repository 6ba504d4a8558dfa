//! Draw and concession proposals

use serde::{Deserialize, Serialize};

use crate::error::{DrawConflict, ValidationError};
use crate::ledger::CentreCountLedger;
use crate::power::{GreatPower, Season, FIRST_YEAR, POWER_COUNT};

/// A single draw (or concession, if one power) proposal in a game.
///
/// Powers are stored in fixed slots, filled from the front.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawProposal {
    pub year: u16,
    pub season: Season,
    pub passed: bool,
    #[serde(default)]
    pub proposer: Option<GreatPower>,
    pub slots: [Option<GreatPower>; POWER_COUNT],
    #[serde(default)]
    pub votes_in_favour: Option<u8>,
}

impl DrawProposal {
    /// Build a proposal with powers packed into the leading slots
    pub fn new(year: u16, season: Season, powers: &[GreatPower], passed: bool) -> Self {
        let mut slots = [None; POWER_COUNT];
        for (slot, &power) in slots.iter_mut().zip(powers) {
            *slot = Some(power);
        }
        Self {
            year,
            season,
            passed,
            proposer: None,
            slots,
            votes_in_favour: None,
        }
    }

    pub fn with_proposer(mut self, proposer: GreatPower) -> Self {
        self.proposer = Some(proposer);
        self
    }

    pub fn with_votes(mut self, votes_in_favour: u8) -> Self {
        self.votes_in_favour = Some(votes_in_favour);
        self
    }

    /// Powers included in the proposal
    pub fn powers(&self) -> Vec<GreatPower> {
        self.slots.iter().flatten().copied().collect()
    }

    pub fn draw_size(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn includes(&self, power: GreatPower) -> bool {
        self.slots.contains(&Some(power))
    }

    /// A proposal naming a single power concedes the game to it
    pub fn is_concession(&self) -> bool {
        self.draw_size() == 1
    }

    /// Checks that need nothing but the proposal itself
    pub fn validate_shape(&self) -> Result<(), ValidationError> {
        if self.year < FIRST_YEAR {
            return Err(ValidationError::InvalidYear {
                year: self.year,
                earliest: FIRST_YEAR,
            });
        }

        // No skipping slots
        let mut found_empty = false;
        for slot in &self.slots {
            match slot {
                None => found_empty = true,
                Some(_) if found_empty => {
                    return Err(ValidationError::InvalidDrawProposal(
                        "draw powers should go as early as possible".to_string(),
                    ));
                }
                Some(_) => {}
            }
        }

        let powers = self.powers();
        if powers.is_empty() {
            return Err(ValidationError::InvalidDrawProposal(
                "proposal names no powers".to_string(),
            ));
        }
        for (i, power) in powers.iter().enumerate() {
            if powers[..i].contains(power) {
                return Err(ValidationError::InvalidDrawProposal(format!(
                    "{power} present more than once"
                )));
            }
        }

        if let Some(votes) = self.votes_in_favour {
            if usize::from(votes) > POWER_COUNT {
                return Err(ValidationError::InvalidDrawProposal(format!(
                    "{votes} votes in favour from {POWER_COUNT} powers"
                )));
            }
        }
        Ok(())
    }

    /// Full validation against the game it belongs to.
    ///
    /// `already_passed` is true when another proposal for the game has passed.
    pub fn validate(
        &self,
        ledger: &CentreCountLedger,
        dias: bool,
        already_passed: bool,
    ) -> Result<(), ValidationError> {
        self.validate_shape()?;

        if self.passed && already_passed {
            return Err(DrawConflict::AlreadyPassed.into());
        }

        let Some(year) = self.decision_year(ledger) else {
            return Ok(());
        };
        for cc in ledger.carried_counts(year) {
            if self.includes(cc.power) {
                if cc.count == 0 {
                    return Err(DrawConflict::DeadPowerIncluded(cc.power).into());
                }
            } else if dias && cc.count > 0 {
                return Err(DrawConflict::MissingSurvivor(cc.power).into());
            }
        }
        Ok(())
    }

    /// Ledger year whose counts the proposal is judged against
    pub fn decision_year(&self, ledger: &CentreCountLedger) -> Option<u16> {
        ledger
            .latest_year_not_after(self.year)
            .or_else(|| ledger.final_year())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use GreatPower::*;

    fn ledger_with(counts: &[(GreatPower, u8)]) -> CentreCountLedger {
        let mut ledger = CentreCountLedger::new();
        for &(power, count) in counts {
            ledger.record(power, 1905, count, None).unwrap();
        }
        ledger
    }

    #[test]
    fn test_powers_and_size() {
        let draw = DrawProposal::new(1905, Season::Fall, &[France, England, Turkey], true);
        assert_eq!(draw.draw_size(), 3);
        assert_eq!(draw.powers(), vec![France, England, Turkey]);
        assert!(draw.includes(England));
        assert!(!draw.includes(Italy));
        assert!(!draw.is_concession());
    }

    #[test]
    fn test_gap_in_slots_rejected() {
        let mut draw = DrawProposal::new(1905, Season::Spring, &[France], false);
        draw.slots[2] = Some(Germany);
        assert!(matches!(
            draw.validate_shape(),
            Err(ValidationError::InvalidDrawProposal(_))
        ));
    }

    #[test]
    fn test_duplicate_and_empty_rejected() {
        let dup = DrawProposal::new(1905, Season::Spring, &[France, France], false);
        assert!(dup.validate_shape().is_err());

        let empty = DrawProposal::new(1905, Season::Spring, &[], false);
        assert!(empty.validate_shape().is_err());

        let early = DrawProposal::new(1900, Season::Spring, &[France], false);
        assert!(matches!(
            early.validate_shape(),
            Err(ValidationError::InvalidYear { year: 1900, .. })
        ));

        let votes = DrawProposal::new(1905, Season::Spring, &[France], false).with_votes(8);
        assert!(votes.validate_shape().is_err());
    }

    #[test]
    fn test_second_passed_proposal_conflicts() {
        let ledger = ledger_with(&[(France, 10), (England, 10)]);
        let draw = DrawProposal::new(1905, Season::Fall, &[France, England], true);
        assert_eq!(
            draw.validate(&ledger, false, true),
            Err(ValidationError::DrawProposalConflict(DrawConflict::AlreadyPassed))
        );
        // A failed proposal may follow a passed one
        let failed = DrawProposal::new(1905, Season::Fall, &[France, England], false);
        assert!(failed.validate(&ledger, false, true).is_ok());
    }

    #[test]
    fn test_dead_power_rejected() {
        let ledger = ledger_with(&[(France, 10), (England, 10), (Italy, 0)]);
        let draw = DrawProposal::new(1906, Season::Spring, &[France, Italy], true);
        assert_eq!(
            draw.validate(&ledger, false, false),
            Err(ValidationError::DrawProposalConflict(
                DrawConflict::DeadPowerIncluded(Italy)
            ))
        );
    }

    #[test]
    fn test_earlier_elimination_carries_into_decision_year() {
        let mut ledger = CentreCountLedger::new();
        ledger.record(Italy, 1904, 0, None).unwrap();
        ledger.record(Turkey, 1904, 2, None).unwrap();
        ledger.record(France, 1905, 10, None).unwrap();
        ledger.record(England, 1905, 10, None).unwrap();

        let draw = DrawProposal::new(1905, Season::Fall, &[France, England, Italy], true);
        assert_eq!(
            draw.validate(&ledger, false, false),
            Err(ValidationError::DrawProposalConflict(
                DrawConflict::DeadPowerIncluded(Italy)
            ))
        );

        // Turkey has no 1905 record but still holds two centres
        let draw = DrawProposal::new(1905, Season::Fall, &[France, England], true);
        assert_eq!(
            draw.validate(&ledger, true, false),
            Err(ValidationError::DrawProposalConflict(
                DrawConflict::MissingSurvivor(Turkey)
            ))
        );
    }

    #[test]
    fn test_dias_requires_all_survivors() {
        let ledger = ledger_with(&[(France, 10), (England, 10), (Italy, 1), (Turkey, 0)]);
        let draw = DrawProposal::new(1906, Season::Spring, &[France, England], true);
        assert_eq!(
            draw.validate(&ledger, true, false),
            Err(ValidationError::DrawProposalConflict(
                DrawConflict::MissingSurvivor(Italy)
            ))
        );
        // Without DIAS the same proposal is fine
        assert!(draw.validate(&ledger, false, false).is_ok());

        let full = DrawProposal::new(1906, Season::Spring, &[France, England, Italy], true);
        assert!(full.validate(&ledger, true, false).is_ok());
    }
}
