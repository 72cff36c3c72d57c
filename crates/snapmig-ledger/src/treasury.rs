use snapmig_snapshot::TreasuryOutput;
use tracing::info;

use crate::error::{LedgerError, LedgerResult};

/// Genesis treasury: the part of `total_supply` not handed out as migration
/// outputs. Dust and not-yet-migrated funds stay in the treasury.
pub fn compute_treasury(total_supply: u64, migrated_total: u64) -> LedgerResult<TreasuryOutput> {
    let amount = total_supply
        .checked_sub(migrated_total)
        .ok_or(LedgerError::SupplyInvariantViolated {
            migrated: migrated_total,
            total_supply,
        })?;
    info!(amount, migrated_total, "genesis treasury computed");
    Ok(TreasuryOutput::genesis(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapmig_types::TOTAL_SUPPLY;

    #[test]
    fn treasury_is_remainder() {
        let treasury = compute_treasury(TOTAL_SUPPLY, 2_000_000).unwrap();
        assert_eq!(treasury.amount, TOTAL_SUPPLY - 2_000_000);
        assert!(treasury.milestone_id.is_null());
        assert!(!treasury.spent);
    }

    #[test]
    fn everything_migrated_leaves_empty_treasury() {
        assert_eq!(compute_treasury(10, 10).unwrap().amount, 0);
    }

    #[test]
    fn over_migration_is_rejected() {
        let err = compute_treasury(10, 11).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::SupplyInvariantViolated { migrated: 11, total_supply: 10 }
        ));
    }
}
