use super::types::*;
use crate::core::constants::*;

/// Check if the next level of `kind` is affordable.
pub fn can_afford(record: &UpgradeRecord, kind: UpgradeKind) -> bool {
    record
        .next_cost(kind)
        .is_some_and(|cost| record.balance() >= cost)
}

/// Spend ink on the next level of `kind`. Does not persist; see
/// [`super::UpgradeStore::purchase`]. On error the record is untouched.
pub fn try_purchase(
    record: &mut UpgradeRecord,
    kind: UpgradeKind,
) -> Result<PurchaseReceipt, PurchaseError> {
    let level = record.level(kind);
    let cost = upgrade_cost(level).ok_or(PurchaseError::MaxLevelReached { kind })?;
    if record.dropped_ink < cost {
        return Err(PurchaseError::InsufficientFunds {
            kind,
            cost,
            balance: record.dropped_ink,
        });
    }
    record.dropped_ink -= cost;
    record.set_level(kind, level + 1);
    Ok(PurchaseReceipt {
        kind,
        new_level: level + 1,
        cost,
        balance: record.dropped_ink,
    })
}

/// Add currency, returning the new balance.
pub fn grant_ink(record: &mut UpgradeRecord, amount: u32) -> u32 {
    record.dropped_ink = record.dropped_ink.saturating_add(amount);
    record.dropped_ink
}

/// Ink dropped by the enemy guarding `floor` (1-based).
pub fn floor_reward(floor: u32) -> u32 {
    INKBLOT_INK_DROP + floor.saturating_sub(1) * INK_DROP_PER_FLOOR
}

/// Cheapest upgrade the record can buy right now, ties broken by shop order.
pub fn cheapest_affordable(record: &UpgradeRecord) -> Option<UpgradeKind> {
    UpgradeKind::ALL
        .into_iter()
        .filter(|kind| can_afford(record, *kind))
        .min_by_key(|kind| record.next_cost(*kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_deducts_and_levels() {
        let mut record = UpgradeRecord::with_balance(100);
        let receipt = try_purchase(&mut record, UpgradeKind::Absorbency).unwrap();
        assert_eq!(receipt.new_level, 1);
        assert_eq!(receipt.cost, 20);
        assert_eq!(receipt.balance, 80);
        assert_eq!(record.balance(), 80);
        assert_eq!(record.max_hit_points(), 120);
    }

    #[test]
    fn test_purchase_exact_balance() {
        let mut record = UpgradeRecord::with_balance(20);
        assert!(try_purchase(&mut record, UpgradeKind::Viscosity).is_ok());
        assert_eq!(record.balance(), 0);
    }

    #[test]
    fn test_maxed_checked_before_funds() {
        let mut record = UpgradeRecord::new();
        record.set_level(UpgradeKind::Pigment, MAX_UPGRADE_LEVEL);
        assert_eq!(
            try_purchase(&mut record, UpgradeKind::Pigment),
            Err(PurchaseError::MaxLevelReached {
                kind: UpgradeKind::Pigment
            })
        );
    }

    #[test]
    fn test_can_afford() {
        let record = UpgradeRecord::with_balance(19);
        assert!(!can_afford(&record, UpgradeKind::Viscosity));
        let record = UpgradeRecord::with_balance(20);
        assert!(can_afford(&record, UpgradeKind::Viscosity));
    }

    #[test]
    fn test_floor_reward_scales() {
        assert_eq!(floor_reward(1), 15);
        assert_eq!(floor_reward(2), 23);
        assert_eq!(floor_reward(5), 47);
        // Floor 0 is treated like floor 1
        assert_eq!(floor_reward(0), 15);
    }

    #[test]
    fn test_grant_ink_saturates() {
        let mut record = UpgradeRecord::with_balance(u32::MAX - 1);
        assert_eq!(grant_ink(&mut record, 10), u32::MAX);
    }

    #[test]
    fn test_cheapest_affordable() {
        let mut record = UpgradeRecord::with_balance(60);
        record.set_level(UpgradeKind::Viscosity, 1);
        // Viscosity next costs 50, the rest 20
        assert_eq!(cheapest_affordable(&record), Some(UpgradeKind::Pigment));
        assert_eq!(cheapest_affordable(&UpgradeRecord::with_balance(5)), None);
    }
}
