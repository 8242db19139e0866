//! Integration test: upgrade economy and persistence
//!
//! Purchases, derived values, and write-through storage on disk and in
//! memory, including corrupt, partial and unavailable saves.

use inkflip::core::constants::{MAX_UPGRADE_LEVEL, UPGRADE_COSTS, UPGRADE_SAVE_KEY};
use inkflip::upgrades::{
    bullet_time_ms, damage_multiplier, max_hit_points, tether_speed_multiplier, try_purchase,
    FileStorage, MemoryStorage, PurchaseError, UpgradeKind, UpgradeRecord, UpgradeStorage,
    UpgradeStore,
};
use proptest::prelude::*;
use std::fs;

/// Record with `kind` bought up to `level`, holding `leftover` ink.
fn record_with(kind: UpgradeKind, level: u8, leftover: u32) -> UpgradeRecord {
    let spent: u32 = UPGRADE_COSTS[..level as usize].iter().sum();
    let mut record = UpgradeRecord::with_balance(spent + leftover);
    for _ in 0..level {
        try_purchase(&mut record, kind).unwrap();
    }
    record
}

// =============================================================================
// Purchasing
// =============================================================================

#[test]
fn test_purchase_then_insufficient_funds() {
    let mut store = UpgradeStore::new(MemoryStorage::new());
    let mut record = UpgradeRecord::with_balance(25);

    let receipt = store.purchase(&mut record, UpgradeKind::Pigment).unwrap();
    assert_eq!(receipt.new_level, 1);
    assert_eq!(receipt.cost, 20);
    assert_eq!(record.balance(), 5);
    assert_eq!(record.level(UpgradeKind::Pigment), 1);

    assert_eq!(
        store.purchase(&mut record, UpgradeKind::Pigment),
        Err(PurchaseError::InsufficientFunds {
            kind: UpgradeKind::Pigment,
            cost: 50,
            balance: 5,
        })
    );
    assert_eq!(record.balance(), 5);
    assert_eq!(record.level(UpgradeKind::Pigment), 1);
    assert_eq!(store.load(), record);
}

#[test]
fn test_full_cost_ladder() {
    let total: u32 = UPGRADE_COSTS.iter().sum();
    let mut record = UpgradeRecord::with_balance(total);
    for (level, cost) in UPGRADE_COSTS.iter().enumerate() {
        assert_eq!(record.next_cost(UpgradeKind::Viscosity), Some(*cost));
        let receipt = try_purchase(&mut record, UpgradeKind::Viscosity).unwrap();
        assert_eq!(receipt.new_level as usize, level + 1);
    }
    assert_eq!(record.balance(), 0);
    assert!(record.is_maxed(UpgradeKind::Viscosity));
    assert_eq!(record.next_cost(UpgradeKind::Viscosity), None);
}

#[test]
fn test_failed_purchase_writes_nothing() {
    let mut store = UpgradeStore::new(MemoryStorage::new());
    let mut record = UpgradeRecord::new();
    assert!(store.purchase(&mut record, UpgradeKind::Absorbency).is_err());
    assert!(store.storage().get(UPGRADE_SAVE_KEY).is_none());
}

proptest! {
    #[test]
    fn prop_maxed_purchase_never_changes_balance(leftover in 0u32..100_000, idx in 0usize..4) {
        let kind = UpgradeKind::ALL[idx];
        let mut record = record_with(kind, MAX_UPGRADE_LEVEL, leftover);
        let before = record.clone();

        prop_assert_eq!(
            try_purchase(&mut record, kind),
            Err(PurchaseError::MaxLevelReached { kind })
        );
        prop_assert_eq!(record.balance(), leftover);
        prop_assert_eq!(record, before);
    }

    #[test]
    fn prop_derived_values_are_linear(level in 0u8..=MAX_UPGRADE_LEVEL) {
        let l = level as f64;
        prop_assert_eq!(bullet_time_ms(level), 300 + 100 * level as u64);
        prop_assert!((damage_multiplier(level) - (1.0 + 0.25 * l)).abs() < 1e-9);
        prop_assert!((tether_speed_multiplier(level) - (1.0 + 0.2 * l)).abs() < 1e-9);
        prop_assert_eq!(max_hit_points(level), 100 + 20 * level as u32);
    }
}

#[test]
fn test_record_getters_follow_levels() {
    let record = record_with(UpgradeKind::Absorbency, 2, 0);
    assert_eq!(record.max_hit_points(), 140);
    assert_eq!(record.bullet_time_ms(), 300);
    assert_eq!(
        UpgradeKind::Absorbency.stat_text(&record),
        "Max HP: 140".to_string()
    );
}

#[test]
fn test_upgrade_kind_parses_persisted_keys() {
    for kind in UpgradeKind::ALL {
        assert_eq!(kind.key().parse::<UpgradeKind>(), Ok(kind));
        assert_eq!(kind.to_string(), kind.key());
    }
    assert!("inkiness".parse::<UpgradeKind>().is_err());
}

// =============================================================================
// File Storage
// =============================================================================

#[test]
fn test_file_storage_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = UpgradeStore::new(FileStorage::new(dir.path()));
    let mut record = UpgradeRecord::with_balance(100);

    store.purchase(&mut record, UpgradeKind::TetherTension).unwrap();
    store.grant_reward(&mut record, 15);

    let path = dir.path().join(format!("{UPGRADE_SAVE_KEY}.json"));
    assert!(path.exists());

    let reopened = UpgradeStore::new(FileStorage::new(dir.path()));
    let loaded = reopened.load();
    assert_eq!(loaded, record);
    assert_eq!(loaded.balance(), 95);
    assert_eq!(loaded.level(UpgradeKind::TetherTension), 1);
}

#[test]
fn test_saved_file_uses_flat_camel_case_keys() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = UpgradeStore::new(FileStorage::new(dir.path()));
    store.save(&record_with(UpgradeKind::TetherTension, 1, 7));

    let json = fs::read_to_string(dir.path().join(format!("{UPGRADE_SAVE_KEY}.json"))).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["tetherTension"], 1);
    assert_eq!(value["droppedInk"], 7);
    assert_eq!(value["viscosity"], 0);
}

#[test]
fn test_corrupt_file_loads_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    fs::write(storage.path_for(UPGRADE_SAVE_KEY), "{ not json").unwrap();

    let store = UpgradeStore::new(storage);
    assert_eq!(store.load(), UpgradeRecord::default());
}

#[test]
fn test_partial_file_fills_missing_keys() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    fs::write(
        storage.path_for(UPGRADE_SAVE_KEY),
        r#"{ "pigment": 2, "droppedInk": 40 }"#,
    )
    .unwrap();

    let record = UpgradeStore::new(storage).load();
    assert_eq!(record.level(UpgradeKind::Pigment), 2);
    assert_eq!(record.level(UpgradeKind::Viscosity), 0);
    assert_eq!(record.balance(), 40);
}

#[test]
fn test_out_of_range_levels_are_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    fs::write(storage.path_for(UPGRADE_SAVE_KEY), r#"{ "absorbency": 9 }"#).unwrap();

    let record = UpgradeStore::new(storage).load();
    assert_eq!(record.level(UpgradeKind::Absorbency), MAX_UPGRADE_LEVEL);
    assert_eq!(record.max_hit_points(), 180);
}

#[test]
fn test_missing_directory_is_created_on_save() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let mut store = UpgradeStore::new(FileStorage::new(&nested));
    store.save(&UpgradeRecord::with_balance(3));
    assert_eq!(store.load().balance(), 3);
}

#[test]
fn test_reset_forgets_progress() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = UpgradeStore::new(FileStorage::new(dir.path()));
    store.save(&UpgradeRecord::with_balance(500));

    assert_eq!(store.reset(), UpgradeRecord::default());
    assert_eq!(store.load(), UpgradeRecord::default());
    // A second reset with nothing on disk is fine.
    store.reset();
}

// =============================================================================
// Degraded Storage
// =============================================================================

#[test]
fn test_unavailable_storage_never_panics() {
    let mut store = UpgradeStore::new(MemoryStorage::unavailable());
    let mut record = store.load();
    assert_eq!(record, UpgradeRecord::default());

    store.grant_reward(&mut record, 30);
    let receipt = store.purchase(&mut record, UpgradeKind::Viscosity).unwrap();
    assert_eq!(receipt.balance, 10);
    assert_eq!(record.bullet_time_ms(), 400);

    // Nothing was persisted.
    assert_eq!(store.load(), UpgradeRecord::default());
    assert!(store.storage().read(UPGRADE_SAVE_KEY).is_err());
}
