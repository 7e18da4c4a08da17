//! End-to-end CRUD behavior through the catalog facade.

use mediadb_catalog::{EntityId, EngineError, CatalogError, Model};
use mediadb_testkit::{catalog, media, user};

#[test]
fn create_assigns_sequential_ids_and_get_all_orders_by_id() {
    let catalog = catalog();

    let (first, second) = catalog
        .update(|tx| {
            let first = catalog.media().create(tx, &mut media("A"))?;
            let second = catalog.media().create(tx, &mut media("B"))?;
            Ok((first, second))
        })
        .unwrap();

    assert_eq!(first, EntityId::new(1));
    assert_eq!(second, EntityId::new(2));

    let all = catalog
        .view(|tx| Ok(catalog.media().get_all(tx, None, None)?))
        .unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].meta().id, first);
    assert_eq!(all[0].meta().version, 0);
    assert_eq!(all[1].meta().id, second);
}

#[test]
fn forged_version_is_overwritten_by_the_engine() {
    let catalog = catalog();

    let id = catalog
        .update(|tx| Ok(catalog.media().create(tx, &mut media("A"))?))
        .unwrap();

    catalog
        .update(|tx| {
            let mut record = catalog.media().get_by_id(tx, id)?;
            record.synopsis = "Revised.".into();
            record.meta.version = 999;
            Ok(catalog.media().update(tx, &mut record)?)
        })
        .unwrap();

    let stored = catalog
        .view(|tx| Ok(catalog.media().get_by_id(tx, id)?))
        .unwrap();
    assert_eq!(stored.meta().version, 1);
    assert_eq!(stored.synopsis, "Revised.");
}

#[test]
fn delete_of_unknown_id_is_idempotent() {
    let catalog = catalog();

    catalog
        .update(|tx| Ok(catalog.media().delete(tx, EntityId::new(999))?))
        .unwrap();

    let count = catalog
        .view(|tx| Ok(catalog.media().get_all(tx, None, None)?.len()))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn duplicate_username_is_rejected_by_scan() {
    let catalog = catalog();

    catalog
        .update(|tx| Ok(catalog.users().create(tx, &mut user("rei"))?))
        .unwrap();

    // Same name modulo case and padding; the service lowercases and
    // trims before validating.
    let mut dupe = user("  REI ");
    let result = catalog.update(|tx| Ok(catalog.users().create(tx, &mut dupe)?));
    assert!(matches!(
        result,
        Err(CatalogError::Engine(EngineError::AlreadyExists { .. }))
    ));
}

#[test]
fn password_hash_is_frozen_and_permissions_reset() {
    let catalog = catalog();

    let id = catalog
        .update(|tx| {
            let mut account = user("shinji");
            account.permissions.admin = true; // ignored at create
            Ok(catalog.users().create(tx, &mut account)?)
        })
        .unwrap();

    let original = catalog
        .view(|tx| Ok(catalog.users().get_by_id(tx, id)?))
        .unwrap();
    assert!(!original.permissions.admin, "permissions reset at create");

    catalog
        .update(|tx| {
            let mut account = catalog.users().get_by_id(tx, id)?;
            account.password_hash = "attacker-controlled".into();
            account.email = "new@example.com".into();
            Ok(catalog.users().update(tx, &mut account)?)
        })
        .unwrap();

    let updated = catalog
        .view(|tx| Ok(catalog.users().get_by_id(tx, id)?))
        .unwrap();
    assert_eq!(updated.password_hash, original.password_hash);
    assert_eq!(updated.email, "new@example.com");
    assert_eq!(updated.meta().version, 1);
}

#[test]
fn mutations_in_view_transactions_are_rejected() {
    let catalog = catalog();

    let result = catalog.view(|tx| Ok(catalog.media().create(tx, &mut media("A"))?));
    assert!(matches!(
        result,
        Err(CatalogError::Engine(EngineError::UnwritableTransaction))
    ));
}

#[test]
fn failed_update_rolls_back_every_write_in_the_transaction() {
    let catalog = catalog();

    let result: Result<(), _> = catalog.update(|tx| {
        catalog.media().create(tx, &mut media("kept?"))?;
        // Second write fails validation: no titles.
        catalog.media().create(tx, &mut Default::default())?;
        Ok(())
    });
    assert!(result.is_err());

    let count = catalog
        .view(|tx| Ok(catalog.media().get_all(tx, None, None)?.len()))
        .unwrap();
    assert_eq!(count, 0, "nothing from the failed transaction persists");
}
