//! Repository integration tests against a temporary SQLite database.

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use tempfile::TempDir;

use formue_core::accounts::{Account, AccountRepositoryTrait};
use formue_core::connections::{
    ConnectionRepositoryTrait, ConnectionSyncStatus, NewBrokerConnection,
};
use formue_core::errors::{DatabaseError, Error};
use formue_core::holdings::{Holding, HoldingRepositoryTrait};
use formue_core::mappings::{MappingRepositoryTrait, NewAccountMapping};
use formue_core::sync_history::{SyncHistoryRepositoryTrait, SyncHistoryStatus};
use formue_core::transactions::{NewTransaction, TransactionRepositoryTrait};
use formue_storage_sqlite::accounts::AccountRepository;
use formue_storage_sqlite::connections::ConnectionRepository;
use formue_storage_sqlite::db::{init, DbPool, WriteHandle};
use formue_storage_sqlite::holdings::HoldingRepository;
use formue_storage_sqlite::mappings::MappingRepository;
use formue_storage_sqlite::sync_history::SyncHistoryRepository;
use formue_storage_sqlite::transactions::TransactionRepository;

struct TestDb {
    // Held so the database file outlives the test body.
    _dir: TempDir,
    pool: DbPool,
    writer: WriteHandle,
}

fn test_db() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    let (pool, writer) = init(path.to_str().unwrap()).unwrap();
    TestDb {
        _dir: dir,
        pool,
        writer,
    }
}

async fn seed_account(db: &TestDb, id: &str) -> Account {
    let repository = AccountRepository::new(db.pool.clone(), db.writer.clone());
    let now = Utc::now();
    repository
        .insert(Account {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            name: format!("Account {id}"),
            currency: "DKK".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

async fn seed_connection(db: &TestDb, broker_type: &str) -> String {
    let repository = ConnectionRepository::new(db.pool.clone(), db.writer.clone());
    let connection = repository
        .create(NewBrokerConnection {
            user_id: "user-1".to_string(),
            broker_type: broker_type.to_string(),
            country: Some("dk".to_string()),
            username: Some("encrypted-username".to_string()),
            app_key: Some("app-key".to_string()),
            app_secret: None,
            redirect_uri: Some("http://localhost:5173/callback".to_string()),
        })
        .await
        .unwrap();
    connection.id
}

#[tokio::test]
async fn connection_round_trip_and_sync_status() {
    let db = test_db();
    let repository = ConnectionRepository::new(db.pool.clone(), db.writer.clone());
    let connection_id = seed_connection(&db, "nordnet").await;

    let loaded = repository.get_by_id(&connection_id).unwrap();
    assert_eq!(loaded.broker_type, "nordnet");
    assert!(loaded.last_sync_status.is_none());

    repository
        .update_sync_status(
            &connection_id,
            ConnectionSyncStatus::AuthFailed,
            Some("Session expired".to_string()),
        )
        .await
        .unwrap();

    let updated = repository.get_by_id(&connection_id).unwrap();
    assert_eq!(updated.last_sync_status.as_deref(), Some("auth_failed"));
    assert_eq!(updated.last_sync_error.as_deref(), Some("Session expired"));
    assert!(updated.last_sync_at.is_some());
}

#[tokio::test]
async fn one_connection_per_user_and_broker() {
    let db = test_db();
    let repository = ConnectionRepository::new(db.pool.clone(), db.writer.clone());
    seed_connection(&db, "nordnet").await;

    let duplicate = repository
        .create(NewBrokerConnection {
            user_id: "user-1".to_string(),
            broker_type: "nordnet".to_string(),
            country: Some("dk".to_string()),
            username: Some("other".to_string()),
            app_key: None,
            app_secret: None,
            redirect_uri: None,
        })
        .await;

    assert!(matches!(
        duplicate,
        Err(Error::Database(DatabaseError::UniqueViolation(_)))
    ));
}

#[tokio::test]
async fn mapping_uniqueness_is_enforced_both_ways() {
    let db = test_db();
    let repository = MappingRepository::new(db.pool.clone(), db.writer.clone());
    let connection_id = seed_connection(&db, "saxo").await;
    seed_account(&db, "acc-1").await;
    seed_account(&db, "acc-2").await;

    repository
        .create(NewAccountMapping {
            connection_id: connection_id.clone(),
            account_id: "acc-1".to_string(),
            external_account_id: "ext-1".to_string(),
            external_account_name: Some("Aktiedepot".to_string()),
            auto_sync: true,
        })
        .await
        .unwrap();

    // Same external account again.
    let same_external = repository
        .create(NewAccountMapping {
            connection_id: connection_id.clone(),
            account_id: "acc-2".to_string(),
            external_account_id: "ext-1".to_string(),
            external_account_name: None,
            auto_sync: true,
        })
        .await;
    assert!(matches!(
        same_external,
        Err(Error::Database(DatabaseError::UniqueViolation(_)))
    ));

    // Same local account again.
    let same_local = repository
        .create(NewAccountMapping {
            connection_id: connection_id.clone(),
            account_id: "acc-1".to_string(),
            external_account_id: "ext-2".to_string(),
            external_account_name: None,
            auto_sync: false,
        })
        .await;
    assert!(matches!(
        same_local,
        Err(Error::Database(DatabaseError::UniqueViolation(_)))
    ));

    let found = repository
        .get_by_external_id(&connection_id, "ext-1")
        .unwrap()
        .unwrap();
    assert_eq!(found.account_id, "acc-1");
}

#[tokio::test]
async fn auto_sync_filter_only_returns_enabled_mappings() {
    let db = test_db();
    let repository = MappingRepository::new(db.pool.clone(), db.writer.clone());
    let connection_id = seed_connection(&db, "saxo").await;
    seed_account(&db, "acc-1").await;
    seed_account(&db, "acc-2").await;

    for (account, external, auto) in [("acc-1", "ext-1", true), ("acc-2", "ext-2", false)] {
        repository
            .create(NewAccountMapping {
                connection_id: connection_id.clone(),
                account_id: account.to_string(),
                external_account_id: external.to_string(),
                external_account_name: None,
                auto_sync: auto,
            })
            .await
            .unwrap();
    }

    assert_eq!(repository.list_by_connection(&connection_id).unwrap().len(), 2);
    let auto = repository.list_auto_sync(&connection_id).unwrap();
    assert_eq!(auto.len(), 1);
    assert_eq!(auto[0].account_id, "acc-1");
}

fn holding(account_id: &str, symbol: &str, market_value: rust_decimal::Decimal) -> Holding {
    Holding {
        id: uuid::Uuid::new_v4().to_string(),
        account_id: account_id.to_string(),
        symbol: symbol.to_string(),
        name: Some(symbol.to_string()),
        quantity: dec!(1),
        average_price: market_value,
        current_price: market_value,
        market_value,
        currency: "DKK".to_string(),
        instrument_type: Some("stock".to_string()),
        synced_at: Utc::now(),
    }
}

#[tokio::test]
async fn holdings_upsert_replaces_in_place_and_stale_rows_are_deleted() {
    let db = test_db();
    let repository = HoldingRepository::new(db.pool.clone(), db.writer.clone());
    seed_account(&db, "acc-1").await;

    let earlier = Utc::now() - Duration::hours(1);
    let mut a = holding("acc-1", "A", dec!(100));
    a.synced_at = earlier;
    let mut b = holding("acc-1", "B", dec!(50));
    b.synced_at = earlier;
    repository.upsert(a).await.unwrap();
    repository.upsert(b).await.unwrap();

    let first_pass = repository.list_by_account("acc-1").unwrap();
    assert_eq!(first_pass.len(), 2);
    let original_id = first_pass.iter().find(|h| h.symbol == "A").unwrap().id.clone();

    // Second pass touches only A.
    let pass_time = Utc::now();
    let mut refreshed = holding("acc-1", "A", dec!(120));
    refreshed.synced_at = pass_time;
    repository.upsert(refreshed).await.unwrap();
    let removed = repository.delete_stale("acc-1", pass_time).await.unwrap();
    assert_eq!(removed, 1);

    let remaining = repository.list_by_account("acc-1").unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].symbol, "A");
    assert_eq!(remaining[0].market_value, dec!(120));
    // Upsert kept the original row, only the snapshot changed.
    assert_eq!(remaining[0].id, original_id);
}

#[tokio::test]
async fn latest_balance_follows_insertion_order() {
    let db = test_db();
    let repository = TransactionRepository::new(db.pool.clone(), db.writer.clone());
    seed_account(&db, "acc-1").await;

    assert!(repository.get_latest_balance("acc-1").unwrap().is_none());

    for (amount, balance) in [(dec!(1000), dec!(1000)), (dec!(150), dec!(1150))] {
        repository
            .create(NewTransaction {
                account_id: "acc-1".to_string(),
                description: "Broker sync adjustment".to_string(),
                amount,
                balance,
                transaction_date: Utc::now().date_naive(),
            })
            .await
            .unwrap();
    }

    assert_eq!(
        repository.get_latest_balance("acc-1").unwrap(),
        Some(dec!(1150))
    );
}

#[tokio::test]
async fn sync_history_opens_and_closes_once() {
    let db = test_db();
    let repository = SyncHistoryRepository::new(db.pool.clone(), db.writer.clone());
    let connection_id = seed_connection(&db, "nordnet").await;

    let started = repository.start(&connection_id).await.unwrap();
    assert_eq!(started.status, SyncHistoryStatus::Started);
    assert!(started.completed_at.is_none());

    repository.complete(&started.id, 2, 17).await.unwrap();

    let records = repository.list_by_connection(&connection_id).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, SyncHistoryStatus::Success);
    assert_eq!(records[0].accounts_synced, 2);
    assert_eq!(records[0].positions_synced, 17);
    assert!(records[0].completed_at.is_some());
    assert!(records[0].duration().is_some());

    let failed = repository.start(&connection_id).await.unwrap();
    repository.fail(&failed.id, "Session expired").await.unwrap();
    let records = repository.list_by_connection(&connection_id).unwrap();
    let failure = records.iter().find(|r| r.id == failed.id).unwrap();
    assert_eq!(failure.status, SyncHistoryStatus::Error);
    assert_eq!(failure.error_message.as_deref(), Some("Session expired"));
}

#[tokio::test]
async fn deleting_a_connection_cascades() {
    let db = test_db();
    let connections = ConnectionRepository::new(db.pool.clone(), db.writer.clone());
    let mappings = MappingRepository::new(db.pool.clone(), db.writer.clone());
    let history = SyncHistoryRepository::new(db.pool.clone(), db.writer.clone());
    let connection_id = seed_connection(&db, "saxo").await;
    seed_account(&db, "acc-1").await;

    mappings
        .create(NewAccountMapping {
            connection_id: connection_id.clone(),
            account_id: "acc-1".to_string(),
            external_account_id: "ext-1".to_string(),
            external_account_name: None,
            auto_sync: true,
        })
        .await
        .unwrap();
    let record = history.start(&connection_id).await.unwrap();
    history.complete(&record.id, 1, 1).await.unwrap();

    assert_eq!(connections.delete(&connection_id).await.unwrap(), 1);
    assert!(mappings.list_by_connection(&connection_id).unwrap().is_empty());
    assert!(history.list_by_connection(&connection_id).unwrap().is_empty());
}

#[tokio::test]
async fn account_lookup_resolves_seeded_rows() {
    let db = test_db();
    let repository = AccountRepository::new(db.pool.clone(), db.writer.clone());
    let account = seed_account(&db, "acc-1").await;

    let loaded = repository.get_by_id("acc-1").unwrap();
    assert_eq!(loaded.name, account.name);
    assert_eq!(loaded.currency, "DKK");

    let missing = repository.get_by_id("acc-404");
    assert!(matches!(
        missing,
        Err(Error::Database(DatabaseError::NotFound(_)))
    ));
}
