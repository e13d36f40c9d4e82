use super::{BalanceLedger, LedgerConfig, PurchaseRequest};
use crate::catalog::FareTableDocument;
use crate::models::{Registration, Ticket, TicketRecord, TicketStatus, TicketingError, UserAccount, UserProfile};
use crate::session::SessionHub;
use crate::storage::{DocumentStore, Fault, MemoryStore, StoreError, StoreOperation, Versioned};
use crate::types::{Money, TicketId};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn fast_config() -> LedgerConfig {
    LedgerConfig::default()
        .with_min_delay(Duration::from_millis(1))
        .with_max_delay(Duration::from_millis(5))
}

fn create_store() -> Result<MemoryStore> {
    let document = FareTableDocument::default()
        .with_fare("Pallabi", "Shahbagh", Decimal::from_str("30")?)
        .with_fare("Shahbagh", "Pallabi", Decimal::from_str("30")?)
        .with_fare("Pallabi", "Agargaon", Decimal::from_str("20")?)
        .with_fare("Agargaon", "Kazipara", Decimal::ZERO);

    Ok(MemoryStore::new().with_fare_table(document))
}

async fn create_ledger_with_rider<S: DocumentStore>(store: S, balance: &str) -> Result<BalanceLedger<S>> {
    let ledger = BalanceLedger::with_config(Arc::new(store), fast_config());

    ledger.register(registration("rider-1")).await?;

    let balance = Money::from_str(balance)?;

    if balance.is_positive() {
        ledger.credit("rider-1", balance).await?;
    }

    Ok(ledger)
}

fn registration(user_id: &str) -> Registration {
    Registration {
        user_id: user_id.to_string(),
        username: "rider".to_string(),
        contact: "01700000000".to_string(),
        rapid_pass_id: Some("RP-0001".to_string())
    }
}

fn purchase(origin: &str, destination: &str, passenger_count: u32) -> Result<PurchaseRequest> {
    Ok(PurchaseRequest {
        origin: origin.to_string(),
        destination: destination.to_string(),
        travel_date: NaiveDate::from_ymd_opt(2026, 10, 15).ok_or_else(|| anyhow!("invalid date"))?,
        passenger_count
    })
}

#[tokio::test]
async fn test_registration_opens_zero_balance_account() -> Result<()> {
    let ledger = BalanceLedger::with_config(Arc::new(create_store()?), fast_config());

    let account = ledger.register(registration("rider-1")).await?;

    assert!(account.balance.is_zero());
    assert!(ledger.get_balance("rider-1").await?.is_zero());
    assert!(matches!(ledger.register(registration("rider-1")).await, Err(TicketingError::AccountExists { .. })));

    Ok(())
}

#[tokio::test]
async fn test_operations_on_missing_account_fail() -> Result<()> {
    let ledger = BalanceLedger::with_config(Arc::new(create_store()?), fast_config());
    let amount = Money::from_str("10")?;

    assert!(matches!(ledger.get_balance("ghost").await, Err(TicketingError::AccountNotFound { .. })));
    assert!(matches!(ledger.credit("ghost", amount).await, Err(TicketingError::AccountNotFound { .. })));
    assert!(matches!(ledger.debit("ghost", amount).await, Err(TicketingError::AccountNotFound { .. })));

    Ok(())
}

#[tokio::test]
async fn test_credit_rejects_non_positive_amounts() -> Result<()> {
    let ledger = create_ledger_with_rider(create_store()?, "50").await?;

    let result = ledger.credit("rider-1", Money::ZERO).await;

    assert!(matches!(result, Err(TicketingError::InvalidAmount { .. })));
    assert_eq!(ledger.get_balance("rider-1").await?, Money::from_str("50")?);

    Ok(())
}

#[tokio::test]
async fn test_non_positive_amount_is_rejected_before_account_lookup() -> Result<()> {
    let store = create_store()?;
    store.inject(StoreOperation::ReadAccount, Fault::Unavailable, 3);
    let ledger = BalanceLedger::with_config(Arc::new(store), fast_config());

    assert!(matches!(ledger.credit("ghost", Money::ZERO).await, Err(TicketingError::InvalidAmount { .. })));
    assert!(matches!(ledger.debit("ghost", Money::ZERO).await, Err(TicketingError::InvalidAmount { .. })));
    assert!(matches!(ledger.debit("ghost", Money::from_str("-5")?).await, Err(TicketingError::InvalidAmount { .. })));

    // No read was attempted, so every injected fault is still pending.
    assert!(matches!(ledger.get_balance("ghost").await, Err(TicketingError::StoreUnavailable { .. })));

    Ok(())
}

#[tokio::test]
async fn test_debit_beyond_balance_leaves_balance_unchanged() -> Result<()> {
    let ledger = create_ledger_with_rider(create_store()?, "25.50").await?;

    let result = ledger.debit("rider-1", Money::from_str("25.51")?).await;

    assert!(matches!(result, Err(TicketingError::InsufficientFunds { .. })));
    assert_eq!(ledger.get_balance("rider-1").await?, Money::from_str("25.50")?);

    Ok(())
}

#[tokio::test]
async fn test_debit_then_credit_restores_balance() -> Result<()> {
    let ledger = create_ledger_with_rider(create_store()?, "500").await?;
    let amount = Money::from_str("123.45")?;

    assert_eq!(ledger.debit("rider-1", amount).await?, Money::from_str("376.55")?);
    assert_eq!(ledger.credit("rider-1", amount).await?, Money::from_str("500")?);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_debits_never_overdraw() -> Result<()> {
    for _ in 0..25 {
        let ledger = Arc::new(create_ledger_with_rider(create_store()?, "100").await?);
        let amount = Money::from_str("60")?;

        let first = tokio::spawn({
            let ledger = ledger.clone();
            async move { ledger.debit("rider-1", amount).await }
        });
        let second = tokio::spawn({
            let ledger = ledger.clone();
            async move { ledger.debit("rider-1", amount).await }
        });

        let results = [first.await?, second.await?];
        let successes = results.iter().filter(|result| result.is_ok()).count();

        assert_eq!(successes, 1);
        assert!(results.iter().any(|result| matches!(
            result,
            Err(TicketingError::InsufficientFunds { .. } | TicketingError::WriteConflict { .. })
        )));
        assert_eq!(ledger.get_balance("rider-1").await?, Money::from_str("40")?);
    }

    Ok(())
}

#[tokio::test]
async fn test_write_conflict_is_retried_against_a_fresh_read() -> Result<()> {
    let ledger = create_ledger_with_rider(create_store()?, "100").await?;
    ledger.store().inject(StoreOperation::WriteAccount, Fault::Conflict, 2);

    let balance = ledger.debit("rider-1", Money::from_str("60")?).await?;

    assert_eq!(balance, Money::from_str("40")?);

    Ok(())
}

#[tokio::test]
async fn test_persistent_write_conflict_is_surfaced_after_bounded_attempts() -> Result<()> {
    let ledger = create_ledger_with_rider(create_store()?, "100").await?;
    ledger.store().inject(StoreOperation::WriteAccount, Fault::Conflict, 3);

    let result = ledger.debit("rider-1", Money::from_str("60")?).await;

    assert!(matches!(result, Err(TicketingError::WriteConflict { .. })));
    assert_eq!(ledger.get_balance("rider-1").await?, Money::from_str("100")?);

    Ok(())
}

#[tokio::test]
async fn test_insufficient_funds_follows_a_transient_read_failure() -> Result<()> {
    let ledger = create_ledger_with_rider(create_store()?, "10").await?;
    ledger.store().inject(StoreOperation::ReadAccount, Fault::Unavailable, 1);

    let result = ledger.debit("rider-1", Money::from_str("30")?).await;

    assert!(matches!(result, Err(TicketingError::InsufficientFunds { .. })));

    Ok(())
}

#[tokio::test]
async fn test_purchase_debits_fare_and_records_running_ticket() -> Result<()> {
    let ledger = create_ledger_with_rider(create_store()?, "500").await?;
    let hub = SessionHub::new();
    let session = hub.sign_in("rider-1");

    let receipt = ledger.purchase_ticket(&session, &purchase("Pallabi", "Shahbagh", 1)?).await?;

    assert_eq!(receipt.balance, Money::from_str("470")?);
    assert_eq!(receipt.ticket.fare_charged, Money::from_str("30")?);
    assert_eq!(receipt.ticket.status, TicketStatus::Running);
    assert_eq!(ledger.get_balance("rider-1").await?, Money::from_str("470")?);

    let tickets = ledger.list_tickets("rider-1").await?;

    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].ticket_id, receipt.ticket_id);
    assert_eq!(tickets[0].ticket, receipt.ticket);

    Ok(())
}

#[tokio::test]
async fn test_purchase_for_group_charges_every_passenger() -> Result<()> {
    let ledger = create_ledger_with_rider(create_store()?, "100").await?;
    let session = SessionHub::new().sign_in("rider-1");

    let receipt = ledger.purchase_ticket(&session, &purchase("Pallabi", "Agargaon", 3)?).await?;

    assert_eq!(receipt.ticket.fare_charged, Money::from_str("60")?);
    assert_eq!(receipt.ticket.passenger_count, 3);
    assert_eq!(receipt.balance, Money::from_str("40")?);

    Ok(())
}

#[tokio::test]
async fn test_purchase_with_insufficient_funds_creates_nothing() -> Result<()> {
    let ledger = create_ledger_with_rider(create_store()?, "10").await?;
    let session = SessionHub::new().sign_in("rider-1");

    let result = ledger.purchase_ticket(&session, &purchase("Pallabi", "Shahbagh", 1)?).await;

    assert!(matches!(result, Err(TicketingError::InsufficientFunds { .. })));
    assert_eq!(ledger.get_balance("rider-1").await?, Money::from_str("10")?);
    assert!(ledger.list_tickets("rider-1").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_purchase_on_invalid_routes_is_rejected_before_debit() -> Result<()> {
    let ledger = create_ledger_with_rider(create_store()?, "100").await?;
    let session = SessionHub::new().sign_in("rider-1");

    let same_station = ledger.purchase_ticket(&session, &purchase("Pallabi", "Pallabi", 1)?).await;
    let unpriced = ledger.purchase_ticket(&session, &purchase("Agargaon", "Pallabi", 1)?).await;
    let free_ride = ledger.purchase_ticket(&session, &purchase("Agargaon", "Kazipara", 1)?).await;

    assert!(matches!(same_station, Err(TicketingError::InvalidRoute { .. })));
    assert!(matches!(unpriced, Err(TicketingError::RouteNotFound { .. })));
    assert!(matches!(free_ride, Err(TicketingError::InvalidAmount { .. })));
    assert_eq!(ledger.get_balance("rider-1").await?, Money::from_str("100")?);
    assert!(ledger.list_tickets("rider-1").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_transient_ticket_append_failure_is_retried() -> Result<()> {
    let ledger = create_ledger_with_rider(create_store()?, "100").await?;
    let session = SessionHub::new().sign_in("rider-1");
    ledger.store().inject(StoreOperation::AppendTicket, Fault::Unavailable, 1);

    let receipt = ledger.purchase_ticket(&session, &purchase("Pallabi", "Shahbagh", 1)?).await?;

    assert_eq!(receipt.balance, Money::from_str("70")?);
    assert_eq!(ledger.list_tickets("rider-1").await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_failed_ticket_append_refunds_the_fare() -> Result<()> {
    let ledger = create_ledger_with_rider(create_store()?, "100").await?;
    let session = SessionHub::new().sign_in("rider-1");
    ledger.store().inject(StoreOperation::AppendTicket, Fault::Unavailable, 3);

    let result = ledger.purchase_ticket(&session, &purchase("Pallabi", "Shahbagh", 1)?).await;

    assert!(matches!(result, Err(TicketingError::StoreUnavailable { .. })));
    assert_eq!(ledger.get_balance("rider-1").await?, Money::from_str("100")?);
    assert!(ledger.list_tickets("rider-1").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_conflicting_ticket_append_is_refunded_and_reported_as_unavailable() -> Result<()> {
    let ledger = create_ledger_with_rider(create_store()?, "100").await?;
    let session = SessionHub::new().sign_in("rider-1");
    ledger.store().inject(StoreOperation::AppendTicket, Fault::Conflict, 3);

    let result = ledger.purchase_ticket(&session, &purchase("Pallabi", "Shahbagh", 1)?).await;

    assert!(matches!(result, Err(TicketingError::StoreUnavailable { .. })));
    assert_eq!(ledger.get_balance("rider-1").await?, Money::from_str("100")?);
    assert!(ledger.list_tickets("rider-1").await?.is_empty());

    Ok(())
}

/// Lets the first `allowed` account writes through and then fails every
/// further one, so a refund can be made to fail after a debit succeeded.
struct FailingWritesStore {
    inner: MemoryStore,
    allowed: usize,
    writes: AtomicUsize
}

impl DocumentStore for FailingWritesStore {
    fn read_fare_table(&self) -> Result<Option<FareTableDocument>, StoreError> {
        self.inner.read_fare_table()
    }

    fn read_account(&self, user_id: &str) -> Result<Option<Versioned<UserAccount>>, StoreError> {
        self.inner.read_account(user_id)
    }

    fn create_account(&self, account: UserAccount) -> Result<Versioned<UserAccount>, StoreError> {
        self.inner.create_account(account)
    }

    fn write_account(&self, account: UserAccount, expected_version: u64) -> Result<u64, StoreError> {
        if self.writes.fetch_add(1, Ordering::SeqCst) >= self.allowed {
            return Err(StoreError::Unavailable { operation: StoreOperation::WriteAccount });
        }

        self.inner.write_account(account, expected_version)
    }

    fn append_ticket(&self, _ticket: Ticket) -> Result<TicketId, StoreError> {
        Err(StoreError::Unavailable { operation: StoreOperation::AppendTicket })
    }

    fn list_tickets(&self, user_id: &str) -> Result<Vec<TicketRecord>, StoreError> {
        self.inner.list_tickets(user_id)
    }
}

#[tokio::test]
async fn test_failed_refund_is_reported_as_compensation_failure() -> Result<()> {
    // One write for the initial top-up, one for the debit; the refund never lands.
    let store = FailingWritesStore { inner: create_store()?, allowed: 2, writes: AtomicUsize::new(0) };
    let ledger = create_ledger_with_rider(store, "100").await?;
    let session = SessionHub::new().sign_in("rider-1");

    let fare = Money::from_str("30")?;

    let result = ledger.purchase_ticket(&session, &purchase("Pallabi", "Shahbagh", 1)?).await;

    assert_eq!(result, Err(TicketingError::CompensationFailed { user_id: "rider-1".to_string(), amount: fare }));
    assert_eq!(ledger.get_balance("rider-1").await?, Money::from_str("70")?);

    Ok(())
}

#[tokio::test]
async fn test_fare_catalog_is_loaded_once() -> Result<()> {
    let ledger = BalanceLedger::with_config(Arc::new(create_store()?), fast_config());

    assert_eq!(ledger.lookup_fare("Pallabi", "Shahbagh", 2).await?, Money::from_str("60")?);
    assert_eq!(ledger.lookup_fare("Shahbagh", "Pallabi", 1).await?, Money::from_str("30")?);
    assert!(ledger.lookup_fare("Pallabi", "Pallabi", 1).await.is_err());

    assert_eq!(ledger.store().fare_table_reads(), 1);

    Ok(())
}

#[tokio::test]
async fn test_fare_catalog_load_is_retried_when_store_is_unavailable() -> Result<()> {
    let store = create_store()?;
    store.inject(StoreOperation::ReadFareTable, Fault::Unavailable, 2);
    let ledger = BalanceLedger::with_config(Arc::new(store), fast_config());

    assert_eq!(ledger.lookup_fare("Pallabi", "Shahbagh", 1).await?, Money::from_str("30")?);

    Ok(())
}

#[tokio::test]
async fn test_missing_fare_table_is_reported_as_malformed_catalog() -> Result<()> {
    let ledger = BalanceLedger::with_config(Arc::new(MemoryStore::new()), fast_config());

    let result = ledger.lookup_fare("Pallabi", "Shahbagh", 1).await;

    assert!(matches!(result, Err(TicketingError::MalformedCatalog { .. })));

    Ok(())
}

#[tokio::test]
async fn test_recharge_and_profile_update_act_on_session_user() -> Result<()> {
    let ledger = create_ledger_with_rider(create_store()?, "0").await?;
    let session = SessionHub::new().sign_in("rider-1");

    assert_eq!(ledger.recharge(&session, Money::from_str("200")?).await?, Money::from_str("200")?);

    let profile = UserProfile {
        username: "rider".to_string(),
        contact: "01800000000".to_string(),
        address: Some("Mirpur 10".to_string())
    };
    let account = ledger.update_profile(&session, profile.clone()).await?;

    assert_eq!(account.profile, profile);
    assert_eq!(account.balance, Money::from_str("200")?);
    assert_eq!(ledger.account("rider-1").await?.profile, profile);

    Ok(())
}

#[test]
fn test_config_never_drops_below_one_attempt() {
    let config = LedgerConfig::default().with_max_attempts(0);

    assert_eq!(config.max_attempts, 1);
    assert_eq!(LedgerConfig::default().max_attempts, 3);
}
