use std::sync::Arc;

use backon::{BackoffBuilder, ExponentialBuilder};
use chrono::{NaiveDate, Utc};
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::catalog::{CatalogCache, FareCatalog, FareQuote};
use crate::ledger::LedgerConfig;
use crate::models::{Registration, Ticket, TicketRecord, TicketingError, UserAccount, UserProfile};
use crate::session::Session;
use crate::storage::{DocumentStore, Versioned};
use crate::types::{Money, StationId, TicketId};

/// A rider's request to buy a ticket for a given day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub origin: StationId,
    pub destination: StationId,
    pub travel_date: NaiveDate,
    pub passenger_count: u32
}

/// Outcome of a completed purchase: the stored ticket and the balance left
/// after paying for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub ticket_id: TicketId,
    pub ticket: Ticket,
    pub balance: Money
}

/// Owns every stored-value balance and the tickets paid from them.
///
/// Balance changes are read-modify-write cycles guarded by the store's
/// conditional write, so two writers racing on one account can never both
/// succeed against the same starting balance. The loser sees a conflict,
/// re-reads and re-validates.
pub struct BalanceLedger<S: DocumentStore> {
    store: Arc<S>,
    catalog: CatalogCache,
    backoff: ExponentialBuilder
}

impl<S: DocumentStore> BalanceLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: LedgerConfig) -> Self {
        Self {
            store,
            catalog: CatalogCache::new(),
            backoff: config.backoff()
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Opens a zero-balance account for a newly signed-up user.
    pub async fn register(&self, registration: Registration) -> Result<UserAccount, TicketingError> {
        let account = UserAccount::open(registration);

        let created = self.retrying("register", || Ok(self.store.create_account(account.clone())?)).await?;

        debug!("Account for user [{}] registered", created.document.user_id);

        Ok(created.document)
    }

    pub async fn account(&self, user_id: &str) -> Result<UserAccount, TicketingError> {
        self.retrying("read_account", || self.load(user_id)).await
            .map(|versioned| versioned.document)
    }

    pub async fn get_balance(&self, user_id: &str) -> Result<Money, TicketingError> {
        self.account(user_id).await.map(|account| account.balance)
    }

    /// Adds `amount` to the user's balance and returns the new balance.
    pub async fn credit(&self, user_id: &str, amount: Money) -> Result<Money, TicketingError> {
        if !amount.is_positive() {
            return Err(TicketingError::invalid_amount(user_id, amount));
        }

        let balance = self.mutate(user_id, "credit", |account| account.credit(amount)).await?;

        debug!("Credited [{amount}] to user [{user_id}], balance is now [{balance}]");

        Ok(balance)
    }

    /// Removes `amount` from the user's balance and returns the new balance.
    ///
    /// Nothing is written when the balance cannot cover `amount`.
    pub async fn debit(&self, user_id: &str, amount: Money) -> Result<Money, TicketingError> {
        if !amount.is_positive() {
            return Err(TicketingError::invalid_amount(user_id, amount));
        }

        let balance = self.mutate(user_id, "debit", |account| account.debit(amount)).await?;

        debug!("Debited [{amount}] from user [{user_id}], balance is now [{balance}]");

        Ok(balance)
    }

    /// Tops up the stored-value balance of the signed-in user.
    pub async fn recharge(&self, session: &Session, amount: Money) -> Result<Money, TicketingError> {
        self.credit(session.user_id(), amount).await
    }

    pub async fn update_profile(&self, session: &Session, profile: UserProfile) -> Result<UserAccount, TicketingError> {
        self.mutate(session.user_id(), "update_profile", |account| {
            account.profile = profile.clone();
            Ok(account.clone())
        })
        .await
    }

    /// The fare catalog, read from the store on first use.
    pub async fn catalog(&self) -> Result<Arc<FareCatalog>, TicketingError> {
        let mut delays = self.backoff.build();

        loop {
            match self.catalog.get_or_load(&self.store).await {
                Err(error) if error.is_retryable() => match delays.next() {
                    Some(delay) => {
                        warn!("Loading the fare catalog failed, retrying in {delay:?}: {error}");
                        sleep(delay).await;
                    }
                    None => return Err(error)
                },
                result => return result
            }
        }
    }

    pub async fn lookup_fare(&self, origin: &str, destination: &str, passenger_count: u32) -> Result<Money, TicketingError> {
        self.catalog().await?.lookup_fare(origin, destination, passenger_count)
    }

    pub async fn quote(&self, origin: &str, destination: &str, passenger_count: u32) -> Result<FareQuote, TicketingError> {
        self.catalog().await?.quote(origin, destination, passenger_count)
    }

    /// Prices the journey, charges the signed-in user and records the ticket.
    ///
    /// Either both the debit and the ticket are persisted or neither is: a
    /// rejected quote or debit writes nothing, and a ticket that cannot be
    /// stored has its fare credited back before the error is returned.
    ///
    /// # Errors
    /// - Any fare lookup error, before the balance is touched.
    /// - `InsufficientFunds` if the balance cannot cover the fare.
    /// - `StoreUnavailable` if the ticket could not be stored and the fare was refunded.
    /// - `CompensationFailed` if the ticket could not be stored and the refund failed too.
    pub async fn purchase_ticket(&self, session: &Session, request: &PurchaseRequest) -> Result<PurchaseReceipt, TicketingError> {
        let user_id = session.user_id();
        let quote = self.quote(&request.origin, &request.destination, request.passenger_count).await?;
        let balance = self.debit(user_id, quote.total).await?;
        let ticket = Ticket::issue(user_id, &quote, request.travel_date, Utc::now());

        let appended = self.retrying("append_ticket", || Ok(self.store.append_ticket(ticket.clone())?)).await;

        match appended {
            Ok(ticket_id) => {
                debug!("Ticket [{ticket_id}] issued to user [{user_id}] for [{}] -> [{}]", quote.origin, quote.destination);

                Ok(PurchaseReceipt { ticket_id, ticket, balance })
            }
            Err(append_error) => {
                warn!("Ticket for user [{user_id}] could not be recorded, refunding [{}]: {append_error}", quote.total);

                match self.credit(user_id, quote.total).await {
                    Ok(_) => Err(TicketingError::StoreUnavailable { reason: append_error.to_string() }),
                    Err(refund_error) => {
                        error!("Refund of [{}] to user [{user_id}] failed: {refund_error}", quote.total);

                        Err(TicketingError::CompensationFailed { user_id: user_id.to_string(), amount: quote.total })
                    }
                }
            }
        }
    }

    /// Every ticket the user has bought, oldest first.
    pub async fn list_tickets(&self, user_id: &str) -> Result<Vec<TicketRecord>, TicketingError> {
        self.retrying("list_tickets", || Ok(self.store.list_tickets(user_id)?)).await
    }

    fn load(&self, user_id: &str) -> Result<Versioned<UserAccount>, TicketingError> {
        self.store.read_account(user_id)?
            .ok_or_else(|| TicketingError::account_not_found(user_id))
    }

    async fn mutate<T>(
        &self,
        user_id: &str,
        operation: &'static str,
        apply: impl Fn(&mut UserAccount) -> Result<T, TicketingError>
    ) -> Result<T, TicketingError> {
        self.retrying(operation, || {
            let Versioned { version, mut document } = self.load(user_id)?;
            let outcome = apply(&mut document)?;

            self.store.write_account(document, version)?;

            Ok(outcome)
        })
        .await
    }

    async fn retrying<T>(
        &self,
        operation: &'static str,
        mut attempt: impl FnMut() -> Result<T, TicketingError>
    ) -> Result<T, TicketingError> {
        let mut delays = self.backoff.build();

        loop {
            match attempt() {
                Err(error) if error.is_retryable() => match delays.next() {
                    Some(delay) => {
                        warn!("{operation} failed, retrying in {delay:?}: {error}");
                        sleep(delay).await;
                    }
                    None => return Err(error)
                },
                result => return result
            }
        }
    }
}
