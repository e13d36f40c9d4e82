mod errors;
mod memory_store;

use crate::catalog::FareTableDocument;
use crate::models::{Ticket, TicketRecord, UserAccount};
use crate::types::TicketId;

pub use errors::{StoreError, StoreOperation};
pub use memory_store::{Fault, MemoryStore};

/// A document paired with the version it was read at.
///
/// Writes must present the version they were derived from; the store rejects
/// the write if the document has moved on since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: u64,
    pub document: T
}

/// The narrow contracts the ticketing core needs from the remote document store.
///
/// Every call may fail with `StoreError::Unavailable`, which stands in for the
/// store's own timeout.
pub trait DocumentStore: Send + Sync + 'static {
    fn read_fare_table(&self) -> Result<Option<FareTableDocument>, StoreError>;
    fn read_account(&self, user_id: &str) -> Result<Option<Versioned<UserAccount>>, StoreError>;
    fn create_account(&self, account: UserAccount) -> Result<Versioned<UserAccount>, StoreError>;
    /// Replaces the account only if its stored version still equals `expected_version`.
    fn write_account(&self, account: UserAccount, expected_version: u64) -> Result<u64, StoreError>;
    fn append_ticket(&self, ticket: Ticket) -> Result<TicketId, StoreError>;
    fn list_tickets(&self, user_id: &str) -> Result<Vec<TicketRecord>, StoreError>;
}
