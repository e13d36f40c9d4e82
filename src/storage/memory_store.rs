use crate::catalog::FareTableDocument;
use crate::models::{Ticket, TicketRecord, UserAccount};
use crate::storage::{DocumentStore, StoreError, StoreOperation, Versioned};
use crate::types::{TicketId, UserId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Failure modes that can be scheduled against a [`MemoryStore`] operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Unavailable,
    Conflict
}

/// In-process document store with per-document conditional writes.
pub struct MemoryStore {
    fare_table: Option<FareTableDocument>,
    accounts: DashMap<UserId, Versioned<UserAccount>>,
    tickets: DashMap<UserId, Vec<TicketRecord>>,
    next_ticket_id: AtomicU64,
    fare_table_reads: AtomicUsize,
    faults: DashMap<StoreOperation, (Fault, usize)>
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            fare_table: None,
            accounts: DashMap::new(),
            tickets: DashMap::new(),
            next_ticket_id: AtomicU64::new(1),
            fare_table_reads: AtomicUsize::new(0),
            faults: DashMap::new()
        }
    }

    pub fn with_fare_table(mut self, document: FareTableDocument) -> Self {
        self.fare_table = Some(document);
        self
    }

    /// Makes the next `times` calls of `operation` fail with `fault`.
    pub fn inject(&self, operation: StoreOperation, fault: Fault, times: usize) {
        self.faults.insert(operation, (fault, times));
    }

    /// Number of times the fare table document has been fetched.
    pub fn fare_table_reads(&self) -> usize {
        self.fare_table_reads.load(Ordering::SeqCst)
    }

    /// Snapshot of every account, ordered by user id.
    pub fn accounts(&self) -> Vec<UserAccount> {
        let mut accounts: Vec<_> = self.accounts.iter().map(|item| item.value().document.clone()).collect();
        accounts.sort_by(|left, right| left.user_id.cmp(&right.user_id));
        accounts
    }

    fn check(&self, operation: StoreOperation, key: &str) -> Result<(), StoreError> {
        let Some(mut entry) = self.faults.get_mut(&operation) else {
            return Ok(())
        };

        let (fault, remaining) = *entry;

        if remaining == 0 {
            return Ok(())
        }

        entry.1 = remaining - 1;
        drop(entry);

        match fault {
            Fault::Unavailable => Err(StoreError::Unavailable { operation }),
            Fault::Conflict => Err(StoreError::Conflict { key: key.to_string(), expected: 0 })
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn read_fare_table(&self) -> Result<Option<FareTableDocument>, StoreError> {
        self.check(StoreOperation::ReadFareTable, "metro_fares")?;
        self.fare_table_reads.fetch_add(1, Ordering::SeqCst);

        Ok(self.fare_table.clone())
    }

    fn read_account(&self, user_id: &str) -> Result<Option<Versioned<UserAccount>>, StoreError> {
        self.check(StoreOperation::ReadAccount, user_id)?;

        Ok(self.accounts.get(user_id).map(|entry| entry.value().clone()))
    }

    fn create_account(&self, account: UserAccount) -> Result<Versioned<UserAccount>, StoreError> {
        self.check(StoreOperation::CreateAccount, &account.user_id)?;

        match self.accounts.entry(account.user_id.clone()) {
            Entry::Occupied(entry) => Err(StoreError::AlreadyExists { key: entry.key().clone() }),
            Entry::Vacant(entry) => {
                let versioned = Versioned { version: 1, document: account };
                entry.insert(versioned.clone());
                Ok(versioned)
            }
        }
    }

    fn write_account(&self, account: UserAccount, expected_version: u64) -> Result<u64, StoreError> {
        self.check(StoreOperation::WriteAccount, &account.user_id)?;

        let Some(mut entry) = self.accounts.get_mut(&account.user_id) else {
            return Err(StoreError::NotFound { key: account.user_id })
        };

        if entry.version != expected_version {
            return Err(StoreError::Conflict { key: account.user_id, expected: expected_version })
        }

        entry.version += 1;
        entry.document = account;

        Ok(entry.version)
    }

    fn append_ticket(&self, ticket: Ticket) -> Result<TicketId, StoreError> {
        self.check(StoreOperation::AppendTicket, &ticket.user_id)?;

        //NOTE: The id is taken under the user's entry lock so each history stays in id order
        let mut history = self.tickets.entry(ticket.user_id.clone()).or_default();
        let ticket_id = self.next_ticket_id.fetch_add(1, Ordering::SeqCst);

        history.push(TicketRecord { ticket_id, ticket });

        Ok(ticket_id)
    }

    fn list_tickets(&self, user_id: &str) -> Result<Vec<TicketRecord>, StoreError> {
        self.check(StoreOperation::ListTickets, user_id)?;

        Ok(self.tickets.get(user_id).map(|entry| entry.value().clone()).unwrap_or_default())
    }
}
