//! Stored-value metro ticketing: fare lookup, balance ledger and ticket
//! issuing on top of a remote document store.

pub mod actors;
pub mod catalog;
pub mod engine;
pub mod ledger;
pub mod models;
pub mod session;
pub mod storage;
pub mod types;

pub use catalog::{FareCatalog, FareQuote, FareTableDocument};
pub use ledger::{BalanceLedger, LedgerConfig, PurchaseReceipt, PurchaseRequest};
pub use models::{Registration, Ticket, TicketRecord, TicketStatus, TicketingError, UserAccount, UserProfile};
pub use session::{AuthEvent, Session, SessionHub};
pub use storage::{DocumentStore, MemoryStore};
pub use types::Money;
