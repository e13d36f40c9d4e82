mod account;
mod errors;
mod ticket;

use serde::{Deserialize, Serialize};

pub use account::{Registration, UserAccount, UserProfile};
pub use errors::TicketingError;
pub use ticket::{Ticket, TicketRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Running,
    Complete,
    Cancelled
}
