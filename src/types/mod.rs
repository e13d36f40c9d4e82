mod errors;
mod money;

pub use errors::MoneyError;
pub use money::Money;

pub type UserId = String;
pub type StationId = String;
pub type TicketId = u64;
