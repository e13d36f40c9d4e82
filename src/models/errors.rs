use crate::storage::StoreError;
use crate::types::{Money, StationId, UserId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketingError {
    #[error("Route from station [{station}] back to itself is not a valid journey")]
    InvalidRoute {
        station: StationId
    },
    #[error("No fare is published for route [{origin}] -> [{destination}]")]
    RouteNotFound {
        origin: StationId,
        destination: StationId
    },
    #[error("Station [{station}] is not part of the fare catalog")]
    UnknownStation {
        station: StationId
    },
    #[error("Passenger count must be at least one")]
    InvalidPassengerCount,
    #[error("Fare for route [{origin}] -> [{destination}] overflowed for [{passenger_count}] passengers")]
    FareOverflow {
        origin: StationId,
        destination: StationId,
        passenger_count: u32
    },
    #[error("Fare catalog is malformed: {reason}")]
    MalformedCatalog {
        reason: String
    },
    #[error("Amount [{amount}] must be positive for user [{user_id}]")]
    InvalidAmount {
        user_id: UserId,
        amount: Money
    },
    #[error("Account was not found for user [{user_id}]")]
    AccountNotFound {
        user_id: UserId
    },
    #[error("Account already exists for user [{user_id}]")]
    AccountExists {
        user_id: UserId
    },
    #[error("Insufficient funds for user [{user_id}]: balance [{balance}], requested [{amount}]")]
    InsufficientFunds {
        user_id: UserId,
        balance: Money,
        amount: Money
    },
    #[error("Numeric overflow occurred on the balance of user [{user_id}]")]
    BalanceOverflow {
        user_id: UserId
    },
    #[error("Account of user [{user_id}] was modified concurrently")]
    WriteConflict {
        user_id: UserId
    },
    #[error("Document store is unavailable: {reason}")]
    StoreUnavailable {
        reason: String
    },
    #[error("Refund of [{amount}] to user [{user_id}] failed after the ticket could not be recorded")]
    CompensationFailed {
        user_id: UserId,
        amount: Money
    }
}

impl TicketingError {
    /// Transient failures that may succeed when repeated against a fresh read.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. } | Self::WriteConflict { .. })
    }

    pub fn insufficient_funds(user_id: &str, balance: Money, amount: Money) -> Self {
        Self::InsufficientFunds { user_id: user_id.to_string(), balance, amount }
    }

    pub fn invalid_amount(user_id: &str, amount: Money) -> Self {
        Self::InvalidAmount { user_id: user_id.to_string(), amount }
    }

    pub fn account_not_found(user_id: &str) -> Self {
        Self::AccountNotFound { user_id: user_id.to_string() }
    }

    pub fn balance_overflow(user_id: &str) -> Self {
        Self::BalanceOverflow { user_id: user_id.to_string() }
    }

    pub fn malformed_catalog(reason: impl Into<String>) -> Self {
        Self::MalformedCatalog { reason: reason.into() }
    }
}

impl From<StoreError> for TicketingError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict { key, .. } => Self::WriteConflict { user_id: key },
            StoreError::AlreadyExists { key } => Self::AccountExists { user_id: key },
            StoreError::NotFound { key } => Self::AccountNotFound { user_id: key },
            unavailable @ StoreError::Unavailable { .. } => Self::StoreUnavailable { reason: unavailable.to_string() }
        }
    }
}
