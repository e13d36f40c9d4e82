use crate::models::errors::TicketingError;
use crate::types::{Money, UserId};
use serde::{Deserialize, Serialize};

/// Contact details captured at sign-up and editable from the profile screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: String,
    pub contact: String,
    pub address: Option<String>
}

/// Everything needed to open a stored-value account for a freshly
/// authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub user_id: UserId,
    pub username: String,
    pub contact: String,
    pub rapid_pass_id: Option<String>
}

/// The `users` document of a single rider.
///
/// The balance is only ever changed through [`UserAccount::credit`] and
/// [`UserAccount::debit`], both of which leave the account untouched when
/// they return an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub user_id: UserId,
    pub balance: Money,
    pub rapid_pass_id: Option<String>,
    pub profile: UserProfile
}

impl UserAccount {
    /// Creates an account with a zero balance.
    pub fn open(registration: Registration) -> Self {
        Self {
            user_id: registration.user_id,
            balance: Money::new(),
            rapid_pass_id: registration.rapid_pass_id,
            profile: UserProfile {
                username: registration.username,
                contact: registration.contact,
                address: None
            }
        }
    }

    /// Adds `amount` to the balance and returns the new balance.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount` is zero or negative.
    /// - `BalanceOverflow` if the new balance is not representable.
    pub fn credit(&mut self, amount: Money) -> Result<Money, TicketingError> {
        if !amount.is_positive() {
            return Err(TicketingError::invalid_amount(&self.user_id, amount))
        }

        self.balance = self.balance.checked_add(amount)
            .ok_or_else(|| TicketingError::balance_overflow(&self.user_id))?;

        Ok(self.balance)
    }

    /// Removes `amount` from the balance and returns the new balance.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount` is zero or negative.
    /// - `InsufficientFunds` if the balance is lower than `amount`.
    pub fn debit(&mut self, amount: Money) -> Result<Money, TicketingError> {
        if !amount.is_positive() {
            return Err(TicketingError::invalid_amount(&self.user_id, amount))
        }

        if self.balance < amount {
            return Err(TicketingError::insufficient_funds(&self.user_id, self.balance, amount))
        }

        self.balance = self.balance.checked_sub(amount)
            .ok_or_else(|| TicketingError::balance_overflow(&self.user_id))?;

        Ok(self.balance)
    }
}
