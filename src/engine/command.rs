use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::ledger::PurchaseRequest;
use crate::models::Registration;
use crate::types::{Money, StationId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Register,
    Recharge,
    Purchase
}

/// A single row of the command journal.
///
/// Only the columns relevant to the command type need to be filled in.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRow {
    #[serde(rename = "command")]
    pub command_type: CommandType,
    #[serde(rename = "user")]
    pub user_id: UserId,
    pub amount: Option<Money>,
    pub origin: Option<StationId>,
    pub destination: Option<StationId>,
    pub date: Option<NaiveDate>,
    pub passengers: Option<u32>,
    pub pass: Option<String>
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Register(Registration),
    Recharge {
        user_id: UserId,
        amount: Money
    },
    Purchase {
        user_id: UserId,
        request: PurchaseRequest
    }
}

impl Command {
    pub fn user_id(&self) -> &str {
        match self {
            Command::Register(registration) => &registration.user_id,
            Command::Recharge { user_id, .. } | Command::Purchase { user_id, .. } => user_id
        }
    }
}

#[derive(Debug, Error)]
#[error("Command [{command_type:?}] for user [{user_id}] is missing the [{field}] column")]
pub struct MissingField {
    pub command_type: CommandType,
    pub user_id: UserId,
    pub field: &'static str
}

impl TryFrom<CommandRow> for Command {
    type Error = MissingField;

    fn try_from(row: CommandRow) -> Result<Self, Self::Error> {
        let missing = |field| MissingField { command_type: row.command_type, user_id: row.user_id.clone(), field };

        let command = match row.command_type {
            CommandType::Register => Command::Register(Registration {
                user_id: row.user_id.clone(),
                username: row.user_id.clone(),
                contact: String::new(),
                rapid_pass_id: row.pass.clone()
            }),
            CommandType::Recharge => Command::Recharge {
                user_id: row.user_id.clone(),
                amount: row.amount.ok_or_else(|| missing("amount"))?
            },
            CommandType::Purchase => Command::Purchase {
                user_id: row.user_id.clone(),
                request: PurchaseRequest {
                    origin: row.origin.clone().ok_or_else(|| missing("origin"))?,
                    destination: row.destination.clone().ok_or_else(|| missing("destination"))?,
                    travel_date: row.date.ok_or_else(|| missing("date"))?,
                    passenger_count: row.passengers.unwrap_or(1)
                }
            }
        };

        Ok(command)
    }
}
