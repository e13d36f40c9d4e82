use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::FareQuote;
use crate::models::TicketStatus;
use crate::types::{Money, StationId, TicketId, UserId};

/// A purchased journey as written to the `tickets` collection.
///
/// The fare is a snapshot of the quote taken at purchase time and is never
/// recomputed, even if the fare table changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub user_id: UserId,
    pub origin_station: StationId,
    pub destination_station: StationId,
    pub travel_date: NaiveDate,
    pub passenger_count: u32,
    pub fare_charged: Money,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>
}

impl Ticket {
    /// Shapes the record for a quote that has just been paid for.
    pub fn issue(user_id: &str, quote: &FareQuote, travel_date: NaiveDate, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            origin_station: quote.origin.clone(),
            destination_station: quote.destination.clone(),
            travel_date,
            passenger_count: quote.passenger_count,
            fare_charged: quote.total,
            status: TicketStatus::Running,
            created_at
        }
    }
}

/// A stored ticket together with the identifier the store assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    pub ticket_id: TicketId,
    #[serde(flatten)]
    pub ticket: Ticket
}
