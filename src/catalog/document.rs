use std::collections::HashMap;
use std::io::Read;

use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::TicketingError;
use crate::types::StationId;

/// The `metro_fares` document exactly as the store holds it: a station list
/// plus loosely typed prices keyed by origin, then destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareTableDocument {
    pub stations: Vec<StationId>,
    pub fares: HashMap<StationId, HashMap<StationId, Decimal>>
}

#[derive(Debug, Deserialize)]
struct FareRow {
    origin: StationId,
    destination: StationId,
    fare: Decimal
}

impl FareTableDocument {
    /// Adds a directional price, listing either station if it is new.
    pub fn with_fare(mut self, origin: &str, destination: &str, price: Decimal) -> Self {
        self.insert(origin, destination, price);
        self
    }

    /// Builds a document from `origin,destination,fare` rows.
    ///
    /// Stations are listed in the order they are first seen.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self, TicketingError> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .from_reader(reader);

        let mut document = Self::default();

        for result in reader.deserialize::<FareRow>() {
            let row = result.map_err(|error| TicketingError::malformed_catalog(format!("CSV deserialization error: {error}")))?;
            document.insert(&row.origin, &row.destination, row.fare);
        }

        Ok(document)
    }

    fn insert(&mut self, origin: &str, destination: &str, price: Decimal) {
        for station in [origin, destination] {
            if !self.stations.iter().any(|known| known == station) {
                self.stations.push(station.to_string());
            }
        }

        self.fares.entry(origin.to_string())
            .or_default()
            .insert(destination.to_string(), price);
    }
}
