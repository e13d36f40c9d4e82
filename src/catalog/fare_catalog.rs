use std::collections::{HashMap, HashSet};

use crate::catalog::FareTableDocument;
use crate::models::TicketingError;
use crate::types::{Money, StationId};

/// A priced journey for a given party size, before any payment is taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FareQuote {
    pub origin: StationId,
    pub destination: StationId,
    pub passenger_count: u32,
    pub unit_price: Money,
    pub total: Money
}

/// Validated, read-only station list and directional fare table.
#[derive(Debug, Clone, Default)]
pub struct FareCatalog {
    stations: Vec<StationId>,
    known: HashSet<StationId>,
    fares: HashMap<StationId, HashMap<StationId, Money>>
}

impl FareCatalog {
    /// Converts the raw store document into a catalog.
    ///
    /// # Errors
    /// Returns `MalformedCatalog` if a station is listed twice, a fare
    /// references an unlisted station, or a price is negative or has more
    /// than two decimal places.
    pub fn from_document(document: FareTableDocument) -> Result<Self, TicketingError> {
        let mut known = HashSet::with_capacity(document.stations.len());

        for station in &document.stations {
            if !known.insert(station.clone()) {
                return Err(TicketingError::malformed_catalog(format!("station [{station}] is listed more than once")));
            }
        }

        let mut fares: HashMap<StationId, HashMap<StationId, Money>> = HashMap::new();

        for (origin, destinations) in document.fares {
            for (destination, price) in destinations {
                for station in [&origin, &destination] {
                    if !known.contains(station) {
                        return Err(TicketingError::malformed_catalog(format!("fare references unlisted station [{station}]")));
                    }
                }

                let unit_price = Money::try_from(price).map_err(|error| {
                    TicketingError::malformed_catalog(format!("fare [{origin}] -> [{destination}]: {error}"))
                })?;

                if unit_price.is_negative() {
                    return Err(TicketingError::malformed_catalog(format!("fare [{origin}] -> [{destination}] is negative")));
                }

                fares.entry(origin.clone()).or_default().insert(destination, unit_price);
            }
        }

        Ok(Self {
            stations: document.stations,
            known,
            fares
        })
    }

    pub fn stations(&self) -> &[StationId] {
        &self.stations
    }

    pub fn contains(&self, station: &str) -> bool {
        self.known.contains(station)
    }

    pub fn unit_price(&self, origin: &str, destination: &str) -> Option<Money> {
        self.fares.get(origin).and_then(|destinations| destinations.get(destination)).copied()
    }

    /// Resolves the total fare for `passenger_count` riders.
    pub fn lookup_fare(&self, origin: &str, destination: &str, passenger_count: u32) -> Result<Money, TicketingError> {
        self.quote(origin, destination, passenger_count).map(|quote| quote.total)
    }

    /// Prices a journey without touching any account.
    ///
    /// # Errors
    /// - `InvalidPassengerCount` for zero passengers.
    /// - `UnknownStation` if either station is not in the catalog.
    /// - `InvalidRoute` if origin and destination are the same station.
    /// - `RouteNotFound` if the directional pair has no published price.
    /// - `FareOverflow` if the total is not representable.
    pub fn quote(&self, origin: &str, destination: &str, passenger_count: u32) -> Result<FareQuote, TicketingError> {
        if passenger_count == 0 {
            return Err(TicketingError::InvalidPassengerCount)
        }

        for station in [origin, destination] {
            if !self.contains(station) {
                return Err(TicketingError::UnknownStation { station: station.to_string() })
            }
        }

        if origin == destination {
            return Err(TicketingError::InvalidRoute { station: origin.to_string() })
        }

        let unit_price = self.unit_price(origin, destination).ok_or_else(|| TicketingError::RouteNotFound {
            origin: origin.to_string(),
            destination: destination.to_string()
        })?;

        let total = unit_price.checked_mul(passenger_count).ok_or_else(|| TicketingError::FareOverflow {
            origin: origin.to_string(),
            destination: destination.to_string(),
            passenger_count
        })?;

        Ok(FareQuote {
            origin: origin.to_string(),
            destination: destination.to_string(),
            passenger_count,
            unit_price,
            total
        })
    }
}
