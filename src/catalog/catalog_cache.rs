use std::sync::Arc;

use moka::future::Cache;
use tracing::debug;

use crate::catalog::FareCatalog;
use crate::models::TicketingError;
use crate::storage::DocumentStore;

const FARE_TABLE_KEY: &str = "metro_fares/metro_fare";

/// Process-wide home of the fare catalog.
///
/// The catalog is read from the store on first use and then kept for the
/// lifetime of the cache. Concurrent first callers wait on a single load;
/// failed loads are not cached.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<&'static str, Arc<FareCatalog>>
}

impl CatalogCache {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder().max_capacity(1).build()
        }
    }

    pub async fn get_or_load<S: DocumentStore>(&self, store: &Arc<S>) -> Result<Arc<FareCatalog>, TicketingError> {
        let store = store.clone();

        self.cache.try_get_with(FARE_TABLE_KEY, async move {
            let document = store.read_fare_table()?
                .ok_or_else(|| TicketingError::malformed_catalog(format!("document [{FARE_TABLE_KEY}] does not exist")))?;
            let catalog = FareCatalog::from_document(document)?;

            debug!("Fare catalog loaded with [{}] stations", catalog.stations().len());

            Ok::<_, TicketingError>(Arc::new(catalog))
        })
        .await
        .map_err(|error| (*error).clone())
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}
