use crate::model::SeriesDescriptor;
use crate::source::{SeriesStore, SourceError};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Fatal: without the series list there is no work to do.
    #[error("series catalog unavailable: {0}")]
    Unavailable(#[source] SourceError),
}

/// Discovers the set of source series and applies the exclusion filter.
pub struct SeriesCatalog {
    store: Arc<dyn SeriesStore>,
}

impl SeriesCatalog {
    pub fn new(store: Arc<dyn SeriesStore>) -> Self {
        Self { store }
    }

    /// Series to migrate, in the store's discovery order, minus exact-match
    /// exclusions.
    pub async fn list_series(
        &self,
        excluded: &HashSet<String>,
    ) -> Result<Vec<SeriesDescriptor>, CatalogError> {
        let names = self
            .store
            .list_series()
            .await
            .map_err(CatalogError::Unavailable)?;

        let discovered = names.len();
        let series: Vec<SeriesDescriptor> = names
            .into_iter()
            .filter(|name| !excluded.contains(name))
            .map(SeriesDescriptor::new)
            .collect();

        tracing::debug!(
            discovered = discovered,
            excluded = discovered - series.len(),
            "Series discovery complete"
        );

        Ok(series)
    }
}
