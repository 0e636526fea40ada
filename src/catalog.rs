// Catalog queries: filtered listings and point lookups over the unit relation

use crate::models::{Category, Unit};
use crate::store::{bounded, DataAccessError, TentStore};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

// Homepage hero selection size
pub const FEATURED_UNITS_LIMIT: usize = 3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Identifier must not be empty")]
    EmptyIdentifier,

    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
}

#[derive(Debug, Clone, Default)]
pub struct UnitFilter {
    // None or empty means every category
    pub categories: Option<Vec<Category>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_capacity: Option<u32>,
    pub search: Option<String>,
    pub available_only: bool,
}

impl UnitFilter {
    pub fn matches(&self, unit: &Unit) -> bool {
        if !self
            .categories
            .as_ref()
            .map_or(true, |cats| cats.is_empty() || cats.contains(&unit.category))
        {
            return false;
        }

        if !self
            .min_price
            .map_or(true, |min| unit.price_per_night >= min)
        {
            return false;
        }

        if !self
            .max_price
            .map_or(true, |max| unit.price_per_night <= max)
        {
            return false;
        }

        if !self.min_capacity.map_or(true, |min| unit.capacity >= min) {
            return false;
        }

        if self.available_only && !unit.is_available {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let needle = term.to_lowercase();
                unit.name.contains_lowercase(&needle)
                    || unit.description.contains_lowercase(&needle)
            }
            _ => true,
        }
    }
}

pub struct CatalogService<S: TentStore> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S: TentStore> Clone for CatalogService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            timeout: self.timeout,
        }
    }
}

impl<S: TentStore> CatalogService<S> {
    pub fn new(store: Arc<S>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Units matching `filter`, most recently created first.
    pub async fn list_units(&self, filter: &UnitFilter) -> Result<Vec<Unit>, CatalogError> {
        let units = bounded(self.timeout, self.store.fetch_units()).await?;
        let total = units.len();

        let mut matched: Vec<Unit> = units.into_iter().filter(|u| filter.matches(u)).collect();
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        debug!(total, matched = matched.len(), "listed units");
        Ok(matched)
    }

    pub async fn get_unit_by_slug(&self, slug: &str) -> Result<Option<Unit>, CatalogError> {
        let slug = non_empty(slug)?;
        Ok(bounded(self.timeout, self.store.fetch_unit_by_slug(slug)).await?)
    }

    pub async fn get_unit_by_id(&self, id: &str) -> Result<Option<Unit>, CatalogError> {
        let id = non_empty(id)?;
        Ok(bounded(self.timeout, self.store.fetch_unit_by_id(id)).await?)
    }

    /// Featured and bookable units, priciest first, at most `FEATURED_UNITS_LIMIT`.
    pub async fn list_featured_units(&self) -> Result<Vec<Unit>, CatalogError> {
        let units = bounded(self.timeout, self.store.fetch_units()).await?;

        let mut featured: Vec<Unit> = units
            .into_iter()
            .filter(|u| u.is_featured && u.is_available)
            .collect();
        featured.sort_by(|a, b| {
            b.price_per_night
                .partial_cmp(&a.price_per_night)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        featured.truncate(FEATURED_UNITS_LIMIT);
        Ok(featured)
    }
}

fn non_empty(value: &str) -> Result<&str, CatalogError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CatalogError::EmptyIdentifier)
    } else {
        Ok(trimmed)
    }
}
