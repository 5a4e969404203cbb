//! Searchable index over the forecast sitelist
//!
//! The index is built once at startup and never mutated afterwards. Rows are
//! kept sorted by name; filtering ranks fuzzy matches without touching the
//! stored order.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use thiserror::Error;

use crate::data::{Location, LocationRow};

/// Errors that can occur when building the location index
#[derive(Debug, Error)]
pub enum LocationIndexError {
    /// The sitelist contained no locations
    #[error("The sitelist contained no locations")]
    Empty,
}

/// Sorted, read-only collection of location rows
#[derive(Debug, Clone)]
pub struct LocationIndex {
    rows: Vec<LocationRow>,
}

impl LocationIndex {
    /// Builds the index from display rows
    ///
    /// Rows are stable-sorted by name (case-sensitive), so sites sharing a
    /// name keep their sitelist order.
    ///
    /// # Returns
    /// * `Ok(LocationIndex)` if at least one row was given
    /// * `Err(LocationIndexError::Empty)` otherwise
    pub fn load(mut rows: Vec<LocationRow>) -> Result<Self, LocationIndexError> {
        if rows.is_empty() {
            return Err(LocationIndexError::Empty);
        }
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self { rows })
    }

    /// Projects fetched locations into rows and builds the index
    pub fn from_locations(locations: &[Location]) -> Result<Self, LocationIndexError> {
        Self::load(locations.iter().map(LocationRow::from).collect())
    }

    /// Returns the indices of rows matching `query`, best match first
    ///
    /// An empty query matches every row in stored order. Otherwise each
    /// row name is fuzzy-matched case-insensitively and the matches are
    /// ordered by descending score, ties keeping stored order.
    pub fn matches(&self, query: &str) -> Vec<usize> {
        if query.is_empty() {
            return (0..self.rows.len()).collect();
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        let mut scored: Vec<(usize, i64)> = self
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| matcher.fuzzy_match(&row.name, query).map(|score| (i, score)))
            .collect();

        // sort_by is stable, so equal scores stay in index order
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.into_iter().map(|(i, _)| i).collect()
    }

    /// Returns the rows matching `query`, best match first
    pub fn filter(&self, query: &str) -> Vec<&LocationRow> {
        self.matches(query)
            .into_iter()
            .map(|i| &self.rows[i])
            .collect()
    }

    /// Returns the row at `index` in stored order
    pub fn row(&self, index: usize) -> Option<&LocationRow> {
        self.rows.get(index)
    }

    /// All rows in stored order
    pub fn rows(&self) -> &[LocationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
