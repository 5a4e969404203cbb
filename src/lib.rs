//! metforecast library
//!
//! Everything except terminal drawing lives here so it can be exercised
//! from integration tests.

pub mod app;
pub mod cli;
pub mod data;
pub mod fetch;
pub mod location_index;
pub mod logging;
pub mod normalize;
pub mod site_data;
