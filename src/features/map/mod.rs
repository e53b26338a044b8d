//! Map data: placing checkpoints as markers, geocoding the ones without coordinates.

pub mod models;
pub mod services;

pub use services::{GeocodingService, MarkerService};
