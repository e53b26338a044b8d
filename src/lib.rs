//! Data layer for the DUI checkpoint map: checkpoint queries against the
//! hosted store, calendar-day classification, and map marker resolution.

pub mod core;
pub mod features;
pub mod shared;
