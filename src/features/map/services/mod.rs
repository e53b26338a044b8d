mod geocoding_service;
mod marker_service;

pub use geocoding_service::{GeocodingError, GeocodingService, NominatimResponse};
pub use marker_service::MarkerService;
