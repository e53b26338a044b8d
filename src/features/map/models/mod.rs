mod marker;

pub use marker::{Coordinates, Marker, MarkerColor};
