//! Pure reshaping of extracted rows into warehouse rows.
//!
//! Every dimension builder returns its rows together with the
//! business-key -> surrogate-key map that the rental fact builder consumes.

pub mod date;
pub mod film;
pub mod keys;
pub mod location;
pub mod rental;

pub use date::build_date_dimension;
pub use film::build_film_dimension;
pub use keys::{Dimension, DimensionKeys, KeyMap, SurrogateKey};
pub use location::{build_client_dimension, build_store_dimension, resolve_location, Location};
pub use rental::{build_rental_facts, ExclusionCounts, FactTable};
