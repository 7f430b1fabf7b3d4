//! The five ETL units of the rental warehouse.

mod customer;
mod date;
mod film;
mod rental;
mod store;

pub use customer::CustomerETL;
pub use date::DateETL;
pub use film::FilmETL;
pub use rental::RentalETL;
pub use store::StoreETL;
