pub mod source;
pub mod warehouse;

pub use source::{CustomerRow, FilmRow, LocationLinks, RentalDateRow, RentalPaymentRow, StoreRow};
pub use warehouse::{dim_client, dim_date, dim_film, dim_store, fact_rental};
