//! Row shapes returned by the extract queries.
//!
//! Location chains are outer-joined, so a dangling address, city or country
//! link shows up as `None` here instead of silently dropping the row.

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use sea_orm::FromQueryResult;

#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct RentalDateRow {
    pub rental_id: i64,
    pub rental_date: NaiveDateTime,
}

/// One row per (film, category) pair; films without a category appear once
/// with both category columns `None`.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct FilmRow {
    pub film_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub length: Option<i64>,
    pub category_id: Option<i64>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct StoreRow {
    pub store_id: i64,
    pub address_id: i64,
    pub address: Option<String>,
    pub district: Option<String>,
    pub city_id: Option<i64>,
    pub city: Option<String>,
    pub country_id: Option<i64>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct CustomerRow {
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub address_id: i64,
    pub address: Option<String>,
    pub district: Option<String>,
    pub phone: Option<String>,
    pub city_id: Option<i64>,
    pub city: Option<String>,
    pub country_id: Option<i64>,
    pub country: Option<String>,
}

/// One row per (rental, payment) pair. Rentals with no payment appear once
/// with `amount = None`; a rental whose inventory row is gone has no film or
/// store.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct RentalPaymentRow {
    pub rental_id: i64,
    pub rental_date: NaiveDateTime,
    pub customer_id: i64,
    pub film_id: Option<i64>,
    pub store_id: Option<i64>,
    pub amount: Option<BigDecimal>,
}

/// Borrowed view of the address -> city -> country columns shared by stores
/// and customers.
#[derive(Debug, Clone, Copy)]
pub struct LocationLinks<'a> {
    pub address_id: i64,
    pub address: Option<&'a str>,
    pub district: Option<&'a str>,
    pub city_id: Option<i64>,
    pub city: Option<&'a str>,
    pub country_id: Option<i64>,
    pub country: Option<&'a str>,
}

impl StoreRow {
    pub fn location(&self) -> LocationLinks<'_> {
        LocationLinks {
            address_id: self.address_id,
            address: self.address.as_deref(),
            district: self.district.as_deref(),
            city_id: self.city_id,
            city: self.city.as_deref(),
            country_id: self.country_id,
            country: self.country.as_deref(),
        }
    }
}

impl CustomerRow {
    pub fn location(&self) -> LocationLinks<'_> {
        LocationLinks {
            address_id: self.address_id,
            address: self.address.as_deref(),
            district: self.district.as_deref(),
            city_id: self.city_id,
            city: self.city.as_deref(),
            country_id: self.country_id,
            country: self.country.as_deref(),
        }
    }
}
