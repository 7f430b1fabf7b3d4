use chrono::{Datelike, NaiveDate};

use super::keys::{Dimension, KeyMap};
use crate::model::{dim_date, RentalDateRow};

/// One `dim_date` row per distinct calendar day on which a rental started.
///
/// `rental_week` is the ISO-8601 week number (weeks start on Monday, week 1
/// contains the year's first Thursday), so early-January days can land in
/// week 52 or 53 of the previous ISO year.
pub fn build_date_dimension(rows: &[RentalDateRow]) -> Dimension<dim_date::Model, NaiveDate> {
    let keys = KeyMap::assign(rows.iter().map(|row| row.rental_date.date()));
    let rows = keys
        .iter()
        .map(|(date, date_key)| dim_date::Model {
            date_key,
            full_date: *date,
            rental_month: date.month() as i32,
            rental_week: date.iso_week().week() as i32,
        })
        .collect();

    Dimension { rows, keys }
}
