use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use serde::Serialize;

use super::keys::DimensionKeys;
use crate::model::{fact_rental, RentalPaymentRow};

/// Scale of `fact_rental.amount`, matching the source `payment.amount`.
pub const AMOUNT_SCALE: i64 = 2;

/// Rentals left out of `fact_rental` because a dimension key was missing.
///
/// `excluded` counts rentals; the per-dimension counters may add up to more
/// when one rental misses several keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionCounts {
    pub excluded: usize,
    pub missing_date: usize,
    pub missing_film: usize,
    pub missing_store: usize,
    pub missing_customer: usize,
}

impl ExclusionCounts {
    pub fn is_empty(&self) -> bool {
        self.excluded == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactTable {
    pub rows: Vec<fact_rental::Model>,
    pub exclusions: ExclusionCounts,
}

struct RentalTotal<'a> {
    rental: &'a RentalPaymentRow,
    amount: BigDecimal,
}

/// Builds one fact row per rental with the sum of its payments.
///
/// Rentals without any payment get an amount of zero. `rental_key` is handed
/// out in `rental_id` order over the rentals that made it into the table.
pub fn build_rental_facts(rows: &[RentalPaymentRow], keys: &DimensionKeys) -> FactTable {
    let mut totals: BTreeMap<i64, RentalTotal<'_>> = BTreeMap::new();
    for row in rows {
        let total = totals.entry(row.rental_id).or_insert_with(|| RentalTotal {
            rental: row,
            amount: BigDecimal::from(0),
        });
        if let Some(amount) = &row.amount {
            total.amount = &total.amount + amount;
        }
    }

    let mut exclusions = ExclusionCounts::default();
    let mut facts = Vec::with_capacity(totals.len());
    for total in totals.into_values() {
        let rental = total.rental;
        let date_key = keys.dates.get(&rental.rental_date.date());
        let film_key = rental.film_id.and_then(|id| keys.films.get(&id));
        let store_key = rental.store_id.and_then(|id| keys.stores.get(&id));
        let customer_key = keys.customers.get(&rental.customer_id);

        match (date_key, film_key, store_key, customer_key) {
            (Some(date_key), Some(film_key), Some(store_key), Some(customer_key)) => {
                facts.push(fact_rental::Model {
                    rental_key: facts.len() as i64 + 1,
                    rental_id: rental.rental_id,
                    date_key,
                    film_key,
                    store_key,
                    customer_key,
                    amount: total.amount.with_scale(AMOUNT_SCALE),
                });
            }
            _ => {
                exclusions.excluded += 1;
                exclusions.missing_date += usize::from(date_key.is_none());
                exclusions.missing_film += usize::from(film_key.is_none());
                exclusions.missing_store += usize::from(store_key.is_none());
                exclusions.missing_customer += usize::from(customer_key.is_none());
                tracing::debug!(
                    rental_id = rental.rental_id,
                    "rental excluded from fact table: unresolved dimension key"
                );
            }
        }
    }

    FactTable {
        rows: facts,
        exclusions,
    }
}
