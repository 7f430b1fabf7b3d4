use std::collections::BTreeMap;

use super::keys::{Dimension, KeyMap};
use crate::etl::EtlError;
use crate::model::{dim_client, dim_store, CustomerRow, LocationLinks, StoreRow};

/// A fully resolved address -> city -> country chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub address: String,
    pub state: Option<String>,
    pub city: String,
    pub country: String,
}

/// Walks the location chain for `owner`; the first missing link is fatal.
pub fn resolve_location(owner: &str, links: LocationLinks<'_>) -> Result<Location, EtlError> {
    let address = links.address.ok_or_else(|| EtlError::Unresolved {
        owner: owner.to_string(),
        from: owner.to_string(),
        missing: "address",
        id: links.address_id.to_string(),
    })?;
    let city = links.city.ok_or_else(|| EtlError::Unresolved {
        owner: owner.to_string(),
        from: format!("address {}", links.address_id),
        missing: "city",
        id: display_id(links.city_id),
    })?;
    let country = links.country.ok_or_else(|| EtlError::Unresolved {
        owner: owner.to_string(),
        from: format!("city {}", display_id(links.city_id)),
        missing: "country",
        id: display_id(links.country_id),
    })?;

    Ok(Location {
        address: address.to_string(),
        state: links.district.map(str::to_string),
        city: city.to_string(),
        country: country.to_string(),
    })
}

fn display_id(id: Option<i64>) -> String {
    id.map_or_else(|| "NULL".to_string(), |id| id.to_string())
}

pub fn build_store_dimension(
    rows: &[StoreRow],
) -> Result<Dimension<dim_store::Model, i64>, EtlError> {
    let stores: BTreeMap<i64, &StoreRow> = rows.iter().map(|row| (row.store_id, row)).collect();
    let keys = KeyMap::assign(stores.keys().copied());

    let mut dimension = Vec::with_capacity(stores.len());
    for (store, store_key) in stores.into_values().zip(1..) {
        let owner = format!("store {}", store.store_id);
        let location = resolve_location(&owner, store.location())?;
        dimension.push(dim_store::Model {
            store_key,
            store_id: store.store_id,
            address: location.address,
            city: location.city,
            state: location.state,
            country: location.country,
        });
    }

    Ok(Dimension {
        rows: dimension,
        keys,
    })
}

pub fn build_client_dimension(
    rows: &[CustomerRow],
) -> Result<Dimension<dim_client::Model, i64>, EtlError> {
    let customers: BTreeMap<i64, &CustomerRow> =
        rows.iter().map(|row| (row.customer_id, row)).collect();
    let keys = KeyMap::assign(customers.keys().copied());

    let mut dimension = Vec::with_capacity(customers.len());
    for (customer, customer_key) in customers.into_values().zip(1..) {
        let owner = format!("customer {}", customer.customer_id);
        let location = resolve_location(&owner, customer.location())?;
        dimension.push(dim_client::Model {
            customer_key,
            customer_id: customer.customer_id,
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            address: location.address,
            city: location.city,
            state: location.state,
            country: location.country,
        });
    }

    Ok(Dimension {
        rows: dimension,
        keys,
    })
}
