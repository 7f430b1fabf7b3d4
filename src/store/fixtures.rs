//! Small Sakila data sets shared by the unit tests.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;

use super::memory::{
    Address, Category, City, Country, Customer, Film, FilmCategory, Inventory, Payment, Rental,
    SakilaTables, Store,
};

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn country(country_id: i64, name: &str) -> Country {
    Country {
        country_id,
        country: name.to_string(),
    }
}

fn city(city_id: i64, name: &str, country_id: i64) -> City {
    City {
        city_id,
        city: name.to_string(),
        country_id,
    }
}

fn address(address_id: i64, line: &str, district: &str, city_id: i64) -> Address {
    Address {
        address_id,
        address: line.to_string(),
        district: Some(district.to_string()),
        city_id,
        phone: Some(format!("555-{:04}", address_id)),
    }
}

fn customer(customer_id: i64, first_name: &str, address_id: i64) -> Customer {
    Customer {
        customer_id,
        first_name: first_name.to_string(),
        last_name: "Smith".to_string(),
        email: Some(format!("{}@sakilacustomer.org", first_name.to_lowercase())),
        address_id,
    }
}

fn film(film_id: i64, title: &str, length: i64) -> Film {
    Film {
        film_id,
        title: title.to_string(),
        description: Some(format!("A film called {}", title)),
        length: Some(length),
    }
}

fn rental(rental_id: i64, rental_date: &str, inventory_id: i64, customer_id: i64) -> Rental {
    Rental {
        rental_id,
        rental_date: at(rental_date),
        inventory_id,
        customer_id,
    }
}

fn payment(payment_id: i64, rental_id: Option<i64>, amount: &str) -> Payment {
    Payment {
        payment_id,
        rental_id,
        amount: dec(amount),
    }
}

/// One rental on 2024-01-15 of "Alpha" at store 1 by Bob, paid 4.99.
pub fn single_rental() -> SakilaTables {
    SakilaTables {
        countries: vec![country(1, "Canada")],
        cities: vec![city(1, "Lethbridge", 1)],
        addresses: vec![
            address(1, "A Street 1", "Alberta", 1),
            address(2, "12 Elm Road", "Alberta", 1),
        ],
        stores: vec![Store {
            store_id: 1,
            address_id: 1,
        }],
        customers: vec![customer(1, "Bob", 2)],
        films: vec![film(1, "Alpha", 92)],
        categories: vec![Category {
            category_id: 1,
            name: "Action".to_string(),
        }],
        film_categories: vec![FilmCategory {
            film_id: 1,
            category_id: 1,
        }],
        inventory: vec![Inventory {
            inventory_id: 1,
            film_id: 1,
            store_id: 1,
        }],
        rentals: vec![rental(1, "2024-01-15 10:30:00", 1, 1)],
        payments: vec![payment(1, Some(1), "4.99")],
    }
}

/// Two stores in two countries, three customers, three films (one with two
/// categories, one with none) and five rentals, including a split payment,
/// an unpaid rental and a payment not tied to any rental.
///
/// Payment totals: store 1 = 7.98, store 2 = 5.98.
pub fn catalog() -> SakilaTables {
    SakilaTables {
        countries: vec![country(1, "Canada"), country(2, "Australia")],
        cities: vec![city(10, "Lethbridge", 1), city(20, "Woodridge", 2)],
        addresses: vec![
            address(100, "47 MySakila Drive", "Alberta", 10),
            address(200, "28 MySQL Boulevard", "QLD", 20),
            address(300, "1913 Hanoi Way", "Alberta", 10),
            address(400, "692 Joliet Street", "QLD", 20),
        ],
        stores: vec![
            Store {
                store_id: 2,
                address_id: 200,
            },
            Store {
                store_id: 1,
                address_id: 100,
            },
        ],
        customers: vec![
            customer(1, "Mary", 300),
            customer(2, "Patricia", 400),
            customer(3, "Linda", 300),
        ],
        films: vec![
            film(1, "Alpha", 92),
            film(2, "Beta", 48),
            film(3, "Gamma", 115),
        ],
        categories: vec![
            Category {
                category_id: 1,
                name: "Action".to_string(),
            },
            Category {
                category_id: 2,
                name: "Animation".to_string(),
            },
            Category {
                category_id: 3,
                name: "Comedy".to_string(),
            },
        ],
        film_categories: vec![
            FilmCategory {
                film_id: 1,
                category_id: 2,
            },
            FilmCategory {
                film_id: 1,
                category_id: 1,
            },
            FilmCategory {
                film_id: 2,
                category_id: 3,
            },
        ],
        inventory: vec![
            Inventory {
                inventory_id: 1,
                film_id: 1,
                store_id: 1,
            },
            Inventory {
                inventory_id: 2,
                film_id: 2,
                store_id: 1,
            },
            Inventory {
                inventory_id: 3,
                film_id: 3,
                store_id: 2,
            },
            Inventory {
                inventory_id: 4,
                film_id: 1,
                store_id: 2,
            },
        ],
        rentals: vec![
            rental(1, "2005-05-24 22:53:30", 1, 1),
            rental(2, "2005-05-24 23:03:39", 2, 2),
            rental(3, "2005-05-25 00:00:40", 3, 3),
            rental(4, "2005-05-26 11:14:00", 4, 1),
            rental(5, "2005-06-01 09:30:00", 3, 2),
        ],
        payments: vec![
            payment(1, Some(1), "2.99"),
            payment(2, Some(2), "1.00"),
            payment(3, Some(2), "3.99"),
            payment(4, Some(3), "4.99"),
            payment(5, Some(5), "0.99"),
            payment(6, None, "5.00"),
        ],
    }
}
