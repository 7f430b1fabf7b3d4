//! Star-schema tables of the `sakila_dw` warehouse.
//!
//! No foreign-key relations are declared: referential integrity between
//! `fact_rental` and the dimensions is guaranteed by load order.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

pub mod dim_date {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "dim_date")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub date_key: i64,
        #[sea_orm(unique)]
        pub full_date: chrono::NaiveDate,
        pub rental_month: i32,
        pub rental_week: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl Model {
        pub fn to_active_model(&self) -> ActiveModel {
            ActiveModel {
                date_key: Set(self.date_key),
                full_date: Set(self.full_date),
                rental_month: Set(self.rental_month),
                rental_week: Set(self.rental_week),
            }
        }
    }
}

pub mod dim_film {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "dim_film")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub film_key: i64,
        #[sea_orm(unique)]
        pub film_id: i64,
        pub title: String,
        #[sea_orm(column_type = "Text", nullable)]
        pub description: Option<String>,
        pub length: Option<i32>,
        pub category: Option<String>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl Model {
        pub fn to_active_model(&self) -> ActiveModel {
            ActiveModel {
                film_key: Set(self.film_key),
                film_id: Set(self.film_id),
                title: Set(self.title.clone()),
                description: Set(self.description.clone()),
                length: Set(self.length),
                category: Set(self.category.clone()),
            }
        }
    }
}

pub mod dim_store {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "dim_store")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub store_key: i64,
        #[sea_orm(unique)]
        pub store_id: i64,
        pub address: String,
        pub city: String,
        pub state: Option<String>,
        pub country: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl Model {
        pub fn to_active_model(&self) -> ActiveModel {
            ActiveModel {
                store_key: Set(self.store_key),
                store_id: Set(self.store_id),
                address: Set(self.address.clone()),
                city: Set(self.city.clone()),
                state: Set(self.state.clone()),
                country: Set(self.country.clone()),
            }
        }
    }
}

pub mod dim_client {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "dim_client")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub customer_key: i64,
        #[sea_orm(unique)]
        pub customer_id: i64,
        pub first_name: String,
        pub last_name: String,
        pub email: Option<String>,
        pub phone: Option<String>,
        pub address: String,
        pub city: String,
        pub state: Option<String>,
        pub country: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl Model {
        pub fn to_active_model(&self) -> ActiveModel {
            ActiveModel {
                customer_key: Set(self.customer_key),
                customer_id: Set(self.customer_id),
                first_name: Set(self.first_name.clone()),
                last_name: Set(self.last_name.clone()),
                email: Set(self.email.clone()),
                phone: Set(self.phone.clone()),
                address: Set(self.address.clone()),
                city: Set(self.city.clone()),
                state: Set(self.state.clone()),
                country: Set(self.country.clone()),
            }
        }
    }
}

pub mod fact_rental {
    use super::*;
    use bigdecimal::BigDecimal;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "fact_rental")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub rental_key: i64,
        #[sea_orm(unique)]
        pub rental_id: i64,
        pub date_key: i64,
        pub film_key: i64,
        pub store_key: i64,
        pub customer_key: i64,
        #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
        pub amount: BigDecimal,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl Model {
        pub fn to_active_model(&self) -> ActiveModel {
            ActiveModel {
                rental_key: Set(self.rental_key),
                rental_id: Set(self.rental_id),
                date_key: Set(self.date_key),
                film_key: Set(self.film_key),
                store_key: Set(self.store_key),
                customer_key: Set(self.customer_key),
                amount: Set(self.amount.clone()),
            }
        }
    }
}
