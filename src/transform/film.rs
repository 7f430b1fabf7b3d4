use std::collections::BTreeMap;

use super::keys::{Dimension, KeyMap};
use crate::model::{dim_film, FilmRow};

/// One `dim_film` row per film id.
///
/// `film_category` allows several categories per film; the warehouse keeps a
/// single one, the category with the lowest `category_id`.
pub fn build_film_dimension(rows: &[FilmRow]) -> Dimension<dim_film::Model, i64> {
    let mut films: BTreeMap<i64, &FilmRow> = BTreeMap::new();
    for row in rows {
        films
            .entry(row.film_id)
            .and_modify(|chosen| {
                if precedes(row.category_id, chosen.category_id) {
                    *chosen = row;
                }
            })
            .or_insert(row);
    }

    let keys = KeyMap::assign(films.keys().copied());
    let rows = films
        .into_values()
        .zip(1..)
        .map(|(film, film_key)| dim_film::Model {
            film_key,
            film_id: film.film_id,
            title: film.title.clone(),
            description: film.description.clone(),
            length: film.length.and_then(|minutes| i32::try_from(minutes).ok()),
            category: film.category.clone(),
        })
        .collect();

    Dimension { rows, keys }
}

/// Any category beats none; otherwise the lower id wins.
fn precedes(candidate: Option<i64>, current: Option<i64>) -> bool {
    match (candidate, current) {
        (Some(a), Some(b)) => a < b,
        (Some(_), None) => true,
        _ => false,
    }
}
