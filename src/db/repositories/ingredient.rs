use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::OnConflict,
};
use std::collections::HashSet;

use crate::entities::{ingredients, prelude::*};

pub struct IngredientRepository {
    conn: DatabaseConnection,
}

impl IngredientRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Ingredients whose name starts with `prefix`, ordered by name.
    ///
    /// SQLite's `LIKE` folds ASCII case and treats `_`/`%` as wildcards, so
    /// it only narrows the candidates; the literal prefix check happens here.
    pub async fn search(&self, prefix: Option<&str>) -> Result<Vec<ingredients::Model>> {
        let mut query = Ingredients::find().order_by_asc(ingredients::Column::Name);

        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            query = query.filter(ingredients::Column::Name.starts_with(prefix));
        }

        let rows = query
            .all(&self.conn)
            .await
            .context("Failed to search ingredients")?;

        Ok(match prefix {
            Some(prefix) => rows
                .into_iter()
                .filter(|i| i.name.starts_with(prefix))
                .collect(),
            None => rows,
        })
    }

    pub async fn get(&self, id: i32) -> Result<Option<ingredients::Model>> {
        Ingredients::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query ingredient")
    }

    /// The subset of `ids` that exist.
    pub async fn existing_ids(&self, ids: &[i32]) -> Result<HashSet<i32>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let found: Vec<i32> = Ingredients::find()
            .select_only()
            .column(ingredients::Column::Id)
            .filter(ingredients::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to check ingredient ids")?;

        Ok(found.into_iter().collect())
    }

    /// Inserts every `(name, unit)` pair not already present and returns how
    /// many rows were added.
    pub async fn get_or_create_many(&self, rows: Vec<(String, String)>) -> Result<u64> {
        let mut inserted = 0;

        for chunk in rows.chunks(500) {
            let models = chunk.iter().map(|(name, unit)| ingredients::ActiveModel {
                name: Set(name.clone()),
                measurement_unit: Set(unit.clone()),
                ..Default::default()
            });

            inserted += Ingredients::insert_many(models)
                .on_conflict(
                    OnConflict::columns([
                        ingredients::Column::Name,
                        ingredients::Column::MeasurementUnit,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&self.conn)
                .await
                .context("Failed to import ingredients")?;
        }

        Ok(inserted)
    }
}
