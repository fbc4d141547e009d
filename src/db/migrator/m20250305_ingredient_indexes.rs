use crate::entities::{ingredients, prelude::*, recipes};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_ingredients_name_unit")
                    .table(Ingredients)
                    .col(ingredients::Column::Name)
                    .col(ingredients::Column::MeasurementUnit)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recipes_pub_date")
                    .table(Recipes)
                    .col(recipes::Column::PubDate)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_recipes_pub_date")
                    .table(Recipes)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_ingredients_name_unit")
                    .table(Ingredients)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
