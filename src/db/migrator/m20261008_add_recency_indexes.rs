use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_food_entries_recency")
                    .table(FoodEntries::Table)
                    .col(FoodEntries::LastUsed)
                    .col(FoodEntries::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_terms_recency")
                    .table(SearchTerms::Table)
                    .col(SearchTerms::LastUsed)
                    .col(SearchTerms::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_autocomplete_entries_recency")
                    .table(AutocompleteEntries::Table)
                    .col(AutocompleteEntries::LastUsed)
                    .col(AutocompleteEntries::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        for index in [
            "idx_food_entries_recency",
            "idx_search_terms_recency",
            "idx_autocomplete_entries_recency",
        ] {
            conn.execute_unprepared(&format!("DROP INDEX IF EXISTS {index}"))
                .await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden)]
enum FoodEntries {
    Table,
    LastUsed,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SearchTerms {
    Table,
    LastUsed,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AutocompleteEntries {
    Table,
    LastUsed,
    CreatedAt,
}
