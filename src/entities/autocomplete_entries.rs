use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "autocomplete_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub query: String,
    #[sea_orm(column_type = "Text")]
    pub suggestions_json: String,
    pub created_at: String,
    pub last_used: Option<String>,
    pub usage_count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
