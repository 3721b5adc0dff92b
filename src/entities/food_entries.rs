use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "food_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub food_id: String,
    pub name: String,
    pub known_as: Option<String>,
    pub category: Option<String>,
    pub category_label: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub upc: Option<String>,
    pub food_contents_label: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub nutrients_json: String,
    #[sea_orm(column_type = "Text")]
    pub measures_json: String,
    #[sea_orm(column_type = "Text")]
    pub serving_sizes_json: String,
    #[sea_orm(column_type = "Text")]
    pub health_labels_json: String,
    #[sea_orm(column_type = "Text")]
    pub diet_labels_json: String,
    #[sea_orm(column_type = "Text")]
    pub qualifiers_json: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub full_details: Option<String>,
    pub has_full_details: bool,
    pub last_api_update: String,
    pub created_at: String,
    pub updated_at: String,
    pub last_used: Option<String>,
    pub usage_count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
