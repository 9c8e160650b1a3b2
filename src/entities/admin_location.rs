use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum LocationCategory {
    #[sea_orm(string_value = "airport")]
    Airport,
    #[sea_orm(string_value = "hotel")]
    Hotel,
    #[sea_orm(string_value = "venue")]
    Venue,
    #[sea_orm(string_value = "corporate")]
    Corporate,
    #[sea_orm(string_value = "other")]
    Other,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_location")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub address: String,
    pub category: LocationCategory,
    pub lat: f64,
    pub lng: f64,
    /// JSON array of alternative names ("LAX", "Los Angeles Airport").
    pub aliases: Json,
    pub icon: Option<String>,
    pub sort_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
