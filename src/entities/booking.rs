use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub reference: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub pickup: Json,
    pub dropoff: Json,
    pub stops: Json,
    pub distance_yards: i64,
    pub vehicle_type: String,
    pub trip_type: String,
    pub passengers: i32,
    pub luggage: i32,
    pub pickup_at: DateTimeWithTimeZone,
    pub return_at: Option<DateTimeWithTimeZone>,
    pub hourly_hours: Option<i32>,
    pub notes: Option<String>,
    pub payment: Json,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
