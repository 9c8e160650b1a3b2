use sea_orm::{Database, DatabaseConnection, EntityTrait};

use crate::config::Config;
use crate::entities::admin_location;
use crate::error::{AppError, AppResult};
use crate::locations::AdminLocationIndex;

pub async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    Database::connect(&config.database_url)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))
}

/// Read the curated locations once; the index never changes afterwards.
pub async fn load_admin_locations(db: &DatabaseConnection) -> AppResult<AdminLocationIndex> {
    let models = admin_location::Entity::find().all(db).await?;
    Ok(AdminLocationIndex::from_models(models))
}
