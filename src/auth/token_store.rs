use chrono::{Duration, Utc};
use rand::Rng;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::error::EtudeError;
use crate::models::access_token;

/// Generate a cryptographically secure random token (hex-encoded).
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

/// Data access over the `access_tokens` table.
///
/// Rows are independent; concurrent creation for the same user never
/// contends on shared state.
#[derive(Clone)]
pub struct AccessTokenStore {
    db: DatabaseConnection,
}

impl AccessTokenStore {
    pub fn new(db: DatabaseConnection) -> Self {
        AccessTokenStore { db }
    }

    /// Look up a token row by its value.
    pub async fn get(&self, token: &str) -> Result<Option<access_token::Model>, EtudeError> {
        let found = access_token::Entity::find_by_id(token.to_string())
            .one(&self.db)
            .await?;
        Ok(found)
    }

    /// Mint and persist a new token for the given user.
    pub async fn create(&self, user_id: i32) -> Result<access_token::Model, EtudeError> {
        let model = access_token::ActiveModel {
            token: Set(generate_token()),
            user_id: Set(user_id),
            created_at: Set(Utc::now().naive_utc()),
        };
        let inserted = model.insert(&self.db).await?;
        Ok(inserted)
    }

    /// Delete a token row. Deleting an absent token is not an error.
    pub async fn delete(&self, token: &str) -> Result<(), EtudeError> {
        access_token::Entity::delete_by_id(token.to_string())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Delete every token older than `lifetime_seconds`.
    ///
    /// Expiry is otherwise lazy (checked at read time), so lapsed rows
    /// accumulate until an operator calls this. Returns the number of rows
    /// removed.
    pub async fn purge_expired(&self, lifetime_seconds: i64) -> Result<u64, EtudeError> {
        let cutoff = Utc::now().naive_utc() - Duration::seconds(lifetime_seconds);
        let result = access_token::Entity::delete_many()
            .filter(access_token::Column::CreatedAt.lte(cutoff))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
