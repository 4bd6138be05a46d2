use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TryIntoModel,
};

use crate::error::EtudeError;
use crate::models::user;

/// Fields for inserting a user row. The password arrives already hashed;
/// only the user manager mints hashes.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub hashed_password: String,
    pub first_name: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
}

/// Partial update applied to an existing user row.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub hashed_password: Option<String>,
    pub first_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
}

/// Data access over the `users` table. Emails are normalized to lowercase
/// on the way in, so the unique index enforces case-insensitive uniqueness.
#[derive(Clone)]
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        UserStore { db }
    }

    pub async fn get(&self, id: i32) -> Result<Option<user::Model>, EtudeError> {
        let found = user::Entity::find_by_id(id).one(&self.db).await?;
        Ok(found)
    }

    /// Case-normalized exact-match lookup.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<user::Model>, EtudeError> {
        let normalized = email.trim().to_lowercase();
        let found = user::Entity::find()
            .filter(user::Column::Email.eq(normalized))
            .one(&self.db)
            .await?;
        Ok(found)
    }

    /// Insert a new user. A unique-email violation fails with
    /// [`EtudeError::DuplicateEmail`]; the existing row is untouched.
    pub async fn create(&self, fields: CreateUser) -> Result<user::Model, EtudeError> {
        let email = fields.email.trim().to_lowercase();

        let model = user::ActiveModel {
            email: Set(email.clone()),
            hashed_password: Set(fields.hashed_password),
            first_name: Set(fields.first_name),
            is_active: Set(fields.is_active),
            is_superuser: Set(fields.is_superuser),
            is_verified: Set(fields.is_verified),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(inserted) => Ok(inserted),
            Err(err) if is_unique_violation(&err) => Err(EtudeError::DuplicateEmail(email)),
            Err(err) => Err(err.into()),
        }
    }

    /// Apply a partial update to a user row.
    pub async fn update(
        &self,
        current: user::Model,
        changes: UpdateUser,
    ) -> Result<user::Model, EtudeError> {
        let mut active: user::ActiveModel = current.into();

        let mut new_email = None;
        if let Some(email) = changes.email {
            let normalized = email.trim().to_lowercase();
            new_email = Some(normalized.clone());
            active.email = Set(normalized);
        }
        if let Some(hash) = changes.hashed_password {
            active.hashed_password = Set(hash);
        }
        if let Some(first_name) = changes.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(is_superuser) = changes.is_superuser {
            active.is_superuser = Set(is_superuser);
        }
        if let Some(is_verified) = changes.is_verified {
            active.is_verified = Set(is_verified);
        }

        // An UPDATE with no SET clause is a backend error
        if !active.is_changed() {
            return active.try_into_model().map_err(Into::into);
        }

        match active.update(&self.db).await {
            Ok(updated) => Ok(updated),
            Err(err) if is_unique_violation(&err) => Err(EtudeError::DuplicateEmail(
                new_email.unwrap_or_default(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// List users ordered by id ascending.
    pub async fn list(&self, limit: u64, offset: u64) -> Result<Vec<user::Model>, EtudeError> {
        let users = user::Entity::find()
            .order_by_asc(user::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.db)
            .await?;
        Ok(users)
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
