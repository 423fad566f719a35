use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::types::{
    NewUser, SignupProfile, SyncOutcome, UserRecord, UserUpdate, DEFAULT_TENANT_ROLE,
};

/// Persistence seam for the `users` table.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_cognito_sub(&self, sub: &str) -> Result<Option<UserRecord>, StoreError>;
    async fn insert(&self, user: &NewUser) -> Result<(), StoreError>;
    async fn update(&self, sub: &str, update: &UserUpdate) -> Result<(), StoreError>;
}

/// Ensure exactly one row exists for the profile's cognito sub.
///
/// First delivery inserts; a redelivery stages only the mutable fields that
/// actually changed. Email, cognito sub and role are never written after
/// creation.
pub async fn sync_user<S>(store: &S, profile: &SignupProfile) -> Result<SyncOutcome, StoreError>
where
    S: UserStore + ?Sized,
{
    match store.find_by_cognito_sub(&profile.cognito_sub).await? {
        None => {
            let user = NewUser {
                cognito_sub: profile.cognito_sub.clone(),
                email: profile.email.clone(),
                name: profile.name.clone(),
                username: profile.username.clone(),
                phone_number: profile.phone_number.clone(),
                restaurant_name: profile.restaurant_name.clone(),
            };
            store.insert(&user).await?;
            Ok(SyncOutcome::Created)
        }
        Some(existing) => {
            let update = stage_update(&existing, profile);
            if update.is_empty() {
                Ok(SyncOutcome::Unchanged)
            } else {
                store.update(&profile.cognito_sub, &update).await?;
                Ok(SyncOutcome::Updated)
            }
        }
    }
}

/// Stage a field only when the incoming value is present and differs from
/// the stored one. A field missing from the event never clears a column.
fn stage_update(existing: &UserRecord, profile: &SignupProfile) -> UserUpdate {
    let mut update = UserUpdate::default();

    if let Some(name) = &profile.name {
        if existing.name.as_deref() != Some(name) {
            update.name = Some(name.clone());
        }
    }
    if let Some(phone) = &profile.phone_number {
        if existing.phone_number.as_deref() != Some(phone) {
            update.phone_number = Some(phone.clone());
        }
    }
    if let Some(restaurant) = &profile.restaurant_name {
        if existing.restaurant_name.as_deref() != Some(restaurant) {
            update.restaurant_name = Some(restaurant.clone());
        }
    }

    update
}

/// Postgres-backed store over the shared `users` table. The main backend
/// owns the schema; columns are camelCase on that side, with "cognitoSub"
/// as primary key and a unique index on email.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_BY_SUB: &str = r#"
    SELECT "cognitoSub" AS cognito_sub, email, name, username,
           "phoneNumber" AS phone_number, "restaurantName" AS restaurant_name,
           role, "createdAt" AS created_at, "updatedAt" AS updated_at
      FROM users
     WHERE "cognitoSub" = $1
"#;

const INSERT_USER: &str = r#"
    INSERT INTO users
        ("cognitoSub", email, name, username, "phoneNumber", "restaurantName",
         role, "createdAt", "updatedAt")
    VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
    ON CONFLICT ("cognitoSub") DO NOTHING
"#;

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_cognito_sub(&self, sub: &str) -> Result<Option<UserRecord>, StoreError> {
        let record = sqlx::query_as::<_, UserRecord>(SELECT_BY_SUB)
            .bind(sub)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn insert(&self, user: &NewUser) -> Result<(), StoreError> {
        sqlx::query(INSERT_USER)
            .bind(&user.cognito_sub)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.username)
            .bind(&user.phone_number)
            .bind(&user.restaurant_name)
            .bind(DEFAULT_TENANT_ROLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update(&self, sub: &str, update: &UserUpdate) -> Result<(), StoreError> {
        // Build the SET list from whichever fields were staged
        let mut sets: Vec<String> = Vec::new();
        let mut idx = 1;

        if update.name.is_some() {
            sets.push(format!("name = ${idx}"));
            idx += 1;
        }
        if update.phone_number.is_some() {
            sets.push(format!("\"phoneNumber\" = ${idx}"));
            idx += 1;
        }
        if update.restaurant_name.is_some() {
            sets.push(format!("\"restaurantName\" = ${idx}"));
            idx += 1;
        }

        if sets.is_empty() {
            return Ok(());
        }
        sets.push("\"updatedAt\" = NOW()".to_string());

        let sql = format!(
            "UPDATE users SET {} WHERE \"cognitoSub\" = ${idx}",
            sets.join(", ")
        );

        let mut query = sqlx::query(&sql);
        if let Some(name) = &update.name {
            query = query.bind(name);
        }
        if let Some(phone) = &update.phone_number {
            query = query.bind(phone);
        }
        if let Some(restaurant) = &update.restaurant_name {
            query = query.bind(restaurant);
        }

        query.bind(sub).execute(&self.pool).await?;
        Ok(())
    }
}
