use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role given to every account created through signup confirmation.
/// Any other role is assigned later by the main backend.
pub const DEFAULT_TENANT_ROLE: &str = "RestaurantOwners";

// ========== USER ==========
#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct UserRecord {
    pub cognito_sub: String,
    pub email: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub restaurant_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row values for a first-time signup. Role and timestamps are filled in by
/// the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub cognito_sub: String,
    pub email: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub restaurant_name: Option<String>,
}

/// Mutable fields staged for an existing row. Only `Some` fields are
/// written; identity fields are not represented here at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub restaurant_name: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone_number.is_none() && self.restaurant_name.is_none()
    }
}

// ========== SIGNUP ==========
/// Normalized projection of one confirmation event. Email is already
/// lowercased; absent or empty attributes are `None`.
#[derive(Debug, Clone)]
pub struct SignupProfile {
    pub cognito_sub: String,
    pub email: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub restaurant_name: Option<String>,
}

/// What one sync pass did to the `users` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
}
