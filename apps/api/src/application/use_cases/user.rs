use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    application::use_cases::subscription::SubscriptionProfile,
    domain::entities::user::UserStatus,
};

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<UserProfile>>;

    async fn get_by_telegram_id(&self, telegram_id: i64) -> AppResult<Option<UserProfile>>;

    /// Link the local user to its Remnawave panel user.
    async fn set_remnawave_uuid(&self, id: i64, remnawave_uuid: Uuid) -> AppResult<()>;
}

#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: UserStatus,
    pub language: String,
    pub balance_kopeks: i64,
    pub remnawave_uuid: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.trim().is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// A user together with its (at most one) subscription.
#[derive(Debug, Clone)]
pub struct UserWithSubscription {
    pub user: UserProfile,
    pub subscription: Option<SubscriptionProfile>,
}
