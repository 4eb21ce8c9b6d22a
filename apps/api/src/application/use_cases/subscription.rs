use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::provisioning::{RemoteUserRef, SubscriptionProvisioner},
        use_cases::user::{UserProfile, UserRepo, UserWithSubscription},
    },
    domain::entities::subscription::SubscriptionStatus,
};

/// Upper bound for a single extension or purchase, in days.
pub const MAX_DURATION_DAYS: i64 = 3650;

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<SubscriptionProfile>>;

    async fn get_by_user_id(&self, user_id: i64) -> AppResult<Option<SubscriptionProfile>>;

    async fn create(&self, input: &CreateSubscriptionInput) -> AppResult<SubscriptionProfile>;

    /// Swap `existing_id` for a new row in one unit. If the insert fails the
    /// existing row is kept.
    async fn replace(
        &self,
        existing_id: i64,
        input: &CreateSubscriptionInput,
    ) -> AppResult<SubscriptionProfile>;

    /// Push `end_date` forward by `days` (counting from now if it already
    /// lapsed) and reactivate an expired subscription. `NotFound` if missing.
    async fn extend(&self, id: i64, days: i64) -> AppResult<SubscriptionProfile>;

    /// Write a previously captured snapshot back over the row.
    async fn restore_state(&self, id: i64, snapshot: &SubscriptionSnapshot) -> AppResult<()>;

    async fn update_remote_links(&self, id: i64, links: &RemoteUserRef) -> AppResult<()>;
}

// ============================================================================
// Profile Types
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionProfile {
    pub id: i64,
    pub user_id: i64,
    pub status: SubscriptionStatus,
    pub is_trial: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub traffic_limit_gb: i32,
    pub traffic_used_gb: f64,
    pub purchased_traffic_gb: i32,
    pub traffic_reset_at: Option<DateTime<Utc>>,
    pub device_limit: i32,
    pub autopay_enabled: bool,
    pub autopay_days_before: Option<i32>,
    pub subscription_url: Option<String>,
    pub subscription_crypto_link: Option<String>,
    pub connected_squads: Vec<String>,
    pub remnawave_short_uuid: Option<String>,
    pub tariff_id: Option<i64>,
    pub is_daily_paused: bool,
    pub last_daily_charge_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionProfile {
    pub fn actual_status(&self) -> SubscriptionStatus {
        self.status.actual(self.end_date, Utc::now())
    }

    /// Whole days left until `end_date`, zero once lapsed.
    pub fn days_left(&self) -> i64 {
        (self.end_date - Utc::now()).num_days().max(0)
    }
}

/// The mutable part of a subscription, captured before a mutation so it can
/// be written back if the remote sync fails.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionSnapshot {
    pub status: SubscriptionStatus,
    pub is_trial: bool,
    pub end_date: DateTime<Utc>,
    pub traffic_limit_gb: i32,
    pub device_limit: i32,
    pub connected_squads: Vec<String>,
    pub subscription_url: Option<String>,
    pub subscription_crypto_link: Option<String>,
    pub remnawave_short_uuid: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&SubscriptionProfile> for SubscriptionSnapshot {
    fn from(sub: &SubscriptionProfile) -> Self {
        Self {
            status: sub.status,
            is_trial: sub.is_trial,
            end_date: sub.end_date,
            traffic_limit_gb: sub.traffic_limit_gb,
            device_limit: sub.device_limit,
            connected_squads: sub.connected_squads.clone(),
            subscription_url: sub.subscription_url.clone(),
            subscription_crypto_link: sub.subscription_crypto_link.clone(),
            remnawave_short_uuid: sub.remnawave_short_uuid.clone(),
            updated_at: sub.updated_at,
        }
    }
}

impl SubscriptionSnapshot {
    pub fn apply_to(&self, sub: &mut SubscriptionProfile) {
        sub.status = self.status;
        sub.is_trial = self.is_trial;
        sub.end_date = self.end_date;
        sub.traffic_limit_gb = self.traffic_limit_gb;
        sub.device_limit = self.device_limit;
        sub.connected_squads = self.connected_squads.clone();
        sub.subscription_url = self.subscription_url.clone();
        sub.subscription_crypto_link = self.subscription_crypto_link.clone();
        sub.remnawave_short_uuid = self.remnawave_short_uuid.clone();
        sub.updated_at = self.updated_at;
    }
}

#[derive(Debug, Clone)]
pub struct CreateSubscriptionInput {
    pub user_id: i64,
    pub status: SubscriptionStatus,
    pub is_trial: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub traffic_limit_gb: i32,
    pub device_limit: i32,
    pub connected_squads: Vec<String>,
}

/// Request to give a user a trial or paid subscription.
#[derive(Debug, Clone, Default)]
pub struct CreateUserSubscriptionInput {
    pub is_trial: bool,
    pub duration_days: Option<i64>,
    pub traffic_limit_gb: Option<i32>,
    pub device_limit: Option<i32>,
    pub squad_uuid: Option<String>,
    pub connected_squads: Vec<String>,
    pub replace_existing: bool,
}

/// Limits applied when a request leaves them unset.
#[derive(Debug, Clone)]
pub struct SubscriptionDefaults {
    pub trial_duration_days: i64,
    pub trial_traffic_limit_gb: i32,
    pub trial_device_limit: i32,
    pub trial_squad_uuid: Option<String>,
    pub default_traffic_limit_gb: i32,
    pub default_device_limit: i32,
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct SubscriptionUseCases {
    subscription_repo: Arc<dyn SubscriptionRepo>,
    user_repo: Arc<dyn UserRepo>,
    provisioner: Arc<dyn SubscriptionProvisioner>,
    defaults: SubscriptionDefaults,
}

impl SubscriptionUseCases {
    pub fn new(
        subscription_repo: Arc<dyn SubscriptionRepo>,
        user_repo: Arc<dyn UserRepo>,
        provisioner: Arc<dyn SubscriptionProvisioner>,
        defaults: SubscriptionDefaults,
    ) -> Self {
        Self {
            subscription_repo,
            user_repo,
            provisioner,
            defaults,
        }
    }

    #[instrument(skip(self))]
    pub async fn get_subscription(&self, id: i64) -> AppResult<SubscriptionProfile> {
        self.subscription_repo
            .get_by_id(id)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Look a user up by internal id, falling back to Telegram id.
    #[instrument(skip(self))]
    pub async fn get_user(&self, user_ref: i64) -> AppResult<UserWithSubscription> {
        let user = self.resolve_user(user_ref).await?;
        let subscription = self.subscription_repo.get_by_user_id(user.id).await?;
        Ok(UserWithSubscription { user, subscription })
    }

    /// Extend a subscription and mirror it to Remnawave.
    ///
    /// If neither updating nor creating the remote user succeeds, the local
    /// row is restored to its pre-extension state and `SyncFailed` is
    /// returned, so a failed request never leaves the extension applied.
    #[instrument(skip(self))]
    pub async fn extend_subscription(&self, id: i64, days: i64) -> AppResult<SubscriptionProfile> {
        if !(1..=MAX_DURATION_DAYS).contains(&days) {
            return Err(AppError::InvalidInput(format!(
                "days must be between 1 and {MAX_DURATION_DAYS}"
            )));
        }

        let current = self.get_subscription(id).await?;
        let snapshot = SubscriptionSnapshot::from(&current);

        let extended = self.subscription_repo.extend(id, days).await?;

        if self.sync_with_remnawave(&extended).await.is_none() {
            self.rollback(id, &snapshot).await?;
            return Err(AppError::SyncFailed(format!(
                "subscription {id} could not be synced, extension rolled back"
            )));
        }

        // Re-read so links written by the sync are included.
        let refreshed = self.get_subscription(id).await?;
        tracing::info!(
            subscription_id = id,
            days,
            end_date = %refreshed.end_date,
            "Subscription extended"
        );
        Ok(refreshed)
    }

    /// Give a user a trial or paid subscription and mirror it to Remnawave.
    ///
    /// A failed sync is logged but keeps the new local subscription.
    #[instrument(skip(self))]
    pub async fn create_user_subscription(
        &self,
        user_ref: i64,
        input: &CreateUserSubscriptionInput,
    ) -> AppResult<UserWithSubscription> {
        let user = self.resolve_user(user_ref).await?;
        let create_input = self.build_create_input(user.id, input, Utc::now())?;

        let subscription = match self.subscription_repo.get_by_user_id(user.id).await? {
            Some(_) if !input.replace_existing => {
                return Err(AppError::InvalidInput(
                    "User already has a subscription".into(),
                ));
            }
            Some(existing) => {
                tracing::info!(
                    user_id = user.id,
                    subscription_id = existing.id,
                    "Replacing existing subscription"
                );
                self.subscription_repo
                    .replace(existing.id, &create_input)
                    .await?
            }
            None => self.subscription_repo.create(&create_input).await?,
        };

        if self.sync_with_remnawave(&subscription).await.is_none() {
            tracing::warn!(
                user_id = user.id,
                subscription_id = subscription.id,
                "Subscription created but Remnawave sync failed"
            );
        }

        let user = self
            .user_repo
            .get_by_id(user.id)
            .await?
            .ok_or(AppError::NotFound)?;
        let subscription = self.subscription_repo.get_by_user_id(user.id).await?;

        Ok(UserWithSubscription { user, subscription })
    }

    // ========================================================================
    // Private Helpers
    // ========================================================================

    async fn resolve_user(&self, user_ref: i64) -> AppResult<UserProfile> {
        if let Some(user) = self.user_repo.get_by_id(user_ref).await? {
            return Ok(user);
        }
        self.user_repo
            .get_by_telegram_id(user_ref)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Try the existing remote record first, then fall back to creating one.
    async fn sync_with_remnawave(&self, subscription: &SubscriptionProfile) -> Option<RemoteUserRef> {
        if let Some(remote) = self.provisioner.update_remote_user(subscription).await {
            return Some(remote);
        }

        tracing::debug!(
            subscription_id = subscription.id,
            "No remote user updated, creating one"
        );
        self.provisioner.create_remote_user(subscription).await
    }

    async fn rollback(&self, id: i64, snapshot: &SubscriptionSnapshot) -> AppResult<()> {
        tracing::warn!(
            subscription_id = id,
            end_date = %snapshot.end_date,
            "Remnawave sync failed, restoring subscription state"
        );

        self.subscription_repo
            .restore_state(id, snapshot)
            .await
            .inspect_err(|err| {
                tracing::error!(
                    subscription_id = id,
                    error = ?err,
                    "Failed to restore subscription after sync failure"
                );
            })
    }

    fn build_create_input(
        &self,
        user_id: i64,
        input: &CreateUserSubscriptionInput,
        now: DateTime<Utc>,
    ) -> AppResult<CreateSubscriptionInput> {
        let defaults = &self.defaults;

        let (status, duration_days, traffic_limit_gb, device_limit, connected_squads) =
            if input.is_trial {
                let squads = input
                    .squad_uuid
                    .clone()
                    .or_else(|| defaults.trial_squad_uuid.clone())
                    .into_iter()
                    .collect();
                (
                    SubscriptionStatus::Trial,
                    input.duration_days.unwrap_or(defaults.trial_duration_days),
                    input
                        .traffic_limit_gb
                        .unwrap_or(defaults.trial_traffic_limit_gb),
                    input.device_limit.unwrap_or(defaults.trial_device_limit),
                    squads,
                )
            } else {
                let days = input.duration_days.ok_or_else(|| {
                    AppError::InvalidInput(
                        "duration_days is required for paid subscriptions".into(),
                    )
                })?;
                (
                    SubscriptionStatus::Active,
                    days,
                    input
                        .traffic_limit_gb
                        .unwrap_or(defaults.default_traffic_limit_gb),
                    input.device_limit.unwrap_or(defaults.default_device_limit),
                    input.connected_squads.clone(),
                )
            };

        if !(1..=MAX_DURATION_DAYS).contains(&duration_days) {
            return Err(AppError::InvalidInput(format!(
                "duration_days must be between 1 and {MAX_DURATION_DAYS}"
            )));
        }
        if traffic_limit_gb < 0 {
            return Err(AppError::InvalidInput(
                "traffic_limit_gb must not be negative".into(),
            ));
        }
        if device_limit < 1 {
            return Err(AppError::InvalidInput(
                "device_limit must be at least 1".into(),
            ));
        }

        Ok(CreateSubscriptionInput {
            user_id,
            status,
            is_trial: input.is_trial,
            start_date: now,
            end_date: now + Duration::days(duration_days),
            traffic_limit_gb,
            device_limit,
            connected_squads,
        })
    }
}
