//! In-memory mock implementations for user and subscription ports.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::provisioning::{RemoteUserRef, SubscriptionProvisioner},
        use_cases::{
            subscription::{
                CreateSubscriptionInput, SubscriptionProfile, SubscriptionRepo,
                SubscriptionSnapshot,
            },
            user::{UserProfile, UserRepo},
        },
    },
    domain::entities::subscription::SubscriptionStatus,
};

// ============================================================================
// InMemoryUserRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepo {
    pub users: Mutex<HashMap<i64, UserProfile>>,
}

impl InMemoryUserRepo {
    pub fn with_users(users: Vec<UserProfile>) -> Self {
        Self {
            users: Mutex::new(users.into_iter().map(|u| (u.id, u)).collect()),
        }
    }

    pub fn get(&self, id: i64) -> Option<UserProfile> {
        self.users.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<UserProfile>> {
        Ok(self.get(id))
    }

    async fn get_by_telegram_id(&self, telegram_id: i64) -> AppResult<Option<UserProfile>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.telegram_id == telegram_id)
            .cloned())
    }

    async fn set_remnawave_uuid(&self, id: i64, remnawave_uuid: Uuid) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).ok_or(AppError::NotFound)?;
        user.remnawave_uuid = Some(remnawave_uuid);
        user.updated_at = Utc::now();
        Ok(())
    }
}

// ============================================================================
// InMemorySubscriptionRepo
// ============================================================================

#[derive(Default)]
pub struct InMemorySubscriptionRepo {
    pub subscriptions: Mutex<HashMap<i64, SubscriptionProfile>>,
    next_id: Mutex<i64>,
    restore_calls: Mutex<usize>,
    fail_create: bool,
    fail_restore: bool,
}

impl InMemorySubscriptionRepo {
    pub fn with_subscriptions(subscriptions: Vec<SubscriptionProfile>) -> Self {
        let next_id = subscriptions.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        Self {
            subscriptions: Mutex::new(subscriptions.into_iter().map(|s| (s.id, s)).collect()),
            next_id: Mutex::new(next_id),
            restore_calls: Mutex::new(0),
            fail_create: false,
            fail_restore: false,
        }
    }

    /// Inserts (plain or as part of a replace) return a database error.
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// `restore_state` is counted but returns a database error.
    pub fn failing_restore(mut self) -> Self {
        self.fail_restore = true;
        self
    }

    pub fn get(&self, id: i64) -> Option<SubscriptionProfile> {
        self.subscriptions.lock().unwrap().get(&id).cloned()
    }

    /// Number of times a snapshot was written back.
    pub fn restore_count(&self) -> usize {
        *self.restore_calls.lock().unwrap()
    }

    fn insert(
        &self,
        subscriptions: &mut HashMap<i64, SubscriptionProfile>,
        input: &CreateSubscriptionInput,
    ) -> AppResult<SubscriptionProfile> {
        if self.fail_create {
            return Err(AppError::Database("insert failed".into()));
        }

        let mut next_id = self.next_id.lock().unwrap();
        let id = (*next_id).max(1);
        *next_id = id + 1;

        let now = Utc::now();
        let profile = SubscriptionProfile {
            id,
            user_id: input.user_id,
            status: input.status,
            is_trial: input.is_trial,
            start_date: input.start_date,
            end_date: input.end_date,
            traffic_limit_gb: input.traffic_limit_gb,
            traffic_used_gb: 0.0,
            purchased_traffic_gb: 0,
            traffic_reset_at: None,
            device_limit: input.device_limit,
            autopay_enabled: false,
            autopay_days_before: Some(3),
            subscription_url: None,
            subscription_crypto_link: None,
            connected_squads: input.connected_squads.clone(),
            remnawave_short_uuid: None,
            tariff_id: None,
            is_daily_paused: false,
            last_daily_charge_at: None,
            created_at: now,
            updated_at: now,
        };
        subscriptions.insert(id, profile.clone());
        Ok(profile)
    }
}

/// Same arithmetic as the `GREATEST(end_date, NOW()) + make_interval(...)`
/// update in `PostgresPersistence::extend`.
fn extended_end_date(end_date: DateTime<Utc>, now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    end_date.max(now) + Duration::days(days)
}

#[async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<SubscriptionProfile>> {
        Ok(self.get(id))
    }

    async fn get_by_user_id(&self, user_id: i64) -> AppResult<Option<SubscriptionProfile>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn create(&self, input: &CreateSubscriptionInput) -> AppResult<SubscriptionProfile> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if subscriptions.values().any(|s| s.user_id == input.user_id) {
            return Err(AppError::InvalidInput(
                "A record with this value already exists".into(),
            ));
        }
        self.insert(&mut subscriptions, input)
    }

    async fn replace(
        &self,
        existing_id: i64,
        input: &CreateSubscriptionInput,
    ) -> AppResult<SubscriptionProfile> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if !subscriptions
            .get(&existing_id)
            .is_some_and(|s| s.user_id == input.user_id)
        {
            return Err(AppError::NotFound);
        }

        // Insert first so a failure leaves the existing row in place.
        let mut staged = subscriptions.clone();
        staged.remove(&existing_id);
        let profile = self.insert(&mut staged, input)?;
        *subscriptions = staged;
        Ok(profile)
    }

    async fn extend(&self, id: i64, days: i64) -> AppResult<SubscriptionProfile> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let sub = subscriptions.get_mut(&id).ok_or(AppError::NotFound)?;

        let now = Utc::now();
        sub.end_date = extended_end_date(sub.end_date, now, days);
        if sub.status == SubscriptionStatus::Expired {
            sub.status = SubscriptionStatus::Active;
        }
        sub.updated_at = now;

        Ok(sub.clone())
    }

    async fn restore_state(&self, id: i64, snapshot: &SubscriptionSnapshot) -> AppResult<()> {
        *self.restore_calls.lock().unwrap() += 1;
        if self.fail_restore {
            return Err(AppError::Database("restore failed".into()));
        }
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let sub = subscriptions.get_mut(&id).ok_or(AppError::NotFound)?;
        snapshot.apply_to(sub);
        Ok(())
    }

    async fn update_remote_links(&self, id: i64, links: &RemoteUserRef) -> AppResult<()> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let sub = subscriptions.get_mut(&id).ok_or(AppError::NotFound)?;
        sub.remnawave_short_uuid = Some(links.short_uuid.clone());
        sub.subscription_url = Some(links.subscription_url.clone());
        sub.subscription_crypto_link = links.crypto_link.clone();
        sub.updated_at = Utc::now();
        Ok(())
    }
}

// ============================================================================
// RecordingProvisioner
// ============================================================================

/// Provisioner with canned results that records which subscriptions it saw.
#[derive(Default)]
pub struct RecordingProvisioner {
    update_result: Option<RemoteUserRef>,
    create_result: Option<RemoteUserRef>,
    update_calls: Mutex<Vec<i64>>,
    create_calls: Mutex<Vec<i64>>,
}

impl RecordingProvisioner {
    pub fn new(update_result: Option<RemoteUserRef>, create_result: Option<RemoteUserRef>) -> Self {
        Self {
            update_result,
            create_result,
            ..Default::default()
        }
    }

    /// Both update and create report failure.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn update_calls(&self) -> Vec<i64> {
        self.update_calls.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> Vec<i64> {
        self.create_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionProvisioner for RecordingProvisioner {
    async fn update_remote_user(
        &self,
        subscription: &SubscriptionProfile,
    ) -> Option<RemoteUserRef> {
        self.update_calls.lock().unwrap().push(subscription.id);
        self.update_result.clone()
    }

    async fn create_remote_user(
        &self,
        subscription: &SubscriptionProfile,
    ) -> Option<RemoteUserRef> {
        self.create_calls.lock().unwrap().push(subscription.id);
        self.create_result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_counts_from_end_date_while_running() {
        let now = Utc::now();
        let end = now + Duration::days(3);
        assert_eq!(extended_end_date(end, now, 30), end + Duration::days(30));
    }

    #[test]
    fn extension_counts_from_now_once_lapsed() {
        let now = Utc::now();
        let end = now - Duration::days(10);
        assert_eq!(extended_end_date(end, now, 7), now + Duration::days(7));
    }
}
