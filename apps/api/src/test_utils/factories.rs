//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    application::{
        ports::provisioning::RemoteUserRef,
        use_cases::{
            subscription::{SubscriptionDefaults, SubscriptionProfile},
            user::UserProfile,
        },
    },
    domain::entities::{subscription::SubscriptionStatus, user::UserStatus},
};

/// Create a test user with sensible defaults.
pub fn create_test_user(overrides: impl FnOnce(&mut UserProfile)) -> UserProfile {
    let mut user = UserProfile {
        id: 1,
        telegram_id: 100_001,
        username: Some("test_user".to_string()),
        first_name: Some("Test".to_string()),
        last_name: None,
        status: UserStatus::Active,
        language: "ru".to_string(),
        balance_kopeks: 0,
        remnawave_uuid: None,
        created_at: test_datetime(),
        updated_at: test_datetime(),
        last_activity: None,
    };
    overrides(&mut user);
    user
}

/// Create a running subscription ending 30 days from now.
pub fn create_test_subscription(
    user_id: i64,
    overrides: impl FnOnce(&mut SubscriptionProfile),
) -> SubscriptionProfile {
    let now = test_datetime();

    let mut subscription = SubscriptionProfile {
        id: 1,
        user_id,
        status: SubscriptionStatus::Active,
        is_trial: false,
        start_date: now,
        end_date: Utc::now() + Duration::days(30),
        traffic_limit_gb: 100,
        traffic_used_gb: 0.0,
        purchased_traffic_gb: 0,
        traffic_reset_at: None,
        device_limit: 3,
        autopay_enabled: false,
        autopay_days_before: Some(3),
        subscription_url: None,
        subscription_crypto_link: None,
        connected_squads: vec![],
        remnawave_short_uuid: None,
        tariff_id: None,
        is_daily_paused: false,
        last_daily_charge_at: None,
        created_at: now,
        updated_at: now,
    };
    overrides(&mut subscription);
    subscription
}

/// Create a remote user handle as returned by a successful sync.
pub fn create_test_remote_ref(short_uuid: &str) -> RemoteUserRef {
    RemoteUserRef {
        uuid: Uuid::new_v4(),
        short_uuid: short_uuid.to_string(),
        subscription_url: format!("https://sub.example.com/{short_uuid}"),
        crypto_link: Some(format!("happ://crypt/{short_uuid}")),
    }
}

pub fn test_defaults() -> SubscriptionDefaults {
    SubscriptionDefaults {
        trial_duration_days: 3,
        trial_traffic_limit_gb: 10,
        trial_device_limit: 1,
        trial_squad_uuid: Some("0b6b7e7c-5a8e-4a4e-9c1b-3f0d9c2b1a11".to_string()),
        default_traffic_limit_gb: 0,
        default_device_limit: 3,
    }
}

/// A fixed point in the past used for creation timestamps.
pub fn test_datetime() -> DateTime<Utc> {
    DateTime::from_timestamp(1_735_689_600, 0).unwrap_or_default()
}
