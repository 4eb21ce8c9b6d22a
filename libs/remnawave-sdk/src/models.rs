//! Wire types for the panel user endpoints.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const BYTES_IN_GB: i64 = 1024 * 1024 * 1024;

/// Convert a traffic quota in gigabytes to the byte count the panel expects.
/// Zero or negative quotas mean unlimited, which the panel encodes as `0`.
pub fn gb_to_bytes(gb: i32) -> i64 {
    if gb <= 0 {
        0
    } else {
        i64::from(gb) * BYTES_IN_GB
    }
}

/// Panel-side user status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Disabled,
    Limited,
    Expired,
}

/// How often the panel resets used traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrafficLimitStrategy {
    NoReset,
    Day,
    Week,
    Month,
}

impl FromStr for TrafficLimitStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NO_RESET" => Ok(TrafficLimitStrategy::NoReset),
            "DAY" => Ok(TrafficLimitStrategy::Day),
            "WEEK" => Ok(TrafficLimitStrategy::Week),
            "MONTH" => Ok(TrafficLimitStrategy::Month),
            other => Err(format!("unknown traffic limit strategy: {other}")),
        }
    }
}

/// Happ client links attached to a panel user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HappLinks {
    #[serde(default)]
    pub crypto_link: Option<String>,
}

/// A user record as returned by the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelUser {
    pub uuid: Uuid,
    pub short_uuid: String,
    pub username: String,
    pub status: UserStatus,
    pub expire_at: DateTime<Utc>,
    #[serde(default)]
    pub traffic_limit_bytes: i64,
    #[serde(default)]
    pub used_traffic_bytes: Option<f64>,
    #[serde(default)]
    pub telegram_id: Option<i64>,
    #[serde(default)]
    pub hwid_device_limit: Option<i32>,
    pub subscription_url: String,
    #[serde(default)]
    pub happ: Option<HappLinks>,
}

impl PanelUser {
    /// Happ crypto link, if the panel generated one.
    pub fn crypto_link(&self) -> Option<&str> {
        self.happ.as_ref().and_then(|h| h.crypto_link.as_deref())
    }
}

/// Body of `POST /api/users`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    pub expire_at: DateTime<Utc>,
    pub traffic_limit_bytes: i64,
    pub traffic_limit_strategy: TrafficLimitStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hwid_device_limit: Option<i32>,
    pub active_internal_squads: Vec<Uuid>,
}

/// Body of `PATCH /api/users`. Unset fields are left untouched by the panel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_limit_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_limit_strategy: Option<TrafficLimitStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hwid_device_limit: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_internal_squads: Option<Vec<Uuid>>,
}

impl UpdateUserRequest {
    pub fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            status: None,
            expire_at: None,
            traffic_limit_bytes: None,
            traffic_limit_strategy: None,
            hwid_device_limit: None,
            active_internal_squads: None,
        }
    }
}

/// Every panel response wraps its payload in `{"response": ...}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub response: T,
}
