use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Trial,
    Disabled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Disabled => "disabled",
        }
    }

    /// Status as seen by the user at `now`: a running subscription whose end
    /// date has passed reports `Expired` even if the row was not updated yet.
    pub fn actual(&self, end_date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        match self {
            SubscriptionStatus::Active | SubscriptionStatus::Trial if end_date <= now => {
                SubscriptionStatus::Expired
            }
            other => *other,
        }
    }
}
