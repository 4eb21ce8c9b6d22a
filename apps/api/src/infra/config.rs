use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use remnawave_sdk::TrafficLimitStrategy;
use secrecy::SecretString;
use url::Url;
use uuid::Uuid;

use crate::{
    application::use_cases::subscription::SubscriptionDefaults, infra::error::InfraError,
};

pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    /// Comma-separated static tokens accepted on `/api`.
    pub web_api_tokens: SecretString,
    pub remnawave_api_url: Url,
    pub remnawave_api_key: SecretString,
    pub remnawave_traffic_strategy: TrafficLimitStrategy,
    pub trial_duration_days: i64,
    pub trial_traffic_limit_gb: i32,
    pub trial_device_limit: i32,
    /// Squad assigned to trials that do not request one.
    pub trial_squad_uuid: Option<String>,
    /// 0 means unlimited.
    pub default_traffic_limit_gb: i32,
    pub default_device_limit: i32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let database_url: String = get_env("DATABASE_URL");
        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 8080)));
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid {
                    var: "CORS_ORIGIN",
                    reason: "not a valid header value".into(),
                })?;

        let web_api_tokens =
            SecretString::new(get_env_default("WEB_API_TOKENS", String::new()).into());

        let remnawave_api_url: Url = get_env("REMNAWAVE_API_URL");
        let remnawave_api_key = SecretString::new(get_env::<String>("REMNAWAVE_API_KEY").into());
        let remnawave_traffic_strategy: TrafficLimitStrategy =
            get_env_default("REMNAWAVE_TRAFFIC_STRATEGY", String::from("MONTH"))
                .parse()
                .map_err(|reason| InfraError::ConfigInvalid {
                    var: "REMNAWAVE_TRAFFIC_STRATEGY",
                    reason,
                })?;

        let trial_duration_days: i64 = get_env_default("TRIAL_DURATION_DAYS", 3);
        let trial_traffic_limit_gb: i32 = get_env_default("TRIAL_TRAFFIC_LIMIT_GB", 10);
        let trial_device_limit: i32 = get_env_default("TRIAL_DEVICE_LIMIT", 1);
        let trial_squad_uuid =
            parse_trial_squad(get_env_default("TRIAL_SQUAD_UUID", String::new()))?;
        let default_traffic_limit_gb: i32 = get_env_default("DEFAULT_TRAFFIC_LIMIT_GB", 0);
        let default_device_limit: i32 = get_env_default("DEFAULT_DEVICE_LIMIT", 3);

        Ok(Self {
            database_url,
            bind_addr,
            cors_origin,
            web_api_tokens,
            remnawave_api_url,
            remnawave_api_key,
            remnawave_traffic_strategy,
            trial_duration_days,
            trial_traffic_limit_gb,
            trial_device_limit,
            trial_squad_uuid,
            default_traffic_limit_gb,
            default_device_limit,
        })
    }

    pub fn subscription_defaults(&self) -> SubscriptionDefaults {
        SubscriptionDefaults {
            trial_duration_days: self.trial_duration_days,
            trial_traffic_limit_gb: self.trial_traffic_limit_gb,
            trial_device_limit: self.trial_device_limit,
            trial_squad_uuid: self.trial_squad_uuid.clone(),
            default_traffic_limit_gb: self.default_traffic_limit_gb,
            default_device_limit: self.default_device_limit,
        }
    }
}

/// Unset or blank means no default squad for trials.
fn parse_trial_squad(raw: String) -> Result<Option<String>, InfraError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<Uuid>()
        .map(|uuid| Some(uuid.to_string()))
        .map_err(|e| InfraError::ConfigInvalid {
            var: "TRIAL_SQUAD_UUID",
            reason: e.to_string(),
        })
}
