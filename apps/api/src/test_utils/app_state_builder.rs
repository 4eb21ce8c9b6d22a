//! Test app state builder for HTTP-level integration testing.
//!
//! `TestAppStateBuilder` creates an `AppState` backed by in-memory repos and a
//! recording provisioner, so route tests run without Postgres or a panel.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use remnawave_sdk::TrafficLimitStrategy;
use secrecy::SecretString;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::{
        api_token::ApiTokenVerifier,
        subscription::{SubscriptionProfile, SubscriptionUseCases},
        user::UserProfile,
    },
    infra::config::AppConfig,
    test_utils::{
        InMemorySubscriptionRepo, InMemoryUserRepo, RecordingProvisioner, test_defaults,
    },
};

/// Token accepted by every state built here.
pub const TEST_API_TOKEN: &str = "test_web_api_token";

/// Handles to the doubles behind a built `AppState`, for assertions.
pub struct TestMocks {
    pub users: Arc<InMemoryUserRepo>,
    pub subscriptions: Arc<InMemorySubscriptionRepo>,
    pub provisioner: Arc<RecordingProvisioner>,
}

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let (app_state, mocks) = TestAppStateBuilder::new()
///     .with_user(create_test_user(|u| u.id = 1))
///     .with_subscription(create_test_subscription(1, |s| s.id = 10))
///     .with_provisioner(RecordingProvisioner::failing())
///     .build_with_mocks();
/// ```
pub struct TestAppStateBuilder {
    users: Vec<UserProfile>,
    subscriptions: Vec<SubscriptionProfile>,
    provisioner: RecordingProvisioner,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            users: vec![],
            subscriptions: vec![],
            provisioner: RecordingProvisioner::failing(),
        }
    }

    pub fn with_user(mut self, user: UserProfile) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_subscription(mut self, subscription: SubscriptionProfile) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    pub fn with_provisioner(mut self, provisioner: RecordingProvisioner) -> Self {
        self.provisioner = provisioner;
        self
    }

    pub fn build(self) -> AppState {
        self.build_with_mocks().0
    }

    pub fn build_with_mocks(self) -> (AppState, TestMocks) {
        let users = Arc::new(InMemoryUserRepo::with_users(self.users));
        let subscriptions = Arc::new(InMemorySubscriptionRepo::with_subscriptions(
            self.subscriptions,
        ));
        let provisioner = Arc::new(self.provisioner);

        let subscription_use_cases = SubscriptionUseCases::new(
            subscriptions.clone(),
            users.clone(),
            provisioner.clone(),
            test_defaults(),
        );

        let app_state = AppState {
            config: Arc::new(test_config()),
            subscription_use_cases: Arc::new(subscription_use_cases),
            api_tokens: Arc::new(ApiTokenVerifier::from_comma_separated(TEST_API_TOKEN)),
        };

        (
            app_state,
            TestMocks {
                users,
                subscriptions,
                provisioner,
            },
        )
    }
}

fn test_config() -> AppConfig {
    let defaults = test_defaults();
    AppConfig {
        database_url: "postgres://localhost/test".to_string(),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        web_api_tokens: SecretString::new(TEST_API_TOKEN.into()),
        remnawave_api_url: Url::parse("http://localhost:3010").unwrap(),
        remnawave_api_key: SecretString::new("panel-token".into()),
        remnawave_traffic_strategy: TrafficLimitStrategy::Month,
        trial_duration_days: defaults.trial_duration_days,
        trial_traffic_limit_gb: defaults.trial_traffic_limit_gb,
        trial_device_limit: defaults.trial_device_limit,
        trial_squad_uuid: defaults.trial_squad_uuid,
        default_traffic_limit_gb: defaults.default_traffic_limit_gb,
        default_device_limit: defaults.default_device_limit,
    }
}
