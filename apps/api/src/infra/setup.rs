use crate::{
    adapters::{http::app_state::AppState, remnawave::RemnawaveSync},
    application::ports::provisioning::SubscriptionProvisioner,
    infra::{
        config::AppConfig, error::InfraError, http_client::try_build_client,
        postgres_persistence,
    },
    use_cases::{
        api_token::ApiTokenVerifier,
        subscription::{SubscriptionRepo, SubscriptionUseCases},
        user::UserRepo,
    },
};
use remnawave_sdk::{RemnawaveClient, RemnawaveConfig};
use secrecy::ExposeSecret;
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env()?;

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);
    let user_repo_arc = postgres_arc.clone() as Arc<dyn UserRepo>;
    let subscription_repo_arc = postgres_arc.clone() as Arc<dyn SubscriptionRepo>;

    let remnawave_client = RemnawaveClient::with_http_client(
        RemnawaveConfig {
            base_url: config.remnawave_api_url.clone(),
            api_key: config.remnawave_api_key.expose_secret().to_string(),
            timeout: None,
        },
        try_build_client().map_err(InfraError::HttpClient)?,
    )
    .map_err(InfraError::Remnawave)?;

    let provisioner = Arc::new(RemnawaveSync::new(
        remnawave_client,
        user_repo_arc.clone(),
        subscription_repo_arc.clone(),
        config.remnawave_traffic_strategy,
    )) as Arc<dyn SubscriptionProvisioner>;

    let subscription_use_cases = SubscriptionUseCases::new(
        subscription_repo_arc,
        user_repo_arc,
        provisioner,
        config.subscription_defaults(),
    );

    let api_tokens = ApiTokenVerifier::from_comma_separated(config.web_api_tokens.expose_secret());
    if api_tokens.is_empty() {
        tracing::warn!("WEB_API_TOKENS is empty, every /api request will be rejected");
    }

    Ok(AppState {
        config: Arc::new(config),
        subscription_use_cases: Arc::new(subscription_use_cases),
        api_tokens: Arc::new(api_tokens),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "subsync_api=debug,remnawave_sdk=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs). Console-only if the file cannot be created.
    let json_layer = match File::create("app.log") {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true),
        ),
        Err(e) => {
            eprintln!("cannot create app.log, logging to console only: {e}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
