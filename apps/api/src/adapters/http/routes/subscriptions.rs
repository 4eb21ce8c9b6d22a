use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::use_cases::subscription::SubscriptionProfile,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_subscription))
        .route("/{id}/extend", post(extend_subscription))
}

#[derive(Deserialize, Validate)]
struct ExtendSubscriptionPayload {
    #[validate(range(min = 1, max = 3650))]
    days: i64,
}

#[derive(Serialize)]
pub(crate) struct SubscriptionResponse {
    id: i64,
    user_id: i64,
    status: String,
    actual_status: String,
    is_trial: bool,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    days_left: i64,
    traffic_limit_gb: i32,
    traffic_used_gb: f64,
    purchased_traffic_gb: i32,
    device_limit: i32,
    autopay_enabled: bool,
    autopay_days_before: Option<i32>,
    subscription_url: Option<String>,
    subscription_crypto_link: Option<String>,
    connected_squads: Vec<String>,
    remnawave_short_uuid: Option<String>,
    tariff_id: Option<i64>,
    is_daily_paused: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&SubscriptionProfile> for SubscriptionResponse {
    fn from(sub: &SubscriptionProfile) -> Self {
        Self {
            id: sub.id,
            user_id: sub.user_id,
            status: sub.status.as_str().to_string(),
            actual_status: sub.actual_status().as_str().to_string(),
            is_trial: sub.is_trial,
            start_date: sub.start_date,
            end_date: sub.end_date,
            days_left: sub.days_left(),
            traffic_limit_gb: sub.traffic_limit_gb,
            traffic_used_gb: sub.traffic_used_gb,
            purchased_traffic_gb: sub.purchased_traffic_gb,
            device_limit: sub.device_limit,
            autopay_enabled: sub.autopay_enabled,
            autopay_days_before: sub.autopay_days_before,
            subscription_url: sub.subscription_url.clone(),
            subscription_crypto_link: sub.subscription_crypto_link.clone(),
            connected_squads: sub.connected_squads.clone(),
            remnawave_short_uuid: sub.remnawave_short_uuid.clone(),
            tariff_id: sub.tariff_id,
            is_daily_paused: sub.is_daily_paused,
            created_at: sub.created_at,
            updated_at: sub.updated_at,
        }
    }
}

async fn get_subscription(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let subscription = app_state.subscription_use_cases.get_subscription(id).await?;
    Ok(Json(SubscriptionResponse::from(&subscription)))
}

async fn extend_subscription(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ExtendSubscriptionPayload>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let subscription = app_state
        .subscription_use_cases
        .extend_subscription(id, payload.days)
        .await?;

    Ok(Json(SubscriptionResponse::from(&subscription)))
}
