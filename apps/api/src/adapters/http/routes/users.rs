use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    adapters::http::{app_state::AppState, routes::subscriptions::SubscriptionResponse},
    app_error::{AppError, AppResult},
    application::use_cases::{
        subscription::CreateUserSubscriptionInput, user::UserWithSubscription,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(get_user))
        .route("/{id}/subscription", post(create_user_subscription))
}

#[derive(Deserialize, Validate)]
struct CreateUserSubscriptionPayload {
    #[serde(default = "default_is_trial")]
    is_trial: bool,
    #[validate(range(min = 1, max = 3650))]
    duration_days: Option<i64>,
    #[validate(range(min = 0))]
    traffic_limit_gb: Option<i32>,
    #[validate(range(min = 1))]
    device_limit: Option<i32>,
    #[validate(custom(function = "validate_squad_uuid"))]
    squad_uuid: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_squad_uuids"))]
    connected_squads: Vec<String>,
    #[serde(default)]
    replace_existing: bool,
}

fn default_is_trial() -> bool {
    true
}

fn validate_squad_uuid(squad: &str) -> Result<(), ValidationError> {
    squad
        .parse::<Uuid>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("squad_uuid"))
}

fn validate_squad_uuids(squads: &[String]) -> Result<(), ValidationError> {
    squads.iter().try_for_each(|s| validate_squad_uuid(s))
}

impl From<CreateUserSubscriptionPayload> for CreateUserSubscriptionInput {
    fn from(p: CreateUserSubscriptionPayload) -> Self {
        Self {
            is_trial: p.is_trial,
            duration_days: p.duration_days,
            traffic_limit_gb: p.traffic_limit_gb,
            device_limit: p.device_limit,
            squad_uuid: p.squad_uuid,
            connected_squads: p.connected_squads,
            replace_existing: p.replace_existing,
        }
    }
}

#[derive(Serialize)]
struct UserResponse {
    id: i64,
    telegram_id: i64,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    full_name: Option<String>,
    status: String,
    language: String,
    balance_kopeks: i64,
    balance_rubles: f64,
    remnawave_uuid: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_activity: Option<DateTime<Utc>>,
    subscription: Option<SubscriptionResponse>,
}

impl From<&UserWithSubscription> for UserResponse {
    fn from(u: &UserWithSubscription) -> Self {
        let user = &u.user;
        Self {
            id: user.id,
            telegram_id: user.telegram_id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            status: user.status.as_str().to_string(),
            language: user.language.clone(),
            balance_kopeks: user.balance_kopeks,
            balance_rubles: user.balance_kopeks as f64 / 100.0,
            remnawave_uuid: user.remnawave_uuid,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_activity: user.last_activity,
            subscription: u.subscription.as_ref().map(SubscriptionResponse::from),
        }
    }
}

/// `id` is the internal user id or, failing that, the Telegram id.
async fn get_user(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let user = app_state.subscription_use_cases.get_user(id).await?;
    Ok(Json(UserResponse::from(&user)))
}

async fn create_user_subscription(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateUserSubscriptionPayload>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let input = CreateUserSubscriptionInput::from(payload);
    let user = app_state
        .subscription_use_cases
        .create_user_subscription(id, &input)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}
