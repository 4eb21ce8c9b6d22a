use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::user::UserStatus,
    use_cases::user::{UserProfile, UserRepo},
};

// User row as stored in the db.
#[derive(sqlx::FromRow, Debug)]
pub struct UserDb {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: UserStatus,
    pub language: String,
    pub balance_kopeks: i64,
    pub remnawave_uuid: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl From<UserDb> for UserProfile {
    fn from(r: UserDb) -> Self {
        UserProfile {
            id: r.id,
            telegram_id: r.telegram_id,
            username: r.username,
            first_name: r.first_name,
            last_name: r.last_name,
            status: r.status,
            language: r.language,
            balance_kopeks: r.balance_kopeks,
            remnawave_uuid: r.remnawave_uuid,
            created_at: r.created_at,
            updated_at: r.updated_at,
            last_activity: r.last_activity,
        }
    }
}

const SELECT_COLS: &str = r#"
    id, telegram_id, username, first_name, last_name, status, language,
    balance_kopeks, remnawave_uuid, created_at, updated_at, last_activity
"#;

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<UserProfile>> {
        let rec = sqlx::query_as::<_, UserDb>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rec.map(UserProfile::from))
    }

    async fn get_by_telegram_id(&self, telegram_id: i64) -> AppResult<Option<UserProfile>> {
        let rec = sqlx::query_as::<_, UserDb>(&format!(
            "SELECT {} FROM users WHERE telegram_id = $1",
            SELECT_COLS
        ))
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rec.map(UserProfile::from))
    }

    async fn set_remnawave_uuid(&self, id: i64, remnawave_uuid: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET remnawave_uuid = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(remnawave_uuid)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
