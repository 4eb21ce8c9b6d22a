use async_trait::async_trait;
use sqlx::{Row, types::Json};

use crate::{
    adapters::persistence::{PostgresPersistence, parse_json_with_fallback},
    app_error::{AppError, AppResult},
    application::{
        ports::provisioning::RemoteUserRef,
        use_cases::subscription::{
            CreateSubscriptionInput, SubscriptionProfile, SubscriptionRepo, SubscriptionSnapshot,
        },
    },
};

fn row_to_profile(row: &sqlx::postgres::PgRow) -> SubscriptionProfile {
    let id: i64 = row.get("id");
    let squads_json: serde_json::Value = row.get("connected_squads");

    SubscriptionProfile {
        id,
        user_id: row.get("user_id"),
        status: row.get("status"),
        is_trial: row.get("is_trial"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        traffic_limit_gb: row.get("traffic_limit_gb"),
        traffic_used_gb: row.get("traffic_used_gb"),
        purchased_traffic_gb: row.get("purchased_traffic_gb"),
        traffic_reset_at: row.get("traffic_reset_at"),
        device_limit: row.get("device_limit"),
        autopay_enabled: row.get("autopay_enabled"),
        autopay_days_before: row.get("autopay_days_before"),
        subscription_url: row.get("subscription_url"),
        subscription_crypto_link: row.get("subscription_crypto_link"),
        connected_squads: parse_json_with_fallback(
            &squads_json,
            "connected_squads",
            "subscription",
            &id.to_string(),
        ),
        remnawave_short_uuid: row.get("remnawave_short_uuid"),
        tariff_id: row.get("tariff_id"),
        is_daily_paused: row.get("is_daily_paused"),
        last_daily_charge_at: row.get("last_daily_charge_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, user_id, status, is_trial, start_date, end_date,
    traffic_limit_gb, traffic_used_gb, purchased_traffic_gb, traffic_reset_at,
    device_limit, autopay_enabled, autopay_days_before,
    subscription_url, subscription_crypto_link, connected_squads, remnawave_short_uuid,
    tariff_id, is_daily_paused, last_daily_charge_at, created_at, updated_at
"#;

fn insert_sql() -> String {
    format!(
        r#"
        INSERT INTO subscriptions (
            user_id, status, is_trial, start_date, end_date,
            traffic_limit_gb, device_limit, connected_squads
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {}
        "#,
        SELECT_COLS
    )
}

fn bind_insert<'q>(
    sql: &'q str,
    input: &'q CreateSubscriptionInput,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(sql)
        .bind(input.user_id)
        .bind(input.status)
        .bind(input.is_trial)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.traffic_limit_gb)
        .bind(input.device_limit)
        .bind(Json(&input.connected_squads))
}

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<SubscriptionProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_profile))
    }

    async fn get_by_user_id(&self, user_id: i64) -> AppResult<Option<SubscriptionProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1",
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_profile))
    }

    async fn create(&self, input: &CreateSubscriptionInput) -> AppResult<SubscriptionProfile> {
        let row = bind_insert(&insert_sql(), input)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row_to_profile(&row))
    }

    async fn replace(
        &self,
        existing_id: i64,
        input: &CreateSubscriptionInput,
    ) -> AppResult<SubscriptionProfile> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        let deleted = sqlx::query("DELETE FROM subscriptions WHERE id = $1 AND user_id = $2")
            .bind(existing_id)
            .bind(input.user_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        let row = bind_insert(&insert_sql(), input)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(row_to_profile(&row))
    }

    async fn extend(&self, id: i64, days: i64) -> AppResult<SubscriptionProfile> {
        let days = i32::try_from(days)
            .map_err(|_| AppError::InvalidInput("days is out of range".into()))?;

        // Computed in one statement so concurrent extensions both apply.
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions
            SET end_date = GREATEST(end_date, NOW()) + make_interval(days => $2),
                status = CASE WHEN status = 'expired' THEN 'active'::subscription_status ELSE status END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(days)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        row.as_ref().map(row_to_profile).ok_or(AppError::NotFound)
    }

    async fn restore_state(&self, id: i64, snapshot: &SubscriptionSnapshot) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = $2,
                is_trial = $3,
                end_date = $4,
                traffic_limit_gb = $5,
                device_limit = $6,
                connected_squads = $7,
                subscription_url = $8,
                subscription_crypto_link = $9,
                remnawave_short_uuid = $10,
                updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(snapshot.status)
        .bind(snapshot.is_trial)
        .bind(snapshot.end_date)
        .bind(snapshot.traffic_limit_gb)
        .bind(snapshot.device_limit)
        .bind(Json(&snapshot.connected_squads))
        .bind(&snapshot.subscription_url)
        .bind(&snapshot.subscription_crypto_link)
        .bind(&snapshot.remnawave_short_uuid)
        .bind(snapshot.updated_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn update_remote_links(&self, id: i64, links: &RemoteUserRef) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET remnawave_short_uuid = $2,
                subscription_url = $3,
                subscription_crypto_link = $4,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&links.short_uuid)
        .bind(&links.subscription_url)
        .bind(&links.crypto_link)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }
}
