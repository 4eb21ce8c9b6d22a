use std::sync::Arc;

use async_trait::async_trait;
use remnawave_sdk::{
    CreateUserRequest, PanelUser, RemnawaveClient, TrafficLimitStrategy, UpdateUserRequest,
    UserStatus as PanelStatus, gb_to_bytes,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    application::{
        ports::provisioning::{RemoteUserRef, SubscriptionProvisioner},
        use_cases::{
            subscription::{SubscriptionProfile, SubscriptionRepo},
            user::{UserProfile, UserRepo},
        },
    },
    domain::entities::subscription::SubscriptionStatus,
};

/// Mirrors local subscriptions onto Remnawave panel users.
pub struct RemnawaveSync {
    client: RemnawaveClient,
    user_repo: Arc<dyn UserRepo>,
    subscription_repo: Arc<dyn SubscriptionRepo>,
    traffic_strategy: TrafficLimitStrategy,
}

impl RemnawaveSync {
    pub fn new(
        client: RemnawaveClient,
        user_repo: Arc<dyn UserRepo>,
        subscription_repo: Arc<dyn SubscriptionRepo>,
        traffic_strategy: TrafficLimitStrategy,
    ) -> Self {
        Self {
            client,
            user_repo,
            subscription_repo,
            traffic_strategy,
        }
    }

    async fn load_user(&self, user_id: i64) -> Option<UserProfile> {
        match self.user_repo.get_by_id(user_id).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                warn!(user_id, "Subscription owner not found, skipping sync");
                None
            }
            Err(e) => {
                warn!(user_id, error = ?e, "Failed to load subscription owner");
                None
            }
        }
    }

    fn update_request(&self, uuid: Uuid, sub: &SubscriptionProfile) -> UpdateUserRequest {
        UpdateUserRequest {
            status: Some(panel_status(sub.actual_status())),
            expire_at: Some(sub.end_date),
            traffic_limit_bytes: Some(gb_to_bytes(sub.traffic_limit_gb)),
            traffic_limit_strategy: Some(self.traffic_strategy),
            hwid_device_limit: Some(sub.device_limit),
            active_internal_squads: Some(squad_uuids(&sub.connected_squads)),
            ..UpdateUserRequest::new(uuid)
        }
    }

    fn create_request(&self, user: &UserProfile, sub: &SubscriptionProfile) -> CreateUserRequest {
        CreateUserRequest {
            username: format!("user_{}", user.telegram_id),
            status: Some(panel_status(sub.actual_status())),
            expire_at: sub.end_date,
            traffic_limit_bytes: gb_to_bytes(sub.traffic_limit_gb),
            traffic_limit_strategy: self.traffic_strategy,
            telegram_id: Some(user.telegram_id),
            description: user_description(user),
            hwid_device_limit: Some(sub.device_limit),
            active_internal_squads: squad_uuids(&sub.connected_squads),
        }
    }

    /// Store the panel links on the subscription. A failure here does not undo
    /// the remote change, so it is only logged.
    async fn persist_links(&self, sub: &SubscriptionProfile, panel_user: &PanelUser) -> RemoteUserRef {
        let remote = RemoteUserRef {
            uuid: panel_user.uuid,
            short_uuid: panel_user.short_uuid.clone(),
            subscription_url: panel_user.subscription_url.clone(),
            crypto_link: panel_user.crypto_link().map(str::to_string),
        };

        if let Err(e) = self.subscription_repo.update_remote_links(sub.id, &remote).await {
            warn!(subscription_id = sub.id, error = ?e, "Failed to store panel links");
        }

        remote
    }
}

#[async_trait]
impl SubscriptionProvisioner for RemnawaveSync {
    async fn update_remote_user(&self, sub: &SubscriptionProfile) -> Option<RemoteUserRef> {
        let user = self.load_user(sub.user_id).await?;

        let Some(uuid) = user.remnawave_uuid else {
            debug!(user_id = user.id, "User has no panel uuid, nothing to update");
            return None;
        };

        match self.client.update_user(&self.update_request(uuid, sub)).await {
            Ok(panel_user) => {
                info!(user_id = user.id, %uuid, "Panel user updated");
                Some(self.persist_links(sub, &panel_user).await)
            }
            Err(e) => {
                warn!(user_id = user.id, %uuid, error = %e, "Failed to update panel user");
                None
            }
        }
    }

    async fn create_remote_user(&self, sub: &SubscriptionProfile) -> Option<RemoteUserRef> {
        let user = self.load_user(sub.user_id).await?;

        // A panel user may already exist for this Telegram account (e.g. after
        // a local data reset). Adopt it instead of creating a duplicate.
        let existing = match self.client.get_users_by_telegram_id(user.telegram_id).await {
            Ok(users) => users.into_iter().next(),
            Err(e) => {
                warn!(
                    user_id = user.id,
                    telegram_id = user.telegram_id,
                    error = %e,
                    "Failed to look up panel users by telegram id"
                );
                return None;
            }
        };

        let result = match existing {
            Some(found) => {
                debug!(user_id = user.id, uuid = %found.uuid, "Adopting existing panel user");
                self.client
                    .update_user(&self.update_request(found.uuid, sub))
                    .await
            }
            None => self.client.create_user(&self.create_request(&user, sub)).await,
        };

        let panel_user = match result {
            Ok(panel_user) => panel_user,
            Err(e) => {
                warn!(user_id = user.id, error = %e, "Failed to create panel user");
                return None;
            }
        };

        if let Err(e) = self.user_repo.set_remnawave_uuid(user.id, panel_user.uuid).await {
            warn!(user_id = user.id, error = ?e, "Failed to store panel uuid on user");
        }

        info!(user_id = user.id, uuid = %panel_user.uuid, "Panel user provisioned");
        Some(self.persist_links(sub, &panel_user).await)
    }
}

fn panel_status(status: SubscriptionStatus) -> PanelStatus {
    match status {
        SubscriptionStatus::Active | SubscriptionStatus::Trial => PanelStatus::Active,
        SubscriptionStatus::Expired => PanelStatus::Expired,
        SubscriptionStatus::Disabled => PanelStatus::Disabled,
    }
}

fn squad_uuids(squads: &[String]) -> Vec<Uuid> {
    squads
        .iter()
        .filter_map(|raw| match raw.parse::<Uuid>() {
            Ok(uuid) => Some(uuid),
            Err(_) => {
                warn!(squad = %raw, "Skipping invalid squad uuid");
                None
            }
        })
        .collect()
}

fn user_description(user: &UserProfile) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(name) = user.full_name() {
        parts.push(name);
    }
    if let Some(username) = user.username.as_deref().filter(|u| !u.is_empty()) {
        parts.push(format!("@{username}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}
