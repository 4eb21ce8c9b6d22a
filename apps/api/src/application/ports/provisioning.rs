use async_trait::async_trait;
use uuid::Uuid;

use crate::application::use_cases::subscription::SubscriptionProfile;

/// Handle to the remote access record after a successful sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUserRef {
    pub uuid: Uuid,
    pub short_uuid: String,
    pub subscription_url: String,
    pub crypto_link: Option<String>,
}

/// External provisioning system that mirrors local subscriptions.
///
/// Both calls are best-effort: failures are logged by the implementation and
/// reported as `None`, never as an error.
#[async_trait]
pub trait SubscriptionProvisioner: Send + Sync {
    /// Push the subscription to the user's existing remote record.
    /// Returns `None` if there is no remote record yet or the call failed.
    async fn update_remote_user(&self, subscription: &SubscriptionProfile)
    -> Option<RemoteUserRef>;

    /// Create (or adopt) a remote record for the subscription's owner.
    async fn create_remote_user(&self, subscription: &SubscriptionProfile)
    -> Option<RemoteUserRef>;
}
