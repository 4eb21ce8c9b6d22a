//! Async client for the Remnawave panel REST API.
//!
//! Only the user endpoints needed to mirror local subscriptions are covered:
//!
//! - **Lookup** - fetch a panel user by UUID or by Telegram id
//! - **Create** - provision a new panel user
//! - **Update** - push status, expiry, limits and squads to an existing user
//!
//! # Example
//!
//! ```rust,ignore
//! use remnawave_sdk::{RemnawaveClient, RemnawaveConfig};
//!
//! let client = RemnawaveClient::new(RemnawaveConfig {
//!     base_url: "https://panel.example.com".parse()?,
//!     api_key: "eyJ...".to_string(),
//!     timeout: None,
//! })?;
//!
//! if let Some(user) = client.get_user_by_uuid(uuid).await? {
//!     println!("subscription url: {}", user.subscription_url);
//! }
//! ```

mod client;
mod error;
mod models;

pub use client::{RemnawaveClient, RemnawaveConfig};
pub use error::RemnawaveError;
pub use models::{
    CreateUserRequest, HappLinks, PanelUser, TrafficLimitStrategy, UpdateUserRequest, UserStatus,
    gb_to_bytes,
};
