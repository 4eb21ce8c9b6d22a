pub mod api_token;
pub mod subscription;
pub mod user;
