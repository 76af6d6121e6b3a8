//! Configuration model loaded from external sources.

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
/// Basic configuration shared across handlers.
pub struct ServerConfig {
    pub domain: String,
    pub address: String,
    pub port: u16,
    pub database_url: String,
    pub secret: String,
    pub auth_service_url: String,
    /// Days an invitation stays acceptable.
    #[serde(default = "default_invitation_ttl_days")]
    pub invitation_ttl_days: i64,
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,
}

fn default_invitation_ttl_days() -> i64 {
    7
}

fn default_items_per_page() -> usize {
    20
}
