use url::Url;

use super::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub stripe: Stripe,
    pub deposits: Deposits,
    pub app: App,
    pub notifications: Notifications,
    pub stage: Stage,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub secret_key: String,
    pub webhook_secret: String,
    pub webhook_tolerance_seconds: i64,
    pub payment_method_types: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Deposits {
    pub currency: String,
    pub hold_ttl_minutes: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct App {
    pub base_url: Url,
}

impl App {
    pub fn checkout_success_url(&self) -> String {
        format!("{}/?booking=success", self.base_url.as_str().trim_end_matches('/'))
    }

    pub fn checkout_cancel_url(&self) -> String {
        format!("{}/?booking=cancel", self.base_url.as_str().trim_end_matches('/'))
    }

    pub fn origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }
}

#[derive(Debug, Clone)]
pub struct Notifications {
    pub webhook_url: Option<Url>,
}
