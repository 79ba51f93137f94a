#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub database: Database,
    pub deposit_holds: DepositHolds,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct DepositHolds {
    /// Unset disables the sweep entirely.
    pub hold_ttl_minutes: Option<i64>,
    pub grace_minutes: i64,
    pub sweep_interval_seconds: u64,
    pub internal_token: Option<String>,
}
