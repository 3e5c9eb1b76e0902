//! Order-server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Order-server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Base URL of the task-service pricing collaborator
    pub task_service_url: String,
    /// Substitute default pricing when the task lookup fails
    /// (load-testing continuity mode)
    pub degraded_mode: bool,
    /// Dispatch pool: always-on workers
    pub dispatch_core_workers: usize,
    /// Dispatch pool: upper bound including overflow workers
    pub dispatch_max_workers: usize,
    /// Dispatch pool: bounded work queue capacity
    pub dispatch_queue_capacity: usize,
    /// Dispatch pool: shutdown drain grace period (seconds)
    pub dispatch_shutdown_grace_secs: u64,
    /// Consumers per queue at startup
    pub consumer_concurrency: usize,
    /// Consumers per queue under backlog
    pub consumer_max_concurrency: usize,
    /// In-flight unacknowledged deliveries per queue
    pub consumer_prefetch: usize,
    /// Broker queue capacity (bounded mailbox per queue)
    pub queue_capacity: usize,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: env_parse("HTTP_PORT", 8080),
            task_service_url: std::env::var("TASK_SERVICE_URL")
                .unwrap_or_else(|_| "http://task-service:8081".into()),
            degraded_mode: env_parse("DEGRADED_MODE", false),
            dispatch_core_workers: env_parse("DISPATCH_CORE_WORKERS", 50),
            dispatch_max_workers: env_parse("DISPATCH_MAX_WORKERS", 100),
            dispatch_queue_capacity: env_parse("DISPATCH_QUEUE_CAPACITY", 500),
            dispatch_shutdown_grace_secs: env_parse("DISPATCH_SHUTDOWN_GRACE_SECS", 60),
            consumer_concurrency: env_parse("CONSUMER_CONCURRENCY", 2),
            consumer_max_concurrency: env_parse("CONSUMER_MAX_CONCURRENCY", 10),
            consumer_prefetch: env_parse("CONSUMER_PREFETCH", 10),
            queue_capacity: env_parse("QUEUE_CAPACITY", 1024),
        })
    }
}
