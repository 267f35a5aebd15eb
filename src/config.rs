use clap::Parser;

/// NBA scoreboard ingest + snapshot service
#[derive(Parser, Debug, Clone)]
#[command(name = "courtside", version, about)]
pub struct Config {
    /// Upstream statistics API base URL
    #[arg(
        long,
        env = "UPSTREAM_API_URL",
        default_value = "https://api.balldontlie.io/v1"
    )]
    pub upstream_api_url: String,

    /// Upstream API key (requests go out unauthenticated without one)
    #[arg(long, env = "UPSTREAM_API_KEY")]
    pub upstream_api_key: Option<String>,

    /// Timezone used to resolve "today" when no date is requested
    #[arg(long, env = "DEFAULT_TIMEZONE", default_value = "America/New_York")]
    pub default_timezone: String,

    /// Maximum pages fetched per refresh, regardless of what the upstream
    /// reports as its total
    #[arg(long, env = "MAX_PAGES", default_value = "10")]
    pub max_pages: u32,

    /// Directory where snapshots and the manifest live
    #[arg(long, env = "DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Days of snapshots kept before pruning
    #[arg(long, env = "RETENTION_DAYS", default_value = "14")]
    pub retention_days: i64,

    /// Seconds between refreshes
    #[arg(long, env = "REFRESH_INTERVAL_SECS", default_value = "300")]
    pub refresh_interval_secs: u64,

    /// API listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Serve the built-in fixture slate instead of calling the upstream
    #[arg(long, env = "USE_FIXTURE", default_value = "false")]
    pub use_fixture: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_pages == 0 {
            anyhow::bail!("max_pages must be at least 1");
        }
        if self.refresh_interval_secs == 0 {
            anyhow::bail!("refresh_interval_secs must be positive");
        }
        if self.data_dir.trim().is_empty() {
            anyhow::bail!("data_dir must not be empty");
        }
        Ok(())
    }
}
