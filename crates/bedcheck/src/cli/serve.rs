//! the `serve` subcommand - runs the check-in server.

use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::{Context, Result};
use tokio::net::TcpListener;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use super::{load_config_file, parse_database_url};
use bedcheck_db::BedcheckDb;
use bedcheck_types::Config;

/// run the bedcheck server
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// path to config file (toml format)
    #[arg(short, long, env = "BEDCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// database url (sqlite: or postgres://)
    #[arg(long, env = "BEDCHECK_DATABASE_URL")]
    database_url: Option<String>,

    /// address to listen on
    #[arg(long, env = "BEDCHECK_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// public url of this server (used in links and profiles)
    #[arg(long, env = "BEDCHECK_SERVER_URL")]
    server_url: Option<String>,

    /// shared key for the staff endpoints
    #[arg(long, env = "BEDCHECK_STAFF_KEY")]
    staff_key: Option<String>,

    /// log level
    #[arg(long, env = "BEDCHECK_LOG_LEVEL")]
    log_level: Option<String>,
}

impl ServeCommand {
    /// convert cli arguments into a config struct, merging with config file if present.
    ///
    /// priority order: defaults -> config file -> cli flags
    fn into_config(self) -> Result<Config> {
        let mut config = match load_config_file(self.config.as_ref())? {
            Some(file_config) => {
                info!("loaded configuration from file");
                file_config
            }
            None => {
                info!("no config file found, using defaults");
                Config::default()
            }
        };

        if let Some(db_url) = self.database_url {
            config.database = parse_database_url(&db_url)?;
        }
        if let Some(listen_addr) = self.listen_addr {
            config.listen_addr = listen_addr;
        }
        if let Some(server_url) = self.server_url {
            config.server_url = server_url;
        }
        if let Some(staff_key) = self.staff_key {
            config.staff_key = Some(staff_key);
        }

        Ok(config)
    }

    /// run the serve command
    pub async fn run(self) -> Result<()> {
        // initialize logging (use CLI override or default to info)
        let log_level_str = self.log_level.clone().unwrap_or_else(|| "info".to_string());
        let log_level = match log_level_str.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
        tracing::subscriber::set_global_default(subscriber)?;

        info!(
            version = env!("CARGO_PKG_VERSION"),
            git_sha = env!("BEDCHECK_GIT_SHA"),
            built_at = env!("BEDCHECK_BUILD_TIMESTAMP"),
            "starting bedcheck"
        );

        let config = self.into_config()?;
        info!("database: {}", config.database.connection_string);
        info!("listen address: {}", config.listen_addr);
        info!("server url: {}", config.server_url);
        if config.staff_key.is_none() {
            info!("no staff key configured; admin endpoints are disabled");
        }

        // ensure parent directory exists for sqlite databases
        if config.database.db_type == "sqlite" {
            let db_path = std::path::Path::new(&config.database.connection_string);
            if let Some(parent) = db_path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                info!("creating database directory: {:?}", parent);
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory: {:?}", parent)
                })?;
            }
        }

        // initialize database (runs migrations)
        let db = BedcheckDb::new(&config)
            .await
            .context("failed to initialize database")?;
        info!("database initialized");

        let listen_addr = config.listen_addr.clone();
        let app = crate::create_app(db, config).context("invalid configuration")?;

        let listener = TcpListener::bind(&listen_addr)
            .await
            .with_context(|| format!("failed to bind {listen_addr}"))?;
        info!("listening on {}", listen_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        Ok(())
    }
}

/// resolve when the process is asked to stop.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
