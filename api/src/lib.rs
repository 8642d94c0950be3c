pub mod password;
pub mod photos;
pub mod routes;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod time;

use actix_cors::Cors;
use actix_identity::IdentityMiddleware;
use actix_session::{
    SessionMiddleware, config::BrowserSession, storage::CookieSessionStore,
};
use actix_web::cookie::{Key, time::Duration};
use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use secrecy::{ExposeSecret, SecretBox};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::storage::StorageService;
use crate::time::TimeSource;

/// Build the server, but not await it.
///
/// Returns the port that the server has bound to by modifying the config.
pub async fn build(
    config: &mut Config,
    time_source: TimeSource,
) -> anyhow::Result<Server> {
    let secret_key = session_key(config.session_master_key.as_ref())?;
    let db_pool = web::Data::new(
        PgPool::connect(&config.database_url)
            .await
            .context("Failed to connect to the database")?,
    );
    let storage = web::Data::new(StorageService::new(
        &config.storage_public_url,
        config
            .storage_signing_secret
            .as_ref()
            .map(|s| SecretBox::new(Box::new(s.expose_secret().clone()))),
        time_source.clone(),
    )?);
    let time_source = web::Data::new(time_source);

    // Clone config values for use in closure
    let allowed_origins = config.allowed_origins.clone();

    // OS assigns the port if binding to 0
    let listener = TcpListener::bind(format!("{}:{}", config.ip, config.port))?;
    config.port = listener.local_addr()?.port();
    let server = HttpServer::new(move || {
        let cors = if allowed_origins.iter().any(|o| o == "*") {
            // Allow any origin (for development)
            Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .supports_credentials()
        } else {
            let mut cors = Cors::default()
                .allow_any_method()
                .allow_any_header()
                .supports_credentials();
            for origin in &allowed_origins {
                cors = cors.allowed_origin(origin);
            }
            cors
        };

        App::new()
            .wrap(cors)
            // Use signed cookie to track user id
            .wrap(IdentityMiddleware::default())
            .wrap(
                SessionMiddleware::builder(
                    CookieSessionStore::default(),
                    secret_key.clone(),
                )
                .cookie_name("group-admin".into())
                .session_lifecycle(
                    BrowserSession::default().state_ttl(Duration::days(30)),
                )
                .build(),
            )
            .service(routes::api_services())
            .app_data(db_pool.clone())
            .app_data(storage.clone())
            .app_data(time_source.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}

/// Sessions survive restarts only when a master key is configured.
fn session_key(master_key: Option<&SecretBox<String>>) -> anyhow::Result<Key> {
    match master_key {
        Some(master_key) => Key::try_from(master_key.expose_secret().as_bytes())
            .map_err(|e| anyhow::anyhow!("Invalid SESSION_MASTER_KEY: {e}")),
        None => Ok(Key::generate()),
    }
}

pub struct Config {
    pub database_url: String,
    /// set to "0.0.0.0" for public access, "127.0.0.1" for local dev
    pub ip: String,
    /// set to 0 to get an os-assigned port
    pub port: u16,
    /// List of allowed CORS origins. Use "*" to allow any origin
    /// (development only)
    pub allowed_origins: Vec<String>,
    /// Public base url of the photo storage bucket
    pub storage_public_url: String,
    /// If set, storage urls are signed and expire
    pub storage_signing_secret: Option<SecretBox<String>>,
    /// At least 64 bytes. A random key is generated when unset.
    pub session_master_key: Option<SecretBox<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        use std::env::var;

        let required = |name: &'static str| {
            var(name).map_err(|_| ConfigError::Missing(name))
        };
        let optional_secret = |name: &'static str| {
            var(name)
                .ok()
                .filter(|s| !s.is_empty())
                .map(|s| SecretBox::new(Box::new(s)))
        };

        let allowed_origins = var("ALLOWED_ORIGINS")
            // default to allow any origin for development
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let port = required("PORT")?.parse().map_err(|e| ConfigError::Invalid {
            name: "PORT",
            source: anyhow::Error::new(e),
        })?;

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            ip: required("IP_ADDRESS")?,
            port,
            allowed_origins,
            storage_public_url: required("STORAGE_PUBLIC_URL")?,
            storage_signing_secret: optional_secret("STORAGE_SIGNING_SECRET"),
            session_master_key: optional_secret("SESSION_MASTER_KEY"),
        })
    }
}
