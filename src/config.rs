use serde::Deserialize;

use crate::comments::services::DEFAULT_REPLY_DEPTH;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// S3/MinIO bucket that holds uploaded images.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Base URL under which stored objects are publicly readable.
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub page_size: i64,
    pub max_page_size: i64,
    pub reply_depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub feed: FeedConfig,
    pub upload_max_bytes: usize,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "inkpost".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "inkpost-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_or("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };

        let endpoint = std::env::var("S3_ENDPOINT")?;
        let bucket = std::env::var("S3_BUCKET")?;
        let public_url = std::env::var("S3_PUBLIC_URL")
            .unwrap_or_else(|_| format!("{}/{}", endpoint.trim_end_matches('/'), bucket));
        let storage = StorageConfig {
            endpoint,
            bucket,
            access_key: std::env::var("S3_ACCESS_KEY")?,
            secret_key: std::env::var("S3_SECRET_KEY")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
            public_url: public_url.trim_end_matches('/').to_string(),
        };

        let feed = FeedConfig {
            page_size: env_or("FEED_PAGE_SIZE", 10),
            max_page_size: env_or("FEED_MAX_PAGE_SIZE", 50),
            reply_depth: env_or("THREAD_REPLY_DEPTH", DEFAULT_REPLY_DEPTH),
        };
        anyhow::ensure!(feed.page_size > 0, "FEED_PAGE_SIZE must be positive");
        anyhow::ensure!(
            feed.max_page_size >= feed.page_size,
            "FEED_MAX_PAGE_SIZE must be at least FEED_PAGE_SIZE"
        );

        Ok(Self {
            database_url,
            jwt,
            storage,
            feed,
            upload_max_bytes: env_or("UPLOAD_MAX_BYTES", 5 * 1024 * 1024),
        })
    }
}
