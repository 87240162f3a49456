// src/config.rs

use std::{env, path::PathBuf, str::FromStr};

use dotenvy::dotenv;

/// How the rating aggregate is written back after being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingConsistency {
    /// Unconditional upsert. Concurrent ratings for one post can be lost.
    BestEffort,
    /// Conditional create/replace on the stored etag, retried on conflict.
    Optimistic,
}

impl FromStr for RatingConsistency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best-effort" | "best_effort" | "legacy" => Ok(RatingConsistency::BestEffort),
            "optimistic" => Ok(RatingConsistency::Optimistic),
            other => Err(format!("unknown rating consistency mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DocumentStoreConfig {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    Memory,
}

/// S3-compatible bucket settings.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO, LocalStack, ...).
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    /// Overrides the URL prefix returned for uploaded objects.
    pub public_base_url: Option<String>,
}

impl S3Config {
    /// Base URL under which uploaded objects are publicly reachable.
    pub fn public_base_url(&self) -> String {
        if let Some(base) = &self.public_base_url {
            return base.clone();
        }
        match &self.endpoint_url {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        }
    }
}

#[derive(Debug, Clone)]
pub enum BlobStoreConfig {
    S3(S3Config),
    Local {
        dir: PathBuf,
        public_base_url: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub creator_key: String,
    pub document_store: DocumentStoreConfig,
    pub blob_store: BlobStoreConfig,
    pub rating_consistency: RatingConsistency,
    pub max_upload_bytes: usize,
    /// Empty means any origin is allowed.
    pub cors_allowed_origins: Vec<String>,
    /// Directory holding the built browser client, served as a fallback.
    pub static_dir: Option<PathBuf>,
    pub log_dir: String,
    pub rust_log: String,
}

impl Config {
    /// Reads the configuration from the environment.
    ///
    /// Panics when a required value is missing or malformed: the server
    /// cannot start without its store credentials.
    pub fn from_env() -> Self {
        dotenv().ok();

        let port = parse_or("PORT", 5000);

        let creator_key = env::var("CREATOR_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .expect("CREATOR_KEY must be set");

        let document_store = match var_or("DOCUMENT_STORE", "postgres").as_str() {
            "postgres" => DocumentStoreConfig::Postgres {
                database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5),
            },
            "memory" => DocumentStoreConfig::Memory,
            other => panic!("DOCUMENT_STORE must be 'postgres' or 'memory', got '{}'", other),
        };

        let blob_store = match var_or("BLOB_STORE", "s3").as_str() {
            "s3" => BlobStoreConfig::S3(S3Config {
                bucket: env::var("S3_BUCKET").expect("S3_BUCKET must be set"),
                region: var_or("S3_REGION", "us-east-1"),
                endpoint_url: env::var("S3_ENDPOINT_URL").ok(),
                force_path_style: parse_or("S3_FORCE_PATH_STYLE", false),
                public_base_url: env::var("BLOB_PUBLIC_BASE_URL").ok(),
            }),
            "local" => BlobStoreConfig::Local {
                dir: PathBuf::from(var_or("LOCAL_UPLOAD_DIR", "uploads")),
                public_base_url: env::var("BLOB_PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| format!("http://localhost:{}/uploads", port)),
            },
            other => panic!("BLOB_STORE must be 's3' or 'local', got '{}'", other),
        };

        let rating_consistency = parse_or("RATING_CONSISTENCY", RatingConsistency::Optimistic);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            port,
            creator_key,
            document_store,
            blob_store,
            rating_consistency,
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
            cors_allowed_origins,
            static_dir: env::var("STATIC_DIR").ok().map(PathBuf::from),
            log_dir: var_or("LOG_DIR", "logs"),
            rust_log: var_or("RUST_LOG", "info"),
        }
    }

    /// In-memory configuration for tests and local experiments.
    pub fn for_memory(creator_key: &str) -> Self {
        Self {
            port: 0,
            creator_key: creator_key.to_string(),
            document_store: DocumentStoreConfig::Memory,
            blob_store: BlobStoreConfig::Local {
                dir: PathBuf::from("uploads"),
                public_base_url: "http://localhost/uploads".to_string(),
            },
            rating_consistency: RatingConsistency::Optimistic,
            max_upload_bytes: 10 * 1024 * 1024,
            cors_allowed_origins: Vec::new(),
            static_dir: None,
            log_dir: "logs".to_string(),
            rust_log: "error".to_string(),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("Invalid {} value '{}': {}", key, raw, e)),
        Err(_) => default,
    }
}
