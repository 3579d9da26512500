use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required env: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageDriver {
    Local,
    S3,
}

impl FromStr for StorageDriver {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "s3" => Ok(Self::S3),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub access_expires_in_secs: i64,
    pub refresh_secret: String,
    pub refresh_expires_in_secs: i64,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub bucket: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub driver: StorageDriver,
    pub local_path: PathBuf,
    pub s3: Option<S3Config>,
    pub image_max_bytes: u64,
    pub video_max_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub from_address: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub filter: String,
    pub directory: Option<PathBuf>,
}

/// Process-wide configuration, read once at startup and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Environment {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origin: String,
    pub frontend_url: String,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
    pub log: LogConfig,
}

const DEFAULT_IMAGE_MAX: u64 = 5 * 1024 * 1024;
const DEFAULT_VIDEO_MAX: u64 = 200 * 1024 * 1024;

impl Environment {
    pub fn new() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;

        let host = optional("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parsed("PORT", 3030)?;
        let bind_addr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::Invalid {
                key: "HOST",
                value: host.clone(),
            })?;

        let jwt = JwtConfig {
            access_secret: required("JWT_ACCESS_SECRET")?,
            access_expires_in_secs: parsed("JWT_ACCESS_EXPIRES_IN", 15 * 60)?,
            refresh_secret: required("JWT_REFRESH_SECRET")?,
            refresh_expires_in_secs: parsed("JWT_REFRESH_EXPIRES_IN", 7 * 24 * 60 * 60)?,
        };

        let driver = match optional("STORAGE_DRIVER") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "STORAGE_DRIVER",
                value,
            })?,
            None => StorageDriver::Local,
        };

        let s3 = if driver == StorageDriver::S3 {
            Some(S3Config {
                access_key_id: required("AWS_ACCESS_KEY_ID")?,
                secret_access_key: required("AWS_SECRET_ACCESS_KEY")?,
                region: optional("AWS_REGION").unwrap_or_else(|| "ap-south-1".to_string()),
                bucket: required("AWS_S3_BUCKET")?,
            })
        } else {
            None
        };

        let storage = StorageConfig {
            driver,
            local_path: optional("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|| "./uploads".to_string())
                .into(),
            s3,
            image_max_bytes: parsed("MULTER_IMAGE_MAX", DEFAULT_IMAGE_MAX)?,
            video_max_bytes: parsed("MULTER_VIDEO_MAX", DEFAULT_VIDEO_MAX)?,
        };

        let smtp = match optional("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                port: parsed("SMTP_PORT", 587)?,
                username: optional("SMTP_USERNAME"),
                password: optional("SMTP_PASSWORD"),
            }),
            None => None,
        };

        let mail = MailConfig {
            from_address: optional("MAIL_FROM")
                .unwrap_or_else(|| "Storefront <no-reply@localhost>".to_string()),
            smtp,
        };

        let log = LogConfig {
            filter: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            directory: optional("LOG_DIR").map(PathBuf::from),
        };

        Ok(Self {
            database_url,
            bind_addr,
            cors_origin: optional("CORS_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            frontend_url: optional("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            jwt,
            storage,
            mail,
            log,
        })
    }
}

fn optional(key: &'static str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
impl Environment {
    /// Configuration used by unit tests; never touches the process environment.
    pub fn for_tests(local_path: PathBuf) -> Self {
        Self {
            database_url: "postgres://localhost/test".to_string(),
            bind_addr: ([127, 0, 0, 1], 0).into(),
            cors_origin: "http://localhost:3000".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            jwt: JwtConfig {
                access_secret: "access-secret-for-tests".to_string(),
                access_expires_in_secs: 900,
                refresh_secret: "refresh-secret-for-tests".to_string(),
                refresh_expires_in_secs: 3600,
            },
            storage: StorageConfig {
                driver: StorageDriver::Local,
                local_path,
                s3: None,
                image_max_bytes: DEFAULT_IMAGE_MAX,
                video_max_bytes: DEFAULT_VIDEO_MAX,
            },
            mail: MailConfig {
                from_address: "Storefront <no-reply@localhost>".to_string(),
                smtp: None,
            },
            log: LogConfig {
                filter: "debug".to_string(),
                directory: None,
            },
        }
    }
}
