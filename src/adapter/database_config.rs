use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// 設定エラー
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

/// 環境変数を読み取る。未設定の場合はデフォルト値
pub(crate) fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// 環境変数を読み取って型変換する。未設定の場合はデフォルト値
pub(crate) fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(format!("Invalid {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

/// 空でない場合のみ環境変数を返す
pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// データベース接続設定
///
/// `DATABASE_URL` が設定されている場合はそれを優先し、
/// 個別の `DATABASE_*` 変数は接続先の表示にだけ使う
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// 環境変数から設定を読み取る
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = non_empty_env("DATABASE_URL");
        if let Some(url) = &url {
            if !url.starts_with("mysql://") {
                return Err(ConfigError::InvalidValue(
                    "DATABASE_URL must start with mysql://".to_string(),
                ));
            }
        }

        Ok(Self {
            url,
            host: env_or("DATABASE_HOST", "localhost"),
            port: parse_env("DATABASE_PORT", 3306)?,
            database: env_or("DATABASE_NAME", "ticketing_db"),
            username: env_or("DATABASE_USER", "ticketing_user"),
            password: env_or("DATABASE_PASSWORD", "ticketing_password"),
            max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
        })
    }

    /// MySQL接続文字列
    pub fn connection_string(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "mysql://{}:{}@{}:{}/{}",
                self.username, self.password, self.host, self.port, self.database
            ),
        }
    }
}
