use crate::adapter::database_config::{env_or, non_empty_env, parse_env, ConfigError};

/// 永続化の方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// MySQLデータベース
    MySql,
    /// プロセス内のメモリ（ローカル実行用）
    InMemory,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "mysql" => Ok(StorageBackend::MySql),
            "memory" => Ok(StorageBackend::InMemory),
            other => Err(ConfigError::InvalidValue(format!(
                "Invalid STORAGE_BACKEND: {}",
                other
            ))),
        }
    }
}

/// HTTPサーバーの設定
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub storage_backend: StorageBackend,
}

impl ServerConfig {
    /// 環境変数から設定を読み取る
    /// JWT_SECRET以外は未設定の場合デフォルト値を使用
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = non_empty_env("JWT_SECRET")
            .ok_or_else(|| ConfigError::Missing("JWT_SECRET".to_string()))?;

        Ok(Self {
            host: env_or("SERVER_HOST", "0.0.0.0"),
            port: parse_env("SERVER_PORT", 3000)?,
            jwt_secret,
            storage_backend: StorageBackend::parse(&env_or("STORAGE_BACKEND", "mysql"))?,
        })
    }

    /// バインドするアドレス
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // テスト間の環境変数の競合を防ぐためのロック
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear() {
        env::remove_var("SERVER_HOST");
        env::remove_var("SERVER_PORT");
        env::remove_var("JWT_SECRET");
        env::remove_var("STORAGE_BACKEND");
    }

    #[test]
    fn test_from_env_with_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear();
        env::set_var("JWT_SECRET", "secret");

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.jwt_secret, "secret");
        assert_eq!(config.storage_backend, StorageBackend::MySql);
        clear();
    }

    #[test]
    fn test_from_env_with_all_variables() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear();
        env::set_var("SERVER_HOST", "127.0.0.1");
        env::set_var("SERVER_PORT", "8080");
        env::set_var("JWT_SECRET", "secret");
        env::set_var("STORAGE_BACKEND", "memory");

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.storage_backend, StorageBackend::InMemory);
        clear();
    }

    #[test]
    fn test_missing_jwt_secret() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear();

        let result = ServerConfig::from_env();
        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_blank_jwt_secret_is_missing() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear();
        env::set_var("JWT_SECRET", "   ");

        let result = ServerConfig::from_env();
        assert!(matches!(result, Err(ConfigError::Missing(_))));
        clear();
    }

    #[test]
    fn test_invalid_port() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear();
        env::set_var("JWT_SECRET", "secret");
        env::set_var("SERVER_PORT", "70000");

        let result = ServerConfig::from_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue(msg)) if msg.contains("SERVER_PORT")
        ));
        clear();
    }

    #[test]
    fn test_invalid_storage_backend() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear();
        env::set_var("JWT_SECRET", "secret");
        env::set_var("STORAGE_BACKEND", "mongodb");

        assert!(ServerConfig::from_env().is_err());
        clear();
    }
}
