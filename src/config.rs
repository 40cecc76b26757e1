use std::env;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use thiserror::Error;

/// Which backend keeps session records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Postgres,
    Memory,
}

impl FromStr for SessionBackend {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "postgres" => Ok(SessionBackend::Postgres),
            "memory" => Ok(SessionBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} has an invalid value: {value}")]
    Invalid { var: &'static str, value: String },
}

pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub session_backend: SessionBackend,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| lookup(var).ok_or(ConfigError::Missing(var));

        let server_port = match lookup("SERVER_PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { var: "SERVER_PORT", value })?,
            None => 8080,
        };

        let jwt_algorithm = match lookup("JWT_ALGORITHM") {
            Some(value) => match Algorithm::from_str(&value) {
                Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => alg,
                _ => return Err(ConfigError::Invalid { var: "JWT_ALGORITHM", value }),
            },
            None => Algorithm::HS256,
        };

        let session_backend = match lookup("SESSION_STORE") {
            Some(value) => value
                .parse::<SessionBackend>()
                .map_err(|_| ConfigError::Invalid { var: "SESSION_STORE", value })?,
            None => SessionBackend::Postgres,
        };

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET",
                value: String::new(),
            });
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_port,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_secret,
            jwt_algorithm,
            session_backend,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.jwt_algorithm, Algorithm::HS256);
        assert_eq!(config.session_backend, SessionBackend::Postgres);
        assert_eq!(config.server_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_config_custom_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", "secret"),
            ("JWT_ALGORITHM", "HS512"),
            ("SERVER_PORT", "3000"),
            ("SERVER_HOST", "0.0.0.0"),
            ("SESSION_STORE", "memory"),
        ]))
        .unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.jwt_algorithm, Algorithm::HS512);
        assert_eq!(config.session_backend, SessionBackend::Memory);
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let result = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://test")]));
        assert_eq!(result.err(), Some(ConfigError::Missing("JWT_SECRET")));

        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", ""),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { var: "JWT_SECRET", .. })
        ));
    }

    #[test]
    fn test_asymmetric_algorithm_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", "secret"),
            ("JWT_ALGORITHM", "RS256"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { var: "JWT_ALGORITHM", .. })
        ));
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", "secret"),
            ("SERVER_PORT", "eighty"),
        ]));
        assert_eq!(
            result.err(),
            Some(ConfigError::Invalid {
                var: "SERVER_PORT",
                value: "eighty".into()
            })
        );
    }
}
