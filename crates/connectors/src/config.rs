//! Connection settings read from the process environment and `.env` files.

use serde::Deserialize;
use std::{collections::HashMap, fmt, fs, path::Path};
use thiserror::Error;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const REST_URL: &str = "REST_URL";
pub const REST_API_KEY: &str = "REST_API_KEY";
pub const REST_SCHEMA: &str = "REST_SCHEMA";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required variable `{0}`")]
    Missing(String),

    #[error("Invalid env file: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PgConfig {
    pub url: String,
}

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct RestConfig {
    pub url: String,
    pub api_key: String,
    /// Sent as `Accept-Profile`/`Content-Profile` when set.
    #[serde(default)]
    pub schema: Option<String>,
}

impl fmt::Debug for RestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestConfig")
            .field("url", &self.url)
            .field("api_key", &"***")
            .field("schema", &self.schema)
            .finish()
    }
}

/// Variables from the environment, optionally overridden by `.env` files.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    vars: HashMap<String, String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    /// Loads `KEY=VALUE` lines from `path`, overriding existing variables.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::Invalid(format!("failed to read {}: {}", path.display(), e))
        })?;
        self.parse_env_content(&content)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    pub fn pg_config(&self) -> Result<PgConfig, ConfigError> {
        Ok(PgConfig {
            url: self.require(DATABASE_URL)?.to_string(),
        })
    }

    pub fn rest_config(&self) -> Result<RestConfig, ConfigError> {
        Ok(RestConfig {
            url: self.require(REST_URL)?.to_string(),
            api_key: self.require(REST_API_KEY)?.to_string(),
            schema: self.get(REST_SCHEMA).map(str::to_string),
        })
    }

    fn parse_env_content(&mut self, content: &str) -> Result<(), ConfigError> {
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Invalid(format!(
                    "malformed line {} (expected KEY=VALUE)",
                    line_num + 1
                )));
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "empty key at line {}",
                    line_num + 1
                )));
            }

            self.vars.insert(key.to_string(), unquote(value.trim()));
        }

        Ok(())
    }
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn empty() -> EnvConfig {
        EnvConfig::from_vars(HashMap::new())
    }

    #[test]
    fn test_parse_env_content() {
        let mut env = empty();
        env.parse_env_content(
            "# comment\n\nREST_URL=\"https://db.example.com/rest/v1\"\nREST_API_KEY='anon'\n",
        )
        .unwrap();

        assert_eq!(env.get(REST_URL), Some("https://db.example.com/rest/v1"));
        assert_eq!(env.get(REST_API_KEY), Some("anon"));
        assert_eq!(env.get(REST_SCHEMA), None);
    }

    #[test]
    fn test_parse_errors_carry_line_number() {
        let err = empty().parse_env_content("A=1\nnot a pair\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let err = empty().parse_env_content("=value").unwrap_err();
        assert!(err.to_string().contains("empty key"));
    }

    #[test]
    fn test_missing_variables() {
        let env = EnvConfig::from_vars(HashMap::from([(REST_URL.to_string(), String::new())]));
        assert!(matches!(env.pg_config(), Err(ConfigError::Missing(key)) if key == DATABASE_URL));
        assert!(matches!(env.rest_config(), Err(ConfigError::Missing(key)) if key == REST_URL));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "DATABASE_URL=postgres://localhost/app").unwrap();
        writeln!(file, "REST_URL=http://localhost:3000").unwrap();
        writeln!(file, "REST_API_KEY=secret").unwrap();
        writeln!(file, "REST_SCHEMA=api").unwrap();

        let mut env = empty();
        env.load_from_file(file.path()).unwrap();

        assert_eq!(env.pg_config().unwrap().url, "postgres://localhost/app");
        let rest = env.rest_config().unwrap();
        assert_eq!(rest.schema.as_deref(), Some("api"));
        assert!(!format!("{rest:?}").contains("secret"));
    }
}
