use std::env;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobBackend {
    Local,
    S3,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket_name: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom endpoint (MinIO etc.); forces path-style addressing.
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub blob_backend: BlobBackend,
    pub blob_local_root: String,
    pub public_base_url: String,
    pub s3: Option<S3Config>,
    pub provider_url: String,
    pub provider_api_key: Option<String>,
    pub provider_timeout: Option<Duration>,
    pub max_concurrent_jobs: Option<usize>,
    pub recover_interrupted_jobs: bool,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match optional(name) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                            | Default                 |
    /// |------------------------------------|-------------------------|
    /// | `DATABASE_URL`                     | required                |
    /// | `HOST`                             | `0.0.0.0`               |
    /// | `PORT`                             | `3000`                  |
    /// | `BLOB_BACKEND`                     | `local`                 |
    /// | `BLOB_LOCAL_ROOT`                  | `./storage`             |
    /// | `PUBLIC_BASE_URL`                  | `http://localhost:3000` |
    /// | `GENERATION_PROVIDER_URL`          | required                |
    /// | `GENERATION_PROVIDER_API_KEY`      | none                    |
    /// | `GENERATION_PROVIDER_TIMEOUT_SECS` | none                    |
    /// | `GENERATION_MAX_CONCURRENCY`       | unbounded               |
    /// | `RECOVER_INTERRUPTED_JOBS`         | `true`                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let host = optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parsed("PORT")?.unwrap_or(3000);

        let blob_backend = match optional("BLOB_BACKEND").as_deref() {
            None | Some("local") => BlobBackend::Local,
            Some("s3") => BlobBackend::S3,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "BLOB_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let s3 = if blob_backend == BlobBackend::S3 {
            Some(S3Config {
                bucket_name: required("S3_BUCKET_NAME")?,
                region: optional("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                access_key_id: required("AWS_ACCESS_KEY_ID")?,
                secret_access_key: required("AWS_SECRET_ACCESS_KEY")?,
                endpoint: optional("S3_ENDPOINT"),
            })
        } else {
            None
        };

        Ok(Self {
            database_url,
            host,
            port,
            blob_backend,
            blob_local_root: optional("BLOB_LOCAL_ROOT").unwrap_or_else(|| "./storage".to_string()),
            public_base_url: optional("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            s3,
            provider_url: required("GENERATION_PROVIDER_URL")?,
            provider_api_key: optional("GENERATION_PROVIDER_API_KEY"),
            provider_timeout: parsed::<u64>("GENERATION_PROVIDER_TIMEOUT_SECS")?
                .map(Duration::from_secs),
            max_concurrent_jobs: parsed("GENERATION_MAX_CONCURRENCY")?,
            recover_interrupted_jobs: parsed("RECOVER_INTERRUPTED_JOBS")?.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // Single test so nothing else in this binary races on the environment.
    #[test]
    fn reads_environment() {
        for name in [
            "HOST",
            "PORT",
            "BLOB_BACKEND",
            "GENERATION_PROVIDER_TIMEOUT_SECS",
            "GENERATION_MAX_CONCURRENCY",
            "RECOVER_INTERRUPTED_JOBS",
        ] {
            env::remove_var(name);
        }
        env::set_var("DATABASE_URL", "sqlite::memory:");
        env::set_var("GENERATION_PROVIDER_URL", "http://provider.test/generate");

        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.blob_backend, BlobBackend::Local);
        assert_eq!(config.provider_timeout, None);
        assert_eq!(config.max_concurrent_jobs, None);
        assert!(config.recover_interrupted_jobs);

        env::set_var("GENERATION_PROVIDER_TIMEOUT_SECS", "90");
        env::set_var("GENERATION_MAX_CONCURRENCY", "2");
        let config = Config::from_env().unwrap();
        assert_eq!(config.provider_timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.max_concurrent_jobs, Some(2));

        env::set_var("PORT", "not-a-port");
        assert_matches!(Config::from_env(), Err(ConfigError::Invalid { name: "PORT", .. }));
        env::remove_var("PORT");

        env::set_var("BLOB_BACKEND", "s3");
        env::remove_var("S3_BUCKET_NAME");
        assert_matches!(Config::from_env(), Err(ConfigError::Missing("S3_BUCKET_NAME")));
        env::remove_var("BLOB_BACKEND");
    }
}
