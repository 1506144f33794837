use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    /// Origin used to build object retrieval locators.
    pub public_base_url: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Meeting records and uploads API")]
pub struct Args {
    /// Host to bind to (overrides MINUTIFY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides MINUTIFY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where uploaded objects are stored (overrides MINUTIFY_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides MINUTIFY_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Public origin for object locators (overrides MINUTIFY_PUBLIC_BASE_URL)
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args, |key| env::var(key))?, migrate))
    }

    /// CLI values win over environment values, which win over defaults.
    pub fn merge<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        let env_host = lookup("MINUTIFY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match lookup("MINUTIFY_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing MINUTIFY_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading MINUTIFY_PORT"),
        };
        let env_storage =
            lookup("MINUTIFY_STORAGE_DIR").unwrap_or_else(|_| "./data/objects".into());
        let env_db = lookup("MINUTIFY_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/minutify.db".into());

        let port = args.port.unwrap_or(env_port);
        let public_base_url = args
            .public_base_url
            .or_else(|| lookup("MINUTIFY_PUBLIC_BASE_URL").ok())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port,
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            database_url: args.database_url.unwrap_or(env_db),
            public_base_url,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, env::VarError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn defaults_apply_without_env_or_args() {
        let cfg = AppConfig::merge(Args::default(), lookup(&[])).unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:3000");
        assert_eq!(cfg.storage_dir, "./data/objects");
        assert_eq!(cfg.database_url, "sqlite://./data/meta/minutify.db");
        assert_eq!(cfg.public_base_url, "http://localhost:3000");
    }

    #[test]
    fn args_override_env() {
        let args = Args {
            port: Some(8080),
            ..Default::default()
        };
        let cfg = AppConfig::merge(
            args,
            lookup(&[("MINUTIFY_PORT", "9000"), ("MINUTIFY_HOST", "127.0.0.1")]),
        )
        .unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:8080");
        assert_eq!(cfg.public_base_url, "http://localhost:8080");
    }

    #[test]
    fn bad_port_is_reported() {
        let err = AppConfig::merge(Args::default(), lookup(&[("MINUTIFY_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("MINUTIFY_PORT"));
    }
}
