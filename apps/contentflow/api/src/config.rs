use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_or_default, env_parse, server::ServerConfig};
use database::postgres::PostgresConfig;
use domain_accounts::config::{GraphConfig, HostedAuthConfig, LinkingConfig, PublicOrigin};

pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: PostgresConfig,
    pub linking: LinkingConfig,
    pub graph: GraphConfig,
    pub hosted_auth: HostedAuthConfig,
    pub run_migrations: bool,
    /// Frontend origin that redirect paths are resolved against.
    pub public_origin: PublicOrigin,
    /// Comma-separated CORS origins.
    pub cors_allowed_origin: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // HOST=0.0.0.0, PORT=8080
        let database = PostgresConfig::from_env()?; // Required
        let hosted_auth = HostedAuthConfig::from_env()?; // Required

        let public_origin = PublicOrigin::from_env()?;
        let cors_allowed_origin = env_or_default("CORS_ALLOWED_ORIGIN", public_origin.as_str());

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            database,
            linking: LinkingConfig::from_env()?,
            graph: GraphConfig::from_env()?,
            hosted_auth,
            run_migrations: env_parse("RUN_MIGRATIONS", false)?,
            public_origin,
            cors_allowed_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [(&str, Option<&str>); 3] = [
        ("DATABASE_URL", Some("postgres://localhost/contentflow")),
        ("HOSTED_AUTH_URL", Some("https://auth.example.com/")),
        ("HOSTED_AUTH_ANON_KEY", Some("anon-key")),
    ];

    #[test]
    fn test_defaults() {
        let vars = [
            REQUIRED[0],
            REQUIRED[1],
            REQUIRED[2],
            ("APP_ENV", None),
            ("PUBLIC_ORIGIN", None),
            ("CORS_ALLOWED_ORIGIN", None),
            ("RUN_MIGRATIONS", None),
        ];
        temp_env::with_vars(vars, || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.environment, Environment::Development);
            assert_eq!(config.public_origin.as_str(), "http://localhost:3000");
            assert_eq!(config.cors_allowed_origin, "http://localhost:3000");
            assert!(!config.run_migrations);
            assert_eq!(config.hosted_auth.url, "https://auth.example.com");
            assert_eq!(config.app.name, "contentflow_api");
        });
    }

    #[test]
    fn test_overrides() {
        let vars = [
            REQUIRED[0],
            REQUIRED[1],
            REQUIRED[2],
            ("APP_ENV", Some("production")),
            ("PUBLIC_ORIGIN", Some("https://app.contentflow.io/")),
            ("CORS_ALLOWED_ORIGIN", Some("https://app.contentflow.io,https://admin.contentflow.io")),
            ("RUN_MIGRATIONS", Some("true")),
        ];
        temp_env::with_vars(vars, || {
            let config = Config::from_env().unwrap();
            assert!(config.environment.use_https());
            assert_eq!(config.public_origin.as_str(), "https://app.contentflow.io");
            assert!(config.cors_allowed_origin.contains("admin.contentflow.io"));
            assert!(config.run_migrations);
        });
    }

    #[test]
    fn test_rejects_public_origin_with_path() {
        let vars = [
            REQUIRED[0],
            REQUIRED[1],
            REQUIRED[2],
            ("PUBLIC_ORIGIN", Some("https://app.contentflow.io/dashboard")),
        ];
        temp_env::with_vars(vars, || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("PUBLIC_ORIGIN"));
        });
    }

    #[test]
    fn test_missing_database_url() {
        let vars = [("DATABASE_URL", None), REQUIRED[1], REQUIRED[2]];
        temp_env::with_vars(vars, || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("DATABASE_URL"));
        });
    }

    #[test]
    fn test_missing_hosted_auth() {
        let vars = [REQUIRED[0], ("HOSTED_AUTH_URL", None), REQUIRED[2]];
        temp_env::with_vars(vars, || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("HOSTED_AUTH_URL"));
        });
    }
}
