use dotenv::dotenv;
use std::env;
use tracing::{info, warn};

const INSECURE_DEFAULT_SECRET: &str = "development-only-auth-secret";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub auth_secret: String,
    pub allowed_email_domains: Vec<String>,
    pub server_host: String,
    pub server_port: u16,
    pub max_connections: u32,
    pub app_env: String,
}

impl Config {
    /// Loads the configuration from environment variables.
    /// Calls dotenv() first so a local `.env` file is honoured.
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://wip.db?mode=rwc".to_string());

        let auth_secret = env::var("AUTH_SECRET").unwrap_or_else(|_| {
            warn!("AUTH_SECRET not set, using default (not secure for production!)");
            INSECURE_DEFAULT_SECRET.to_string()
        });

        let allowed_email_domains =
            parse_domain_list(&env::var("ALLOWED_EMAIL_DOMAINS").unwrap_or_default());

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| "Invalid SERVER_PORT: must be a number between 0-65535".to_string())?;

        let max_connections = env::var("MAX_DB_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .map_err(|_| "Invalid MAX_DB_CONNECTIONS: must be a positive number".to_string())?;

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            database_url,
            auth_secret,
            allowed_email_domains,
            server_host,
            server_port,
            max_connections,
            app_env,
        })
    }

    /// Logs the configuration, hiding secrets
    pub fn print_info(&self) {
        info!("Server configuration:");
        info!("  Environment: {}", self.app_env);
        info!("  Server address: {}:{}", self.server_host, self.server_port);
        info!("  Database: {}", Self::mask_url(&self.database_url));
        info!("  Max DB connections: {}", self.max_connections);
        if self.allowed_email_domains.is_empty() {
            info!("  Allowed email domains: any");
        } else {
            info!("  Allowed email domains: {}", self.allowed_email_domains.join(", "));
        }
        if self.auth_secret == INSECURE_DEFAULT_SECRET {
            warn!("  Auth secret: USING DEFAULT (INSECURE!)");
        } else {
            info!("  Auth secret: custom secret configured");
        }
    }

    /// Masks credentials in the database URL for logging
    fn mask_url(url: &str) -> String {
        if let Some(at_pos) = url.find('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        if url.starts_with("sqlite:") {
            return url.to_string();
        }
        "***".to_string()
    }
}

/// Splits a comma separated domain list, dropping blanks and normalising case.
pub fn parse_domain_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domain_list() {
        assert_eq!(
            parse_domain_list(" Example.com, ,corp.example.org"),
            vec!["example.com".to_string(), "corp.example.org".to_string()]
        );
        assert!(parse_domain_list("").is_empty());
    }

    #[test]
    fn test_mask_url_hides_credentials() {
        assert_eq!(
            Config::mask_url("postgres://user:pass@db:5432/wip"),
            "postgres://***@db:5432/wip"
        );
        assert_eq!(Config::mask_url("sqlite://wip.db"), "sqlite://wip.db");
    }
}
