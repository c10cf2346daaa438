use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct BillingConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub smtp: SmtpConfig,
    pub storage: StorageConfig,
    pub service_name: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret<String>,
    pub from_email: String,
    pub from_name: String,
    /// Base URL of the tenant-facing payment page linked from invoice emails.
    pub payment_base_url: String,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub proof_dir: PathBuf,
}

impl BillingConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("BILLING_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("BILLING_SERVICE_PORT")
            .unwrap_or_else(|_| "3005".to_string())
            .parse()?;

        let db_url = env::var("BILLING_DATABASE_URL").expect("BILLING_DATABASE_URL must be set");
        let max_connections = env::var("BILLING_DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()?;
        let min_connections = env::var("BILLING_DATABASE_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let smtp_enabled = env::var("BILLING_SMTP_ENABLED")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);
        let smtp_host = env::var("BILLING_SMTP_HOST").unwrap_or_else(|_| "localhost".to_string());
        let smtp_port = env::var("BILLING_SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()?;
        let smtp_user = env::var("BILLING_SMTP_USER").unwrap_or_default();
        let smtp_password = env::var("BILLING_SMTP_PASSWORD").unwrap_or_default();
        let from_email = env::var("BILLING_SMTP_FROM_EMAIL")
            .unwrap_or_else(|_| "billing@localhost".to_string());
        let from_name = env::var("BILLING_SMTP_FROM_NAME")
            .unwrap_or_else(|_| "Boarding House Billing".to_string());
        let payment_base_url = env::var("BILLING_PAYMENT_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let proof_dir = env::var("BILLING_PROOF_DIR")
            .unwrap_or_else(|_| "./uploads/proofs".to_string())
            .into();

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                max_connections,
                min_connections,
            },
            smtp: SmtpConfig {
                enabled: smtp_enabled,
                host: smtp_host,
                port: smtp_port,
                user: smtp_user,
                password: Secret::new(smtp_password),
                from_email,
                from_name,
                payment_base_url,
            },
            storage: StorageConfig { proof_dir },
            service_name: "billing-service".to_string(),
        })
    }
}
