use crate::api::{
    self,
    handlers::auth::{AuthConfig, SigningKey},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::{debug, info};
use url::Url;

pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub token_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub frontend_base_url: String,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("dsn", &redact_dsn(&self.dsn))
            .field("token_secret", &"[REDACTED]")
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("frontend_base_url", &self.frontend_base_url)
            .finish()
    }
}

/// Strip the password from a DSN so it can be logged.
fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("REDACTED"));
            }
            url.to_string()
        }
        Err(_) => "<invalid dsn>".to_string(),
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the signing key is too short or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let signing_key =
        SigningKey::from_secret(&args.token_secret).context("Invalid --token-secret")?;

    let auth_config = AuthConfig::new(args.frontend_base_url)
        .with_session_ttl_seconds(args.session_ttl_seconds);

    info!(
        port = args.port,
        session_ttl_seconds = auth_config.session_ttl_seconds(),
        frontend_base_url = auth_config.frontend_base_url(),
        "Starting server"
    );

    api::new(args.port, args.dsn, auth_config, signing_key).await
}
