//! Session and cookie arguments.

use crate::api::handlers::auth::{DEFAULT_SESSION_TTL_SECONDS, MIN_SIGNING_KEY_LEN};
use anyhow::{Context, Result};
use clap::{Arg, Command, builder::ValueParser};
use secrecy::SecretString;

pub const ARG_TOKEN_SECRET: &str = "token-secret";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";

/// Parsed auth options.
pub struct Options {
    pub token_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub frontend_base_url: String,
}

impl Options {
    /// # Errors
    /// Returns an error if a required auth argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let token_secret = matches
            .get_one::<String>(ARG_TOKEN_SECRET)
            .cloned()
            .map(SecretString::from)
            .context("missing required argument: --token-secret")?;
        let session_ttl_seconds = matches
            .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(DEFAULT_SESSION_TTL_SECONDS);
        let frontend_base_url = matches
            .get_one::<String>(ARG_FRONTEND_BASE_URL)
            .cloned()
            .context("missing required argument: --frontend-base-url")?;

        Ok(Self {
            token_secret,
            session_ttl_seconds,
            frontend_base_url,
        })
    }
}

fn validator_token_secret() -> ValueParser {
    ValueParser::from(move |secret: &str| -> std::result::Result<String, String> {
        if secret.len() < MIN_SIGNING_KEY_LEN {
            return Err(format!(
                "token secret must be at least {MIN_SIGNING_KEY_LEN} bytes"
            ));
        }
        Ok(secret.to_string())
    })
}

fn validator_ttl() -> ValueParser {
    ValueParser::from(move |ttl: &str| -> std::result::Result<i64, String> {
        match ttl.parse::<i64>() {
            Ok(seconds) if seconds > 0 => Ok(seconds),
            _ => Err("session TTL must be a positive number of seconds".to_string()),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_SECRET)
                .long(ARG_TOKEN_SECRET)
                .help("Secret used to sign session tokens (at least 32 bytes)")
                .env("FOCUSMATE_TOKEN_SECRET")
                .hide_env_values(true)
                .required(true)
                .value_parser(validator_token_secret()),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session cookie TTL in seconds")
                .env("FOCUSMATE_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(validator_ttl()),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL, used as the CORS origin and to decide the cookie Secure flag")
                .env("FOCUSMATE_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000"),
        )
}
