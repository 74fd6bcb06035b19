//! Configuration from the environment

use std::net::SocketAddr;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;

use crate::codes::DEFAULT_CODE_LENGTH;
use crate::codes::MAX_CODE_LENGTH;
use crate::codes::generate;
use crate::utils::env_var;
use crate::utils::env_var_or_else;

const DEFAULT_ADDRESS: &str = "0.0.0.0:6000";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:6000";
const DEFAULT_EXPIRED_REDIRECT: &str = "/?error=expired";

/// Length of a generated `JWT_SECRET`
const GENERATED_SECRET_LENGTH: usize = 32;

/// Configuration of Shortlink
#[derive(Clone, Debug)]
pub struct Config {
    /// Address to listen on
    pub address: SocketAddr,

    /// Base of the short URLs handed out
    pub public_url: String,

    /// Where visitors of expired links are sent
    pub expired_redirect: String,

    /// Length of generated codes
    pub code_length: usize,

    /// Postgres connection string, the memory storage is used without one
    pub database_url: Option<String>,

    /// Secret shared with the identity provider to verify tokens
    pub jwt_secret: String,
}

impl Config {
    /// Read the configuration from the environment
    ///
    /// # Errors
    ///
    /// Will return `Err` when a variable is set to an invalid value
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            address: address_from_env()?,
            public_url: env_var_or_else("PUBLIC_URL", || DEFAULT_PUBLIC_URL.to_string()),
            expired_redirect: env_var_or_else("EXPIRED_REDIRECT", || {
                DEFAULT_EXPIRED_REDIRECT.to_string()
            }),
            code_length: code_length_from_env()?,
            database_url: env_var("DATABASE_URL"),
            jwt_secret: env_var_or_else("JWT_SECRET", || {
                let jwt_secret = generate(GENERATED_SECRET_LENGTH);
                tracing::info!("`JWT_SECRET` is not set, generating temporary one: {jwt_secret}");
                jwt_secret
            }),
        })
    }
}

fn address_from_env() -> Result<SocketAddr> {
    let address = env_var_or_else("ADDRESS", || DEFAULT_ADDRESS.to_string());
    let mut address = address
        .parse::<SocketAddr>()
        .with_context(|| format!("Invalid `ADDRESS`: {address}"))?;

    // optional override of just the port
    if let Some(port) = env_var("PORT") {
        let port = port
            .parse::<u16>()
            .with_context(|| format!("Invalid `PORT`: {port}"))?;

        address.set_port(port);
    }

    Ok(address)
}

fn code_length_from_env() -> Result<usize> {
    let Some(code_length) = env_var("CODE_LENGTH") else {
        return Ok(DEFAULT_CODE_LENGTH);
    };

    let code_length = code_length
        .parse::<usize>()
        .with_context(|| format!("Invalid `CODE_LENGTH`: {code_length}"))?;

    if code_length == 0 || code_length > MAX_CODE_LENGTH {
        bail!("`CODE_LENGTH` must be between 1 and {MAX_CODE_LENGTH}, got {code_length}");
    }

    Ok(code_length)
}
