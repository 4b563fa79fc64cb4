//! Map validated CLI matches to an action carrying the immutable configuration.

use crate::cli::{
    actions::{Action, server::Args},
    commands::{ARG_DSN, ARG_MAX_CONNECTIONS, ARG_PORT, session},
    config::{GatewayConfig, MIN_SECRET_KEY_LEN},
};
use anyhow::{Context, Result, bail};
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    let max_connections = matches
        .get_one::<u32>(ARG_MAX_CONNECTIONS)
        .copied()
        .unwrap_or(5);

    let secret_key = matches
        .get_one::<String>(session::ARG_SECRET_KEY)
        .cloned()
        .context("missing required argument: --secret-key")?;
    if secret_key.len() < MIN_SECRET_KEY_LEN {
        bail!("--secret-key must be at least {MIN_SECRET_KEY_LEN} bytes long");
    }

    let config = GatewayConfig::new(dsn, SecretString::from(secret_key))
        .with_port(port)
        .with_max_connections(max_connections)
        .with_secure_cookies(matches.get_flag(session::ARG_SECURE_COOKIES));

    Ok(Action::Server(Args { config }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn test_handler_builds_config() -> Result<()> {
        let matches = commands::new().try_get_matches_from(vec![
            "portier",
            "--port",
            "9000",
            "--dsn",
            "sqlite::memory:",
            "--max-connections",
            "1",
            "--secret-key",
            "0123456789abcdef",
        ])?;

        let Action::Server(args) = handler(&matches)?;
        assert_eq!(args.config.port, 9000);
        assert_eq!(args.config.dsn, "sqlite::memory:");
        assert_eq!(args.config.max_connections, 1);
        assert_eq!(args.config.secret_key.expose_secret(), "0123456789abcdef");
        assert!(!args.config.secure_cookies);
        Ok(())
    }

    #[test]
    fn test_handler_rejects_short_secret() -> Result<()> {
        let matches =
            commands::new().try_get_matches_from(vec!["portier", "--secret-key", "short"])?;

        let err = handler(&matches).err().map(|e| e.to_string());
        assert!(err.is_some_and(|e| e.contains("at least 16 bytes")));
        Ok(())
    }
}
