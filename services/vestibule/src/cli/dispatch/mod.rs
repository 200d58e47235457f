//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the appropriate action, such as starting
//! the API server with its full configuration.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands;
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::time::Duration;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);
    let ceremony_path = matches
        .get_one::<String>(commands::ARG_CEREMONY)
        .cloned()
        .context("missing required argument: --ceremony")?;
    let issuer = matches
        .get_one::<String>(commands::ARG_ISSUER)
        .cloned()
        .context("missing required argument: --issuer")?;
    let frontend_base_url = matches
        .get_one::<String>(commands::ARG_FRONTEND_BASE_URL)
        .cloned()
        .context("missing required argument: --frontend-base-url")?;
    let signing_seed = matches
        .get_one::<String>(commands::ARG_SIGNING_SEED)
        .cloned()
        .map(SecretString::from);

    let ttl = |name: &str, fallback: u64| {
        Duration::from_secs(matches.get_one::<u64>(name).copied().unwrap_or(fallback))
    };

    Ok(Action::Server(Args {
        port,
        issuer,
        signing_seed,
        ceremony_path,
        frontend_base_url,
        ceremony_ttl: ttl(commands::ARG_CEREMONY_TTL, 300),
        access_ttl: ttl(commands::ARG_ACCESS_TTL, 600),
        refresh_ttl: ttl(commands::ARG_REFRESH_TTL, 14 * 24 * 60 * 60),
    }))
}
