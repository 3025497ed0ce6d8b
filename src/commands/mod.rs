pub mod apply;
pub mod repo;

use crate::Context;
use crate::config::{self, SyncConfig};
use anyhow::Result;
use bitbucket::backend::http::UreqClient;
use bitbucket::{Client, Credentials, Endpoints, Transport};
use std::path::PathBuf;

/// Locate and load the desired-state file
pub fn load_config(ctx: &Context) -> Result<(SyncConfig, PathBuf)> {
    let path = config::resolve_path(ctx.config.as_deref())?;
    log::debug!("loading {}", path.display());
    let config = SyncConfig::load(&path)?;
    Ok((config, path))
}

/// Build an API client for the repository named in `config`
pub fn connect(ctx: &Context, config: &SyncConfig) -> Result<Client> {
    let credentials = ctx.username.as_deref().map(|username| {
        Credentials::new(username, ctx.password.as_deref().unwrap_or_default())
    });
    if credentials.is_none() {
        log::warn!("no username given, calling the API anonymously");
    }

    let transport = Transport::new(Box::new(UreqClient::new(config.timeout())))
        .with_credentials(credentials)
        .with_retry(config.retry_policy());
    let endpoints = Endpoints::new(config.api_url(), &config.workspace, &config.repository)?;

    Ok(Client::new(transport, endpoints))
}
