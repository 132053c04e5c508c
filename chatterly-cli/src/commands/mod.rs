//! Subcommand handlers.

pub mod chat;
pub mod completion;
pub mod config;
pub mod messages;
pub mod rooms;
pub mod session;
pub mod users;

use anyhow::{Context, Result, bail};
use client::{ChatClient, Session};
use shared::config::ClientConfig;

/// Build a client and rehydrate the stored session, failing when there is none.
pub(crate) fn signed_in_client(config: ClientConfig) -> Result<(ChatClient, Session)> {
    let client = ChatClient::from_config(config).context("failed to set up the client")?;
    let state = client
        .restore()
        .context("failed to read the stored session")?;
    let Some(session) = state.session().cloned() else {
        bail!("not logged in; run `chatterly session login` first");
    };
    Ok((client, session))
}
