use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;
use client::view;
use shared::config::ClientConfig;

use super::signed_in_client;

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// Search users by name or email
    Search {
        /// Text to search for
        query: String,
    },
}

pub async fn run(command: UsersCommand, config: ClientConfig) -> Result<()> {
    let (client, _session) = signed_in_client(config)?;

    match command {
        UsersCommand::Search { query } => {
            let users = client
                .api()
                .search_users(&query)
                .await
                .context("failed to search users")?;
            if users.is_empty() {
                println!("No users found.");
            }
            let now = Utc::now();
            for user in users {
                let presence = if user.is_online() {
                    "online".to_string()
                } else {
                    view::format_last_seen(user.last_seen, now)
                };
                println!("{:<26} {:<20} {:<28} {presence}", user.id, user.username, user.email);
            }
        }
    }
    Ok(())
}
