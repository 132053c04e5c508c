use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::Subcommand;
use client::view;
use shared::{
    config::ClientConfig,
    models::{Message, MessageKind, RoomId, UserId},
};

use super::signed_in_client;

#[derive(Subcommand, Debug)]
pub enum MessagesCommand {
    /// Search message content, across all rooms or within one
    Search {
        /// Text to search for
        query: String,

        /// Restrict the search to this room
        #[arg(long, short)]
        room: Option<String>,
    },
    /// List the pinned messages of a room
    Pinned {
        /// Room identifier
        #[arg(long, short)]
        room: String,
    },
}

pub async fn run(command: MessagesCommand, config: ClientConfig) -> Result<()> {
    let (client, session) = signed_in_client(config)?;
    let self_id = session.user.id;

    let messages = match command {
        MessagesCommand::Search { query, room: None } => client
            .api()
            .search_messages(&query)
            .await
            .context("failed to search messages")?,
        MessagesCommand::Search {
            query,
            room: Some(room),
        } => client
            .api()
            .search_room_messages(&RoomId::from(room.as_str()), &query)
            .await
            .context("failed to search room messages")?,
        MessagesCommand::Pinned { room } => client
            .api()
            .pinned_messages(&RoomId::from(room.as_str()))
            .await
            .context("failed to load pinned messages")?,
    };

    if messages.is_empty() {
        println!("No messages found.");
    }
    for message in &messages {
        println!("{}", message_line(message, &self_id));
    }
    Ok(())
}

/// One-line rendering of a message: time, sender, body, ticks, reactions.
pub(crate) fn message_line(message: &Message, self_id: &UserId) -> String {
    let sender = if view::is_own(message, self_id) {
        "you"
    } else {
        message.sender.username.as_str()
    };
    let mut line = format!(
        "[{}] {sender}: {}",
        view::format_time(message.created_at),
        body(message)
    );

    if view::is_own(message, self_id) {
        let ticks = view::status_ticks(message.status);
        let _ = write!(line, " {}", ticks.glyph);
        if ticks.highlighted {
            line.push_str(" (read)");
        }
    }
    if message.is_pinned {
        line.push_str(" [pinned]");
    }
    let reactions = view::reaction_counts(&message.reactions);
    if !reactions.is_empty() {
        let rendered = reactions
            .iter()
            .map(|(emoji, count)| format!("{emoji}{count}"))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = write!(line, "  {rendered}");
    }
    let _ = write!(line, "  #{}", message.id);
    line
}

fn body(message: &Message) -> String {
    match message.kind {
        MessageKind::Text | MessageKind::System => message.content.clone(),
        MessageKind::File | MessageKind::Gif => {
            let name = message
                .file_name
                .as_deref()
                .unwrap_or(message.content.as_str());
            let size = message
                .file_size
                .as_deref()
                .map(|size| format!(" ({size})"))
                .unwrap_or_default();
            format!("<{}: {name}{size}>", message.kind.as_str())
        }
    }
}
