use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;
use client::view;
use shared::{
    config::ClientConfig,
    models::{Room, RoomId, UserId},
};

use super::signed_in_client;

#[derive(Subcommand, Debug)]
pub enum RoomsCommand {
    /// List the rooms you belong to
    List,
    /// Search rooms by name
    Search {
        /// Text to search for
        query: String,
    },
    /// Show one room with its members
    Show {
        /// Room identifier
        room: String,
    },
}

pub async fn run(command: RoomsCommand, config: ClientConfig) -> Result<()> {
    let (client, session) = signed_in_client(config)?;
    let self_id = session.user.id;

    match command {
        RoomsCommand::List => {
            let rooms = client.load_rooms().await.context("failed to load rooms")?;
            print_rooms(&rooms, &self_id);
        }
        RoomsCommand::Search { query } => {
            let rooms = client
                .api()
                .search_rooms(&query)
                .await
                .context("failed to search rooms")?;
            print_rooms(&rooms, &self_id);
        }
        RoomsCommand::Show { room } => {
            let room = client
                .api()
                .room(&RoomId::from(room.as_str()))
                .await
                .context("failed to load room")?;
            print_room_details(&room, &self_id);
        }
    }
    Ok(())
}

fn room_line(room: &Room, self_id: &UserId) -> String {
    let now = Utc::now();
    let mut line = format!(
        "{:<26} {:<24} {:<8}",
        room.id,
        view::room_display_name(room, self_id),
        room.kind.as_str()
    );
    if let Some(badge) = view::unread_badge(room.unread_count) {
        let _ = write!(line, " ({badge})");
    }
    if let Some(last) = &room.last_message {
        let _ = write!(
            line,
            "  {}: {} · {}",
            last.sender.username,
            preview(&last.content),
            view::format_relative(last.created_at, now)
        );
    }
    line
}

fn print_rooms(rooms: &[Room], self_id: &UserId) {
    if rooms.is_empty() {
        println!("No rooms found.");
        return;
    }
    for room in rooms {
        println!("{}", room_line(room, self_id));
    }
}

fn print_room_details(room: &Room, self_id: &UserId) {
    let now = Utc::now();
    println!(
        "{} [{}]",
        view::room_display_name(room, self_id),
        room.kind.as_str()
    );
    println!("{}", view::header_status(room, self_id, &[], now));
    println!("Pinned messages: {}", room.pinned_messages.len());
    println!("Members:");
    for member in &room.members {
        let role = if view::is_admin(room, &member.id) {
            " (admin)"
        } else {
            ""
        };
        let presence = if member.is_online() {
            "online".to_string()
        } else {
            view::format_last_seen(member.last_seen, now)
        };
        println!("  {}{role}  {presence}", member.username);
    }
}

fn preview(content: &str) -> String {
    const MAX: usize = 40;
    if content.chars().count() <= MAX {
        content.to_string()
    } else {
        let cut: String = content.chars().take(MAX).collect();
        format!("{cut}...")
    }
}
