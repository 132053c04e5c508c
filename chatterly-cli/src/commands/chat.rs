use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Args;
use client::{ChannelEvent, ChatClient, ClientError, EventOutcome, composer::Composer, view};
use shared::{
    config::ClientConfig,
    models::{MessageId, Pagination, RoomId, ServerEvent, UserId},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use super::{messages::message_line, signed_in_client};

const HELP: &str =
    "Commands: /react <message-id> <emoji>, /pin <message-id>, /read <message-id>, /more, /quit";

#[derive(Args, Debug)]
#[command(about = "Open a room and chat live")]
pub struct ChatArgs {
    /// Room identifier to open
    #[arg(long, short)]
    pub room: String,
}

pub async fn run(args: ChatArgs, config: ClientConfig) -> Result<()> {
    let (mut client, session) = signed_in_client(config)?;
    let room_id = RoomId::from(args.room.as_str());

    let mut events = client
        .connect()
        .await
        .context("failed to open the live channel")?;
    client.load_rooms().await.context("failed to load rooms")?;
    if client.snapshot().room(&room_id).is_none() {
        client.disconnect().await;
        bail!("room {room_id} is not one of your rooms");
    }
    let pagination = client
        .select_room(&room_id)
        .await
        .context("failed to load messages")?;
    info!(%room_id, "room opened");

    let mut screen = ChatView::new(session.user.id, client.composer()?, pagination);
    screen.print_opening(&client);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => screen.on_channel_event(&client, event),
                None => break,
            },
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !screen.on_line(&client, &line).await {
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    drop(screen);
    client.disconnect().await;
    Ok(())
}

/// Terminal rendering state for one open room.
struct ChatView {
    self_id: UserId,
    composer: Composer,
    next_page: Option<u32>,
    last_typing: Option<String>,
    last_header: String,
}

impl ChatView {
    fn new(self_id: UserId, composer: Composer, pagination: Option<Pagination>) -> Self {
        Self {
            self_id,
            composer,
            next_page: pagination.and_then(next_page),
            last_typing: None,
            last_header: String::new(),
        }
    }

    fn print_opening(&mut self, client: &ChatClient) {
        let state = client.snapshot();
        if let Some(room) = state.active_room() {
            self.last_header = view::header_status(room, &self.self_id, &[], Utc::now());
            println!(
                "== {} ({}) ==",
                view::room_display_name(room, &self.self_id),
                self.last_header
            );
        }
        for message in state.messages() {
            println!("{}", message_line(message, &self.self_id));
        }
        println!("{HELP}");
    }

    fn on_channel_event(&mut self, client: &ChatClient, event: ChannelEvent) {
        let mut touched: Option<MessageId> = None;
        let mut new_message: Option<(RoomId, MessageId)> = None;
        match &event {
            ChannelEvent::Connected => {
                self.composer.set_enabled(true);
                println!("* connected");
            }
            ChannelEvent::Disconnected { reason } => {
                self.composer.set_enabled(false);
                println!("* connection lost ({reason}); reconnecting...");
            }
            ChannelEvent::Event(ServerEvent::MessageNew(message)) => {
                new_message = Some((message.room.clone(), message.id.clone()));
            }
            ChannelEvent::Event(ServerEvent::MessageStatus(update)) => {
                touched = Some(update.message_id.clone());
            }
            ChannelEvent::Event(ServerEvent::MessageReacted(update)) => {
                touched = Some(update.message_id.clone());
            }
            ChannelEvent::Event(ServerEvent::MessagePinned(update)) => {
                touched = Some(update.message_id.clone());
            }
            ChannelEvent::Event(ServerEvent::Error(error)) => {
                println!("! {}", error.message);
            }
            ChannelEvent::Event(_) => {}
        }

        if client.handle_channel_event(event) != EventOutcome::Applied {
            return;
        }

        let state = client.snapshot();
        if let Some((room_id, message_id)) = new_message {
            if let Some(message) = state.message(&message_id) {
                println!("{}", message_line(message, &self.self_id));
            } else if let Some(room) = state.room(&room_id) {
                let badge = view::unread_badge(room.unread_count)
                    .map(|badge| format!(" ({badge})"))
                    .unwrap_or_default();
                println!(
                    "* new message in {}{badge}",
                    view::room_display_name(room, &self.self_id)
                );
            }
        }
        if let Some(message) = touched.and_then(|id| state.message(&id)) {
            println!("~ {}", message_line(message, &self.self_id));
        }

        let typing = view::typing_text(state.typing());
        if typing != self.last_typing {
            if let Some(text) = &typing {
                println!("* {text}");
            }
            self.last_typing = typing;
        }
        if let Some(room) = state.active_room() {
            let header = view::header_status(room, &self.self_id, &[], Utc::now());
            if header != self.last_header {
                println!("* {header}");
                self.last_header = header;
            }
        }
    }

    /// Handle one line of input; `false` ends the session.
    async fn on_line(&mut self, client: &ChatClient, line: &str) -> bool {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            self.send(line);
            return true;
        };

        let parts: Vec<&str> = command.split_whitespace().collect();
        match parts.as_slice() {
            ["quit" | "q"] => return false,
            ["react", id, emoji] => report(client.react(&MessageId::from(*id), emoji)),
            ["pin", id] => {
                let is_admin = client
                    .snapshot()
                    .active_room()
                    .is_some_and(|room| view::is_admin(room, &self.self_id));
                if is_admin {
                    report(client.pin(&MessageId::from(*id)));
                } else {
                    println!("! only room admins can pin messages");
                }
            }
            ["read", id] => report(client.mark_read(&MessageId::from(*id))),
            ["more"] => self.load_more(client).await,
            _ => println!("! unknown command. {HELP}"),
        }
        true
    }

    fn send(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.composer.is_enabled() {
            println!("! not connected; message not sent");
            return;
        }
        if let Err(err) = self.composer.input(text) {
            report(Err(err));
            return;
        }
        report(self.composer.send().map(|_| ()));
    }

    async fn load_more(&mut self, client: &ChatClient) {
        let Some(page) = self.next_page else {
            println!("* no older messages");
            return;
        };
        match client.load_page(page).await {
            Ok(Some(pagination)) => {
                self.next_page = next_page(pagination);
                let state = client.snapshot();
                println!("-- history (page {page}) --");
                for message in state.messages() {
                    println!("{}", message_line(message, &self.self_id));
                }
            }
            Ok(None) => {}
            Err(err) => println!("! {}", err.user_message()),
        }
    }
}

fn next_page(pagination: Pagination) -> Option<u32> {
    (pagination.has_more || pagination.page < pagination.pages).then_some(pagination.page + 1)
}

fn report(result: Result<(), ClientError>) {
    match result {
        Ok(()) => {}
        Err(ClientError::NotConnected) => println!("! not connected; try again once reconnected"),
        Err(err) => println!("! {}", err.user_message()),
    }
}
