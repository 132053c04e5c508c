//! Reconciliation of pulled pages and pushed events into one view state.
//!
//! [`ChatState`] owns the room list, the active room's message sequence and
//! its typing set. Pull results seed it, live events fold into it. Every
//! method is synchronous; callers serialize access behind a mutex so each
//! effect applies atomically.

use shared::models::{
    Message, MessageId, MessagePinnedEvent, MessageReactedEvent, MessageStatusEvent, Room, RoomId,
    ServerEvent, TypingStartEvent, TypingStopEvent, UserId, UserOfflineEvent, UserOnlineEvent,
};
use tracing::{debug, warn};

/// Someone currently typing in the active room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingUser {
    /// Who is typing.
    pub user_id: UserId,
    /// Name shown in the typing line.
    pub username: String,
}

/// Proof of which room selection a page fetch was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket {
    room_id: RoomId,
    generation: u64,
}

impl PageTicket {
    /// Room the fetch targets.
    #[must_use]
    pub const fn room_id(&self) -> &RoomId {
        &self.room_id
    }
}

/// What folding an event did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The state changed.
    Applied,
    /// Nothing in the current state matched the event.
    Ignored,
    /// The event would have violated an invariant (status regression).
    Rejected,
}

#[derive(Debug, Clone)]
struct ActiveRoom {
    room_id: RoomId,
    generation: u64,
    messages: Vec<Message>,
    typing: Vec<TypingUser>,
}

impl ActiveRoom {
    fn message_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|message| &message.id == id)
    }
}

/// Canonical client-side chat state.
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    self_id: Option<UserId>,
    rooms: Vec<Room>,
    active: Option<ActiveRoom>,
    generation: u64,
    connected: bool,
}

impl ChatState {
    /// Empty state for the given signed-in user.
    #[must_use]
    pub fn new(self_id: Option<UserId>) -> Self {
        Self {
            self_id,
            ..Self::default()
        }
    }

    /// Set or forget the signed-in user.
    pub fn set_self(&mut self, self_id: Option<UserId>) {
        self.self_id = self_id;
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn self_id(&self) -> Option<&UserId> {
        self.self_id.as_ref()
    }

    /// Rooms in the order they were seeded or inserted.
    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Look up a room by id.
    #[must_use]
    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|room| &room.id == id)
    }

    fn room_mut(&mut self, id: &RoomId) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|room| &room.id == id)
    }

    /// Id of the selected room.
    #[must_use]
    pub fn active_room_id(&self) -> Option<&RoomId> {
        self.active.as_ref().map(|active| &active.room_id)
    }

    /// The selected room, when it is still in the room list.
    #[must_use]
    pub fn active_room(&self) -> Option<&Room> {
        self.active_room_id().and_then(|id| self.room(id))
    }

    /// Active room messages in arrival order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        self.active
            .as_ref()
            .map(|active| active.messages.as_slice())
            .unwrap_or_default()
    }

    /// Look up a message in the active room.
    #[must_use]
    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages().iter().find(|message| &message.id == id)
    }

    /// Users typing in the active room.
    #[must_use]
    pub fn typing(&self) -> &[TypingUser] {
        self.active
            .as_ref()
            .map(|active| active.typing.as_slice())
            .unwrap_or_default()
    }

    /// Last connection state reported by the live channel.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Connection changes never touch loaded rooms or messages.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Replace the room list with a fresh pull result.
    pub fn seed_rooms(&mut self, rooms: Vec<Room>) {
        self.rooms = rooms;
    }

    /// Insert a room or replace the one with the same id.
    pub fn upsert_room(&mut self, room: Room) {
        match self.room_mut(&room.id) {
            Some(existing) => *existing = room,
            None => self.rooms.push(room),
        }
    }

    /// Remove a room; leaving it deselects it when active.
    pub fn remove_room(&mut self, id: &RoomId) {
        self.rooms.retain(|room| &room.id != id);
        if self.active_room_id() == Some(id) {
            self.active = None;
        }
    }

    /// Make `room_id` the active room.
    ///
    /// Clears the typing set and message sequence, resets the room's unread
    /// counter and returns the ticket its first page must be applied with.
    pub fn select_room(&mut self, room_id: RoomId) -> PageTicket {
        self.generation += 1;
        if let Some(room) = self.room_mut(&room_id) {
            room.unread_count = 0;
        }
        self.active = Some(ActiveRoom {
            room_id: room_id.clone(),
            generation: self.generation,
            messages: Vec::new(),
            typing: Vec::new(),
        });

        PageTicket {
            room_id,
            generation: self.generation,
        }
    }

    /// Ticket for the current selection, used to fetch further pages.
    #[must_use]
    pub fn current_ticket(&self) -> Option<PageTicket> {
        self.active.as_ref().map(|active| PageTicket {
            room_id: active.room_id.clone(),
            generation: active.generation,
        })
    }

    /// Apply a fetched page. Returns `false` and drops the page when the
    /// selection changed since `ticket` was issued.
    ///
    /// The page goes first, followed by whatever the sequence already holds
    /// (pushes that arrived while the fetch was in flight, or newer pages when
    /// loading history). Messages present in both appear once, with the
    /// further advanced delivery status.
    pub fn apply_page(&mut self, ticket: &PageTicket, page: Vec<Message>) -> bool {
        let Some(active) = self
            .active
            .as_mut()
            .filter(|active| active.generation == ticket.generation && active.room_id == ticket.room_id)
        else {
            debug!(room = %ticket.room_id, "discarding stale message page");
            return false;
        };

        let streamed = std::mem::take(&mut active.messages);
        let mut merged = Vec::with_capacity(page.len() + streamed.len());
        for message in page.into_iter().chain(streamed) {
            merge_message(&mut merged, message);
        }
        active.messages = merged;
        true
    }

    /// Drop everything; used on logout.
    pub fn clear(&mut self) {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    /// Fold one live event into the state.
    pub fn apply_event(&mut self, event: ServerEvent) -> EventOutcome {
        let name = event.name();
        let outcome = match event {
            ServerEvent::MessageNew(message) => self.on_message_new(*message),
            ServerEvent::MessageStatus(status) => self.on_message_status(&status),
            ServerEvent::MessageReacted(reacted) => self.on_message_reacted(reacted),
            ServerEvent::MessagePinned(pinned) => self.on_message_pinned(&pinned),
            ServerEvent::TypingStart(typing) => self.on_typing_start(typing),
            ServerEvent::TypingStop(typing) => self.on_typing_stop(&typing),
            ServerEvent::UserOnline(online) => self.on_user_online(&online),
            ServerEvent::UserOffline(offline) => self.on_user_offline(&offline),
            ServerEvent::Error(error) => {
                warn!(message = %error.message, "live channel reported an error");
                EventOutcome::Ignored
            }
        };

        if outcome != EventOutcome::Applied {
            debug!(event = name, ?outcome, "event not applied");
        }
        outcome
    }

    fn on_message_new(&mut self, message: Message) -> EventOutcome {
        let mut outcome = EventOutcome::Ignored;
        let is_active = self.active_room_id() == Some(&message.room);
        let from_self = self.self_id.as_ref() == Some(&message.sender.id);

        if let Some(room) = self.room_mut(&message.room) {
            room.last_message = Some(Box::new(message.clone()));
            if !is_active && !from_self {
                room.unread_count = room.unread_count.saturating_add(1);
            }
            outcome = EventOutcome::Applied;
        }

        if let Some(active) = self.active.as_mut().filter(|_| is_active) {
            merge_message(&mut active.messages, message);
            outcome = EventOutcome::Applied;
        }

        outcome
    }

    fn on_message_status(&mut self, event: &MessageStatusEvent) -> EventOutcome {
        let mut outcome = EventOutcome::Ignored;

        if let Some(message) = self
            .active
            .as_mut()
            .and_then(|active| active.message_mut(&event.message_id))
        {
            outcome = if message.advance_status(event.status) {
                EventOutcome::Applied
            } else {
                EventOutcome::Rejected
            };
        }

        for room in &mut self.rooms {
            if let Some(last) = room
                .last_message
                .as_mut()
                .filter(|last| last.id == event.message_id)
                && last.advance_status(event.status)
                && outcome == EventOutcome::Ignored
            {
                outcome = EventOutcome::Applied;
            }
        }

        outcome
    }

    fn on_message_reacted(&mut self, event: MessageReactedEvent) -> EventOutcome {
        let mut outcome = EventOutcome::Ignored;

        for room in &mut self.rooms {
            if let Some(last) = room
                .last_message
                .as_mut()
                .filter(|last| last.id == event.message_id)
            {
                last.reactions.clone_from(&event.reactions);
            }
        }

        if let Some(message) = self
            .active
            .as_mut()
            .and_then(|active| active.message_mut(&event.message_id))
        {
            message.reactions = event.reactions;
            outcome = EventOutcome::Applied;
        }

        outcome
    }

    fn on_message_pinned(&mut self, event: &MessagePinnedEvent) -> EventOutcome {
        let Some(active) = self.active.as_mut() else {
            return EventOutcome::Ignored;
        };
        let Some(message) = active.message_mut(&event.message_id) else {
            return EventOutcome::Ignored;
        };
        message.is_pinned = event.is_pinned;
        let room_id = active.room_id.clone();

        if let Some(room) = self.room_mut(&room_id) {
            let position = room
                .pinned_messages
                .iter()
                .position(|id| id == &event.message_id);
            match (event.is_pinned, position) {
                (true, None) => room.pinned_messages.push(event.message_id.clone()),
                (false, Some(index)) => {
                    room.pinned_messages.remove(index);
                }
                _ => {}
            }
        }

        EventOutcome::Applied
    }

    fn typing_target(&mut self, room: Option<&RoomId>) -> Option<&mut ActiveRoom> {
        self.active
            .as_mut()
            .filter(|active| room.is_none_or(|room| room == &active.room_id))
    }

    fn on_typing_start(&mut self, event: TypingStartEvent) -> EventOutcome {
        let Some(active) = self.typing_target(event.room_id.as_ref()) else {
            return EventOutcome::Ignored;
        };
        if active.typing.iter().any(|user| user.user_id == event.user_id) {
            return EventOutcome::Ignored;
        }
        active.typing.push(TypingUser {
            user_id: event.user_id,
            username: event.username,
        });
        EventOutcome::Applied
    }

    fn on_typing_stop(&mut self, event: &TypingStopEvent) -> EventOutcome {
        let Some(active) = self.typing_target(event.room_id.as_ref()) else {
            return EventOutcome::Ignored;
        };
        let before = active.typing.len();
        active.typing.retain(|user| user.user_id != event.user_id);
        if active.typing.len() == before {
            EventOutcome::Ignored
        } else {
            EventOutcome::Applied
        }
    }

    fn on_user_online(&mut self, event: &UserOnlineEvent) -> EventOutcome {
        let mut outcome = EventOutcome::Ignored;
        for room in &mut self.rooms {
            for member in room.members_matching(&event.user_id) {
                member.set_online();
                outcome = EventOutcome::Applied;
            }
        }
        outcome
    }

    fn on_user_offline(&mut self, event: &UserOfflineEvent) -> EventOutcome {
        let mut outcome = EventOutcome::Ignored;
        for room in &mut self.rooms {
            for member in room.members_matching(&event.user_id) {
                member.set_offline(event.last_seen);
                outcome = EventOutcome::Applied;
            }
        }
        outcome
    }
}

/// Append `message` unless its id is already present; a duplicate only
/// advances the existing entry's status.
fn merge_message(messages: &mut Vec<Message>, message: Message) {
    match messages.iter_mut().find(|existing| existing.id == message.id) {
        Some(existing) => {
            existing.advance_status(message.status);
        }
        None => messages.push(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::models::{DeliveryStatus, PresenceStatus, Timestamp};

    fn room(id: &str, members: &[(&str, &str)]) -> Room {
        let members: Vec<_> = members
            .iter()
            .map(|(id, name)| json!({"_id": id, "username": name}))
            .collect();
        serde_json::from_value(json!({"_id": id, "type": "group", "name": id, "members": members}))
            .unwrap()
    }

    fn message(id: &str, room: &str, sender: &str) -> Message {
        serde_json::from_value(json!({
            "_id": id,
            "room": room,
            "sender": {"_id": sender, "username": sender},
            "content": format!("content of {id}"),
            "createdAt": "2025-03-08T14:30:00Z"
        }))
        .unwrap()
    }

    fn state() -> ChatState {
        let mut state = ChatState::new(Some(UserId::from("me")));
        state.seed_rooms(vec![
            room("a", &[("me", "me"), ("u1", "ada"), ("u2", "bob")]),
            room("b", &[("me", "me"), ("u1", "ada")]),
            room("c", &[("me", "me"), ("u3", "cy")]),
        ]);
        state
    }

    fn typing_start(user: &str) -> ServerEvent {
        ServerEvent::TypingStart(TypingStartEvent {
            user_id: UserId::from(user),
            username: user.to_string(),
            room_id: None,
        })
    }

    fn typing_stop(user: &str) -> ServerEvent {
        ServerEvent::TypingStop(TypingStopEvent {
            user_id: UserId::from(user),
            room_id: None,
        })
    }

    fn status(id: &str, status: DeliveryStatus) -> ServerEvent {
        ServerEvent::MessageStatus(MessageStatusEvent {
            message_id: MessageId::from(id),
            status,
        })
    }

    #[test]
    fn repeated_typing_start_is_idempotent() {
        let mut state = state();
        state.select_room(RoomId::from("a"));

        assert_eq!(state.apply_event(typing_start("u1")), EventOutcome::Applied);
        assert_eq!(state.apply_event(typing_start("u1")), EventOutcome::Ignored);
        assert_eq!(state.typing().len(), 1);
    }

    #[test]
    fn typing_stop_for_non_typing_user_is_noop() {
        let mut state = state();
        state.select_room(RoomId::from("a"));
        state.apply_event(typing_start("u1"));

        assert_eq!(state.apply_event(typing_stop("u2")), EventOutcome::Ignored);
        assert_eq!(state.typing().len(), 1);

        assert_eq!(state.apply_event(typing_stop("u1")), EventOutcome::Applied);
        assert!(state.typing().is_empty());
    }

    #[test]
    fn typing_for_another_room_is_ignored() {
        let mut state = state();
        state.select_room(RoomId::from("a"));

        let event = ServerEvent::TypingStart(TypingStartEvent {
            user_id: UserId::from("u1"),
            username: "ada".into(),
            room_id: Some(RoomId::from("b")),
        });
        assert_eq!(state.apply_event(event), EventOutcome::Ignored);
        assert!(state.typing().is_empty());
    }

    #[test]
    fn typing_without_active_room_is_ignored() {
        let mut state = state();
        assert_eq!(state.apply_event(typing_start("u1")), EventOutcome::Ignored);
    }

    #[test]
    fn user_online_marks_every_membership_only_for_that_user() {
        let mut state = state();
        let event = ServerEvent::UserOnline(UserOnlineEvent {
            user_id: UserId::from("u1"),
            username: "ada".into(),
        });

        assert_eq!(state.apply_event(event), EventOutcome::Applied);

        for room in state.rooms() {
            for member in &room.members {
                let expected = if member.id.as_str() == "u1" {
                    PresenceStatus::Online
                } else {
                    PresenceStatus::Offline
                };
                assert_eq!(member.status, expected, "{} in {}", member.id, room.id);
            }
        }
    }

    #[test]
    fn user_offline_records_last_seen() {
        let mut state = state();
        let seen: Timestamp = serde_json::from_value(json!("2025-03-08T14:30:00Z")).unwrap();
        state.apply_event(ServerEvent::UserOnline(UserOnlineEvent {
            user_id: UserId::from("u1"),
            username: "ada".into(),
        }));

        state.apply_event(ServerEvent::UserOffline(UserOfflineEvent {
            user_id: UserId::from("u1"),
            last_seen: seen,
        }));

        let member = state.rooms()[1]
            .members
            .iter()
            .find(|member| member.id.as_str() == "u1")
            .unwrap();
        assert!(!member.is_online());
        assert_eq!(member.last_seen, Some(seen));
    }

    #[test]
    fn presence_for_unknown_user_is_ignored() {
        let mut state = state();
        let event = ServerEvent::UserOnline(UserOnlineEvent {
            user_id: UserId::from("ghost"),
            username: String::new(),
        });
        assert_eq!(state.apply_event(event), EventOutcome::Ignored);
    }

    #[test]
    fn status_never_regresses() {
        let mut state = state();
        let ticket = state.select_room(RoomId::from("a"));
        state.apply_page(&ticket, vec![message("m1", "a", "u1")]);

        assert_eq!(state.apply_event(status("m1", DeliveryStatus::Read)), EventOutcome::Applied);
        assert_eq!(
            state.apply_event(status("m1", DeliveryStatus::Delivered)),
            EventOutcome::Rejected
        );
        assert_eq!(
            state.message(&MessageId::from("m1")).unwrap().status,
            DeliveryStatus::Read
        );
    }

    #[test]
    fn status_advances_last_message_snapshot() {
        let mut state = state();
        state.apply_event(ServerEvent::MessageNew(Box::new(message("m9", "c", "u3"))));

        assert_eq!(
            state.apply_event(status("m9", DeliveryStatus::Delivered)),
            EventOutcome::Applied
        );
        let last = state.room(&RoomId::from("c")).unwrap().last_message.as_ref().unwrap();
        assert_eq!(last.status, DeliveryStatus::Delivered);
    }

    #[test]
    fn switching_rooms_clears_typing_and_messages() {
        let mut state = state();
        let ticket = state.select_room(RoomId::from("a"));
        state.apply_page(&ticket, vec![message("m1", "a", "u1"), message("m2", "a", "u2")]);
        state.apply_event(typing_start("u1"));

        let ticket = state.select_room(RoomId::from("b"));
        assert!(state.typing().is_empty());
        assert!(state.messages().is_empty());

        state.apply_page(&ticket, vec![message("m3", "b", "u1")]);
        let ids: Vec<_> = state.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m3"]);
    }

    #[test]
    fn stale_page_is_discarded() {
        let mut state = state();
        let stale = state.select_room(RoomId::from("a"));
        let current = state.select_room(RoomId::from("b"));

        assert!(!state.apply_page(&stale, vec![message("m1", "a", "u1")]));
        assert!(state.messages().is_empty());
        assert!(state.apply_page(&current, vec![message("m3", "b", "u1")]));
        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn reselecting_same_room_invalidates_older_ticket() {
        let mut state = state();
        let first = state.select_room(RoomId::from("a"));
        let _second = state.select_room(RoomId::from("a"));

        assert!(!state.apply_page(&first, vec![message("m1", "a", "u1")]));
    }

    #[test]
    fn message_new_updates_last_message_snapshot() {
        let mut state = state();
        let mut pushed = message("m5", "b", "u1");
        pushed.content = "fresh from the feed".into();

        state.apply_event(ServerEvent::MessageNew(Box::new(pushed)));

        let room = state.room(&RoomId::from("b")).unwrap();
        assert_eq!(room.last_message.as_ref().unwrap().content, "fresh from the feed");
    }

    #[test]
    fn page_and_early_push_of_same_message_appear_once() {
        let mut state = state();
        let ticket = state.select_room(RoomId::from("a"));
        let page: Vec<_> = (1..=20)
            .map(|n| message(&format!("m{n}"), "a", "u1"))
            .collect();

        let mut early = message("m20", "a", "u1");
        early.status = DeliveryStatus::Delivered;
        state.apply_event(ServerEvent::MessageNew(Box::new(early)));
        assert!(state.apply_page(&ticket, page));

        assert_eq!(state.messages().len(), 20);
        let last = state.messages().last().unwrap();
        assert_eq!(last.id.as_str(), "m20");
        assert_eq!(last.status, DeliveryStatus::Delivered);
    }

    #[test]
    fn pushes_during_fetch_follow_the_page() {
        let mut state = state();
        let ticket = state.select_room(RoomId::from("a"));
        state.apply_event(ServerEvent::MessageNew(Box::new(message("m3", "a", "u1"))));

        state.apply_page(&ticket, vec![message("m1", "a", "u1"), message("m2", "a", "u2")]);

        let ids: Vec<_> = state.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2", "m3"]);
    }

    #[test]
    fn duplicate_push_is_deduplicated() {
        let mut state = state();
        state.select_room(RoomId::from("a"));
        state.apply_event(ServerEvent::MessageNew(Box::new(message("m1", "a", "u1"))));
        state.apply_event(ServerEvent::MessageNew(Box::new(message("m1", "a", "u1"))));

        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn older_page_is_prepended() {
        let mut state = state();
        let ticket = state.select_room(RoomId::from("a"));
        state.apply_page(&ticket, vec![message("m3", "a", "u1")]);

        assert!(state.apply_page(&ticket, vec![message("m1", "a", "u1"), message("m2", "a", "u1")]));

        let ids: Vec<_> = state.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2", "m3"]);
    }

    #[test]
    fn unread_counts_only_other_rooms_and_other_senders() {
        let mut state = state();
        state.select_room(RoomId::from("a"));

        state.apply_event(ServerEvent::MessageNew(Box::new(message("m1", "a", "u1"))));
        state.apply_event(ServerEvent::MessageNew(Box::new(message("m2", "b", "u1"))));
        state.apply_event(ServerEvent::MessageNew(Box::new(message("m3", "b", "u1"))));
        state.apply_event(ServerEvent::MessageNew(Box::new(message("m4", "c", "me"))));

        assert_eq!(state.room(&RoomId::from("a")).unwrap().unread_count, 0);
        assert_eq!(state.room(&RoomId::from("b")).unwrap().unread_count, 2);
        assert_eq!(state.room(&RoomId::from("c")).unwrap().unread_count, 0);
        assert!(state.message(&MessageId::from("m2")).is_none());

        state.select_room(RoomId::from("b"));
        assert_eq!(state.room(&RoomId::from("b")).unwrap().unread_count, 0);
    }

    #[test]
    fn reactions_are_replaced_wholesale() {
        let mut state = state();
        let ticket = state.select_room(RoomId::from("a"));
        state.apply_page(&ticket, vec![message("m1", "a", "u1")]);
        let reactions = serde_json::from_value(json!([
            {"user": {"_id": "u1", "username": "ada"}, "emoji": "👍"},
            {"user": {"_id": "u2", "username": "bob"}, "emoji": "👍"}
        ]))
        .unwrap();

        let outcome = state.apply_event(ServerEvent::MessageReacted(MessageReactedEvent {
            message_id: MessageId::from("m1"),
            reactions,
        }));
        assert_eq!(outcome, EventOutcome::Applied);
        assert_eq!(state.messages()[0].reactions.len(), 2);

        state.apply_event(ServerEvent::MessageReacted(MessageReactedEvent {
            message_id: MessageId::from("m1"),
            reactions: Vec::new(),
        }));
        assert!(state.messages()[0].reactions.is_empty());
    }

    #[test]
    fn pin_toggles_flag_and_room_list() {
        let mut state = state();
        let ticket = state.select_room(RoomId::from("a"));
        state.apply_page(&ticket, vec![message("m1", "a", "u1")]);

        let pin = |is_pinned| {
            ServerEvent::MessagePinned(MessagePinnedEvent {
                message_id: MessageId::from("m1"),
                is_pinned,
            })
        };

        state.apply_event(pin(true));
        state.apply_event(pin(true));
        assert!(state.messages()[0].is_pinned);
        assert_eq!(state.active_room().unwrap().pinned_messages.len(), 1);

        state.apply_event(pin(false));
        assert!(!state.messages()[0].is_pinned);
        assert!(state.active_room().unwrap().pinned_messages.is_empty());
    }

    #[test]
    fn error_event_changes_nothing() {
        let mut state = state();
        let before = format!("{state:?}");
        let outcome = state.apply_event(ServerEvent::Error(
            shared::models::ChannelErrorEvent {
                message: "nope".into(),
            },
        ));

        assert_eq!(outcome, EventOutcome::Ignored);
        assert_eq!(format!("{state:?}"), before);
    }

    #[test]
    fn connection_flag_keeps_loaded_data() {
        let mut state = state();
        let ticket = state.select_room(RoomId::from("a"));
        state.apply_page(&ticket, vec![message("m1", "a", "u1")]);

        state.set_connected(true);
        state.set_connected(false);

        assert_eq!(state.rooms().len(), 3);
        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn clear_invalidates_outstanding_tickets() {
        let mut state = state();
        let ticket = state.select_room(RoomId::from("a"));
        state.clear();
        state.seed_rooms(vec![room("a", &[])]);
        state.select_room(RoomId::from("a"));

        assert!(state.self_id().is_none());
        assert!(!state.apply_page(&ticket, vec![message("m1", "a", "u1")]));
    }

    #[test]
    fn upsert_and_remove_rooms() {
        let mut state = state();
        state.select_room(RoomId::from("c"));

        let mut renamed = room("a", &[]);
        renamed.name = Some("renamed".into());
        state.upsert_room(renamed);
        state.upsert_room(room("d", &[]));
        assert_eq!(state.rooms().len(), 4);
        assert_eq!(state.room(&RoomId::from("a")).unwrap().name.as_deref(), Some("renamed"));

        state.remove_room(&RoomId::from("c"));
        assert!(state.active_room_id().is_none());
    }
}
