//! Wire models exchanged with the chat backend.

pub mod envelope;
pub mod errors;
pub mod events;
pub mod ids;
pub mod message;
pub mod room;
pub mod timestamp;
pub mod user;

pub use envelope::ApiResponse;
pub use errors::{ErrorResponse, GENERIC_ERROR_MESSAGE};
pub use events::{
    ChannelErrorEvent, ClientIntent, MessageIntent, MessagePinnedEvent, MessageReactedEvent,
    MessageStatusEvent, ReactIntent, RoomIntent, SendMessageIntent, ServerEvent, TypingStartEvent,
    TypingStopEvent, UserOfflineEvent, UserOnlineEvent,
};
pub use ids::{MessageId, RoomId, UserId};
pub use message::{
    DeliveryStatus, EditMessageRequest, Message, MessageKind, MessagePage, Pagination, Reaction,
};
pub use room::{CreateRoomRequest, Room, RoomKind, RoomMemberRequest, UpdateRoomRequest};
pub use timestamp::Timestamp;
pub use user::{AuthResponse, LoginRequest, PresenceStatus, SignupRequest, User};
