//! HTTP adapter for inbound prospect messages.

mod dto;
mod handlers;
mod routes;

pub use dto::{InboundMessageRequest, MessageResponse};
pub use handlers::ConversationHandlers;
pub use routes::conversation_routes;
