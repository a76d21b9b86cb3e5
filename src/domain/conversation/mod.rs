//! Conversation module.
//!
//! Turns one normalized inbound [`Input`] into a [`Response`] for a lead:
//! the reply, the next funnel state, the field updates to commit and the
//! intents to execute afterwards.

mod contact;
mod engine;
pub mod grammar;
mod input;
mod message;
mod response;
pub mod templates;

pub use contact::{parse_contact, ContactDetails, ContactError, CONTACT_EXAMPLE};
pub use engine::{Collaborators, ConversationEngine, EngineError, EngineSettings};
pub use input::Input;
pub use message::{Button, OutboundMessage};
pub use response::{Intent, MessageKey, Outcome, Response};
