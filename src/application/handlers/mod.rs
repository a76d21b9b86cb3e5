//! Command handlers.

mod control_bot;
mod handle_message;
mod register_admin;

pub use control_bot::{BotControlError, BotControlHandler, BotStatus};
pub use handle_message::{
    HandleMessageCommand, HandleMessageError, HandleMessageHandler, HandleMessageResult,
};
pub use register_admin::{
    AdminRegistered, RegisterAdminCommand, RegisterAdminError, RegisterAdminHandler,
};
