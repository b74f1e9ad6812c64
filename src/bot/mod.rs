//! Messaging bot front-end.

mod backend;
mod commands;
mod poller;
mod telegram;

pub use backend::{reply_for, BotBackend, LocalBackend, RestBackend};
pub use commands::{format_track_list, usage, BotCommand, WELCOME_MESSAGE};
pub use poller::BotPoller;
pub use telegram::{next_offset, Chat, IncomingMessage, TelegramClient, Update};
