//! Telegram module - chat relay and command bot

pub mod bot;
pub mod commands;
pub mod format;
pub mod handler;
pub mod sender;

pub use bot::TelegramBot;
pub use commands::BotCommand;
pub use handler::{CommandHandler, CommandReply};
pub use sender::TelegramNotifier;
