//! Notify module - outbound alert rendering and delivery

pub mod dispatcher;
pub mod render;
pub mod telegram;

pub use dispatcher::NotificationDispatcher;
pub use telegram::TelegramTransport;
