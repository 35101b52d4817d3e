//! Identity provider implementations.

mod discord;

pub use discord::DiscordProvider;
