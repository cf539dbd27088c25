//! # Fetebot Channels
//! Chat-platform adapters. The core only sees the `ChatPlatform` trait;
//! this crate provides the Discord REST implementation.

pub mod discord;

pub use discord::DiscordChannel;
