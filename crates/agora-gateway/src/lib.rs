pub mod bot;
pub mod commands;
pub mod connection;
pub mod history;
pub mod media;
pub mod registry;
pub mod room;
pub mod services;
pub mod session;
