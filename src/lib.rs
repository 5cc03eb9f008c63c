pub mod config;
pub mod detect;
pub mod languages;
pub mod openai;
pub mod resolver;
pub mod security;
pub mod server;
pub mod store;
pub mod telegram;
