pub mod config;
pub mod document;
pub mod i18n;
pub mod openai;
pub mod portable_text;
pub mod report;
pub mod scheduler;
pub mod security;
pub mod server;
pub mod store;
pub mod sync;
pub mod translation;
