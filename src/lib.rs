pub mod command;
pub mod config;
pub mod dispatch;
pub mod loader;
pub mod request;
pub mod summary;
