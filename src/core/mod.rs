pub mod config;
pub mod service;
pub mod session;
pub mod shell;
pub mod types;
