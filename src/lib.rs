pub mod config;
pub mod error;
pub mod fetch;
pub mod grades;
pub mod infra;
pub mod parser;
pub mod server;
pub mod services;
pub mod session;
