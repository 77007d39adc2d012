//! Client for the Laravel-based IMS student portal.

pub mod client;

pub use client::ImsClient;
