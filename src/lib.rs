// Library root for the ticket desk service

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod core;
pub mod metrics;
pub mod policy;
pub mod store;
