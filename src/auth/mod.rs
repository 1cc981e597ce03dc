// Authentication & authorization module

pub mod accounts;
pub mod audit_logger;
pub mod auth_middleware;
pub mod credential;
pub mod identity;
pub mod roles;
