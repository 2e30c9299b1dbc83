// Business domains
pub mod access;
pub mod agent;
pub mod auth;
pub mod registry;
