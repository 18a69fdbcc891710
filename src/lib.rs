pub mod api;
pub mod auth;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod observability;
pub mod state;
pub mod store;
