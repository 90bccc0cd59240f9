//! Vendor chat relay library.
//! This crate exposes internal modules for integration testing.
//! The binary entry point is in main.rs.

pub mod chat;
pub mod config;
pub mod db;
pub mod i18n;
pub mod routes;
pub mod state;
pub mod store;
pub mod vendors;
pub mod ws;
