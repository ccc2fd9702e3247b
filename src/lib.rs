//! A self-writing blog: articles are generated by a configurable text
//! provider, stored in SQLite and served over a small read-only REST API.

pub mod ai;
pub mod api;
pub mod app;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod tui;
