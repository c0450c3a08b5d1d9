//! Core guestbook admin library (config, session handling, API gateway).

pub mod api;
pub mod config;
pub mod gateway;
pub mod session;
