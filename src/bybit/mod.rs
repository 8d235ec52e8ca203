//! Bybit module - Client implementation for the Bybit v5 REST API

pub mod auth;
pub mod messages;
pub mod rest;

pub use rest::BybitRestClient;
