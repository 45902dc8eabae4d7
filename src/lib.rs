//! Read-through caching gateway for the Trademarket.

pub mod cache;
pub mod config;
pub mod db;
pub mod enrich;
pub mod error;
pub mod http;
pub mod keys;
pub mod market;
pub mod metrics;
pub mod service;
