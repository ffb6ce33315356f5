//! HTTP inbound adapter exposing REST endpoints.

pub mod cache_control;
pub mod conditional;
pub mod error;
pub mod health;
pub mod releases;
pub mod schemas;
pub mod state;
mod upload;
pub mod validation;

pub use error::ApiResult;
