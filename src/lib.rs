//! Turnstile - Token-Bucket Admission Control
//!
//! This crate implements a transport-agnostic admission controller for
//! per-route rate limiting. A default token bucket governs all requests,
//! with optional per-route overrides, atomic policy reload, and a periodic
//! file-based policy reloader. The enclosing transport layer calls
//! [`admission::AdmissionController::admit`] once per request and maps a
//! deny decision to its own "too many requests" response.

pub mod admission;
pub mod config;
pub mod error;

pub use admission::{AdmissionController, PolicyReloader, TokenBucket};
pub use config::{LimiterSettings, RateLimitPolicy};
pub use error::{Result, TurnstileError};
