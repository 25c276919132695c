//! Proxygate - Subscription & Credential Lifecycle Engine
//!
//! This crate implements the lifecycle core of a gated MTProto proxy service:
//! it tracks each user's paid/trial access window, reconciles asynchronous
//! payment confirmations exactly once, and issues the per-user, per-endpoint
//! proxy secrets that the proxy servers accept as bearer credentials.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
