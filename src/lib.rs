//! Quaderno: a small self-hosted blog engine.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
