//! Vigil - bearer-token authenticated API with timezone-aware recurring jobs
//!
//! The crate bundles two pipelines behind one binary: an HTTP surface that
//! validates HS256 bearer tokens and turns every failure into a structured
//! JSON error, and a scheduler that runs registered jobs at a local wall-clock
//! time with per-job leases, retries and catch-up after downtime.

#![allow(missing_docs)]

pub mod api;
pub mod app;
pub mod app_info;
pub mod auth;
pub mod boot;
pub mod cli;
pub mod commands;
pub mod config;
pub mod database;
pub mod environment;
pub mod jobs;
pub mod router;
pub mod schedule;
pub mod setup_tracing;
