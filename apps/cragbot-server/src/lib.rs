//! cragbot interaction server
//!
//! HTTP webhook backend for the cragbot Discord application. Receives signed
//! interaction requests, answers autocomplete inline, and runs full commands
//! through a deferred second invocation whose result is posted to the
//! interaction webhook.
//!
//! # Architecture
//!
//! - [`signature`] / [`decoder`] authenticate and parse inbound requests
//! - [`dispatch`] routes interactions and drives the defer, re-dispatch and
//!   timeout protocol, built on [`race`], [`redispatch`] and [`callback`]
//! - [`commands`] holds the registry and the `/climb` and `/crag` commands
//! - [`discord_client`] talks to the Discord REST API
//! - [`handlers`] exposes everything over axum

pub mod callback;
pub mod commands;
pub mod config;
pub mod decoder;
pub mod discord_client;
pub mod dispatch;
pub mod embed;
pub mod error;
pub mod formatter;
pub mod handlers;
pub mod interaction;
pub mod race;
pub mod redispatch;
pub mod response;
pub mod signature;
pub mod state;
