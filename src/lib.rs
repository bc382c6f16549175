// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Open Banking Consent Server - simulated bank backend for PSD2-style
//! data sharing.
//!
//! A third-party provider (TPP) asks for a consent on a customer's
//! accounts, the customer approves or denies it on an HTML page, and the
//! TPP then reads account data through routes guarded by the consent gate.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer token verification and the consent gate
//! - `consent` - Consent engine, state machine and access decision
//! - `storage` - Storage trait with in-memory and redb backends
//! - `views` - HTML authorization pages

pub mod api;
pub mod auth;
pub mod config;
pub mod consent;
pub mod error;
pub mod models;
pub mod seed;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod views;
