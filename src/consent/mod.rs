// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Consent Module
//!
//! The consent lifecycle of the simulated bank:
//!
//! - [`engine`] - the only writer of consent records
//! - [`lifecycle`] - approve/deny transition table
//! - [`access`] - per-request access decision used by the consent gate
//! - [`resources`] - account data reads for gated routes

pub mod access;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod resources;

pub use access::{evaluate, AccessDenied, CustomerBinding};
pub use engine::{ConsentService, NewConsent};
pub use error::ConsentError;
pub use lifecycle::AuthorizationAction;
