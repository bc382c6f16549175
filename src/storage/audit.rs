// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit trail for consent lifecycle events.
//!
//! Every write the consent engine performs is recorded together with the
//! provenance captured at creation (TPP, PSU address and user agent).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Types of auditable events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    ConsentCreated,
    ConsentUpdated,
    ConsentAuthorized,
    ConsentDenied,
    ConsentRevoked,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// Consent affected.
    pub consent_id: String,
    /// TPP the consent was issued to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tpp_id: Option<String>,
    /// Caller that triggered the event (token subject), if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// Additional details as JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(event_type: AuditEventType, consent_id: impl Into<String>) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            consent_id: consent_id.into(),
            tpp_id: None,
            actor: None,
            details: None,
        }
    }

    /// Set the TPP.
    pub fn with_tpp(mut self, tpp_id: impl Into<String>) -> Self {
        self.tpp_id = Some(tpp_id.into());
        self
    }

    /// Set the acting user.
    pub fn with_actor(mut self, actor: Option<&str>) -> Self {
        self.actor = actor.map(str::to_string);
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
