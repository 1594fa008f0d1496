// Copyright (c) 2025 - Cowboy AI, Inc.
//! Assembly Events
//!
//! Ordered record of what one assembly did. Every event is wrapped in a
//! [`RecordedEvent`] carrying its own id, the assembly it belongs to
//! (correlation id) and a timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authorization::AuthorizationRule;
use crate::components::certificate::{ListenerMode, ValidationRecord};
use crate::components::service::ServiceEndpoint;
use crate::domain::{DomainName, ResourceKind};
use crate::resource::ResourceId;

/// Something that happened during an assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssemblyEvent {
    ResourceProvisioned {
        resource_id: ResourceId,
        kind: ResourceKind,
        logical_name: String,
    },
    AccessAuthorized {
        rule: AuthorizationRule,
    },
    /// No domain was supplied; the service is published without TLS
    PlaintextListenerSelected,
    CertificateRequested {
        domain: DomainName,
        validation_record: ValidationRecord,
    },
    CertificateValidated {
        domain: DomainName,
    },
    AssemblyCompleted {
        endpoint: ServiceEndpoint,
        listener: ListenerMode,
    },
}

impl AssemblyEvent {
    /// Get human-readable event type name
    pub fn event_type_name(&self) -> &'static str {
        match self {
            AssemblyEvent::ResourceProvisioned { .. } => "ResourceProvisioned",
            AssemblyEvent::AccessAuthorized { .. } => "AccessAuthorized",
            AssemblyEvent::PlaintextListenerSelected => "PlaintextListenerSelected",
            AssemblyEvent::CertificateRequested { .. } => "CertificateRequested",
            AssemblyEvent::CertificateValidated { .. } => "CertificateValidated",
            AssemblyEvent::AssemblyCompleted { .. } => "AssemblyCompleted",
        }
    }
}

/// Event envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub event_id: Uuid,
    pub assembly_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: AssemblyEvent,
}

/// Append-only event log of one assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    assembly_id: Uuid,
    events: Vec<RecordedEvent>,
}

impl EventLog {
    pub fn new(assembly_id: Uuid) -> Self {
        Self {
            assembly_id,
            events: Vec::new(),
        }
    }

    pub fn record(&mut self, event: AssemblyEvent) {
        self.events.push(RecordedEvent {
            event_id: Uuid::now_v7(),
            assembly_id: self.assembly_id,
            timestamp: Utc::now(),
            event,
        });
    }

    pub fn assembly_id(&self) -> Uuid {
        self.assembly_id
    }

    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event type names in order
    pub fn type_names(&self) -> Vec<&'static str> {
        self.events
            .iter()
            .map(|recorded| recorded.event.event_type_name())
            .collect()
    }
}
