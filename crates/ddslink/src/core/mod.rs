// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Boundary with the underlying DDS core.
//!
//! The connector drives the middleware exclusively through the traits in
//! this module: entity creation from the loaded configuration, queue
//! snapshot/drain per reader, sample submission per writer, and status
//! callbacks (data availability, match changes, acknowledgments). Everything
//! below these traits (discovery, wire encoding, QoS negotiation, transport)
//! belongs to the core implementation.
//!
//! [`loopback`] provides the built-in intra-process implementation used by
//! the default constructor and the test suite. Alternative cores plug in via
//! [`crate::Connector::with_core`].

pub mod loopback;

use crate::config::EndpointConfig;
use crate::dynamic::DynamicValue;
use crate::error::{Error, Result};
use crate::sample::SampleInfo;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Descriptor of a discovered remote peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerDescriptor {
    /// Configured name of the remote entity.
    pub name: String,
}

/// What a `write` call should do with the pending instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteAction {
    /// Publish the instance data (the default).
    #[default]
    Write,
    /// Dispose the instance; readers receive an invalid-data lifecycle sample.
    Dispose,
    /// Unregister the instance; readers receive an invalid-data lifecycle sample.
    Unregister,
}

/// Optional per-write parameters, accepted as a JSON document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteParams {
    #[serde(default)]
    pub action: WriteAction,
    /// Overrides the writer-side timestamp (nanoseconds since the Unix epoch).
    #[serde(default)]
    pub source_timestamp: Option<i64>,
}

impl WriteParams {
    /// Parse write parameters from JSON text; unknown keys are rejected.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::SchemaMismatch(format!("write parameters: {}", e)))
    }
}

/// Status callbacks the core delivers to the connector. Implementations must
/// be cheap and non-blocking; they run on the core's delivery path.
pub trait StatusListener: Send + Sync {
    fn on_data_available(&self) {}
    fn on_match_change(&self) {}
    fn on_acknowledgment(&self) {}
}

/// Writer handle obtained from the core.
pub trait CoreWriter: Send + Sync {
    /// Submit one complete sample for delivery to matched readers.
    fn publish(&self, sample: DynamicValue, params: &WriteParams) -> Result<()>;

    /// Snapshot of currently matched remote readers.
    fn matched_subscriptions(&self) -> Vec<PeerDescriptor>;

    /// Reliable samples sent but not yet acknowledged by all matched readers.
    fn unacknowledged_samples(&self) -> usize;

    /// Register the connector's status listener.
    fn set_listener(&self, listener: Arc<dyn StatusListener>);

    /// Release the handle; the entity disappears from discovery.
    fn close(&self);
}

/// Reader handle obtained from the core.
pub trait CoreReader: Send + Sync {
    /// Current queue contents without removing them. Clears the new-data flag.
    fn snapshot(&self) -> Vec<(DynamicValue, SampleInfo)>;

    /// Current queue contents, removing them from the core's queue. Clears
    /// the new-data flag.
    fn drain(&self) -> Vec<(DynamicValue, SampleInfo)>;

    /// True when samples arrived since the last snapshot/drain.
    fn has_new_data(&self) -> bool;

    /// Snapshot of currently matched remote writers.
    fn matched_publications(&self) -> Vec<PeerDescriptor>;

    /// Register the connector's status listener.
    fn set_listener(&self, listener: Arc<dyn StatusListener>);

    /// Release the handle; the entity disappears from discovery.
    fn close(&self);
}

/// Factory boundary: turns configured endpoints into live handles.
pub trait DdsCore: Send + Sync {
    fn create_writer(&self, endpoint: &EndpointConfig) -> Result<Arc<dyn CoreWriter>>;
    fn create_reader(&self, endpoint: &EndpointConfig) -> Result<Arc<dyn CoreReader>>;
}

const DEFAULT_MAX_OBJECTS: usize = 1024;

static MAX_OBJECTS: OnceLock<usize> = OnceLock::new();
static CONNECTOR_CREATED: AtomicBool = AtomicBool::new(false);

/// Bound the core's entity resource pool.
///
/// Must be called before the first connector is created in the process and
/// at most once; later calls fail. The loopback core enforces the bound as a
/// process-wide entity cap.
pub fn set_max_objects_per_thread(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(Error::Config("max objects limit must be positive".into()));
    }
    if CONNECTOR_CREATED.load(Ordering::Acquire) {
        return Err(Error::Config(
            "set_max_objects_per_thread must be called before any connector is created".into(),
        ));
    }
    MAX_OBJECTS
        .set(limit)
        .map_err(|_| Error::Config("max objects limit already set".into()))
}

pub(crate) fn max_objects_limit() -> usize {
    *MAX_OBJECTS.get().unwrap_or(&DEFAULT_MAX_OBJECTS)
}

pub(crate) fn mark_connector_created() {
    CONNECTOR_CREATED.store(true, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_params_from_json() {
        let params = WriteParams::from_json(r#"{"action": "dispose"}"#).expect("parse");
        assert_eq!(params.action, WriteAction::Dispose);
        assert_eq!(params.source_timestamp, None);

        let params =
            WriteParams::from_json(r#"{"source_timestamp": 123456789}"#).expect("parse");
        assert_eq!(params.action, WriteAction::Write);
        assert_eq!(params.source_timestamp, Some(123456789));
    }

    #[test]
    fn test_write_params_rejects_unknown_keys() {
        assert!(matches!(
            WriteParams::from_json(r#"{"priority": 3}"#),
            Err(Error::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_max_objects_default() {
        assert!(max_objects_limit() >= 1);
    }
}
