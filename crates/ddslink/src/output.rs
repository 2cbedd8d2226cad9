// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publishing side: the `Output` entity and its pending write instance.
//!
//! Setters accumulate state in the pending instance; `write()` publishes one
//! complete snapshot of it and leaves the instance untouched, matching the
//! update-and-resend publish pattern. `clear()` starts a fresh instance.
//! The instance lock serializes setters against a concurrent `write`, so a
//! racing writer always sends a consistent snapshot.

use crate::config::EndpointConfig;
use crate::connector::Shared;
use crate::core::{CoreWriter, PeerDescriptor, WriteParams};
use crate::dynamic::{json, path, DynamicValue, TypeDescriptor};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// A named publication endpoint owned by a connector.
pub struct Output {
    name: String,
    topic: String,
    type_desc: Arc<TypeDescriptor>,
    core: Arc<dyn CoreWriter>,
    instance: Mutex<DynamicValue>,
    /// Matched-subscription count last observed by a wait call.
    last_seen_matched: Mutex<i64>,
    shared: Arc<Shared>,
}

impl Output {
    pub(crate) fn new(
        endpoint: &EndpointConfig,
        core: Arc<dyn CoreWriter>,
        shared: Arc<Shared>,
    ) -> Self {
        let instance = endpoint.type_desc.default_value();
        Self {
            name: endpoint.name.clone(),
            topic: endpoint.topic.clone(),
            type_desc: Arc::clone(&endpoint.type_desc),
            core,
            instance: Mutex::new(instance),
            last_seen_matched: Mutex::new(0),
            shared,
        }
    }

    /// Configured entity name (`"PublisherName::WriterName"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Topic this output publishes to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Set a numeric member of the pending instance, narrowing f64 to the
    /// declared width with standard IEEE-754 conversion.
    pub fn set_number(&self, member: &str, value: f64) -> Result<()> {
        self.shared.record(self.shared.ensure_open().and_then(|()| {
            path::set_number(&self.type_desc, &mut self.instance.lock(), member, value)
        }))
    }

    /// Set a boolean member of the pending instance.
    pub fn set_boolean(&self, member: &str, value: bool) -> Result<()> {
        self.shared.record(self.shared.ensure_open().and_then(|()| {
            path::set_boolean(&self.type_desc, &mut self.instance.lock(), member, value)
        }))
    }

    /// Set a string member of the pending instance.
    pub fn set_string(&self, member: &str, value: &str) -> Result<()> {
        self.shared.record(self.shared.ensure_open().and_then(|()| {
            path::set_string(&self.type_desc, &mut self.instance.lock(), member, value)
        }))
    }

    /// Merge a JSON document into the pending instance. Unknown fields fail
    /// with [`Error::SchemaMismatch`]; fields absent from the document keep
    /// their current values. The merge is atomic: on failure the pending
    /// instance is left unchanged.
    pub fn set_json_instance(&self, json_text: &str) -> Result<()> {
        self.shared.record(self.shared.ensure_open().and_then(|()| {
            let doc: serde_json::Value = serde_json::from_str(json_text)
                .map_err(|e| Error::SchemaMismatch(e.to_string()))?;

            let mut instance = self.instance.lock();
            let mut staged = instance.clone();
            json::merge(&self.type_desc, &mut staged, &doc)?;
            *instance = staged;
            Ok(())
        }))
    }

    /// Populate the pending instance from any serde-serializable value via
    /// its JSON form.
    pub fn set_serialized<T: Serialize>(&self, value: &T) -> Result<()> {
        self.shared.record(self.shared.ensure_open().and_then(|()| {
            let doc = serde_json::to_value(value)
                .map_err(|e| Error::SchemaMismatch(e.to_string()))?;

            let mut instance = self.instance.lock();
            let mut staged = instance.clone();
            json::merge(&self.type_desc, &mut staged, &doc)?;
            *instance = staged;
            Ok(())
        }))
    }

    /// Serialize the current pending instance to JSON text.
    pub fn json_instance(&self) -> Result<String> {
        self.shared.record(
            self.shared
                .ensure_open()
                .and_then(|()| json::to_json_text(&self.instance.lock())),
        )
    }

    /// Reset the whole pending instance to the type's default values.
    pub fn clear(&self) -> Result<()> {
        self.shared.record(self.shared.ensure_open().map(|()| {
            *self.instance.lock() = self.type_desc.default_value();
        }))
    }

    /// Reset one member of the pending instance to its type default.
    pub fn clear_member(&self, member: &str) -> Result<()> {
        self.shared.record(self.shared.ensure_open().and_then(|()| {
            path::clear_member(&self.type_desc, &mut self.instance.lock(), member)
        }))
    }

    /// Publish the current pending instance to matched subscriptions. The
    /// instance is left as-is for repeated partial updates; call
    /// [`Output::clear`] to start fresh.
    pub fn write(&self) -> Result<()> {
        self.write_with(&WriteParams::default())
    }

    /// Publish with per-write parameters supplied as a JSON document, e.g.
    /// `{"action": "dispose"}`.
    pub fn write_with_params(&self, params_json: &str) -> Result<()> {
        let params = self.shared.record(WriteParams::from_json(params_json))?;
        self.write_with(&params)
    }

    fn write_with(&self, params: &WriteParams) -> Result<()> {
        self.shared.record(self.shared.ensure_open().and_then(|()| {
            // Snapshot under the lock; publish outside it so a slow core
            // never blocks concurrent setters.
            let snapshot = self.instance.lock().clone();
            log::debug!("[OUTPUT] write '{}' action={:?}", self.name, params.action);
            self.core.publish(snapshot, params)
        }))
    }

    /// Block until every outstanding reliable sample of this writer has been
    /// acknowledged by all matched subscriptions.
    ///
    /// `timeout_ms < 0` waits indefinitely, `0` polls. Expiry is reported as
    /// [`Error::Timeout`].
    pub fn wait_for_acknowledgments(&self, timeout_ms: i64) -> Result<()> {
        self.shared.record(self.shared.ensure_open().and_then(|()| {
            self.shared.gate.wait_until(timeout_ms, || {
                (self.core.unacknowledged_samples() == 0).then_some(())
            })
        }))
    }

    /// Block until the matched-subscription count changes, returning the
    /// signed change relative to the last observed count (positive on join,
    /// negative on loss).
    pub fn wait_for_matched_subscription(&self, timeout_ms: i64) -> Result<i32> {
        self.shared.record(self.shared.ensure_open().and_then(|()| {
            self.shared.gate.wait_until(timeout_ms, || {
                let current = self.core.matched_subscriptions().len() as i64;
                let mut last = self.last_seen_matched.lock();
                let delta = current - *last;
                if delta == 0 {
                    None
                } else {
                    *last = current;
                    Some(delta as i32)
                }
            })
        }))
    }

    /// Non-blocking snapshot of currently matched subscriptions as a JSON
    /// array of peer descriptors.
    pub fn matched_subscriptions(&self) -> Result<String> {
        self.shared.record(self.shared.ensure_open().and_then(|()| {
            let peers: Vec<PeerDescriptor> = self.core.matched_subscriptions();
            serde_json::to_string(&peers).map_err(|e| Error::CoreFailure(e.to_string()))
        }))
    }

    pub(crate) fn close_core(&self) {
        self.core.close();
    }
}
