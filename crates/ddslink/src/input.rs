// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscribing side: the `Input` entity.
//!
//! `read()` and `take()` refresh the input's sample buffer from the core's
//! current queue snapshot and return promptly; blocking for new data is the
//! job of the wait operations. Buffered samples are then addressed by index
//! (translated through the connector's index-origin option) and member path.

use crate::config::EndpointConfig;
use crate::connector::Shared;
use crate::core::{CoreReader, PeerDescriptor};
use crate::dynamic::{json, path, TypeDescriptor};
use crate::error::{Error, Result};
use crate::sample::{SampleBuffer, SampleInfo};
use parking_lot::{Mutex, MutexGuard};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Borrowed view of one buffered sample, valid while it is held.
///
/// Obtained from [`Input::sample`]; holds the owning input's buffer lock for
/// its whole lifetime, so validity is enforced by the borrow checker rather
/// than by caller discipline.
pub struct SampleView<'a> {
    guard: MutexGuard<'a, SampleBuffer>,
    index: usize,
}

impl SampleView<'_> {
    /// The raw dynamic sample data.
    pub fn value(&self) -> &crate::dynamic::DynamicValue {
        &self.guard.at(self.index).value
    }

    /// The sample's metadata.
    pub fn info(&self) -> &SampleInfo {
        &self.guard.at(self.index).info
    }
}

/// A named subscription endpoint owned by a connector.
pub struct Input {
    name: String,
    topic: String,
    type_desc: Arc<TypeDescriptor>,
    core: Arc<dyn CoreReader>,
    buffer: Mutex<SampleBuffer>,
    /// Matched-publication count last observed by a wait call.
    last_seen_matched: Mutex<i64>,
    shared: Arc<Shared>,
}

impl Input {
    pub(crate) fn new(
        endpoint: &EndpointConfig,
        core: Arc<dyn CoreReader>,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            name: endpoint.name.clone(),
            topic: endpoint.topic.clone(),
            type_desc: Arc::clone(&endpoint.type_desc),
            core,
            buffer: Mutex::new(SampleBuffer::new()),
            last_seen_matched: Mutex::new(0),
            shared,
        }
    }

    /// Configured entity name (`"SubscriberName::ReaderName"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Topic this input subscribes to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Refresh the buffer without removing samples from the core's queue.
    /// Repeated reads without new publications observe identical contents.
    pub fn read(&self) -> Result<()> {
        self.shared.record(self.shared.ensure_open().map(|()| {
            let entries = self.core.snapshot();
            log::debug!("[INPUT] read '{}' len={}", self.name, entries.len());
            self.buffer.lock().replace(entries);
        }))
    }

    /// Refresh the buffer and remove the delivered samples from the core's
    /// queue; a subsequent `read`/`take` without new arrivals yields an
    /// empty buffer.
    pub fn take(&self) -> Result<()> {
        self.shared.record(self.shared.ensure_open().map(|()| {
            let entries = self.core.drain();
            log::debug!("[INPUT] take '{}' len={}", self.name, entries.len());
            self.buffer.lock().replace(entries);
        }))
    }

    /// Number of samples produced by the most recent `read`/`take`.
    pub fn samples_len(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Read a numeric member of the sample at `index` as f64.
    ///
    /// Values wider than 53 bits lose precision in the conversion; this is
    /// inherent to the double-based accessor, not corrected silently.
    pub fn number_from_sample(&self, index: usize, member: &str) -> Result<f64> {
        self.shared.record(self.with_sample(index, |desc, value| {
            path::get_number(desc, value, member)
        }))
    }

    /// Read a boolean member of the sample at `index`.
    pub fn boolean_from_sample(&self, index: usize, member: &str) -> Result<bool> {
        self.shared.record(self.with_sample(index, |desc, value| {
            path::get_boolean(desc, value, member)
        }))
    }

    /// Read a string member of the sample at `index`.
    pub fn string_from_sample(&self, index: usize, member: &str) -> Result<String> {
        self.shared.record(self.with_sample(index, |desc, value| {
            path::get_string(desc, value, member)
        }))
    }

    /// Serialize the whole sample at `index` to JSON text. The returned
    /// string is owned by the caller.
    pub fn json_sample(&self, index: usize) -> Result<String> {
        self.shared
            .record(self.with_sample(index, |_, value| json::to_json_text(value)))
    }

    /// Serialize one member of the sample at `index` to JSON text.
    pub fn json_member(&self, index: usize, member: &str) -> Result<String> {
        self.shared.record(self.with_sample(index, |desc, value| {
            let (_, leaf) = path::resolve(desc, value, member)?;
            json::to_json_text(leaf)
        }))
    }

    /// Deserialize the sample at `index` into any serde-compatible type via
    /// its JSON form.
    pub fn sample_as<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        self.shared.record(self.with_sample(index, |_, value| {
            serde_json::from_value(json::to_json(value))
                .map_err(|e| Error::SchemaMismatch(e.to_string()))
        }))
    }

    /// Query a boolean metadata field (`"valid_data"`, `"new_instance"`) of
    /// the sample at `index`.
    pub fn info_boolean(&self, index: usize, field: &str) -> Result<bool> {
        self.shared.record(self.with_entry(index, |entry| {
            entry.info.boolean_field(field)
        }))
    }

    /// Query a metadata field (`"source_timestamp"`, `"reception_timestamp"`,
    /// `"identity"`) of the sample at `index` as JSON text.
    pub fn info_json(&self, index: usize, field: &str) -> Result<String> {
        self.shared
            .record(self.with_entry(index, |entry| entry.info.json_field(field)))
    }

    /// Block until this input has newly available samples.
    ///
    /// `timeout_ms < 0` waits indefinitely, `0` polls. Expiry is reported as
    /// [`Error::Timeout`].
    pub fn wait_for_data(&self, timeout_ms: i64) -> Result<()> {
        self.shared.record(self.shared.ensure_open().and_then(|()| {
            self.shared
                .gate
                .wait_until(timeout_ms, || self.core.has_new_data().then_some(()))
        }))
    }

    /// Block until the matched-publication count changes, returning the
    /// signed change relative to the last observed count (positive on join,
    /// negative on loss).
    pub fn wait_for_matched_publication(&self, timeout_ms: i64) -> Result<i32> {
        self.shared.record(self.shared.ensure_open().and_then(|()| {
            self.shared.gate.wait_until(timeout_ms, || {
                let current = self.core.matched_publications().len() as i64;
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

    /// Non-blocking snapshot of currently matched publications as a JSON
    /// array of peer descriptors.
    pub fn matched_publications(&self) -> Result<String> {
        self.shared.record(self.shared.ensure_open().and_then(|()| {
            let peers: Vec<PeerDescriptor> = self.core.matched_publications();
            serde_json::to_string(&peers).map_err(|e| Error::CoreFailure(e.to_string()))
        }))
    }

    /// Borrowed access to the raw dynamic sample and its metadata at `index`,
    /// bypassing the typed accessors.
    ///
    /// The view holds the input's buffer lock: it is valid exactly as long as
    /// it lives, and a concurrent `read`/`take` blocks until it is dropped.
    /// Keep views short-lived.
    pub fn sample(&self, index: usize) -> Result<SampleView<'_>> {
        if let Err(e) = self.shared.ensure_open() {
            return self.shared.record(Err(e));
        }
        let guard = self.buffer.lock();
        let idx = match self.shared.external_index(index, guard.len()) {
            Ok(idx) => idx,
            Err(e) => {
                drop(guard);
                return self.shared.record(Err(e));
            }
        };
        Ok(SampleView { guard, index: idx })
    }

    pub(crate) fn has_new_data(&self) -> bool {
        self.core.has_new_data()
    }

    pub(crate) fn close_core(&self) {
        self.core.close();
    }

    fn with_entry<T>(
        &self,
        index: usize,
        f: impl FnOnce(&crate::sample::SampleEntry) -> Result<T>,
    ) -> Result<T> {
        self.shared.ensure_open()?;
        let buffer = self.buffer.lock();
        let idx = self.shared.external_index(index, buffer.len())?;
        f(buffer.get(idx)?)
    }

    fn with_sample<T>(
        &self,
        index: usize,
        f: impl FnOnce(&TypeDescriptor, &crate::dynamic::DynamicValue) -> Result<T>,
    ) -> Result<T> {
        self.with_entry(index, |entry| f(&self.type_desc, &entry.value))
    }
}
