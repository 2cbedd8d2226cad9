// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample buffer and per-sample metadata.
//!
//! Each `Input` owns one buffer, refreshed in place by `read`/`take`. The
//! buffer keeps whatever the last refresh produced until the next refresh, so
//! indexed access stays stable between operations. Storage is always
//! zero-origin; the one-based presentation option is applied at the accessor
//! boundary, never here.

use crate::dynamic::DynamicValue;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Identity of the writer that produced a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WriterIdentity {
    pub writer_guid: [u8; 16],
    pub sequence_number: u64,
}

/// Per-sample metadata delivered alongside the data.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleInfo {
    /// False for lifecycle events (dispose/unregister) carrying no payload.
    pub valid_data: bool,
    /// Nanoseconds since the Unix epoch, stamped by the writer.
    pub source_timestamp: i64,
    /// Nanoseconds since the Unix epoch, stamped at delivery.
    pub reception_timestamp: i64,
    /// True the first time this reader sees the sample's instance.
    pub new_instance: bool,
    /// Producing writer's identity.
    pub identity: WriterIdentity,
}

impl SampleInfo {
    /// Query a boolean metadata field by name.
    pub fn boolean_field(&self, field: &str) -> Result<bool> {
        match field {
            "valid_data" => Ok(self.valid_data),
            "new_instance" => Ok(self.new_instance),
            _ => Err(Error::MemberNotFound(format!("info field '{}'", field))),
        }
    }

    /// Query a metadata field as JSON text.
    pub fn json_field(&self, field: &str) -> Result<String> {
        match field {
            "source_timestamp" => Ok(self.source_timestamp.to_string()),
            "reception_timestamp" => Ok(self.reception_timestamp.to_string()),
            "identity" => serde_json::to_string(&self.identity)
                .map_err(|e| Error::CoreFailure(e.to_string())),
            _ => Err(Error::MemberNotFound(format!("info field '{}'", field))),
        }
    }
}

/// One buffered `(sample, info)` pair.
#[derive(Debug, Clone)]
pub(crate) struct SampleEntry {
    pub value: DynamicValue,
    pub info: SampleInfo,
}

/// Ordered sequence of samples from the most recent read/take.
#[derive(Debug, Default)]
pub(crate) struct SampleBuffer {
    entries: Vec<SampleEntry>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Replace the whole buffer with a fresh queue snapshot.
    pub fn replace(&mut self, entries: Vec<(DynamicValue, SampleInfo)>) {
        self.entries = entries
            .into_iter()
            .map(|(value, info)| SampleEntry { value, info })
            .collect();
    }

    /// Zero-origin access; the caller translates the external index first.
    pub fn get(&self, index: usize) -> Result<&SampleEntry> {
        self.entries.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    /// Unchecked zero-origin access for holders of a validated index.
    pub fn at(&self, index: usize) -> &SampleEntry {
        &self.entries[index]
    }
}
