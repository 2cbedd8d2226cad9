// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Intra-process core implementation.
//!
//! Writers and readers attached to the same [`LoopbackCore`] and domain id
//! discover each other by topic name and registered type name; delivery is a
//! synchronous clone into each matched reader's bounded history queue. This
//! is the core behind [`crate::Connector::new`] and the test suite; it
//! exercises the full boundary contract (match notifications, lifecycle
//! samples, acknowledgment status) without any network machinery.

use crate::config::EndpointConfig;
use crate::core::{
    max_objects_limit, CoreReader, CoreWriter, DdsCore, PeerDescriptor, StatusListener,
    WriteAction, WriteParams,
};
use crate::dynamic::DynamicValue;
use crate::error::{Error, Result};
use crate::sample::{SampleInfo, WriterIdentity};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

/// History depth per reader queue. Oldest samples are dropped when full.
const HISTORY_DEPTH: usize = 256;

/// In-process DDS core.
#[derive(Default)]
pub struct LoopbackCore {
    domains: DashMap<u32, Arc<DomainBus>>,
    entity_count: Arc<AtomicUsize>,
}

impl LoopbackCore {
    /// Create an isolated core instance (entities only match within it).
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The process-wide shared core used by the default connector
    /// constructor. Connectors attaching to the same domain id through this
    /// instance discover each other.
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<LoopbackCore>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(LoopbackCore::new))
    }

    fn domain(&self, domain_id: u32) -> Arc<DomainBus> {
        Arc::clone(
            &self
                .domains
                .entry(domain_id)
                .or_insert_with(|| Arc::new(DomainBus::default())),
        )
    }

    fn reserve_entity(&self) -> Result<()> {
        let limit = max_objects_limit();
        let count = self.entity_count.fetch_add(1, Ordering::AcqRel);
        if count >= limit {
            self.entity_count.fetch_sub(1, Ordering::AcqRel);
            return Err(Error::CoreFailure(format!(
                "entity resource pool exhausted (limit {})",
                limit
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
struct DomainBus {
    topics: DashMap<String, Arc<TopicChannel>>,
}

impl DomainBus {
    fn channel(&self, topic: &str) -> Arc<TopicChannel> {
        Arc::clone(
            &self
                .topics
                .entry(topic.to_string())
                .or_insert_with(|| Arc::new(TopicChannel::default())),
        )
    }
}

#[derive(Default)]
struct TopicChannel {
    writers: Mutex<Vec<Weak<LoopbackWriter>>>,
    readers: Mutex<Vec<Weak<LoopbackReader>>>,
}

impl TopicChannel {
    fn alive_writers(&self) -> Vec<Arc<LoopbackWriter>> {
        let mut writers = self.writers.lock();
        writers.retain(|w| w.strong_count() > 0);
        writers.iter().filter_map(Weak::upgrade).collect()
    }

    fn alive_readers(&self) -> Vec<Arc<LoopbackReader>> {
        let mut readers = self.readers.lock();
        readers.retain(|r| r.strong_count() > 0);
        readers.iter().filter_map(Weak::upgrade).collect()
    }

    /// Wake every attached entity's match predicate.
    fn notify_match_change(&self, type_name: &str) {
        for writer in self.alive_writers() {
            if writer.type_name == type_name {
                writer.notify_match_change();
            }
        }
        for reader in self.alive_readers() {
            if reader.type_name == type_name {
                reader.notify_match_change();
            }
        }
    }
}

fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

fn next_guid() -> [u8; 16] {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    let serial = COUNTER.fetch_add(1, Ordering::Relaxed);
    let pid = std::process::id();

    let mut guid = [0u8; 16];
    guid[..4].copy_from_slice(&pid.to_be_bytes());
    guid[8..].copy_from_slice(&serial.to_be_bytes());
    guid
}

/// Writer endpoint attached to a loopback topic channel.
pub struct LoopbackWriter {
    name: String,
    type_name: String,
    guid: [u8; 16],
    sequence: AtomicU64,
    channel: Arc<TopicChannel>,
    listener: Mutex<Option<Arc<dyn StatusListener>>>,
    closed: AtomicBool,
    pool: Arc<AtomicUsize>,
}

impl LoopbackWriter {
    fn notify_match_change(&self) {
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_match_change();
        }
    }
}

impl CoreWriter for LoopbackWriter {
    fn publish(&self, sample: DynamicValue, params: &WriteParams) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::CoreFailure("writer handle closed".into()));
        }

        let sequence_number = self.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        let timestamp = params.source_timestamp.unwrap_or_else(now_ns);
        let info = SampleInfo {
            valid_data: params.action == WriteAction::Write,
            source_timestamp: timestamp,
            reception_timestamp: 0,
            new_instance: false,
            identity: WriterIdentity {
                writer_guid: self.guid,
                sequence_number,
            },
        };

        let readers = self.channel.alive_readers();
        let mut delivered = 0usize;
        for reader in &readers {
            if reader.type_name == self.type_name {
                reader.deliver(sample.clone(), info.clone(), params.action);
                delivered += 1;
            }
        }
        log::debug!(
            "[LOOPBACK] publish writer='{}' seq={} matched={}",
            self.name,
            sequence_number,
            delivered
        );

        // Delivery is synchronous, so the sample is acknowledged by the time
        // publish returns.
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_acknowledgment();
        }
        Ok(())
    }

    fn matched_subscriptions(&self) -> Vec<PeerDescriptor> {
        self.channel
            .alive_readers()
            .iter()
            .filter(|r| r.type_name == self.type_name)
            .map(|r| PeerDescriptor {
                name: r.name.clone(),
            })
            .collect()
    }

    fn unacknowledged_samples(&self) -> usize {
        // Synchronous delivery leaves nothing in flight.
        0
    }

    fn set_listener(&self, listener: Arc<dyn StatusListener>) {
        *self.listener.lock() = Some(listener);
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.pool.fetch_sub(1, Ordering::AcqRel);
        let mut writers = self.channel.writers.lock();
        writers.retain(|w| {
            w.upgrade()
                .map_or(false, |w| !std::ptr::eq(w.as_ref(), self))
        });
        drop(writers);
        self.channel.notify_match_change(&self.type_name);
        log::debug!("[LOOPBACK] writer '{}' closed", self.name);
    }
}

#[derive(Default)]
struct ReaderState {
    queue: VecDeque<(DynamicValue, SampleInfo)>,
    /// Writer GUIDs whose instances this reader has already seen.
    seen_writers: HashSet<[u8; 16]>,
}

/// Reader endpoint attached to a loopback topic channel.
pub struct LoopbackReader {
    name: String,
    type_name: String,
    channel: Arc<TopicChannel>,
    state: Mutex<ReaderState>,
    new_data: AtomicBool,
    listener: Mutex<Option<Arc<dyn StatusListener>>>,
    closed: AtomicBool,
    pool: Arc<AtomicUsize>,
}

impl LoopbackReader {
    fn deliver(&self, value: DynamicValue, mut info: SampleInfo, action: WriteAction) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }

        {
            let mut state = self.state.lock();
            info.reception_timestamp = now_ns();
            info.new_instance = state.seen_writers.insert(info.identity.writer_guid);
            if action != WriteAction::Write {
                // Dispose/unregister ends the instance; a later write starts
                // a fresh one.
                state.seen_writers.remove(&info.identity.writer_guid);
            }

            while state.queue.len() >= HISTORY_DEPTH {
                state.queue.pop_front();
            }
            state.queue.push_back((value, info));
            self.new_data.store(true, Ordering::Release);
        }

        // Listener runs with the queue lock released.
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_data_available();
        }
    }

    fn notify_match_change(&self) {
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_match_change();
        }
    }
}

impl CoreReader for LoopbackReader {
    fn snapshot(&self) -> Vec<(DynamicValue, SampleInfo)> {
        let state = self.state.lock();
        self.new_data.store(false, Ordering::Release);
        state.queue.iter().cloned().collect()
    }

    fn drain(&self) -> Vec<(DynamicValue, SampleInfo)> {
        let mut state = self.state.lock();
        self.new_data.store(false, Ordering::Release);
        state.queue.drain(..).collect()
    }

    fn has_new_data(&self) -> bool {
        self.new_data.load(Ordering::Acquire)
    }

    fn matched_publications(&self) -> Vec<PeerDescriptor> {
        self.channel
            .alive_writers()
            .iter()
            .filter(|w| w.type_name == self.type_name)
            .map(|w| PeerDescriptor {
                name: w.name.clone(),
            })
            .collect()
    }

    fn set_listener(&self, listener: Arc<dyn StatusListener>) {
        *self.listener.lock() = Some(listener);
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.pool.fetch_sub(1, Ordering::AcqRel);
        let mut readers = self.channel.readers.lock();
        readers.retain(|r| {
            r.upgrade()
                .map_or(false, |r| !std::ptr::eq(r.as_ref(), self))
        });
        drop(readers);
        self.channel.notify_match_change(&self.type_name);
        log::debug!("[LOOPBACK] reader '{}' closed", self.name);
    }
}

impl DdsCore for LoopbackCore {
    fn create_writer(&self, endpoint: &EndpointConfig) -> Result<Arc<dyn CoreWriter>> {
        self.reserve_entity()?;
        let channel = self.domain(endpoint.domain_id).channel(&endpoint.topic);

        let writer = Arc::new(LoopbackWriter {
            name: endpoint.name.clone(),
            type_name: endpoint.type_name.clone(),
            guid: next_guid(),
            sequence: AtomicU64::new(0),
            channel: Arc::clone(&channel),
            listener: Mutex::new(None),
            closed: AtomicBool::new(false),
            pool: Arc::clone(&self.entity_count),
        });

        channel.writers.lock().push(Arc::downgrade(&writer));
        channel.notify_match_change(&endpoint.type_name);
        log::debug!(
            "[LOOPBACK] writer '{}' on topic '{}' (domain {})",
            endpoint.name,
            endpoint.topic,
            endpoint.domain_id
        );
        Ok(writer)
    }

    fn create_reader(&self, endpoint: &EndpointConfig) -> Result<Arc<dyn CoreReader>> {
        self.reserve_entity()?;
        let channel = self.domain(endpoint.domain_id).channel(&endpoint.topic);

        let reader = Arc::new(LoopbackReader {
            name: endpoint.name.clone(),
            type_name: endpoint.type_name.clone(),
            channel: Arc::clone(&channel),
            state: Mutex::new(ReaderState::default()),
            new_data: AtomicBool::new(false),
            listener: Mutex::new(None),
            closed: AtomicBool::new(false),
            pool: Arc::clone(&self.entity_count),
        });

        channel.readers.lock().push(Arc::downgrade(&reader));
        channel.notify_match_change(&endpoint.type_name);
        log::debug!(
            "[LOOPBACK] reader '{}' on topic '{}' (domain {})",
            endpoint.name,
            endpoint.topic,
            endpoint.domain_id
        );
        Ok(reader)
    }
}
