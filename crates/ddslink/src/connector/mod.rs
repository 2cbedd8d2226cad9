// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The connector session object.
//!
//! A [`Connector`] loads an XML configuration, instantiates every writer and
//! reader its selected participant declares against the DDS core, and hands
//! out entity handles by name. It also carries the session-wide concerns:
//! the wait gate, the closed flag, the per-connector last-error slot, and
//! the immutable options.

mod registry;

use crate::config::Configuration;
use crate::core::loopback::LoopbackCore;
use crate::core::{DdsCore, StatusListener};
use crate::error::{Error, Result};
use crate::input::Input;
use crate::output::Output;
use crate::wait::EventGate;
use parking_lot::Mutex;
use registry::EntityRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Connector creation options. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorOptions {
    /// When false, data arrival no longer wakes blocked `wait_for_data`
    /// calls (they still observe already-buffered data at entry and wake on
    /// match/acknowledgment events).
    pub enable_on_data_event: bool,
    /// Present sample indices with origin 1 instead of 0. Storage is always
    /// zero-origin; this changes only the accessor boundary.
    pub one_based_sequence_indexing: bool,
}

impl Default for ConnectorOptions {
    fn default() -> Self {
        Self {
            enable_on_data_event: true,
            one_based_sequence_indexing: false,
        }
    }
}

/// Session state shared between the connector and its entities.
pub(crate) struct Shared {
    pub options: ConnectorOptions,
    pub gate: EventGate,
    closed: AtomicBool,
    last_error: Mutex<Option<String>>,
}

impl Shared {
    fn new(options: ConnectorOptions) -> Self {
        Self {
            options,
            gate: EventGate::new(),
            closed: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    /// Fail fast once teardown has begun.
    pub fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::ConnectorClosed);
        }
        Ok(())
    }

    /// Record a failure in the last-error slot (last-write-wins). Timeouts
    /// are a normal wait outcome and are not recorded.
    pub fn record<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if !e.is_timeout() {
                *self.last_error.lock() = Some(e.to_string());
            }
        }
        result
    }

    /// Translate an externally supplied sample index to zero-origin storage.
    pub fn external_index(&self, index: usize, len: usize) -> Result<usize> {
        if self.options.one_based_sequence_indexing {
            if index == 0 || index > len {
                return Err(Error::IndexOutOfRange { index, len });
            }
            Ok(index - 1)
        } else {
            if index >= len {
                return Err(Error::IndexOutOfRange { index, len });
            }
            Ok(index)
        }
    }
}

/// Routes core status callbacks into the session gate.
struct GateListener {
    shared: Arc<Shared>,
}

impl StatusListener for GateListener {
    fn on_data_available(&self) {
        if self.shared.options.enable_on_data_event {
            self.shared.gate.notify();
        }
    }

    fn on_match_change(&self) {
        self.shared.gate.notify();
    }

    fn on_acknowledgment(&self) {
        self.shared.gate.notify();
    }
}

/// A session managing the named inputs and outputs of one configured
/// participant.
///
/// # Example
///
/// ```rust,no_run
/// use ddslink::{Connector, ConnectorOptions};
///
/// fn main() -> ddslink::Result<()> {
///     let connector = Connector::new(
///         "MyParticipantLibrary::Zero",
///         "shapes.xml",
///         ConnectorOptions::default(),
///     )?;
///
///     let output = connector.get_output("MyPublisher::MySquareWriter")?;
///     output.set_number("x", 42.0)?;
///     output.write()?;
///
///     let input = connector.get_input("MySubscriber::MySquareReader")?;
///     connector.wait_for_data(5000)?;
///     input.take()?;
///     println!("{} samples", input.samples_len());
///     Ok(())
/// }
/// ```
///
/// # Thread Safety
///
/// All operations are safe to call from multiple threads. Blocked wait calls
/// on one entity never prevent operations on other entities, and `close()`
/// (or dropping the connector) interrupts every outstanding wait with
/// [`Error::ConnectorClosed`].
pub struct Connector {
    config_name: String,
    shared: Arc<Shared>,
    registry: EntityRegistry,
}

impl Connector {
    /// Create a connector for the participant selected by `config_name`
    /// (`"LibraryName::ParticipantName"`), using the process-wide loopback
    /// core.
    ///
    /// `config_source` is a file path, a `file://` URL, or inline XML behind
    /// a `str://` prefix.
    pub fn new(
        config_name: &str,
        config_source: &str,
        options: ConnectorOptions,
    ) -> Result<Connector> {
        Self::with_core(config_name, config_source, options, LoopbackCore::shared())
    }

    /// Create a connector against a specific core implementation.
    pub fn with_core(
        config_name: &str,
        config_source: &str,
        options: ConnectorOptions,
        core: Arc<dyn DdsCore>,
    ) -> Result<Connector> {
        let config = Configuration::load(config_source)?;
        let participant = config.participant(config_name)?;

        crate::core::mark_connector_created();

        let shared = Arc::new(Shared::new(options));
        let listener: Arc<dyn StatusListener> = Arc::new(GateListener {
            shared: Arc::clone(&shared),
        });

        let mut outputs: Vec<Arc<Output>> = Vec::with_capacity(participant.writers.len());
        let mut inputs: Vec<Arc<Input>> = Vec::with_capacity(participant.readers.len());

        let close_created = |outputs: &[Arc<Output>], inputs: &[Arc<Input>]| {
            for output in outputs {
                output.close_core();
            }
            for input in inputs {
                input.close_core();
            }
        };

        for endpoint in &participant.writers {
            let handle = match core.create_writer(endpoint) {
                Ok(handle) => handle,
                Err(e) => {
                    close_created(&outputs, &inputs);
                    return Err(e);
                }
            };
            handle.set_listener(Arc::clone(&listener));
            outputs.push(Arc::new(Output::new(endpoint, handle, Arc::clone(&shared))));
        }

        for endpoint in &participant.readers {
            let handle = match core.create_reader(endpoint) {
                Ok(handle) => handle,
                Err(e) => {
                    close_created(&outputs, &inputs);
                    return Err(e);
                }
            };
            handle.set_listener(Arc::clone(&listener));
            inputs.push(Arc::new(Input::new(endpoint, handle, Arc::clone(&shared))));
        }

        log::debug!(
            "[CONNECTOR] created '{}' ({} outputs, {} inputs)",
            config_name,
            outputs.len(),
            inputs.len()
        );

        Ok(Connector {
            config_name: config_name.to_string(),
            shared,
            registry: EntityRegistry::new(outputs, inputs),
        })
    }

    /// The participant selector this connector was created with.
    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    /// The options this connector was created with.
    pub fn options(&self) -> ConnectorOptions {
        self.shared.options
    }

    /// Resolve a configured writer by its `"PublisherName::WriterName"` name.
    pub fn get_output(&self, name: &str) -> Result<Arc<Output>> {
        self.shared.record(
            self.shared
                .ensure_open()
                .and_then(|()| self.registry.output(name)),
        )
    }

    /// Resolve a configured reader by its `"SubscriberName::ReaderName"` name.
    pub fn get_input(&self, name: &str) -> Result<Arc<Input>> {
        self.shared.record(
            self.shared
                .ensure_open()
                .and_then(|()| self.registry.input(name)),
        )
    }

    /// Block until any input of this connector has newly available samples.
    ///
    /// `timeout_ms < 0` waits indefinitely, `0` polls. Expiry is reported as
    /// [`Error::Timeout`].
    pub fn wait_for_data(&self, timeout_ms: i64) -> Result<()> {
        self.shared.record(self.shared.ensure_open().and_then(|()| {
            self.shared.gate.wait_until(timeout_ms, || {
                self.registry
                    .inputs()
                    .any(|input| input.has_new_data())
                    .then_some(())
            })
        }))
    }

    /// The most recent failure recorded by any operation of this connector,
    /// last-write-wins. Valid until the next failing call.
    pub fn last_error_message(&self) -> Option<String> {
        self.shared.last_error.lock().clone()
    }

    /// Tear the session down: cancel all outstanding waits with
    /// [`Error::ConnectorClosed`] and release every core handle. Idempotent;
    /// also invoked by `Drop`.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.gate.close();
        for output in self.registry.outputs() {
            output.close_core();
        }
        for input in self.registry.inputs() {
            input.close_core();
        }
        log::debug!("[CONNECTOR] closed '{}'", self.config_name);
    }
}

impl Drop for Connector {
    fn drop(&mut self) {
        self.close();
    }
}
