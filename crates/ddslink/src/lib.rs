// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # ddslink - configuration-driven pub/sub connector for DDS
//!
//! A lightweight facade over a DDS core: writers and readers are declared in
//! an XML configuration, addressed by name, and accessed through dynamically
//! typed samples - dotted member paths for hot-path scalars, JSON for whole
//! instances. Blocking wait primitives cover data availability, peer
//! discovery, and write acknowledgment.
//!
//! ## Quick Start
//!
//! ```rust
//! use ddslink::{Connector, ConnectorOptions, Result};
//!
//! const CONFIG: &str = r#"str://"<dds>
//!   <types>
//!     <struct name="ShapeType">
//!       <member name="color" type="string"/>
//!       <member name="x" type="long"/>
//!     </struct>
//!   </types>
//!   <domain_library name="Lib">
//!     <domain name="D" domain_id="42">
//!       <register_type name="ShapeType" type_ref="ShapeType"/>
//!       <topic name="Square" register_type_ref="ShapeType"/>
//!     </domain>
//!   </domain_library>
//!   <domain_participant_library name="App">
//!     <domain_participant name="Zero" domain_ref="Lib::D">
//!       <publisher name="Pub"><data_writer name="W" topic_ref="Square"/></publisher>
//!       <subscriber name="Sub"><data_reader name="R" topic_ref="Square"/></subscriber>
//!     </domain_participant>
//!   </domain_participant_library>
//! </dds>""#;
//!
//! fn main() -> Result<()> {
//!     let connector = Connector::new("App::Zero", CONFIG, ConnectorOptions::default())?;
//!
//!     let output = connector.get_output("Pub::W")?;
//!     output.set_string("color", "GREEN")?;
//!     output.set_number("x", 42.0)?;
//!     output.write()?;
//!
//!     let input = connector.get_input("Sub::R")?;
//!     connector.wait_for_data(5000)?;
//!     input.take()?;
//!     assert_eq!(input.number_from_sample(0, "x")?, 42.0);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                     Application Layer                        |
//! |        Connector -> Output/Input (by configured name)        |
//! +--------------------------------------------------------------+
//! |                      Connector Layer                         |
//! |  Sample Buffers | Pending Instances | Wait Gate | Last Error |
//! +--------------------------------------------------------------+
//! |                      Core Boundary                           |
//! |  create entities | queue snapshot/drain | status callbacks   |
//! +--------------------------------------------------------------+
//! |              DDS Core (built-in: loopback bus)               |
//! +--------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Connector`] | Session owning the configured entities, entry point |
//! | [`Output`] | Named writer with a pending instance to populate and send |
//! | [`Input`] | Named reader with an indexed sample/info buffer |
//! | [`ConnectorOptions`] | Index origin and data-event behavior |
//! | [`Error`] | Error taxonomy; `Timeout` is a normal wait outcome |

/// XML configuration model and loader.
pub mod config;
/// Session object owning the configured entities.
mod connector;
/// Boundary traits for the underlying DDS core, plus the loopback core.
pub mod core;
/// Dynamic data model (descriptors, values, paths, JSON).
pub mod dynamic;
mod error;
/// Subscribing entity.
mod input;
/// Publishing entity.
mod output;
/// Sample buffer and per-sample metadata.
pub mod sample;
/// Blocking wait primitive shared by all wait operations.
mod wait;

pub use connector::{Connector, ConnectorOptions};
pub use crate::core::{set_max_objects_per_thread, PeerDescriptor, WriteAction, WriteParams};
pub use error::{Error, Result};
pub use input::{Input, SampleView};
pub use output::Output;
pub use sample::{SampleInfo, WriterIdentity};
pub use wait::TIMEOUT_INFINITE;

/// ddslink version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
