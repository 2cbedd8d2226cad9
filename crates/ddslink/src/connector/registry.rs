// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Name-to-entity resolution.
//!
//! All entities are instantiated at connector construction from the
//! configuration, so resolution is a pure lookup: repeated calls return the
//! same entity and never touch the core again.

use crate::error::{Error, Result};
use crate::input::Input;
use crate::output::Output;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub(crate) struct EntityRegistry {
    outputs: HashMap<String, Arc<Output>>,
    inputs: HashMap<String, Arc<Input>>,
}

impl EntityRegistry {
    pub fn new(outputs: Vec<Arc<Output>>, inputs: Vec<Arc<Input>>) -> Self {
        Self {
            outputs: outputs
                .into_iter()
                .map(|o| (o.name().to_string(), o))
                .collect(),
            inputs: inputs
                .into_iter()
                .map(|i| (i.name().to_string(), i))
                .collect(),
        }
    }

    pub fn output(&self, name: &str) -> Result<Arc<Output>> {
        if let Some(output) = self.outputs.get(name) {
            return Ok(Arc::clone(output));
        }
        if self.inputs.contains_key(name) {
            return Err(Error::TypeMismatch(format!(
                "'{}' is a data reader, not a data writer",
                name
            )));
        }
        Err(Error::EntityNotFound(name.to_string()))
    }

    pub fn input(&self, name: &str) -> Result<Arc<Input>> {
        if let Some(input) = self.inputs.get(name) {
            return Ok(Arc::clone(input));
        }
        if self.outputs.contains_key(name) {
            return Err(Error::TypeMismatch(format!(
                "'{}' is a data writer, not a data reader",
                name
            )));
        }
        Err(Error::EntityNotFound(name.to_string()))
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Arc<Input>> {
        self.inputs.values()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Arc<Output>> {
        self.outputs.values()
    }
}
