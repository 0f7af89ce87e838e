// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mock engine for exercising the query pipeline without a native library.
//!
//! [`MockEngine`] implements [`EngineOps`] by appending every call to a
//! shared log. Cloning the engine shares the log, so a test can hand one
//! clone to [`Binding::with_engine`] and keep the other for assertions.
//! Completions are driven by hand through the binding's `deliver_*` entry
//! points, standing in for the engine's callback threads.

use std::sync::{Arc, Mutex, PoisonError};

use orogen_backend_tephra::{Binding, EngineOps};
use orogen_core::request::{PickRect, RequestId};

/// One recorded native call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineCall {
    /// `request_world_position(id, x, y)`
    WorldPosition {
        /// Correlation id the bridge attached to the request.
        id: RequestId,
        /// Queried pixel X.
        x: i32,
        /// Queried pixel Y.
        y: i32,
    },
    /// `request_object_picking(rect)`
    ObjectPicking {
        /// Queried rectangle.
        rect: PickRect,
    },
    /// `highlight_paths(paths)`
    Highlight {
        /// Highlighted paths, in submission order.
        paths: Vec<String>,
    },
    /// `set_config_variable(key, value)`
    Config {
        /// Variable name.
        key: String,
        /// Variable value.
        value: String,
    },
}

/// Call-logging [`EngineOps`] implementation.
#[derive(Clone, Debug, Default)]
pub struct MockEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
}

impl MockEngine {
    /// Creates an engine with an empty call log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every call recorded so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().clone()
    }

    /// Drains and returns the recorded calls.
    pub fn take_calls(&self) -> Vec<EngineCall> {
        std::mem::take(&mut *self.lock())
    }

    /// Ids of the world-position requests recorded so far, in order.
    #[must_use]
    pub fn world_position_ids(&self) -> Vec<RequestId> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                EngineCall::WorldPosition { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EngineCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: EngineCall) {
        self.lock().push(call);
    }
}

impl EngineOps for MockEngine {
    fn request_world_position(&self, id: RequestId, x: i32, y: i32) {
        self.record(EngineCall::WorldPosition { id, x, y });
    }

    fn request_object_picking(&self, rect: PickRect) {
        self.record(EngineCall::ObjectPicking { rect });
    }

    fn highlight_paths(&self, paths: &[String]) {
        self.record(EngineCall::Highlight {
            paths: paths.to_vec(),
        });
    }

    fn set_config_variable(&self, key: &str, value: &str) {
        self.record(EngineCall::Config {
            key: key.to_owned(),
            value: value.to_owned(),
        });
    }
}

/// Builds an enabled binding over a fresh mock engine, returning both.
///
/// The returned engine shares the call log with the one inside the binding.
#[must_use]
pub fn mock_binding() -> (Binding<MockEngine>, MockEngine) {
    let engine = MockEngine::new();
    (Binding::with_engine(engine.clone()), engine)
}
