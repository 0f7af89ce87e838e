// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end dispatch/completion behavior over the mock engine.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use orogen_backend_tephra::{Binding, EngineOps};
use orogen_core::handler::{PickHandler, WorldPosHandler};
use orogen_core::request::{PickRect, PixelPos, RequestId};
use orogen_query_harness::{EngineCall, MockEngine, mock_binding};

fn counting_worldpos_handler() -> (WorldPosHandler, Arc<AtomicU32>) {
    let hits = Arc::new(AtomicU32::new(0));
    let hits_in = Arc::clone(&hits);
    let handler = WorldPosHandler::new(move |_, _, _, _, _| {
        hits_in.fetch_add(1, Ordering::Relaxed);
    });
    (handler, hits)
}

#[test]
fn duplicate_dispatch_coalesces_and_completes_once_per_push() {
    let (binding, engine) = mock_binding();
    let (handler, hits) = counting_worldpos_handler();

    binding.request_world_position(10, 20, handler.clone());
    binding.request_world_position(10, 20, handler);

    // Same handler and pixel derive the same id; the two dispatches share
    // one reference-counted entry.
    let ids = engine.world_position_ids();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], ids[1]);
    assert_eq!(binding.pending_world_position(), 1);
    assert_eq!(binding.pending_world_position_count(ids[0]), 2);

    // First completion decrements; the entry stays for the second.
    binding.deliver_world_position(ids[0], 10, 20, 1.0, 2.0, 3.0);
    assert_eq!(hits.load(Ordering::Relaxed), 1);
    assert_eq!(binding.pending_world_position_count(ids[0]), 1);

    // Second completion exhausts the entry.
    binding.deliver_world_position(ids[0], 10, 20, 1.0, 2.0, 3.0);
    assert_eq!(hits.load(Ordering::Relaxed), 2);
    assert_eq!(binding.pending_world_position(), 0);

    // A straggler after exhaustion is an orphan and does nothing.
    binding.deliver_world_position(ids[0], 10, 20, 1.0, 2.0, 3.0);
    assert_eq!(hits.load(Ordering::Relaxed), 2);
}

/// Engine double that runs a hook from inside the dispatch call itself.
#[derive(Clone, Default)]
struct SnapshotEngine {
    on_world_position: Arc<Mutex<Option<Box<dyn Fn(RequestId) + Send + Sync>>>>,
}

impl EngineOps for SnapshotEngine {
    fn request_world_position(&self, id: RequestId, _x: i32, _y: i32) {
        if let Some(hook) = self.on_world_position.lock().expect("test lock").as_ref() {
            hook(id);
        }
    }

    fn request_object_picking(&self, _rect: PickRect) {}

    fn highlight_paths(&self, _paths: &[String]) {}

    fn set_config_variable(&self, _key: &str, _value: &str) {}
}

#[test]
fn handler_is_registered_before_the_engine_call() {
    let engine = SnapshotEngine::default();
    let binding = Arc::new(Binding::with_engine(engine.clone()));

    // Snapshot the pending count from inside the native request call: a
    // completion racing the dispatch on an engine thread can arrive as soon
    // as the call is made, and must already find the handler registered.
    let observed = Arc::new(Mutex::new(Vec::new()));
    let binding_in = Arc::clone(&binding);
    let observed_in = Arc::clone(&observed);
    *engine.on_world_position.lock().expect("test lock") = Some(Box::new(move |id| {
        observed_in
            .lock()
            .expect("test lock")
            .push(binding_in.pending_world_position_count(id));
    }));

    let (handler, _hits) = counting_worldpos_handler();
    binding.request_world_position(10, 20, handler.clone());
    binding.request_world_position(10, 20, handler);

    assert_eq!(*observed.lock().expect("test lock"), vec![1, 2]);
}

#[test]
fn world_position_ids_differ_across_handlers_and_pixels() {
    let (binding, engine) = mock_binding();
    let (first, _) = counting_worldpos_handler();
    let (second, _) = counting_worldpos_handler();

    binding.request_world_position(10, 20, first.clone());
    binding.request_world_position(10, 20, second);
    binding.request_world_position(11, 20, first);

    let ids = engine.world_position_ids();
    assert_eq!(ids.len(), 3);
    assert_ne!(ids[0], ids[1], "distinct handlers must not share an id");
    assert_ne!(ids[0], ids[2], "distinct pixels must not share an id");
    assert_eq!(binding.pending_world_position(), 3);
}

#[test]
fn completion_carries_the_engine_payload() {
    let (binding, engine) = mock_binding();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in = Arc::clone(&seen);
    let handler = WorldPosHandler::new(move |px, py, wx, wy, wz| {
        seen_in.lock().expect("test lock").push((px, py, wx, wy, wz));
    });

    binding.request_world_position(7, 9, handler);
    let id = engine.world_position_ids()[0];
    binding.deliver_world_position(id, 7, 9, 0.5, -1.25, 64.0);

    assert_eq!(&*seen.lock().expect("test lock"), &[(7, 9, 0.5, -1.25, 64.0)]);
}

#[test]
fn object_picking_delivers_the_decoded_path_set() {
    let (binding, engine) = mock_binding();
    let seen: Arc<Mutex<Vec<BTreeSet<String>>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_in = Arc::clone(&seen);
    let handler = PickHandler::new(move |paths| {
        seen_in.lock().expect("test lock").push(paths.clone());
    });

    let rect = PickRect {
        x0: 1,
        y0: 2,
        x1: 30,
        y1: 40,
    };
    binding.request_object_picking(rect, handler);
    assert_eq!(engine.calls(), vec![EngineCall::ObjectPicking { rect }]);
    assert_eq!(binding.pending_object_picking_count(), 1);

    let paths: BTreeSet<String> = ["a".to_owned(), "b".to_owned()].into();
    binding.deliver_object_picking(&paths);

    let seen = seen.lock().expect("test lock");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], paths);
}

#[test]
fn picking_completion_without_a_dispatch_is_ignored() {
    let (binding, _engine) = mock_binding();
    // No pending entry; nothing to invoke, nothing to panic over.
    binding.deliver_object_picking(&BTreeSet::from(["a".to_owned()]));
    assert_eq!(binding.pending_object_picking_count(), 0);
}

#[test]
fn overlapping_picks_with_different_handlers_keep_the_newest() {
    let (binding, _engine) = mock_binding();
    let first_hits = Arc::new(AtomicU32::new(0));
    let second_hits = Arc::new(AtomicU32::new(0));

    let first_in = Arc::clone(&first_hits);
    binding.request_object_picking(
        PixelPos::new(0, 0).pick_rect(),
        PickHandler::new(move |_| {
            first_in.fetch_add(1, Ordering::Relaxed);
        }),
    );
    let second_in = Arc::clone(&second_hits);
    binding.request_object_picking(
        PixelPos::new(5, 5).pick_rect(),
        PickHandler::new(move |_| {
            second_in.fetch_add(1, Ordering::Relaxed);
        }),
    );

    // Both requests share the sentinel slot; the collision resets it.
    assert_eq!(binding.pending_object_picking_count(), 1);

    binding.deliver_object_picking(&BTreeSet::new());
    assert_eq!(first_hits.load(Ordering::Relaxed), 0);
    assert_eq!(second_hits.load(Ordering::Relaxed), 1);

    // The displaced handler never becomes deliverable again.
    binding.deliver_object_picking(&BTreeSet::new());
    assert_eq!(first_hits.load(Ordering::Relaxed), 0);
    assert_eq!(second_hits.load(Ordering::Relaxed), 1);
}

#[test]
fn overlapping_picks_with_the_same_handler_reference_count() {
    let (binding, _engine) = mock_binding();
    let hits = Arc::new(AtomicU32::new(0));
    let hits_in = Arc::clone(&hits);
    let handler = PickHandler::new(move |_| {
        hits_in.fetch_add(1, Ordering::Relaxed);
    });

    binding.request_object_picking(PixelPos::new(0, 0).pick_rect(), handler.clone());
    binding.request_object_picking(PixelPos::new(0, 0).pick_rect(), handler);
    assert_eq!(binding.pending_object_picking_count(), 2);

    binding.deliver_object_picking(&BTreeSet::new());
    binding.deliver_object_picking(&BTreeSet::new());
    assert_eq!(hits.load(Ordering::Relaxed), 2);
    assert_eq!(binding.pending_object_picking_count(), 0);
}

#[test]
fn highlight_and_config_pass_straight_through() {
    let (binding, engine) = mock_binding();

    binding.highlight_paths(&["/scene/a".to_owned(), "/scene/b".to_owned()]);
    binding.set_config_variable("rtx.fallbackLightType", "1");

    assert_eq!(
        engine.take_calls(),
        vec![
            EngineCall::Highlight {
                paths: vec!["/scene/a".to_owned(), "/scene/b".to_owned()],
            },
            EngineCall::Config {
                key: "rtx.fallbackLightType".to_owned(),
                value: "1".to_owned(),
            },
        ]
    );
}

#[test]
fn disabled_binding_swallows_every_operation() {
    let binding: Binding<MockEngine> = Binding::disabled();
    assert!(!binding.is_enabled());

    let (handler, hits) = counting_worldpos_handler();
    binding.request_world_position(1, 2, handler);
    binding.request_object_picking(PixelPos::new(1, 2).pick_rect(), PickHandler::new(|_| {}));
    binding.highlight_paths(&["/scene/a".to_owned()]);
    binding.set_config_variable("k", "v");

    // Nothing was registered, so nothing can ever complete.
    assert_eq!(binding.pending_world_position(), 0);
    assert_eq!(binding.pending_object_picking_count(), 0);
    assert_eq!(hits.load(Ordering::Relaxed), 0);
}

#[test]
fn pending_requests_die_with_the_binding() {
    let (binding, engine) = mock_binding();
    let (handler, hits) = counting_worldpos_handler();
    binding.request_world_position(3, 4, handler);
    let id = engine.world_position_ids()[0];

    drop(binding);

    // A fresh binding starts empty; the old id means nothing to it.
    let fresh = Binding::with_engine(engine);
    assert_eq!(fresh.pending_world_position(), 0);
    fresh.deliver_world_position(id, 3, 4, 0.0, 0.0, 0.0);
    assert_eq!(hits.load(Ordering::Relaxed), 0);
}
