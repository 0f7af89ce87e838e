// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Completion routing from the engine's trampolines to the owning binding.
//!
//! The `HdTephra` callback signatures carry no context pointer, so the two
//! trampolines handed to the engine are fixed free functions. To reach the
//! binding that owns the pending registries, registration stores a
//! `Weak<dyn CompletionSink>` in a process-wide indirection table under a
//! freshly-allocated token, and an atomic records the token of the active
//! registration. A trampoline loads the active token, looks up the sink,
//! and forwards the decoded payload.
//!
//! [`RouteGuard`] unregisters on drop, so tearing down a binding detaches
//! routing deterministically. A completion that races with teardown finds no
//! sink (or a dead `Weak`) and is discarded — the orphan-completion policy.

use std::collections::BTreeSet;
use std::ffi::{CStr, c_char};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use orogen_core::request::RequestId;

/// Receives decoded completions. Implemented by the binding's shared state.
pub(crate) trait CompletionSink: Send + Sync {
    /// A world-position request identified by `id` finished.
    fn world_position_completed(
        &self,
        id: RequestId,
        pixel_x: i32,
        pixel_y: i32,
        world_x: f32,
        world_y: f32,
        world_z: f32,
    );

    /// An object-picking request finished with the given path set.
    fn object_picking_completed(&self, paths: BTreeSet<String>);
}

/// Registered sinks, keyed by routing token.
///
/// The table is tiny (one live entry per binding, and hosts hold one
/// binding), so a `Vec` scan beats a map here.
static ROUTES: Mutex<Vec<(u64, Weak<dyn CompletionSink>)>> = Mutex::new(Vec::new());

/// Token of the registration completions should route to. Zero means none.
static ACTIVE: AtomicU64 = AtomicU64::new(0);

/// Next token to hand out. Tokens are never reused.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

fn routes() -> std::sync::MutexGuard<'static, Vec<(u64, Weak<dyn CompletionSink>)>> {
    ROUTES.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registers `sink` as the routing target for engine completions.
///
/// The most recent registration wins; the returned guard unregisters on
/// drop.
pub(crate) fn register(sink: Weak<dyn CompletionSink>) -> RouteGuard {
    let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
    routes().push((token, sink));
    ACTIVE.store(token, Ordering::Release);
    RouteGuard { token }
}

/// Unregisters its token when dropped.
#[derive(Debug)]
pub(crate) struct RouteGuard {
    token: u64,
}

impl Drop for RouteGuard {
    fn drop(&mut self) {
        routes().retain(|(token, _)| *token != self.token);
        // Only clear ACTIVE if no newer registration has replaced us.
        let _ = ACTIVE.compare_exchange(self.token, 0, Ordering::AcqRel, Ordering::Relaxed);
    }
}

/// Resolves the sink completions should currently be delivered to.
fn active_sink() -> Option<Arc<dyn CompletionSink>> {
    let active = ACTIVE.load(Ordering::Acquire);
    if active == 0 {
        return None;
    }
    let routes = routes();
    routes
        .iter()
        .find(|(token, _)| *token == active)
        .and_then(|(_, sink)| sink.upgrade())
}

/// World-position completion trampoline handed to the engine.
///
/// Runs on an engine thread. The payload is plain scalars, so decoding is
/// trivial; a completion with no active binding is dropped.
pub(crate) extern "C-unwind" fn world_position_trampoline(
    request_id: i32,
    pixel_x: i32,
    pixel_y: i32,
    world_x: f32,
    world_y: f32,
    world_z: f32,
) {
    if let Some(sink) = active_sink() {
        sink.world_position_completed(
            RequestId(request_id),
            pixel_x,
            pixel_y,
            world_x,
            world_y,
            world_z,
        );
    }
}

/// Object-picking completion trampoline handed to the engine.
///
/// Runs on an engine thread. The raw `char**`/count payload is decoded into
/// an owned [`BTreeSet`] here, once, and raw memory never travels further.
///
/// # Safety
///
/// The engine passes `count` pointers to NUL-terminated strings that stay
/// valid for the duration of the call. Null array or element pointers are
/// tolerated and skipped.
pub(crate) unsafe extern "C-unwind" fn object_picking_trampoline(
    paths: *const *const c_char,
    count: u32,
) {
    let Some(sink) = active_sink() else {
        return;
    };
    let mut decoded = BTreeSet::new();
    if !paths.is_null() {
        // SAFETY: per the callback contract, `paths` points to `count`
        // consecutive C-string pointers valid for the duration of the call.
        let entries = unsafe { std::slice::from_raw_parts(paths, count as usize) };
        for &entry in entries {
            if entry.is_null() {
                continue;
            }
            // SAFETY: non-null entries are NUL-terminated strings.
            let path = unsafe { CStr::from_ptr(entry) };
            decoded.insert(path.to_string_lossy().into_owned());
        }
    }
    sink.object_picking_completed(decoded);
}
