// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host-owned binding: dispatchers, pending registries, lifecycle.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use orogen_core::engine::EngineOps;
use orogen_core::handler::{PickHandler, SceneQueryHandler, WorldPosHandler};
use orogen_core::query::QueryMode;
use orogen_core::registry::CountedRegistry;
use orogen_core::request::{
    OBJECT_PICKING_REQUEST_ID, PickRect, PixelPos, RequestId, WorldPoint,
    world_position_request_id,
};

use crate::router::{self, CompletionSink, RouteGuard};
use crate::symbols::TephraApi;

/// The binding to the Tephra renderer, specialized for production use.
pub type TephraBinding = Binding<TephraApi>;

/// Host-owned handle to the renderer's asynchronous query surface.
///
/// Owns the pending-request registries and the engine handle; generic over
/// [`EngineOps`] so the whole dispatch/completion pipeline runs against a
/// test double exactly as it runs against the FFI entry points.
///
/// Construct with [`TephraBinding::load`] for the real engine, or
/// [`Binding::with_engine`] for an explicit engine value (used by harnesses;
/// note that completions must then be delivered by hand via
/// [`deliver_world_position`](Self::deliver_world_position) and
/// [`deliver_object_picking`](Self::deliver_object_picking)).
///
/// Dropping the binding detaches completion routing. Handlers still pending
/// are released without being invoked.
#[derive(Debug)]
pub struct Binding<E> {
    shared: Arc<BindingShared<E>>,
    /// Keeps completion routing attached. `None` for harness bindings.
    _route: Option<RouteGuard>,
}

/// State shared with completion routing.
#[derive(Debug)]
pub(crate) struct BindingShared<E> {
    /// `None` is the disabled state: the library (or a symbol) was missing.
    engine: Option<E>,
    /// Single lock for both registries; completions can arrive on engine
    /// threads concurrently with dispatch.
    pending: Mutex<PendingTables>,
}

#[derive(Debug, Default)]
struct PendingTables {
    world_position: CountedRegistry<RequestId, WorldPosHandler>,
    object_picking: CountedRegistry<RequestId, PickHandler>,
}

impl<E> BindingShared<E> {
    fn new(engine: Option<E>) -> Self {
        Self {
            engine,
            pending: Mutex::new(PendingTables::default()),
        }
    }

    fn pending(&self) -> MutexGuard<'_, PendingTables> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: EngineOps> BindingShared<E> {
    /// Dispatches a world-position request.
    ///
    /// The handler is registered *before* the native call so a completion
    /// arriving on another thread always finds its entry.
    fn dispatch_world_position(&self, x: i32, y: i32, handler: WorldPosHandler) {
        let Some(engine) = &self.engine else {
            log::error!(
                "request_world_position dropped: the Tephra renderer library is not loaded"
            );
            return;
        };
        let id = world_position_request_id(handler.token(), x, y);
        self.pending().world_position.push(id, handler);
        engine.request_world_position(id, x, y);
    }

    /// Dispatches an object-picking request.
    ///
    /// All picking requests share one registry slot; see
    /// [`OBJECT_PICKING_REQUEST_ID`].
    fn dispatch_object_picking(&self, rect: PickRect, handler: PickHandler) {
        let Some(engine) = &self.engine else {
            log::error!(
                "request_object_picking dropped: the Tephra renderer library is not loaded"
            );
            return;
        };
        self.pending()
            .object_picking
            .push(OBJECT_PICKING_REQUEST_ID, handler);
        engine.request_object_picking(rect);
    }

    fn highlight(&self, paths: &[String]) {
        let Some(engine) = &self.engine else {
            log::error!("highlight_paths dropped: the Tephra renderer library is not loaded");
            return;
        };
        engine.highlight_paths(paths);
    }

    fn set_config(&self, key: &str, value: &str) {
        let Some(engine) = &self.engine else {
            log::error!("set_config_variable dropped: the Tephra renderer library is not loaded");
            return;
        };
        engine.set_config_variable(key, value);
    }

    /// Pops and invokes the handler for a world-position completion.
    ///
    /// The handler runs with the pending lock released, so it may dispatch
    /// follow-up requests. An orphan completion pops nothing and is ignored.
    fn complete_world_position(
        &self,
        id: RequestId,
        pixel_x: i32,
        pixel_y: i32,
        world_x: f32,
        world_y: f32,
        world_z: f32,
    ) {
        let handler = self.pending().world_position.pop(id);
        if let Some(handler) = handler {
            handler.invoke(pixel_x, pixel_y, world_x, world_y, world_z);
        }
    }

    /// Pops and invokes the handler for an object-picking completion.
    fn complete_object_picking(&self, paths: &BTreeSet<String>) {
        let handler = self.pending().object_picking.pop(OBJECT_PICKING_REQUEST_ID);
        if let Some(handler) = handler {
            handler.invoke(paths);
        }
    }
}

impl<E: EngineOps + Send + Sync + 'static> CompletionSink for BindingShared<E> {
    fn world_position_completed(
        &self,
        id: RequestId,
        pixel_x: i32,
        pixel_y: i32,
        world_x: f32,
        world_y: f32,
        world_z: f32,
    ) {
        self.complete_world_position(id, pixel_x, pixel_y, world_x, world_y, world_z);
    }

    fn object_picking_completed(&self, paths: BTreeSet<String>) {
        self.complete_object_picking(&paths);
    }
}

impl<E: EngineOps + Send + Sync + 'static> Binding<E> {
    /// Creates an enabled binding over an explicit engine value.
    ///
    /// Completion routing is *not* attached: this constructor exists for
    /// harnesses and embedded setups that deliver completions themselves.
    #[must_use]
    pub fn with_engine(engine: E) -> Self {
        Self {
            shared: Arc::new(BindingShared::new(Some(engine))),
            _route: None,
        }
    }

    /// Creates a disabled binding: every operation logs an error and
    /// returns.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            shared: Arc::new(BindingShared::new(None)),
            _route: None,
        }
    }

    /// Whether the native engine is reachable.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.shared.engine.is_some()
    }

    /// Asks for the world position under pixel `(x, y)`.
    ///
    /// `handler` is retained until its completion arrives (one invocation
    /// per dispatch), it is displaced by an id collision, or the binding is
    /// dropped. Re-requesting the same pixel with the same handler before
    /// the first completion coalesces onto one counted entry.
    pub fn request_world_position(&self, x: i32, y: i32, handler: WorldPosHandler) {
        self.shared.dispatch_world_position(x, y, handler);
    }

    /// Asks for the set of object paths intersecting `rect`.
    ///
    /// Overlapping picking requests share one correlation slot: a second
    /// request with a *different* handler before the first completion
    /// displaces the earlier handler (it is never invoked).
    pub fn request_object_picking(&self, rect: PickRect, handler: PickHandler) {
        self.shared.dispatch_object_picking(rect, handler);
    }

    /// Replaces the engine's highlight set. Fire-and-forget.
    pub fn highlight_paths(&self, paths: &[String]) {
        self.shared.highlight(paths);
    }

    /// Sets one engine configuration variable. Fire-and-forget.
    ///
    /// Example: `binding.set_config_variable("rtx.fallbackLightType", "1")`.
    pub fn set_config_variable(&self, key: &str, value: &str) {
        self.shared.set_config(key, value);
    }

    /// Issues the combined path/world-position query for `pixel`.
    ///
    /// - [`QueryMode::PositionOnly`] issues only the world-position request;
    ///   the handler receives an empty path.
    /// - [`QueryMode::PathOnly`] issues only a 1×1 picking request; the
    ///   handler receives the first picked path (or empty) and no position.
    /// - [`QueryMode::PathAndPosition`] issues the picking request first and
    ///   chains a world-position request from its completion; the handler
    ///   fires once, after the position completion, with a position only
    ///   when something was picked.
    pub fn request_scene_query(&self, pixel: PixelPos, mode: QueryMode, handler: SceneQueryHandler) {
        match mode {
            QueryMode::PositionOnly => {
                self.shared.dispatch_world_position(
                    pixel.x.cast_signed(),
                    pixel.y.cast_signed(),
                    WorldPosHandler::new(move |px, py, wx, wy, wz| {
                        handler.invoke(
                            "",
                            Some(WorldPoint::from_f32(wx, wy, wz)),
                            PixelPos::new(px.cast_unsigned(), py.cast_unsigned()),
                        );
                    }),
                );
            }
            QueryMode::PathOnly => {
                self.shared.dispatch_object_picking(
                    pixel.pick_rect(),
                    PickHandler::new(move |paths| {
                        let path = paths.iter().next().map(String::as_str).unwrap_or_default();
                        handler.invoke(path, None, pixel);
                    }),
                );
            }
            QueryMode::PathAndPosition => {
                // The picking completion re-dispatches through a weak
                // back-reference; if the binding is gone by then, the query
                // dissolves silently like any other pending request.
                let shared = Arc::downgrade(&self.shared);
                self.shared.dispatch_object_picking(
                    pixel.pick_rect(),
                    PickHandler::new(move |paths| {
                        let Some(shared) = shared.upgrade() else {
                            return;
                        };
                        let path = paths.iter().next().cloned().unwrap_or_default();
                        let handler = handler.clone();
                        shared.dispatch_world_position(
                            pixel.x.cast_signed(),
                            pixel.y.cast_signed(),
                            WorldPosHandler::new(move |px, py, wx, wy, wz| {
                                let world = (!path.is_empty())
                                    .then(|| WorldPoint::from_f32(wx, wy, wz));
                                handler.invoke(
                                    &path,
                                    world,
                                    PixelPos::new(px.cast_unsigned(), py.cast_unsigned()),
                                );
                            }),
                        );
                    }),
                );
            }
        }
    }

    /// Delivers a world-position completion to this binding.
    ///
    /// Production bindings receive completions through the registered
    /// trampolines; this entry point exists for harnesses and embedded
    /// setups that pump the engine themselves.
    pub fn deliver_world_position(
        &self,
        id: RequestId,
        pixel_x: i32,
        pixel_y: i32,
        world_x: f32,
        world_y: f32,
        world_z: f32,
    ) {
        self.shared
            .complete_world_position(id, pixel_x, pixel_y, world_x, world_y, world_z);
    }

    /// Delivers an object-picking completion to this binding.
    ///
    /// See [`deliver_world_position`](Self::deliver_world_position).
    pub fn deliver_object_picking(&self, paths: &BTreeSet<String>) {
        self.shared.complete_object_picking(paths);
    }

    /// Number of distinct world-position request ids currently pending.
    #[must_use]
    pub fn pending_world_position(&self) -> usize {
        self.shared.pending().world_position.len()
    }

    /// Pending count for world-position request `id`.
    #[must_use]
    pub fn pending_world_position_count(&self, id: RequestId) -> u32 {
        self.shared.pending().world_position.pending_count(id)
    }

    /// Pending count on the shared object-picking slot.
    #[must_use]
    pub fn pending_object_picking_count(&self) -> u32 {
        self.shared
            .pending()
            .object_picking
            .pending_count(OBJECT_PICKING_REQUEST_ID)
    }
}

impl Binding<TephraApi> {
    /// Loads the Tephra library and attaches completion routing.
    ///
    /// Never fails: when the library or a required symbol is missing, a
    /// warning is logged once and the returned binding is disabled — all
    /// operations become logged no-ops and the host stays usable.
    #[must_use]
    pub fn load() -> Self {
        match TephraApi::load() {
            Ok(api) => Self::attach(api),
            Err(err) => {
                log::warn!(
                    "Tephra renderer unavailable; object picking and highlighting are \
                     disabled: {err}"
                );
                Self::disabled()
            }
        }
    }

    /// Attaches routing and installs the completion callbacks for a
    /// successfully-loaded api.
    fn attach(api: TephraApi) -> Self {
        let shared = Arc::new(BindingShared::new(Some(api)));
        let sink: Weak<BindingShared<TephraApi>> = Arc::downgrade(&shared);
        let route = router::register(sink);
        if let Some(engine) = &shared.engine {
            engine.install_callbacks();
        }
        Self {
            shared,
            _route: Some(route),
        }
    }
}
