//! Ties the spatial object container to the invoke dispatcher: one
//! `update` registers every object in the camera's 3x3 tile window,
//! dispatches pairs, and routes the resulting command-queue pushes back
//! onto their owning objects (or the global queue, for
//! `functioncalls_global`).

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::document::{Document, DocumentCache};
use crate::invoke::{CallTarget, Channel, CommandQueues, Dispatcher};
use crate::object::{CommandRegistry, ObjectHandle, RenderObject};

use super::container::ObjectContainer;
use super::tile::{Layer, TileCoord};

/// Owns every object in the scene plus the shared global document and
/// resource cache, and wires them into the invoke dispatcher each frame.
pub struct Environment {
    pub container: ObjectContainer,
    pub global_doc: Arc<RwLock<Document>>,
    pub resources: Arc<Mutex<DocumentCache>>,
    pub global_queue: CommandQueues,
    dispatcher: Dispatcher,
}

impl Environment {
    /// Builds an empty environment with the given tile size and resource
    /// cache eviction tuning.
    pub fn new(tile_size: f64, eviction_chance: f64, idle_hits_threshold: u32) -> Self {
        let global_doc = Arc::new(RwLock::new(Document::new()));
        let resources = Arc::new(Mutex::new(DocumentCache::new(
            eviction_chance,
            idle_hits_threshold,
        )));
        let dispatcher = Dispatcher::new(global_doc.clone(), resources.clone());
        Environment {
            container: ObjectContainer::new(tile_size),
            global_doc,
            resources,
            global_queue: CommandQueues::default(),
            dispatcher,
        }
    }

    /// Inserts a new object into `layer` at its document-declared position.
    pub fn append(&mut self, layer: Layer, object: RenderObject) -> ObjectHandle {
        self.container.append(layer, object)
    }

    /// Run one dispatch pass over every layer's 3x3 window around
    /// `camera`, then drain the resulting command calls into their
    /// target queues (self/other objects or the environment's global
    /// queue).
    pub fn update(&mut self, camera: TileCoord, layers: &[Layer]) {
        for &layer in layers {
            for batch in self.container.window_batches(layer, camera) {
                for handle in batch {
                    if let Some(obj) = self.container.get(handle) {
                        self.dispatcher
                            .register(handle.as_u64(), obj.document.clone(), obj.entries().to_vec());
                    }
                }
            }
        }

        let pending = self.dispatcher.dispatch();
        self.route_calls(pending);
        self.container.reinsert_all();
    }

    fn route_calls(&mut self, pending: Vec<crate::invoke::PendingCall>) {
        for call in pending {
            match call.target {
                CallTarget::SelfObj(id) | CallTarget::Other(id) => {
                    if let Some((handle, _)) = self.find_by_id(id) {
                        if let Some(obj) = self.container.get_mut(handle) {
                            obj.queues.push(Channel::Script, call.command);
                        }
                    }
                }
                CallTarget::Global => {
                    self.global_queue.push(Channel::Script, call.command);
                }
            }
        }
    }

    fn find_by_id(&mut self, id: u64) -> Option<(ObjectHandle, ())> {
        self.container
            .iter_mut()
            .find(|(h, _)| h.as_u64() == id)
            .map(|(h, _)| (h, ()))
    }

    /// Drain every live object's `script`/`internal`/`always` queues
    /// through `registry`, plus the environment's own global queue.
    pub fn drain_queues(&mut self, registry: &CommandRegistry) {
        for (_, obj) in self.container.iter_mut() {
            for &channel in &crate::invoke::CHANNELS {
                let mut queue = std::mem::take(&mut obj.queues);
                queue.drain(channel, |cmd| registry.dispatch(obj, cmd));
                obj.queues = queue;
            }
        }
    }

    pub fn purge(&mut self) {
        self.container.purge();
    }

    pub fn object_count(&self) -> usize {
        self.container.object_count()
    }
}
