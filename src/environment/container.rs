//! `ObjectContainer`: objects bucketed by layer and tile, so a frame only
//! has to touch the 3x3 window around the camera instead of every object
//! in the world.

use std::collections::HashMap;

use crate::object::{Arena, ObjectHandle, RenderObject};

use super::tile::{Layer, TileCoord};

/// Per-batch cost ceiling (sum of each object's `estimate_cost()`). A
/// tile's objects are split into multiple batches once the running total
/// would exceed this, so no single parallel work item grows unbounded.
pub const BATCH_COST_GOAL: usize = 50_000;

pub struct ObjectContainer {
    arena: Arena<RenderObject>,
    buckets: HashMap<(Layer, TileCoord), Vec<ObjectHandle>>,
    placement: HashMap<ObjectHandle, (Layer, TileCoord)>,
    tile_size: f64,
}

impl ObjectContainer {
    pub fn new(tile_size: f64) -> Self {
        ObjectContainer {
            arena: Arena::new(),
            buckets: HashMap::new(),
            placement: HashMap::new(),
            tile_size,
        }
    }

    pub fn append(&mut self, layer: Layer, object: RenderObject) -> ObjectHandle {
        let tile = self.tile_for(&object);
        let handle = self.arena.insert(object);
        self.buckets.entry((layer, tile)).or_default().push(handle);
        self.placement.insert(handle, (layer, tile));
        if let Some(obj) = self.arena.get_mut(handle) {
            obj.handle = Some(handle);
        }
        handle
    }

    fn tile_for(&self, object: &RenderObject) -> TileCoord {
        let mut doc = object.document.write();
        let x = doc.get::<f64>("pos.x", 0.0);
        let y = doc.get::<f64>("pos.y", 0.0);
        TileCoord::of(x, y, self.tile_size)
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<&RenderObject> {
        self.arena.get(handle)
    }

    pub fn get_mut(&mut self, handle: ObjectHandle) -> Option<&mut RenderObject> {
        self.arena.get_mut(handle)
    }

    /// Every handle in the 3x3 tile window around `camera` for `layer`,
    /// split into cost-bounded batches.
    pub fn window_batches(&self, layer: Layer, camera: TileCoord) -> Vec<Vec<ObjectHandle>> {
        let mut handles = Vec::new();
        for tile in camera.window() {
            if let Some(bucket) = self.buckets.get(&(layer, tile)) {
                handles.extend(bucket.iter().copied());
            }
        }
        self.batch(handles)
    }

    fn batch(&self, handles: Vec<ObjectHandle>) -> Vec<Vec<ObjectHandle>> {
        let mut batches = Vec::new();
        let mut current = Vec::new();
        let mut current_cost = 0usize;
        for h in handles {
            let cost = self.arena.get(h).map(|o| o.estimate_cost()).unwrap_or(1);
            if current_cost + cost > BATCH_COST_GOAL && !current.is_empty() {
                batches.push(std::mem::take(&mut current));
                current_cost = 0;
            }
            current_cost += cost;
            current.push(h);
        }
        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }

    /// Recompute every object's tile from its current position and move
    /// it between buckets if it has drifted out of its old one.
    pub fn reinsert_all(&mut self) {
        let moves: Vec<(ObjectHandle, (Layer, TileCoord), (Layer, TileCoord))> = self
            .placement
            .iter()
            .filter_map(|(&handle, &(layer, old_tile))| {
                let obj = self.arena.get(handle)?;
                let new_tile = self.tile_for(obj);
                if new_tile != old_tile {
                    Some((handle, (layer, old_tile), (layer, new_tile)))
                } else {
                    None
                }
            })
            .collect();

        for (handle, old_key, new_key) in moves {
            if let Some(bucket) = self.buckets.get_mut(&old_key) {
                bucket.retain(|&h| h != handle);
            }
            self.buckets.entry(new_key).or_default().push(handle);
            self.placement.insert(handle, new_key);
        }
    }

    /// Remove every object flagged for deletion across the whole
    /// container. Idempotent: a second call with nothing newly flagged
    /// removes nothing.
    pub fn purge(&mut self) {
        let doomed: Vec<ObjectHandle> = self
            .arena
            .iter()
            .filter(|(_, obj)| obj.delete_flag)
            .map(|(h, _)| h)
            .collect();

        for handle in doomed {
            if let Some((layer, tile)) = self.placement.remove(&handle) {
                if let Some(bucket) = self.buckets.get_mut(&(layer, tile)) {
                    bucket.retain(|&h| h != handle);
                }
            }
            self.arena.remove(handle);
        }
    }

    pub fn object_count(&self) -> usize {
        self.arena.len()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectHandle, &mut RenderObject)> {
        self.arena.iter_mut()
    }
}
