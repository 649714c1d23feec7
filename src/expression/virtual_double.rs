//! Bridges expression variable names to live document values.
//!
//! `self.*` and `global.*` are remanent: the same entity's own document and
//! the shared global document don't change out from under an evaluation, so
//! their stable double handles are cached once per [`VirtualDouble`] and
//! reused for every later lookup of the same path. `other.*` is
//! non-remanent - in a pair evaluation, "other" is a different entity on
//! every pair, so its value is re-read from the document fresh each time
//! and never cached.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::document::{Document, DocumentCache, StableDouble};

use super::eval::VariableResolver;

pub struct VirtualDouble {
    pub this_doc: Arc<RwLock<Document>>,
    pub global_doc: Arc<RwLock<Document>>,
    pub resources: Arc<Mutex<DocumentCache>>,
    pub other_doc: Option<Arc<RwLock<Document>>>,
    remanent_cache: HashMap<String, StableDouble>,
}

impl VirtualDouble {
    pub fn new(
        this_doc: Arc<RwLock<Document>>,
        global_doc: Arc<RwLock<Document>>,
        resources: Arc<Mutex<DocumentCache>>,
    ) -> Self {
        VirtualDouble {
            this_doc,
            global_doc,
            resources,
            other_doc: None,
            remanent_cache: HashMap::new(),
        }
    }

    /// Rebind `other.*` ahead of evaluating one pair. Does not disturb the
    /// remanent `self`/`global`/resource cache.
    pub fn set_other(&mut self, other: Option<Arc<RwLock<Document>>>) {
        self.other_doc = other;
    }

    fn remanent_double(&mut self, cache_key: String, doc: &Arc<RwLock<Document>>, path: &str) -> f64 {
        if let Some(handle) = self.remanent_cache.get(&cache_key) {
            return handle.get();
        }
        let handle = doc.write().stable_double(path);
        let v = handle.get();
        self.remanent_cache.insert(cache_key, handle);
        v
    }
}

impl VariableResolver for VirtualDouble {
    fn resolve(&mut self, name: &str) -> f64 {
        if let Some(path) = name.strip_prefix("self.") {
            let doc = self.this_doc.clone();
            return self.remanent_double(name.to_string(), &doc, path);
        }
        if let Some(path) = name.strip_prefix("global.") {
            let doc = self.global_doc.clone();
            return self.remanent_double(name.to_string(), &doc, path);
        }
        if let Some(path) = name.strip_prefix("other.") {
            return match &self.other_doc {
                Some(doc) => doc.write().get::<f64>(path, 0.0),
                None => 0.0,
            };
        }
        if name.contains(':') {
            return self.resources.lock().get::<f64>(name, 0.0);
        }
        0.0
    }

    /// `{<path>}` variable entries go through here instead of `resolve`
    /// so a string-typed document value reads back as itself rather than
    /// `0.0`'s formatted form. `other.*`/resource reads are never cached,
    /// same as `resolve`; `self.*`/`global.*` are read fresh too, since a
    /// [`StableDouble`] handle can't carry a string.
    fn resolve_string(&mut self, name: &str) -> String {
        if let Some(path) = name.strip_prefix("self.") {
            return self.this_doc.write().get::<String>(path, String::new());
        }
        if let Some(path) = name.strip_prefix("global.") {
            return self.global_doc.write().get::<String>(path, String::new());
        }
        if let Some(path) = name.strip_prefix("other.") {
            return match &self.other_doc {
                Some(doc) => doc.write().get::<String>(path, String::new()),
                None => String::new(),
            };
        }
        if name.contains(':') {
            return self.resources.lock().get::<String>(name, String::new());
        }
        String::new()
    }
}
