//! The `Document`: a JSON tree plus a per-path scalar cache sitting in
//! front of it. Scalar writes land in the cache immediately and are only
//! materialized into the tree on `flush` (called implicitly by the
//! structural operations: `member_type`, `member_size`, `remove_key`,
//! `set_subdoc`, `serialize`).
//!
//! Known quirk, preserved on purpose: overwriting a path does not
//! invalidate cache entries held for paths nested underneath it. If code
//! holds a stable double for `a.b.c` and then does `set_subdoc("a.b",
//! ...)`, the old `a.b.c` handle keeps reporting its last value until
//! something touches it directly. The original engine behaves the same
//! way and some content relies on it, so sub-document writes are the
//! documented way to make bulk structural edits instead of patching
//! through many individual scalar paths.

use std::collections::HashMap;

use serde_json::Value as Json;

use super::cache::{PathCache, StableDouble};
use super::path::{self, Segment};
use super::value::{classify, MemberType, Scalar, ScalarValue};

/// A JSON document with a write-behind scalar cache.
#[derive(Debug, Clone)]
pub struct Document {
    root: Json,
    cache: HashMap<String, PathCache>,
}

impl Default for Document {
    fn default() -> Self {
        Document {
            root: Json::Object(serde_json::Map::new()),
            cache: HashMap::new(),
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(root: Json) -> Self {
        Document {
            root,
            cache: HashMap::new(),
        }
    }

    /// Read a scalar at `path`, falling back to `default` if the path is
    /// absent, holds a non-scalar value, or cannot be converted to `T`.
    pub fn get<T: ScalarValue>(&mut self, path: &str, default: T) -> T {
        if let Some(entry) = self.cache.get_mut(path) {
            if let Some(v) = T::cached(entry) {
                return v;
            }
            return match T::try_from_scalar(&entry.last) {
                Some(v) => {
                    T::cache_into(entry, v.clone());
                    v
                }
                None => default,
            };
        }

        let Some(raw) = get_in(&self.root, path) else {
            return default;
        };
        let Some(scalar) = Scalar::from_json(raw) else {
            return default;
        };
        match T::try_from_scalar(&scalar) {
            Some(v) => {
                let mut entry = PathCache::new(scalar);
                entry.dirty = false; // value already lives in the tree
                T::cache_into(&mut entry, v.clone());
                self.cache.insert(path.to_string(), entry);
                v
            }
            None => default,
        }
    }

    /// Write a scalar to `path`. Lands in the cache; call `flush` (or any
    /// structural operation) to materialize it into the tree.
    pub fn set<T: ScalarValue>(&mut self, path: &str, value: T) {
        let scalar = value.into_scalar();
        match self.cache.get_mut(path) {
            Some(entry) => entry.overwrite(scalar),
            None => {
                self.cache.insert(path.to_string(), PathCache::new(scalar));
            }
        }
    }

    /// Arithmetic assignment: `self[path] += delta`, as a double.
    pub fn set_add(&mut self, path: &str, delta: f64) {
        let current = self.get::<f64>(path, 0.0);
        self.set(path, current + delta);
    }

    pub fn set_multiply(&mut self, path: &str, factor: f64) {
        let current = self.get::<f64>(path, 0.0);
        self.set(path, current * factor);
    }

    pub fn set_concat(&mut self, path: &str, suffix: &str) {
        let current = self.get::<String>(path, String::new());
        self.set(path, current + suffix);
    }

    /// A pointer-stable handle to `path`'s value as a double. Repeated
    /// calls for the same path return clones of the same cell.
    pub fn stable_double(&mut self, path: &str) -> StableDouble {
        if let Some(entry) = self.cache.get(path) {
            return entry.stable.clone();
        }
        let scalar = get_in(&self.root, path)
            .and_then(Scalar::from_json)
            .unwrap_or(Scalar::F64(0.0));
        let mut entry = PathCache::new(scalar);
        entry.dirty = false;
        let handle = entry.stable.clone();
        self.cache.insert(path.to_string(), entry);
        handle
    }

    /// Write every dirty cache entry into the tree. Does not touch stable
    /// double handles or clear derived conversion caches.
    pub fn flush(&mut self) {
        for (path, entry) in self.cache.iter_mut() {
            if entry.dirty {
                set_in(&mut self.root, path, entry.last.to_json());
                entry.dirty = false;
            }
        }
    }

    pub fn member_type(&mut self, path: &str) -> MemberType {
        self.flush();
        match get_in(&self.root, path) {
            Some(v) => classify(v),
            None => MemberType::Null,
        }
    }

    /// Array length, `1` for a document/scalar, `0` if absent.
    pub fn member_size(&mut self, path: &str) -> usize {
        self.flush();
        match get_in(&self.root, path) {
            Some(Json::Array(a)) => a.len(),
            Some(Json::Null) | None => 0,
            Some(_) => 1,
        }
    }

    pub fn remove_key(&mut self, path: &str) {
        self.flush();
        remove_in(&mut self.root, path);
        self.cache.remove(path);
    }

    /// Replace the sub-tree at `path` with a deep copy of `child`'s
    /// materialized content. Both documents are flushed first.
    pub fn set_subdoc(&mut self, path: &str, child: &mut Document) {
        self.flush();
        child.flush();
        set_in(&mut self.root, path, child.root.clone());
        self.cache.remove(path);
    }

    /// Clone of the sub-tree at `path`, as a fresh document with an empty
    /// cache.
    pub fn get_subdoc(&mut self, path: &str) -> Document {
        self.flush();
        match get_in(&self.root, path) {
            Some(v) => Document::from_value(v.clone()),
            None => Document::new(),
        }
    }

    pub fn serialize(&mut self) -> String {
        self.flush();
        serde_json::to_string(&self.root).unwrap_or_else(|_| "{}".to_string())
    }

    /// Load a document from `serial`, which is one of:
    /// - a literal JSON object/array/scalar string, parsed directly;
    /// - a filesystem link to a JSON file;
    /// - a link followed by one or more `|`-separated command fragments,
    ///   applied to the loaded document in order (`set <path> <value>`,
    ///   or the legacy `key=value` shorthand, equivalent to
    ///   `set key value`).
    ///
    /// A link that can't be read or doesn't parse as JSON falls back to
    /// an empty document rather than failing the whole load.
    pub fn deserialize(serial: &str) -> Result<Document, serde_json::Error> {
        if let Ok(root) = serde_json::from_str::<Json>(serial) {
            return Ok(Document::from_value(root));
        }

        let mut parts = serial.split('|');
        let link = parts.next().unwrap_or("").trim();
        let mut doc = match std::fs::read_to_string(link) {
            Ok(text) => serde_json::from_str::<Json>(&text)
                .map(Document::from_value)
                .unwrap_or_else(|err| {
                    log::warn!("document link '{}' did not parse as JSON: {}", link, err);
                    Document::new()
                }),
            Err(err) => {
                log::warn!("document link '{}' could not be read: {}", link, err);
                Document::new()
            }
        };

        for fragment in parts {
            let fragment = fragment.trim();
            if fragment.is_empty() {
                continue;
            }
            doc.apply_command(&rewrite_legacy_assignment(fragment));
        }

        Ok(doc)
    }

    /// The document-level floor of command dispatch: `set <path> <value>`.
    /// Anything else is logged and ignored - richer command routing lives
    /// above `Document`, closer to the objects that own a command tree.
    fn apply_command(&mut self, command: &str) {
        let mut tokens = command.split_whitespace();
        match tokens.next() {
            Some("set") => {
                let path = match tokens.next() {
                    Some(p) => p,
                    None => {
                        log::warn!("'set' command '{}' is missing a path", command);
                        return;
                    }
                };
                let value = tokens.collect::<Vec<_>>().join(" ");
                match value.parse::<f64>() {
                    Ok(f) => self.set(path, f),
                    Err(_) => self.set(path, value),
                }
            }
            Some(other) => log::warn!("unrecognized document command '{}'", other),
            None => {}
        }
    }

    /// Read-only access to the flushed tree, for callers (resource cache,
    /// diff tooling) that need the raw `serde_json::Value`.
    pub fn as_value(&mut self) -> &Json {
        self.flush();
        &self.root
    }
}

/// Rewrites the legacy `key=value` fragment shorthand into `set key value`.
/// Fragments already spelled as a command (`set ...`, or anything else)
/// pass through untouched.
fn rewrite_legacy_assignment(fragment: &str) -> String {
    if fragment.starts_with("set ") {
        return fragment.to_string();
    }
    match fragment.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() && !key.contains(char::is_whitespace) => {
            format!("set {} {}", key.trim(), value.trim())
        }
        _ => fragment.to_string(),
    }
}

fn get_in<'a>(root: &'a Json, path: &str) -> Option<&'a Json> {
    let segments = path::parse(path);
    let mut current = root;
    for seg in &segments {
        current = match (seg, current) {
            (Segment::Key(k), Json::Object(map)) => map.get(k)?,
            (Segment::Index(i), Json::Array(arr)) => arr.get(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

fn set_in(root: &mut Json, path: &str, value: Json) {
    let segments = path::parse(path);
    if segments.is_empty() {
        *root = value;
        return;
    }
    let mut current = root;
    for (i, seg) in segments.iter().enumerate() {
        let last = i == segments.len() - 1;
        match seg {
            Segment::Key(k) => {
                if !current.is_object() {
                    *current = Json::Object(serde_json::Map::new());
                }
                let map = current.as_object_mut().unwrap();
                if last {
                    map.insert(k.clone(), value);
                    return;
                }
                current = map.entry(k.clone()).or_insert(Json::Null);
            }
            Segment::Index(idx) => {
                if !current.is_array() {
                    *current = Json::Array(Vec::new());
                }
                let arr = current.as_array_mut().unwrap();
                while arr.len() <= *idx {
                    arr.push(Json::Null);
                }
                if last {
                    arr[*idx] = value;
                    return;
                }
                current = &mut arr[*idx];
            }
        }
    }
}

fn remove_in(root: &mut Json, path: &str) {
    let segments = path::parse(path);
    let Some((last, parent_segments)) = segments.split_last() else {
        return;
    };
    let mut current = root;
    for seg in parent_segments {
        current = match (seg, current) {
            (Segment::Key(k), Json::Object(map)) => match map.get_mut(k) {
                Some(v) => v,
                None => return,
            },
            (Segment::Index(i), Json::Array(arr)) => match arr.get_mut(*i) {
                Some(v) => v,
                None => return,
            },
            _ => return,
        };
    }
    match (last, current) {
        (Segment::Key(k), Json::Object(map)) => {
            map.remove(k);
        }
        (Segment::Index(i), Json::Array(arr)) => {
            if *i < arr.len() {
                arr.remove(*i);
            }
        }
        _ => {}
    }
}
