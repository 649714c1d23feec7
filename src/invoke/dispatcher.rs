//! Topic-based pairing and evaluation of invoke entries.
//!
//! Every render object registers its active entries with the dispatcher
//! once per frame. `dispatch` then pairs registrations that share a topic
//! (including an entry pairing with itself, the "other = self" local
//! case) plus the `"all"` topic, which pairs with every registration
//! exactly once regardless of its own topic. Pairs evaluate in parallel;
//! each pair's guard and assignments run against a [`VirtualDouble`] bound
//! to that pair's `self`/`other`/`global`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rayon::prelude::*;

use crate::document::{Document, DocumentCache};
use crate::expression::{ExpressionPool, VirtualDouble};

use super::entry::{AssignOp, CompiledEntry};

pub const ALL_TOPIC: &str = "all";

struct Registration {
    owner_id: u64,
    owner_doc: Arc<RwLock<Document>>,
    entry: Arc<CompiledEntry>,
}

/// Where a queued `functioncalls_*` command should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget {
    SelfObj(u64),
    Other(u64),
    Global,
}

#[derive(Debug, Clone)]
pub struct PendingCall {
    pub target: CallTarget,
    pub command: String,
}

pub struct Dispatcher {
    registrations: Vec<Registration>,
    global_doc: Arc<RwLock<Document>>,
    resources: Arc<Mutex<DocumentCache>>,
    pool: ExpressionPool,
}

impl Dispatcher {
    pub fn new(global_doc: Arc<RwLock<Document>>, resources: Arc<Mutex<DocumentCache>>) -> Self {
        Dispatcher {
            registrations: Vec::new(),
            global_doc,
            resources,
            pool: ExpressionPool::new(),
        }
    }

    /// Offer one entity's compiled, currently-active entries for this
    /// frame's pairing pass.
    pub fn register(
        &mut self,
        owner_id: u64,
        owner_doc: Arc<RwLock<Document>>,
        entries: impl IntoIterator<Item = Arc<CompiledEntry>>,
    ) {
        for entry in entries {
            self.registrations.push(Registration {
                owner_id,
                owner_doc: owner_doc.clone(),
                entry,
            });
        }
    }

    /// Evaluate every topic-matched pair registered this frame, apply
    /// assignments, and collect the function calls guarded entries
    /// requested. Clears the registration table for the next frame.
    pub fn dispatch(&mut self) -> Vec<PendingCall> {
        let pairs = self.build_pairs();
        let pending = Mutex::new(Vec::new());

        pairs.par_iter().for_each(|&(a, b)| {
            self.evaluate_pair(a, b, &pending);
        });

        self.registrations.clear();
        pending.into_inner()
    }

    fn build_pairs(&self) -> Vec<(usize, usize)> {
        let mut by_topic: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, reg) in self.registrations.iter().enumerate() {
            by_topic.entry(reg.entry.topic.as_str()).or_default().push(i);
        }

        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        let mut push = |a: usize, b: usize, seen: &mut HashSet<(usize, usize)>| {
            if seen.insert((a, b)) {
                pairs.push((a, b));
            }
        };

        for (topic, idxs) in &by_topic {
            if *topic == ALL_TOPIC {
                continue;
            }
            for &a in idxs {
                for &b in idxs {
                    push(a, b, &mut seen);
                }
            }
        }

        if let Some(all_idxs) = by_topic.get(ALL_TOPIC) {
            for &a in all_idxs {
                for b in 0..self.registrations.len() {
                    push(a, b, &mut seen);
                }
            }
        }

        pairs
    }

    fn evaluate_pair(&self, a: usize, b: usize, pending: &Mutex<Vec<PendingCall>>) {
        let ra = &self.registrations[a];
        let rb = &self.registrations[b];

        let mut vd = VirtualDouble::new(
            ra.owner_doc.clone(),
            self.global_doc.clone(),
            self.resources.clone(),
        );
        vd.set_other(Some(rb.owner_doc.clone()));

        let guard = self
            .pool
            .eval_template_f64(&ra.entry.logical_arg, &mut vd)
            .unwrap_or(0.0);
        if !guard.is_finite() {
            log::warn!(
                "topic '{}' guard evaluated to a non-finite value, treating as false",
                ra.entry.topic
            );
            return;
        }
        if guard.abs() < crate::core::EPSILON {
            return;
        }

        for assignment in &ra.entry.assignments {
            let (target_doc, path) = match assignment.target.strip_prefix("global.") {
                Some(path) => (&self.global_doc, path),
                None => match assignment.target.strip_prefix("other.") {
                    Some(path) => (&rb.owner_doc, path),
                    None => (
                        &ra.owner_doc,
                        assignment
                            .target
                            .strip_prefix("self.")
                            .unwrap_or(&assignment.target),
                    ),
                },
            };

            // Arithmetic ops need an eventual double; everything else is a
            // string by default and only takes the fast numeric path when
            // the value expression is a pure, unformatted `$(...)`. The
            // value is always evaluated before `target_doc` is locked,
            // since resolving `self.`/`other.`/`global.` variables in the
            // expression may need to read that very document.
            match assignment.op {
                AssignOp::Add | AssignOp::Multiply => {
                    let value = if assignment.value.returnable_as_double() {
                        match self.pool.eval_template_f64(&assignment.value, &mut vd) {
                            Ok(v) => v,
                            Err(_) => continue,
                        }
                    } else {
                        match self.pool.eval_template_string(&assignment.value, &mut vd) {
                            Ok(s) => s.trim().parse::<f64>().unwrap_or(0.0),
                            Err(_) => continue,
                        }
                    };
                    let mut doc = target_doc.write();
                    if assignment.op == AssignOp::Add {
                        doc.set_add(path, value);
                    } else {
                        doc.set_multiply(path, value);
                    }
                }
                AssignOp::Set if assignment.value.returnable_as_double() => {
                    let value = match self.pool.eval_template_f64(&assignment.value, &mut vd) {
                        Ok(v) => v,
                        Err(_) => continue,
                    };
                    target_doc.write().set(path, value);
                }
                AssignOp::Set => {
                    let value = match self.pool.eval_template_string(&assignment.value, &mut vd) {
                        Ok(s) => s,
                        Err(_) => continue,
                    };
                    target_doc.write().set(path, value);
                }
                AssignOp::Concat => {
                    let s = match self.pool.eval_template_string(&assignment.value, &mut vd) {
                        Ok(s) => s,
                        Err(_) => continue,
                    };
                    target_doc.write().set_concat(path, &s);
                }
            }
        }

        let mut calls = Vec::new();
        for cmd in &ra.entry.functioncalls_self {
            calls.push(PendingCall {
                target: CallTarget::SelfObj(ra.owner_id),
                command: cmd.clone(),
            });
        }
        for cmd in &ra.entry.functioncalls_other {
            calls.push(PendingCall {
                target: CallTarget::Other(rb.owner_id),
                command: cmd.clone(),
            });
        }
        for cmd in &ra.entry.functioncalls_global {
            calls.push(PendingCall {
                target: CallTarget::Global,
                command: cmd.clone(),
            });
        }
        if !calls.is_empty() {
            pending.lock().extend(calls);
        }
    }

    pub fn pending_registration_count(&self) -> usize {
        self.registrations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::entry::EntryDef;

    fn make_entry(topic: &str, logical_arg: &str, exprs: &[&str]) -> Arc<CompiledEntry> {
        let def = EntryDef {
            topic: topic.into(),
            logical_arg: logical_arg.into(),
            exprs: exprs.iter().map(|s| s.to_string()).collect(),
            functioncalls_self: vec![],
            functioncalls_other: vec![],
            functioncalls_global: vec![],
        };
        Arc::new(CompiledEntry::compile(&def).unwrap())
    }

    #[test]
    fn local_rule_pairs_entry_with_itself() {
        let global = Arc::new(RwLock::new(Document::new()));
        let resources = Arc::new(Mutex::new(DocumentCache::new(0.0, 4)));
        let mut dispatcher = Dispatcher::new(global, resources);

        let doc = Arc::new(RwLock::new(Document::new()));
        doc.write().set("hp", 10.0_f64);
        let entry = make_entry("tick", "1", &["self.hp=$(self.hp-1)"]);
        dispatcher.register(1, doc.clone(), vec![entry]);
        dispatcher.dispatch();

        assert_eq!(doc.write().get::<f64>("hp", 0.0), 9.0);
    }

    #[test]
    fn cross_object_pair_reads_other() {
        let global = Arc::new(RwLock::new(Document::new()));
        let resources = Arc::new(Mutex::new(DocumentCache::new(0.0, 4)));
        let mut dispatcher = Dispatcher::new(global, resources);

        let a = Arc::new(RwLock::new(Document::new()));
        a.write().set("hp", 10.0_f64);
        let b = Arc::new(RwLock::new(Document::new()));
        b.write().set("hp", 3.0_f64);

        let entry_a = make_entry("hit", "1", &["self.hp=$(self.hp-other.hp)"]);
        dispatcher.register(1, a.clone(), vec![entry_a]);
        dispatcher.register(2, b.clone(), vec![]);
        dispatcher.dispatch();

        // a pairs with itself (other=self, hp-hp=0) and with b (hp-3=7);
        // pair order isn't guaranteed, so just check it changed from 10.
        assert_ne!(a.write().get::<f64>("hp", 10.0), 10.0);
    }

    #[test]
    fn guard_false_skips_assignment() {
        let global = Arc::new(RwLock::new(Document::new()));
        let resources = Arc::new(Mutex::new(DocumentCache::new(0.0, 4)));
        let mut dispatcher = Dispatcher::new(global, resources);

        let doc = Arc::new(RwLock::new(Document::new()));
        doc.write().set("hp", 10.0_f64);
        let entry = make_entry("tick", "0", &["self.hp=$(999)"]);
        dispatcher.register(1, doc.clone(), vec![entry]);
        dispatcher.dispatch();

        assert_eq!(doc.write().get::<f64>("hp", 0.0), 10.0);
    }

    #[test]
    fn all_topic_pairs_with_every_registration_once() {
        let global = Arc::new(RwLock::new(Document::new()));
        let resources = Arc::new(Mutex::new(DocumentCache::new(0.0, 4)));
        let mut dispatcher = Dispatcher::new(global, resources);

        let a = Arc::new(RwLock::new(Document::new()));
        a.write().set("hits", 0.0_f64);
        let b = Arc::new(RwLock::new(Document::new()));

        let entry_a = make_entry(ALL_TOPIC, "1", &["self.hits=$(self.hits+1)"]);
        dispatcher.register(1, a.clone(), vec![entry_a]);
        dispatcher.register(2, b, vec![]);
        dispatcher.dispatch();

        // pairs with itself and with b: exactly 2 increments.
        assert_eq!(a.write().get::<f64>("hits", 0.0), 2.0);
    }
}
