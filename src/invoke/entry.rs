//! Invoke entries: one JSON-authored rule, compiled once when an entity's
//! ruleset is (re)loaded.

use serde::Deserialize;

use crate::expression::Template;

/// How an assignment's right-hand side combines with the target path's
/// current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Multiply,
    Concat,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub target: String,
    pub op: AssignOp,
    pub value: Template,
}

/// Raw, JSON-facing shape of one invoke entry before compilation.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryDef {
    pub topic: String,
    #[serde(default = "default_logical_arg")]
    pub logical_arg: String,
    #[serde(default)]
    pub exprs: Vec<String>,
    #[serde(default)]
    pub functioncalls_self: Vec<String>,
    #[serde(default)]
    pub functioncalls_other: Vec<String>,
    #[serde(default)]
    pub functioncalls_global: Vec<String>,
}

fn default_logical_arg() -> String {
    "1".to_string()
}

/// A compiled, ready-to-evaluate invoke entry.
#[derive(Debug, Clone)]
pub struct CompiledEntry {
    pub topic: String,
    pub logical_arg: Template,
    pub assignments: Vec<Assignment>,
    pub functioncalls_self: Vec<String>,
    pub functioncalls_other: Vec<String>,
    pub functioncalls_global: Vec<String>,
    /// Rough evaluation cost: number of `$` sigils across the guard and
    /// every assignment's source, at least 1 per entry.
    pub cost: usize,
}

impl CompiledEntry {
    pub fn compile(def: &EntryDef) -> Result<CompiledEntry, String> {
        let logical_arg = Template::compile(&def.logical_arg)?;
        let assignments = def
            .exprs
            .iter()
            .map(|s| parse_assignment(s))
            .collect::<Result<Vec<_>, _>>()?;

        let mut cost = def.logical_arg.matches('$').count();
        for raw in &def.exprs {
            cost += raw.matches('$').count();
        }
        cost = cost.max(1);

        Ok(CompiledEntry {
            topic: def.topic.clone(),
            logical_arg,
            assignments,
            functioncalls_self: def.functioncalls_self.clone(),
            functioncalls_other: def.functioncalls_other.clone(),
            functioncalls_global: def.functioncalls_global.clone(),
            cost,
        })
    }
}

/// Parse `"path OP value"` where `OP` is one of `+=`, `*=`, `|=`, `=`,
/// longest match first so `+=` isn't seen as a bare `=`.
fn parse_assignment(src: &str) -> Result<Assignment, String> {
    const OPS: [(&str, AssignOp); 4] = [
        ("+=", AssignOp::Add),
        ("*=", AssignOp::Multiply),
        ("|=", AssignOp::Concat),
        ("=", AssignOp::Set),
    ];
    for (token, op) in OPS {
        if let Some(idx) = src.find(token) {
            let target = src[..idx].trim().to_string();
            let rest = &src[idx + token.len()..];
            let value = Template::compile(rest.trim())?;
            if target.is_empty() {
                return Err(format!("assignment '{}' has no target path", src));
            }
            return Ok(Assignment { target, op, value });
        }
    }
    Err(format!("'{}' is not an assignment (missing operator)", src))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_set() {
        let a = parse_assignment("self.hp=$(self.hp-1)").unwrap();
        assert_eq!(a.target, "self.hp");
        assert_eq!(a.op, AssignOp::Set);
    }

    #[test]
    fn parses_compound_operators_before_bare_equals() {
        let a = parse_assignment("self.hp+=$(1)").unwrap();
        assert_eq!(a.op, AssignOp::Add);
        assert_eq!(a.target, "self.hp");

        let a = parse_assignment("self.tag|=$(x)").unwrap();
        assert_eq!(a.op, AssignOp::Concat);
    }

    #[test]
    fn rejects_missing_operator() {
        assert!(parse_assignment("self.hp").is_err());
    }

    #[test]
    fn compiles_entry_def() {
        let def = EntryDef {
            topic: "collision".into(),
            logical_arg: "gt(self.hp, 0)".into(),
            exprs: vec!["self.hp+=$(-1)".into()],
            functioncalls_self: vec![],
            functioncalls_other: vec![],
            functioncalls_global: vec![],
        };
        let compiled = CompiledEntry::compile(&def).unwrap();
        assert_eq!(compiled.assignments.len(), 1);
    }
}
