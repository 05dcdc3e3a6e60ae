//! Lexical scope tracking for the analysis pass.
//!
//! Variables are identified by [`VarId`], a dense index into [`Scope`]'s
//! entry table, rather than by name lookups threaded through the AST. Name
//! resolution happens once, during analysis, against a stack of per-block
//! frames; after that, every reference in the AST carries its resolved
//! `VarId` directly.

use crate::types::Type;
use std::collections::HashMap;

pub type VarId = usize;

#[derive(Debug, Clone)]
pub struct VarEntry {
    pub name: String,
    pub ty: Type,
    pub is_const: bool,
}

/// Dense table of every variable declared anywhere in the script, keyed by
/// [`VarId`]. Entries are never removed; going out of scope only removes the
/// name from lookup, not the entry itself (the AST may still reference it).
#[derive(Debug, Default)]
pub struct Scope {
    entries: Vec<VarEntry>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: impl Into<String>, ty: Type, is_const: bool) -> VarId {
        let id = self.entries.len();
        self.entries.push(VarEntry {
            name: name.into(),
            ty,
            is_const,
        });
        id
    }

    pub fn get(&self, id: VarId) -> &VarEntry {
        &self.entries[id]
    }
}

/// Stack of lexical frames, each a name→`VarId` map. Unlike the original's
/// copy-on-push `VarMap` (every nested scope started as a full copy of its
/// parent), each frame here holds only the names declared directly within
/// it; `lookup` walks the stack innermost-to-outermost. This keeps
/// redeclaration checks scoped to exactly the current frame, which is what
/// the spec requires, without the original's O(depth) copy on every block
/// entry.
#[derive(Debug, Default)]
pub struct VarMapStack {
    frames: Vec<HashMap<String, VarId>>,
}

impl VarMapStack {
    pub fn new() -> Self {
        let mut stack = Self { frames: Vec::new() };
        stack.push();
        stack
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Declares `name` in the current (innermost) frame. Returns `false`
    /// without inserting if `name` is already declared in this frame.
    pub fn declare(&mut self, name: &str, id: VarId) -> bool {
        let frame = self.frames.last_mut().expect("at least one frame");
        if frame.contains_key(name) {
            return false;
        }
        frame.insert(name.to_string(), id);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
    }

    /// Whether `name` is declared in the current frame specifically (used by
    /// the redeclaration check, which only cares about the innermost frame).
    pub fn declared_in_current_frame(&self, name: &str) -> bool {
        self.frames
            .last()
            .map(|frame| frame.contains_key(name))
            .unwrap_or(false)
    }
}
