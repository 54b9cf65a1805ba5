//! Lexical scopes and local-slot allocation.
//!
//! Every slot holds a boxed pointer and is typed i32 in WASM terms. Slots
//! are handed out by a monotonically-growing counter per function body and
//! are never reclaimed when a scope closes. Two slot kinds exist: named
//! (visible through the scope chain) and scratch (anonymous codegen
//! temporaries).

use std::collections::HashMap;

use crate::encoder::{self, ValType};

/// A stack of name → slot maps plus the next-free-slot counter.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<HashMap<String, u32>>,
    next_slot: u32,
    param_count: u32,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// A fresh stack with one open scope and no parameters.
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            next_slot: 0,
            param_count: 0,
        }
    }

    /// Push a new innermost scope.
    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope. The outermost scope is never popped.
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Declare a name and return its slot.
    ///
    /// With `is_local`, always creates a new slot in the top scope
    /// (re-declaration in the same scope overwrites; last wins). Otherwise
    /// searches outward and reuses the nearest binding's slot, creating one
    /// in the top scope only when the name is unbound everywhere.
    pub fn declare(&mut self, name: &str, is_local: bool) -> u32 {
        if !is_local {
            if let Some(slot) = self.lookup(name) {
                return slot;
            }
        }
        let slot = self.consume_slot();
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name.to_string(), slot);
        slot
    }

    /// Innermost-out search for a name.
    pub fn lookup(&self, name: &str) -> Option<u32> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    /// Allocate an anonymous slot for a codegen temporary.
    pub fn consume_scratch(&mut self) -> u32 {
        self.consume_slot()
    }

    fn consume_slot(&mut self) -> u32 {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    /// Record how many leading slots are function parameters; parameters are
    /// not part of the local-declaration prelude.
    pub fn set_param_count(&mut self, n: u32) {
        self.param_count = n;
    }

    /// The WASM local-declaration prelude: one `count × i32` group covering
    /// every slot beyond the parameters.
    pub fn local_decls(&self) -> Vec<u8> {
        let extra = self.next_slot.saturating_sub(self.param_count);
        if extra == 0 {
            encoder::locals_prelude(&[])
        } else {
            encoder::locals_prelude(&[(extra, ValType::I32)])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_and_lookup() {
        let mut scopes = ScopeStack::new();
        let slot = scopes.declare("x", false);
        assert_eq!(slot, 0);
        assert_eq!(scopes.lookup("x"), Some(0));
        assert_eq!(scopes.lookup("y"), None);
    }

    #[test]
    fn plain_declare_updates_outer_binding() {
        let mut scopes = ScopeStack::new();
        let outer = scopes.declare("x", false);
        scopes.enter_scope();
        let inner = scopes.declare("x", false);
        assert_eq!(outer, inner);
    }

    #[test]
    fn local_declare_shadows_outer_binding() {
        let mut scopes = ScopeStack::new();
        let outer = scopes.declare("x", false);
        scopes.enter_scope();
        let inner = scopes.declare("x", true);
        assert_ne!(outer, inner);
        assert_eq!(scopes.lookup("x"), Some(inner));
        scopes.exit_scope();
        assert_eq!(scopes.lookup("x"), Some(outer));
    }

    #[test]
    fn scratch_slots_are_anonymous() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", false);
        let s = scopes.consume_scratch();
        assert_eq!(s, 1);
        let t = scopes.consume_scratch();
        assert_eq!(t, 2);
    }

    #[test]
    fn slots_survive_scope_exit() {
        let mut scopes = ScopeStack::new();
        scopes.enter_scope();
        scopes.declare("a", true);
        scopes.exit_scope();
        // Counter is monotonic; the slot is not reused.
        assert_eq!(scopes.declare("b", false), 1);
    }

    #[test]
    fn local_decls_excludes_params() {
        let mut scopes = ScopeStack::new();
        scopes.declare("p0", true);
        scopes.declare("p1", true);
        scopes.set_param_count(2);
        scopes.declare("v", true);
        scopes.consume_scratch();
        // 2 extra slots, one i32 group
        assert_eq!(scopes.local_decls(), vec![1, 2, 0x7F]);
    }

    #[test]
    fn local_decls_empty_when_only_params() {
        let mut scopes = ScopeStack::new();
        scopes.declare("p0", true);
        scopes.set_param_count(1);
        assert_eq!(scopes.local_decls(), vec![0]);
    }
}
