// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Environment for variable bindings.

use std::collections::HashMap;

use crate::value::Value;

/// A scope in the environment.
#[derive(Debug, Default)]
struct Scope {
    bindings: HashMap<String, Value>,
}

/// The environment holding variable bindings.
///
/// The first scope holds globals and lives as long as the interpreter. A
/// function call hides the caller's local scopes so the callee sees only
/// globals and its own parameters.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
}

/// Local scopes of a caller, hidden for the duration of a call.
pub struct SavedScopes(Vec<Scope>);

impl Environment {
    pub fn new() -> Self {
        Self { scopes: vec![Scope::default()] }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Drop every local scope, leaving only globals. Used after an error
    /// unwinds out of nested blocks.
    pub fn reset_to_globals(&mut self) {
        self.scopes.truncate(1);
    }

    pub fn enter_call(&mut self) -> SavedScopes {
        let saved = self.scopes.split_off(1);
        self.scopes.push(Scope::default());
        SavedScopes(saved)
    }

    pub fn leave_call(&mut self, saved: SavedScopes) {
        self.scopes.truncate(1);
        self.scopes.extend(saved.0);
    }

    /// Define a variable in the current scope.
    pub fn define(&mut self, name: String, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(name, value);
        }
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.bindings.get(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.scopes.iter_mut().rev().find_map(|scope| scope.bindings.get_mut(name))
    }

    /// Assign to the nearest existing binding, or define one in the current
    /// scope.
    pub fn assign(&mut self, name: &str, value: Value) {
        match self.get_mut(name) {
            Some(slot) => *slot = value,
            None => self.define(name.to_string(), value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_and_pops() {
        let mut env = Environment::new();
        env.define("x".into(), Value::Int(1));
        env.push_scope();
        env.define("x".into(), Value::Int(2));
        assert!(matches!(env.get("x"), Some(Value::Int(2))));
        env.pop_scope();
        assert!(matches!(env.get("x"), Some(Value::Int(1))));
    }

    #[test]
    fn assign_updates_outer_binding() {
        let mut env = Environment::new();
        env.define("total".into(), Value::Int(0));
        env.push_scope();
        env.assign("total", Value::Int(5));
        env.assign("fresh", Value::Int(9));
        env.pop_scope();
        assert!(matches!(env.get("total"), Some(Value::Int(5))));
        assert!(env.get("fresh").is_none());
    }

    #[test]
    fn call_hides_caller_locals() {
        let mut env = Environment::new();
        env.define("g".into(), Value::Int(1));
        env.push_scope();
        env.define("local".into(), Value::Int(2));

        let saved = env.enter_call();
        assert!(env.get("g").is_some());
        assert!(env.get("local").is_none());
        env.leave_call(saved);

        assert!(matches!(env.get("local"), Some(Value::Int(2))));
    }

    #[test]
    fn globals_survive_pop_attempts() {
        let mut env = Environment::new();
        env.define("g".into(), Value::Int(1));
        env.pop_scope();
        env.reset_to_globals();
        assert!(env.get("g").is_some());
    }
}
