//! Runtime scope chain.
//!
//! Frames are heap-owned `Rc<RefCell<_>>` nodes so that closures, bound
//! methods, and block scopes can share a suffix of the chain and keep it
//! alive after the block that created it has finished.  A frame's enclosing
//! link is set at construction and never changes; nesting always allocates
//! a new frame.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

/// Shared handle to one scope frame.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// The global frame: no enclosing link.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// A nested frame whose lookups fall through to `enclosing`.
    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in this frame.  Redefinition simply overwrites, which is
    /// how a local re-declares an outer name of the same spelling.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up, searching outward through enclosing frames.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Assign to an existing `name`, searching outward through enclosing
    /// frames.  Assigning a name no frame defines is a runtime error.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Walk exactly `distance` enclosing links.  The resolver guarantees
    /// the chain is at least that deep.
    pub fn ancestor(this: &EnvRef, distance: usize) -> EnvRef {
        let mut environment: EnvRef = Rc::clone(this);

        for _ in 0..distance {
            let enclosing = environment
                .borrow()
                .enclosing
                .clone()
                .expect("resolver produced a distance deeper than the environment chain");

            environment = enclosing;
        }

        environment
    }

    /// Read `name` from the frame exactly `distance` links out.
    pub fn get_at(this: &EnvRef, distance: usize, name: &str) -> Option<Value> {
        Environment::ancestor(this, distance)
            .borrow()
            .values
            .get(name)
            .cloned()
    }

    /// Write `name` in the frame exactly `distance` links out.
    pub fn assign_at(this: &EnvRef, distance: usize, name: &str, value: Value) {
        Environment::ancestor(this, distance)
            .borrow_mut()
            .values
            .insert(name.to_string(), value);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
