//! Lexical environment (scope chain).
//!
//! A mapping from names to values chained to an optional parent.  Parents are
//! shared, not owned: a closure's captured environment may be referenced by
//! many closures at once and must outlive the block that created it, hence
//! `Rc<RefCell<_>>`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::value::Value;

#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// A root environment with no parent.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// An empty child of `enclosing`.
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// A child of `parent` pre-populated with `bindings`.  Used for block
    /// entry, call-frame construction and `this`/`super` binding.
    pub fn push(
        parent: Rc<RefCell<Environment>>,
        bindings: impl IntoIterator<Item = (String, Value)>,
    ) -> Rc<RefCell<Environment>> {
        let mut child = Environment::with_enclosing(parent);
        for (name, value) in bindings {
            child.values.insert(name, value);
        }
        Rc::new(RefCell::new(child))
    }

    /// Adds a new binding in the current scope, shadowing any outer binding
    /// of the same name.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Looks a name up, walking outward from the innermost scope.
    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
            })
        }
    }

    /// Mutates an existing binding in place, walking outward until one is
    /// found.  Assignment never creates a new binding.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
            })
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}
