//! Runtime object model: closures, classes and instances.
//!
//! Objects are shared by `Rc` and compare by identity.  A closure captures
//! the environment visible at its declaration; `bind` threads receiver
//! context into a fresh child environment instead of mutating the original,
//! which is how method dispatch installs `this` without special evaluator
//! cases.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::Stmt;
use crate::environment::Environment;
use crate::value::Value;

/// A function value: parameters, body and the environment captured at
/// declaration time.  Equality is reference identity, never structural.
pub struct LoxFunction {
    /// `None` for anonymous functions; shows as `<fn>`.
    pub name: Option<String>,

    /// Ordered parameter names.
    pub params: Vec<String>,

    /// Body block, shared between a method and its bound copies.
    pub body: Rc<Vec<Stmt>>,

    /// The scope chain visible where the function was declared.
    pub closure: Rc<RefCell<Environment>>,
}

impl LoxFunction {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Name used in arity diagnostics.
    pub fn describe(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    /// A copy of this function whose scope chain additionally defines
    /// `this`.  The body and parameters are shared; the original closure is
    /// left untouched.
    pub fn bind(&self, instance: Value) -> LoxFunction {
        let bound_env = Environment::push(
            self.closure.clone(),
            [("this".to_string(), instance)],
        );
        LoxFunction {
            name: self.name.clone(),
            params: self.params.clone(),
            body: self.body.clone(),
            closure: bound_env,
        }
    }
}

// Closures participate in environment cycles (a function stored in the very
// environment it captured), so Debug must stay shallow.
impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A class value: name, method table and optional base class (single
/// inheritance).  The `base` link is fixed at creation.
#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub methods: HashMap<String, Rc<LoxFunction>>,
    pub base: Option<Rc<LoxClass>>,
}

impl LoxClass {
    /// Method lookup: self first, then the base chain.  `None` means the
    /// chain is exhausted; callers surface that as an undefined property,
    /// except class invocation which reads it as "no constructor".
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        self.methods.get(name).cloned().or_else(|| {
            self.base.as_ref().and_then(|base| base.find_method(name))
        })
    }
}

/// An instance: a class reference plus field storage populated lazily by
/// attribute writes.  Interior mutability lets shared instances acquire
/// fields after construction.
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    fields: RefCell<HashMap<String, Value>>,
}

/// Outcome of the two-step attribute lookup on an instance.
pub enum Attribute {
    /// A field set earlier by an attribute write.
    Field(Value),
    /// A method from the class chain, already bound to the instance.
    Method(Rc<LoxFunction>),
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: RefCell::new(HashMap::new()),
        }
    }

    /// Attribute read: the instance's own fields first, then the class
    /// method chain.  A found method is bound to `this` before being
    /// returned.  `None` means neither step produced anything.
    pub fn lookup(this: &Rc<LoxInstance>, name: &str) -> Option<Attribute> {
        if let Some(value) = this.fields.borrow().get(name) {
            return Some(Attribute::Field(value.clone()));
        }
        this.class.find_method(name).map(|method| {
            Attribute::Method(Rc::new(method.bind(Value::Instance(this.clone()))))
        })
    }

    /// Attribute write.  Only instances may acquire fields; the interpreter
    /// rejects writes on any other value kind.
    pub fn set_field(&self, name: &str, value: Value) {
        self.fields.borrow_mut().insert(name.to_string(), value);
    }
}

// Fields may hold the instance itself; keep Debug acyclic.
impl fmt::Debug for LoxInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LoxInstance({})", self.class.name)
    }
}
