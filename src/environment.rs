use crate::stdlib;
use crate::types::{LispObject, LispSymbol};
use derive_more::Display;
use itertools::Itertools;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub type Scope = HashMap<LispSymbol, LispObject>;

#[derive(Display, Debug, Clone, PartialEq, Eq)]
#[display(fmt = "name '{}' is not defined", _0)]
pub struct UnboundName(pub LispSymbol);

/// One scope plus a link to the scope it was created in. Lookups walk outwards from the
/// innermost scope; closures and child scopes keep their parents alive through the `Rc`.
pub struct Environment {
    scope: RefCell<Scope>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new_child(bindings: Scope, parent: Option<&Rc<Environment>>) -> Rc<Self> {
        Rc::new(Self {
            scope: RefCell::new(bindings),
            parent: parent.cloned(),
        })
    }

    pub fn spawn_from(parent: &Rc<Environment>) -> Rc<Self> {
        Self::new_child(Scope::new(), Some(parent))
    }

    /// A global environment holding the standard library.
    pub fn standard() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn chain(&self) -> impl Iterator<Item = &Environment> {
        std::iter::successors(Some(self), |&env| env.parent.as_deref())
    }

    pub fn get(&self, key: &LispSymbol) -> Option<LispObject> {
        self.chain()
            .find_map(|env| env.scope.borrow().get(key).cloned())
    }

    pub fn fetch(&self, key: &LispSymbol) -> Result<LispObject, UnboundName> {
        self.get(key).ok_or_else(|| UnboundName(key.clone()))
    }

    /// Binds in the innermost scope only, shadowing any outer binding.
    pub fn define<T>(&self, key: T, value: LispObject) -> Option<LispObject>
    where
        T: Into<LispSymbol>,
    {
        self.scope.borrow_mut().insert(key.into(), value)
    }

    /// Overwrites the binding in the innermost scope that already holds `key`. Returns
    /// false, changing nothing, when no scope does.
    pub fn deep_set(&self, key: &LispSymbol, value: LispObject) -> bool {
        match self
            .chain()
            .find(|env| env.scope.borrow().contains_key(key))
        {
            Some(env) => {
                env.scope.borrow_mut().insert(key.clone(), value);
                true
            }
            None => false,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        let env = Self {
            scope: RefCell::new(Scope::new()),
            parent: None,
        };
        for (&name, &func) in stdlib::CORE.iter() {
            env.define(name, LispObject::Primitive(func));
        }
        for (name, value) in stdlib::constants() {
            env.define(name, value);
        }
        env
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scopes = self.chain().map(|env| {
            let scope = env.scope.borrow();
            match env.parent {
                // The global scope is mostly primitives; listing them is noise.
                None => format!("<global: {} names>", scope.len()),
                Some(_) => format!("{{{}}}", scope.keys().sorted_by(|a, b| a.0.cmp(&b.0)).join(" ")),
            }
        });
        write!(f, "{}", scopes.format(" -> "))
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment({})", self)
    }
}
