//! Runtime environments.
//!
//! A runtime environment is a chain of scope frames. Lookup walks parent
//! frames; definition writes only the innermost frame. Frames sit behind
//! `Rc` so a closure can keep its captured frame alive for as long as
//! the closure itself is reachable.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::value::Value;

/// A handle to a scope frame chain. Cloning the handle shares the frame;
/// this is how closures capture their defining environment.
#[derive(Clone)]
pub struct Env {
    frame: Rc<Frame>,
}

struct Frame {
    vars: RefCell<FxHashMap<String, Value>>,
    parent: Option<Env>,
}

impl Env {
    /// Create a root environment with no parent.
    pub fn root() -> Env {
        Env {
            frame: Rc::new(Frame {
                vars: RefCell::new(FxHashMap::default()),
                parent: None,
            }),
        }
    }

    /// Create a child frame whose parent is this environment.
    pub fn child(&self) -> Env {
        Env {
            frame: Rc::new(Frame {
                vars: RefCell::new(FxHashMap::default()),
                parent: Some(self.clone()),
            }),
        }
    }

    /// Define (or redefine) a name in the innermost frame.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.frame.vars.borrow_mut().insert(name.into(), value);
    }

    /// Look up a name, walking parent frames outward.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.frame.vars.borrow().get(name) {
            return Some(value.clone());
        }
        self.frame.parent.as_ref().and_then(|p| p.lookup(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_lookup() {
        let env = Env::root();
        env.define("x", Value::Number(1.0));
        assert_eq!(env.lookup("x"), Some(Value::Number(1.0)));
        assert_eq!(env.lookup("y"), None);
    }

    #[test]
    fn child_sees_parent_bindings() {
        let env = Env::root();
        env.define("x", Value::Number(1.0));
        let child = env.child();
        assert_eq!(child.lookup("x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn child_definition_shadows_without_touching_parent() {
        let env = Env::root();
        env.define("x", Value::Number(1.0));
        let child = env.child();
        child.define("x", Value::Number(2.0));
        assert_eq!(child.lookup("x"), Some(Value::Number(2.0)));
        assert_eq!(env.lookup("x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn shared_handle_sees_later_definitions() {
        // Cloning the handle shares the frame, the way a closure capture
        // must: definitions after the capture are visible through it.
        let env = Env::root();
        let captured = env.clone();
        env.define("late", Value::Bool(true));
        assert_eq!(captured.lookup("late"), Some(Value::Bool(true)));
    }
}
