//! Scopes and variable slots.
//!
//! A scope is a mutable name-to-slot map chained to an optional parent and
//! tagged with an owner. The owner tag drives `this`/`super` resolution and
//! member-lookup boundaries; plain name lookup walks the parent chain.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::ast::AccessLevel;
use crate::interpreter::class::{Class, ClassRef};
use crate::interpreter::value::{Object, Overload, Value};

pub type ScopeRef = Rc<RefCell<Scope>>;

/// What a scope belongs to.
#[derive(Clone, Default)]
pub enum ScopeOwner {
    #[default]
    None,
    Class(Weak<Class>),
    Object(Weak<RefCell<Object>>),
    /// A function activation, tagged with the function name.
    Function(String),
}

impl fmt::Debug for ScopeOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeOwner::None => write!(f, "none"),
            ScopeOwner::Class(class) => match class.upgrade() {
                Some(class) => write!(f, "class {}", class.name),
                None => write!(f, "class <dropped>"),
            },
            ScopeOwner::Object(obj) => match obj.upgrade() {
                Some(obj) => write!(f, "object {}", obj.borrow().class.name),
                None => write!(f, "object <dropped>"),
            },
            ScopeOwner::Function(name) => write!(f, "fn {}", name),
        }
    }
}

/// How a slot binds its value: direct storage or a get/set accessor pair.
#[derive(Debug, Clone)]
pub enum Binding {
    Stored(Value),
    Accessor {
        getter: Option<Rc<Overload>>,
        setter: Option<Rc<Overload>>,
    },
}

/// A named binding with constness, staticness, and accessibility.
#[derive(Debug, Clone)]
pub struct Slot {
    pub name: String,
    /// Accepted classes on assignment; empty means any.
    pub declared_types: Vec<ClassRef>,
    pub binding: Binding,
    pub is_constant: bool,
    pub is_static: bool,
    pub access: AccessLevel,
}

impl Slot {
    pub fn stored(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            declared_types: Vec::new(),
            binding: Binding::Stored(value),
            is_constant: false,
            is_static: false,
            access: AccessLevel::Public,
        }
    }

    pub fn constant(name: impl Into<String>, value: Value) -> Self {
        let mut slot = Self::stored(name, value);
        slot.is_constant = true;
        slot
    }

    pub fn with_access(mut self, access: AccessLevel) -> Self {
        self.access = access;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }
}

/// A result of name lookup: the slot (cloned) and the scope holding it.
pub struct LookupHit {
    pub slot: Slot,
    pub holder: ScopeRef,
}

/// A mutable mapping of names to slots.
#[derive(Debug, Default)]
pub struct Scope {
    slots: IndexMap<String, Slot, ahash::RandomState>,
    parent: Option<ScopeRef>,
    owner: ScopeOwner,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: Option<ScopeRef>, owner: ScopeOwner) -> Self {
        Self {
            slots: IndexMap::default(),
            parent,
            owner,
        }
    }

    pub fn shared(parent: Option<ScopeRef>, owner: ScopeOwner) -> ScopeRef {
        Rc::new(RefCell::new(Self::with_parent(parent, owner)))
    }

    pub fn parent(&self) -> Option<ScopeRef> {
        self.parent.clone()
    }

    pub fn owner(&self) -> &ScopeOwner {
        &self.owner
    }

    pub fn set_owner(&mut self, owner: ScopeOwner) {
        self.owner = owner;
    }

    /// Define or overwrite a slot in this scope.
    pub fn define(&mut self, slot: Slot) {
        self.slots.insert(slot.name.clone(), slot);
    }

    /// Define a plain stored variable.
    pub fn define_value(&mut self, name: impl Into<String>, value: Value) {
        let slot = Slot::stored(name, value);
        self.define(slot);
    }

    pub fn get_local(&self, name: &str) -> Option<Slot> {
        self.slots.get(name).cloned()
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Replace the stored value of a local slot, bypassing const and type
    /// checks. Used by bootstrap and by the evaluator after it has already
    /// validated the write.
    pub fn set_local(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.slots.get_mut(name) {
            slot.binding = Binding::Stored(value);
        }
    }

    /// Slots in declaration order; clones, so callers hold no borrow.
    pub fn entries(&self) -> Vec<Slot> {
        self.slots.values().cloned().collect()
    }
}

/// Walk the scope chain for a name.
pub fn lookup(scope: &ScopeRef, name: &str) -> Option<LookupHit> {
    let mut current = scope.clone();
    loop {
        if let Some(slot) = current.borrow().get_local(name) {
            return Some(LookupHit {
                slot,
                holder: current.clone(),
            });
        }
        let parent = current.borrow().parent();
        match parent {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

/// Walk the chain but stop once the lookup would leave the receiver's
/// object/class scopes. Used for member access, where a miss must not fall
/// through to enclosing lexical scopes.
pub fn lookup_member(scope: &ScopeRef, name: &str) -> Option<LookupHit> {
    let mut current = scope.clone();
    loop {
        let in_owner = matches!(
            current.borrow().owner(),
            ScopeOwner::Object(_) | ScopeOwner::Class(_)
        );
        if !in_owner {
            return None;
        }
        if let Some(slot) = current.borrow().get_local(name) {
            return Some(LookupHit {
                slot,
                holder: current.clone(),
            });
        }
        let parent = current.borrow().parent();
        match parent {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

/// Ancestor test: does `scope`'s chain pass through `target`? Decides
/// whether an access site sits inside a class body for private members.
pub fn contains_scope(scope: &ScopeRef, target: &ScopeRef) -> bool {
    let mut current = scope.clone();
    loop {
        if Rc::ptr_eq(&current, target) {
            return true;
        }
        let parent = current.borrow().parent();
        match parent {
            Some(parent) => current = parent,
            None => return false,
        }
    }
}

/// Nearest enclosing object receiver, walking up through function
/// activations.
pub fn nearest_this(scope: &ScopeRef) -> Option<Value> {
    let mut current = scope.clone();
    loop {
        let owner = current.borrow().owner().clone();
        if let ScopeOwner::Object(obj) = owner {
            if let Some(obj) = obj.upgrade() {
                return Some(Value::Object(obj));
            }
        }
        let parent = current.borrow().parent();
        match parent {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::class::{Class, Primitive};
    use crate::interpreter::value::Payload;

    fn int_class() -> ClassRef {
        Class::builtin("int", Primitive::Int, None)
    }

    fn int_value(class: &ClassRef, n: i64) -> Value {
        Value::Object(Object::allocate(class.clone(), Some(Payload::Int(n))))
    }

    #[test]
    fn lookup_walks_parent_chain() {
        let class = int_class();
        let root = Scope::shared(None, ScopeOwner::None);
        root.borrow_mut().define_value("x", int_value(&class, 1));
        let child = Scope::shared(Some(root.clone()), ScopeOwner::Function("f".into()));

        let hit = lookup(&child, "x").expect("x visible from child");
        assert!(Rc::ptr_eq(&hit.holder, &root));
        assert_eq!(lookup(&child, "y").map(|h| h.slot.name), None);
    }

    #[test]
    fn constant_slots_keep_their_flag_through_lookup() {
        let class = int_class();
        let root = Scope::shared(None, ScopeOwner::None);
        root.borrow_mut()
            .define(Slot::constant("k", int_value(&class, 7)));
        let child = Scope::shared(Some(root), ScopeOwner::None);

        let hit = lookup(&child, "k").unwrap();
        assert!(hit.slot.is_constant);
    }

    #[test]
    fn shadowing_resolves_to_innermost() {
        let class = int_class();
        let root = Scope::shared(None, ScopeOwner::None);
        root.borrow_mut().define_value("x", int_value(&class, 1));
        let child = Scope::shared(Some(root.clone()), ScopeOwner::None);
        child.borrow_mut().define_value("x", int_value(&class, 2));

        let hit = lookup(&child, "x").unwrap();
        assert!(Rc::ptr_eq(&hit.holder, &child));
        match hit.slot.binding {
            Binding::Stored(v) => assert_eq!(v.as_int(), Some(2)),
            _ => panic!("expected stored binding"),
        }
    }

    #[test]
    fn contains_scope_is_ancestor_test() {
        let root = Scope::shared(None, ScopeOwner::None);
        let mid = Scope::shared(Some(root.clone()), ScopeOwner::None);
        let leaf = Scope::shared(Some(mid.clone()), ScopeOwner::None);
        let stranger = Scope::shared(None, ScopeOwner::None);

        assert!(contains_scope(&leaf, &root));
        assert!(contains_scope(&leaf, &mid));
        assert!(!contains_scope(&root, &leaf));
        assert!(!contains_scope(&leaf, &stranger));
    }
}
