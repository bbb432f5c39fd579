//! Class records and declaration-time inheritance flattening.
//!
//! Inheritance is resolved once, when a class declaration completes, by
//! copying ancestor members into the class. Method lookup afterwards is a
//! flat scope walk; `super` reaches the synthesized flattened-super record.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::AccessLevel;
use crate::error::RuntimeError;
use crate::interpreter::scope::{Binding, Scope, ScopeOwner, ScopeRef, Slot};
use crate::interpreter::value::{FieldTemplate, FunctionSet, FunctionsRef, Value};
use crate::span::Span;

pub type ClassRef = Rc<Class>;

/// Which built-in representation a class's instances carry. User classes
/// are `User`; the tag selects the operator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    User,
    Object,
    Null,
    Type,
    Function,
    Str,
    Int,
    Float,
    Decimal,
    Bool,
    Range,
    List,
    Dict,
    Iterator,
    Exception,
    Script,
    Json,
}

/// A named type descriptor. Immutable once its declaration body completes,
/// except for member addition performed by native bootstrap code — hence
/// the interior mutability on everything the bootstrap touches.
pub struct Class {
    pub name: String,
    pub members: ScopeRef,
    pub field_templates: RefCell<Vec<FieldTemplate>>,
    /// Transitive closure of declared ancestors.
    pub ancestors: RefCell<Vec<ClassRef>>,
    /// Synthesized merge of all ancestors, reached through `super`.
    pub flattened_super: RefCell<Option<ClassRef>>,
    pub ctor: RefCell<Option<FunctionsRef>>,
    pub primitive: Primitive,
    pub is_static: bool,
    pub access: AccessLevel,
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

impl Class {
    /// Create a class whose member scope chains to the declaration scope.
    pub fn create(
        name: impl Into<String>,
        primitive: Primitive,
        parent_scope: Option<ScopeRef>,
        is_static: bool,
        access: AccessLevel,
    ) -> ClassRef {
        let name = name.into();
        Rc::new_cyclic(|weak| {
            let members = Scope::shared(parent_scope, ScopeOwner::Class(weak.clone()));
            Class {
                name,
                members,
                field_templates: RefCell::new(Vec::new()),
                ancestors: RefCell::new(Vec::new()),
                flattened_super: RefCell::new(None),
                ctor: RefCell::new(None),
                primitive,
                is_static,
                access,
            }
        })
    }

    /// Shorthand used by the bootstrap for built-in classes.
    pub fn builtin(
        name: impl Into<String>,
        primitive: Primitive,
        parent_scope: Option<ScopeRef>,
    ) -> ClassRef {
        Self::create(name, primitive, parent_scope, false, AccessLevel::Public)
    }

    /// The constructor function set, created on first use.
    pub fn ctor_set(&self) -> FunctionsRef {
        let mut ctor = self.ctor.borrow_mut();
        ctor.get_or_insert_with(|| {
            Rc::new(RefCell::new(FunctionSet::new("new")))
        })
        .clone()
    }

    pub fn has_native_ctor(&self) -> bool {
        self.ctor
            .borrow()
            .as_ref()
            .map(|set| set.borrow().has_native())
            .unwrap_or(false)
    }
}

/// Subtype test over the flattened ancestor closure.
pub fn is_type_or_sub_of(class: &ClassRef, other: &ClassRef) -> bool {
    if Rc::ptr_eq(class, other) {
        return true;
    }
    class
        .ancestors
        .borrow()
        .iter()
        .any(|a| Rc::ptr_eq(a, other))
}

/// How a member copy merges into its destination.
pub struct CopyPolicy {
    /// Clamp Private slots to Protected (flattened-super copies).
    pub clamp_private: bool,
    /// Replace colliding members instead of keeping the existing ones.
    pub replace: bool,
    pub include_ctor: bool,
}

/// Copy `src`'s members, field templates, and (optionally) constructor
/// overloads into `dst`. Function sets merge overload-by-overload; an
/// overload with an exactly matching signature replaces only under the
/// replace policy.
pub fn copy_members(src: &ClassRef, dst: &ClassRef, policy: &CopyPolicy) {
    let entries = src.members.borrow().entries();
    for mut slot in entries {
        if policy.clamp_private && slot.access == AccessLevel::Private {
            slot.access = AccessLevel::Protected;
        }
        if let Binding::Stored(Value::Functions(src_set)) = &slot.binding {
            let existing = dst.members.borrow().get_local(&slot.name);
            match existing {
                Some(Slot {
                    binding: Binding::Stored(Value::Functions(dst_set)),
                    ..
                }) => {
                    dst_set
                        .borrow_mut()
                        .merge_from(&src_set.borrow(), policy.replace);
                }
                Some(_) if !policy.replace => {}
                _ => {
                    // Fresh copy so later merges never mutate the source set.
                    let copied = Rc::new(RefCell::new(src_set.borrow().clone()));
                    slot.binding = Binding::Stored(Value::Functions(copied));
                    dst.members.borrow_mut().define(slot);
                }
            }
            continue;
        }
        let present = dst.members.borrow().contains_local(&slot.name);
        if !present || policy.replace {
            dst.members.borrow_mut().define(slot);
        }
    }

    let src_templates = src.field_templates.borrow().clone();
    let mut dst_templates = dst.field_templates.borrow_mut();
    for template in src_templates {
        let mut template = template;
        if policy.clamp_private && template.access == AccessLevel::Private {
            template.access = AccessLevel::Protected;
        }
        match dst_templates.iter().position(|t| t.name == template.name) {
            Some(pos) if policy.replace => dst_templates[pos] = template,
            Some(_) => {}
            None => dst_templates.push(template),
        }
    }
    drop(dst_templates);

    if policy.include_ctor {
        let src_ctor = src.ctor.borrow().clone();
        if let Some(src_ctor) = src_ctor {
            let dst_ctor = dst.ctor_set();
            dst_ctor
                .borrow_mut()
                .merge_from(&src_ctor.borrow(), policy.replace);
        }
    }
}

/// Resolve inheritance for a freshly declared class.
///
/// Walks the declared supers in reverse declaration order, merging each
/// super's own members and then its flattened-super into a synthetic
/// record, with Private members clamped to Protected. First write wins, so
/// a super's overrides shadow the members it inherited, and a
/// later-declared super's members shadow an earlier one's. The flattened
/// record is then copied into the class itself, minus the constructor
/// entry, so direct lookups never traverse to it except through `super`.
pub fn flatten_supers(
    class: &ClassRef,
    supers: &[ClassRef],
    span: Span,
) -> Result<(), RuntimeError> {
    for sup in supers {
        if sup.has_native_ctor() {
            return Err(RuntimeError::UnsupportedInheritance(sup.name.clone(), span));
        }
        if sup.is_static {
            return Err(RuntimeError::type_error(
                format!("cannot inherit from static class '{}'", sup.name),
                span,
            ));
        }
    }

    let flat = Class::create(
        format!("{}.super", class.name),
        Primitive::User,
        None,
        false,
        AccessLevel::Public,
    );

    let merge = CopyPolicy {
        clamp_private: true,
        replace: false,
        include_ctor: true,
    };

    for sup in supers.iter().rev() {
        // The super's own members first: its overrides must beat the
        // inherited members carried by its flattened record.
        copy_members(sup, &flat, &merge);
        let flattened = sup.flattened_super.borrow().clone();
        if let Some(flattened) = flattened {
            copy_members(&flattened, &flat, &merge);
        }
    }

    let mut ancestors: Vec<ClassRef> = Vec::new();
    let mut remember = |candidate: &ClassRef| {
        if !ancestors.iter().any(|a| Rc::ptr_eq(a, candidate)) {
            ancestors.push(candidate.clone());
        }
    };
    for sup in supers {
        remember(sup);
        for ancestor in sup.ancestors.borrow().iter() {
            remember(ancestor);
        }
    }

    *class.ancestors.borrow_mut() = ancestors;
    *class.flattened_super.borrow_mut() = Some(flat.clone());

    copy_members(
        &flat,
        class,
        &CopyPolicy {
            clamp_private: false,
            replace: false,
            include_ctor: false,
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::value::{functions_value, Overload};

    fn user_class(name: &str) -> ClassRef {
        Class::create(name, Primitive::User, None, false, AccessLevel::Public)
    }

    fn method(class: &ClassRef, name: &str) -> Rc<Overload> {
        let overload = Overload::native(Vec::new(), Rc::new(|_, _, _| unreachable!()));
        class
            .members
            .borrow_mut()
            .define(Slot::stored(name, functions_value(FunctionSet::single(name, overload.clone()))));
        overload
    }

    fn overloads_of(class: &ClassRef, name: &str) -> Vec<Rc<Overload>> {
        match class.members.borrow().get_local(name) {
            Some(Slot {
                binding: Binding::Stored(Value::Functions(set)),
                ..
            }) => set.borrow().overloads.clone(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn later_declared_super_wins_on_collision() {
        let a = user_class("A");
        let b = user_class("B");
        let _m_a = method(&a, "m");
        let m_b = method(&b, "m");

        let d = user_class("D");
        flatten_supers(&d, &[a, b], Span::default()).unwrap();

        let survivors = overloads_of(&d, "m");
        assert_eq!(survivors.len(), 1);
        assert!(Rc::ptr_eq(&survivors[0], &m_b), "B's overload must win");
    }

    #[test]
    fn grandchild_resolves_the_parent_override() {
        let a = user_class("A");
        let _m_a = method(&a, "m");
        let b = user_class("B");
        let m_b = method(&b, "m");
        flatten_supers(&b, &[a], Span::default()).unwrap();

        let c = user_class("C");
        flatten_supers(&c, &[b], Span::default()).unwrap();

        let survivors = overloads_of(&c, "m");
        assert_eq!(survivors.len(), 1);
        assert!(Rc::ptr_eq(&survivors[0], &m_b), "B's override must win");
    }

    #[test]
    fn diamond_exposes_single_copy_of_root_members() {
        let a = user_class("A");
        let m_a = method(&a, "m");

        let b = user_class("B");
        flatten_supers(&b, &[a.clone()], Span::default()).unwrap();
        let c = user_class("C");
        flatten_supers(&c, &[a.clone()], Span::default()).unwrap();

        let d = user_class("D");
        flatten_supers(&d, &[b.clone(), c.clone()], Span::default()).unwrap();

        let survivors = overloads_of(&d, "m");
        assert_eq!(survivors.len(), 1, "diamond must not duplicate A's member");
        assert!(Rc::ptr_eq(&survivors[0], &m_a));

        let ancestors = d.ancestors.borrow();
        assert_eq!(ancestors.len(), 3);
        assert!(ancestors.iter().any(|x| Rc::ptr_eq(x, &a)));
    }

    #[test]
    fn subtype_test_covers_transitive_ancestors() {
        let a = user_class("A");
        let b = user_class("B");
        flatten_supers(&b, &[a.clone()], Span::default()).unwrap();
        let c = user_class("C");
        flatten_supers(&c, &[b.clone()], Span::default()).unwrap();

        assert!(is_type_or_sub_of(&c, &c));
        assert!(is_type_or_sub_of(&c, &b));
        assert!(is_type_or_sub_of(&c, &a));
        assert!(!is_type_or_sub_of(&a, &c));
    }

    #[test]
    fn native_constructor_blocks_inheritance() {
        let base = user_class("base");
        base.ctor_set().borrow_mut().merge_overload(
            Overload::native(Vec::new(), Rc::new(|_, _, _| unreachable!())),
            true,
        );

        let child = user_class("child");
        let err = flatten_supers(&child, &[base], Span::default()).unwrap_err();
        assert!(matches!(err, RuntimeError::UnsupportedInheritance(..)));
    }

    #[test]
    fn private_members_clamp_to_protected_through_flattening() {
        let a = user_class("A");
        a.members.borrow_mut().define(
            Slot::stored("secret", functions_value(FunctionSet::new("secret")))
                .with_access(AccessLevel::Private),
        );
        let b = user_class("B");
        flatten_supers(&b, &[a], Span::default()).unwrap();
        let c = user_class("C");
        flatten_supers(&c, &[b], Span::default()).unwrap();

        // Inherited at any depth, the slot is at most Protected.
        let slot = c.members.borrow().get_local("secret").unwrap();
        assert_eq!(slot.access, AccessLevel::Protected);
    }
}
