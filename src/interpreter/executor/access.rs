//! Member access, assignment targets, and receiver resolution.

use crate::ast::{AccessLevel, Expr, ExprKind};
use crate::error::RuntimeError;
use crate::interpreter::class::{is_type_or_sub_of, ClassRef};
use crate::interpreter::ops::ops_for;
use crate::interpreter::scope::{
    contains_scope, lookup, lookup_member, nearest_this, Binding, LookupHit, ScopeOwner, ScopeRef,
    Slot,
};
use crate::interpreter::value::{functions_value, Value};
use crate::interpreter::Interpreter;
use crate::span::Span;

use super::RuntimeResult;

impl Interpreter {
    pub(crate) fn evaluate_member(
        &mut self,
        object: &Expr,
        name: &str,
        safe: bool,
        span: Span,
    ) -> RuntimeResult<Value> {
        // `super.m` resolves through the flattened super and keeps `this`
        // as the receiver.
        if matches!(object.kind, ExprKind::Super) {
            return self.get_super_member(name, span);
        }
        let object = self.evaluate(object)?;
        if safe && object.is_null() {
            return Ok(self.builtins.null());
        }
        self.get_member(&object, name, span)
    }

    pub(crate) fn get_member(
        &mut self,
        object: &Value,
        name: &str,
        span: Span,
    ) -> RuntimeResult<Value> {
        match object {
            Value::Object(obj) => {
                let scope = obj.borrow().scope.clone();
                let hit = lookup_member(&scope, name).ok_or_else(|| {
                    RuntimeError::new(
                        format!("{} has no member '{}'", object.type_name(), name),
                        span,
                    )
                })?;
                self.check_member_access(&hit, name, span)?;
                self.read_member(hit, name, object.clone(), span)
            }
            Value::Class(class) => {
                let hit = lookup_member(&class.members, name).ok_or_else(|| {
                    RuntimeError::new(
                        format!("class {} has no member '{}'", class.name, name),
                        span,
                    )
                })?;
                self.check_member_access(&hit, name, span)?;
                self.read_member(hit, name, Value::Class(class.clone()), span)
            }
            Value::Functions(set) => match name {
                "name" => {
                    let name = set.borrow().name.clone();
                    Ok(self.builtins.str_value(name))
                }
                _ => Err(RuntimeError::new(
                    format!("functions have no member '{}'", name),
                    span,
                )),
            },
        }
    }

    /// Produce the member's value: function sets bind the receiver, getter
    /// slots run their getter.
    fn read_member(
        &mut self,
        hit: LookupHit,
        name: &str,
        receiver: Value,
        span: Span,
    ) -> RuntimeResult<Value> {
        match hit.slot.binding {
            Binding::Stored(Value::Functions(set)) => {
                let bound = set.borrow().bind(receiver);
                Ok(functions_value(bound))
            }
            Binding::Stored(value) => Ok(value),
            Binding::Accessor { getter, .. } => {
                let getter = getter.ok_or_else(|| {
                    RuntimeError::type_error(format!("'{}' is write-only", name), span)
                })?;
                self.call_overload(&getter, name, Some(receiver), Vec::new(), span)
            }
        }
    }

    fn get_super_member(&mut self, name: &str, span: Span) -> RuntimeResult<Value> {
        let this = nearest_this(&self.scope)
            .ok_or_else(|| RuntimeError::new("'super' outside of a method", span))?;
        let flattened = self.super_class_of(&this, span)?;
        let hit = lookup_member(&flattened.members, name).ok_or_else(|| {
            RuntimeError::new(format!("super has no member '{}'", name), span)
        })?;
        self.read_member(hit, name, this, span)
    }

    pub(crate) fn evaluate_this(&mut self, span: Span) -> RuntimeResult<Value> {
        nearest_this(&self.scope)
            .ok_or_else(|| RuntimeError::new("'this' outside of a method", span))
    }

    pub(crate) fn evaluate_super(&mut self, span: Span) -> RuntimeResult<Value> {
        let this = nearest_this(&self.scope)
            .ok_or_else(|| RuntimeError::new("'super' outside of a method", span))?;
        let flattened = self.super_class_of(&this, span)?;
        Ok(Value::Class(flattened))
    }

    /// The flattened record `super` refers to. Resolution starts at the
    /// class that declared the executing overload, so an inherited method
    /// running on a subclass instance chains from its own declaration site;
    /// outside such a frame the receiver's class decides.
    pub(crate) fn super_class_of(&self, this: &Value, span: Span) -> RuntimeResult<ClassRef> {
        let class = self
            .current_method_owner()
            .unwrap_or_else(|| self.class_of(this));
        let flattened = class.flattened_super.borrow().clone();
        flattened.ok_or_else(|| {
            RuntimeError::new(format!("class {} has no super", class.name), span)
        })
    }

    pub(crate) fn evaluate_index(
        &mut self,
        object: &Expr,
        index: &Expr,
        span: Span,
    ) -> RuntimeResult<Value> {
        let object = self.evaluate(object)?;
        let index = self.evaluate(index)?;
        let ops = ops_for(self.class_of(&object).primitive);
        ops.index_get(self, &object, &index, span)
    }

    /// Write a value through an assignment target.
    pub(crate) fn assign_to(&mut self, target: &Expr, value: Value) -> RuntimeResult<()> {
        match &target.kind {
            ExprKind::Name(name) => self.assign_name(name, value, target.span),
            ExprKind::Member { object, name, safe } => {
                let object = self.evaluate(object)?;
                if *safe && object.is_null() {
                    return Ok(());
                }
                self.assign_member(&object, name, value, target.span)
            }
            ExprKind::Index { object, index } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                let ops = ops_for(self.class_of(&object).primitive);
                ops.index_set(self, &object, &index, &value, target.span)
            }
            _ => Err(RuntimeError::type_error(
                "invalid assignment target",
                target.span,
            )),
        }
    }

    fn assign_name(&mut self, name: &str, value: Value, span: Span) -> RuntimeResult<()> {
        let hit = lookup(&self.scope, name)
            .ok_or_else(|| RuntimeError::unbound_name(name, span))?;
        match &hit.slot.binding {
            Binding::Stored(old) => {
                if hit.slot.is_constant && !old.is_null() {
                    return Err(RuntimeError::const_reassignment(name, span));
                }
                self.check_declared_types(name, &hit.slot.declared_types, &value, span)?;
                hit.holder.borrow_mut().set_local(name, value);
                Ok(())
            }
            Binding::Accessor { setter, .. } => {
                let setter = setter.clone().ok_or_else(|| {
                    RuntimeError::type_error(format!("'{}' is read-only", name), span)
                })?;
                let receiver = self.receiver_of(&hit.holder);
                self.call_overload(&setter, name, receiver, vec![value], span)?;
                Ok(())
            }
        }
    }

    pub(crate) fn assign_member(
        &mut self,
        object: &Value,
        name: &str,
        value: Value,
        span: Span,
    ) -> RuntimeResult<()> {
        match object {
            Value::Object(obj) => {
                let scope = obj.borrow().scope.clone();
                match lookup_member(&scope, name) {
                    Some(hit) => {
                        self.check_member_access(&hit, name, span)?;
                        match &hit.slot.binding {
                            Binding::Accessor { setter, .. } => {
                                let setter = setter.clone().ok_or_else(|| {
                                    RuntimeError::type_error(
                                        format!("'{}' is read-only", name),
                                        span,
                                    )
                                })?;
                                self.call_overload(
                                    &setter,
                                    name,
                                    Some(object.clone()),
                                    vec![value],
                                    span,
                                )?;
                                Ok(())
                            }
                            Binding::Stored(old) => {
                                if hit.slot.is_constant && !old.is_null() {
                                    return Err(RuntimeError::const_reassignment(name, span));
                                }
                                self.check_declared_types(
                                    name,
                                    &hit.slot.declared_types,
                                    &value,
                                    span,
                                )?;
                                // Instance writes to a non-static class slot
                                // land on the instance, not the shared class
                                // scope.
                                let holder_is_instance =
                                    std::rc::Rc::ptr_eq(&hit.holder, &scope);
                                if holder_is_instance || hit.slot.is_static {
                                    hit.holder.borrow_mut().set_local(name, value);
                                } else {
                                    let mut slot = hit.slot.clone();
                                    slot.binding = Binding::Stored(value);
                                    scope.borrow_mut().define(slot);
                                }
                                Ok(())
                            }
                        }
                    }
                    None => {
                        scope.borrow_mut().define(Slot::stored(name, value));
                        Ok(())
                    }
                }
            }
            Value::Class(class) => {
                let existing = class.members.borrow().get_local(name);
                match existing {
                    Some(slot) => {
                        if let Binding::Stored(old) = &slot.binding {
                            if slot.is_constant && !old.is_null() {
                                return Err(RuntimeError::const_reassignment(name, span));
                            }
                        }
                        self.check_declared_types(name, &slot.declared_types, &value, span)?;
                        class.members.borrow_mut().set_local(name, value);
                        Ok(())
                    }
                    None => {
                        class
                            .members
                            .borrow_mut()
                            .define(Slot::stored(name, value).with_static(true));
                        Ok(())
                    }
                }
            }
            Value::Functions(_) => Err(RuntimeError::type_error(
                "cannot assign members on a function",
                span,
            )),
        }
    }

    /// The receiver implied by the scope holding a slot.
    pub(crate) fn receiver_of(&self, holder: &ScopeRef) -> Option<Value> {
        match holder.borrow().owner() {
            ScopeOwner::Object(obj) => obj.upgrade().map(Value::Object),
            ScopeOwner::Class(class) => class.upgrade().map(Value::Class),
            _ => None,
        }
    }

    /// Enforce the member's access level against the current scope.
    ///
    /// Private members are reachable only from scopes chaining through the
    /// holding scope. Protected members additionally admit any access site
    /// whose `this` is an instance of the holder's class or a subtype.
    fn check_member_access(
        &self,
        hit: &LookupHit,
        name: &str,
        span: Span,
    ) -> RuntimeResult<()> {
        let access = hit.slot.access;
        if access == AccessLevel::Public {
            return Ok(());
        }
        if contains_scope(&self.scope, &hit.holder) {
            return Ok(());
        }
        if access == AccessLevel::Protected {
            if let Some(this) = nearest_this(&self.scope) {
                let this_class = self.class_of(&this);
                if let Some(holder_class) = self.owner_class(&hit.holder) {
                    if is_type_or_sub_of(&this_class, &holder_class)
                        || std::rc::Rc::ptr_eq(&this_class, &holder_class)
                    {
                        return Ok(());
                    }
                }
            }
        }
        Err(RuntimeError::AccessViolation {
            name: name.to_string(),
            access: access.to_string(),
            span,
        })
    }

    fn owner_class(&self, holder: &ScopeRef) -> Option<ClassRef> {
        match holder.borrow().owner() {
            ScopeOwner::Class(class) => class.upgrade(),
            ScopeOwner::Object(obj) => obj.upgrade().map(|o| o.borrow().class.clone()),
            _ => None,
        }
    }
}
