//! Function, class, and enum declarations.

use std::rc::Rc;

use crate::ast::*;
use crate::error::RuntimeError;
use crate::interpreter::class::{flatten_supers, Class, Primitive};
use crate::interpreter::scope::{Binding, Scope, ScopeOwner, Slot};
use crate::interpreter::value::{
    functions_value, FieldTemplate, FunctionSet, Overload, OverloadBody, Value,
};
use crate::interpreter::Interpreter;
use crate::span::Span;

use super::{RuntimeResult, Signal};

impl Interpreter {
    /// Declare a function overload. A repeated name in the same scope merges
    /// into the existing function set, replacing an overload with the same
    /// signature.
    pub(crate) fn execute_function_decl(&mut self, decl: &FunctionDecl) -> RuntimeResult<Signal> {
        let overload = self.build_overload(
            &decl.params,
            &decl.body,
            Some(self.scope.clone()),
            decl.is_static,
            decl.access,
            decl.span,
        )?;

        let existing = self.scope.borrow().get_local(&decl.name);
        match existing {
            Some(Slot {
                binding: Binding::Stored(Value::Functions(set)),
                ..
            }) => {
                set.borrow_mut().merge_overload(overload, true);
            }
            Some(_) => {
                return Err(RuntimeError::new(
                    format!("'{}' is already declared and is not a function", decl.name),
                    decl.span,
                ));
            }
            None => {
                let set = FunctionSet::single(decl.name.clone(), overload);
                self.scope
                    .borrow_mut()
                    .define(Slot::stored(decl.name.clone(), functions_value(set)));
            }
        }
        Ok(Signal::Normal(self.builtins.null()))
    }

    pub(crate) fn build_overload(
        &mut self,
        params: &[ParamDecl],
        body: &[Stmt],
        closure: Option<crate::interpreter::scope::ScopeRef>,
        is_static: bool,
        access: AccessLevel,
        span: Span,
    ) -> RuntimeResult<Rc<Overload>> {
        let params = self.resolve_params(params)?;
        Ok(Rc::new(Overload {
            params,
            body: OverloadBody::Ast(Rc::new(body.to_vec())),
            closure,
            is_static,
            access,
            span,
        }))
    }

    pub(crate) fn execute_class_decl(&mut self, decl: &ClassDecl) -> RuntimeResult<Signal> {
        if decl.is_static && !decl.supers.is_empty() {
            return Err(RuntimeError::type_error(
                format!("static class {} cannot inherit", decl.name),
                decl.span,
            ));
        }

        let class = Class::create(
            decl.name.clone(),
            Primitive::User,
            Some(self.scope.clone()),
            decl.is_static,
            decl.access,
        );
        // Visible inside its own body, so methods can name their class.
        self.scope
            .borrow_mut()
            .define(Slot::constant(decl.name.clone(), Value::Class(class.clone())));

        for member in &decl.members {
            match member {
                ClassMember::Field(field) => self.declare_field(&class, field)?,
                ClassMember::Method(method) => self.declare_method(&class, method)?,
                ClassMember::Constructor(ctor) => {
                    let overload = self.build_overload(
                        &ctor.params,
                        &ctor.body,
                        Some(class.members.clone()),
                        false,
                        ctor.access,
                        ctor.span,
                    )?;
                    class.ctor_set().borrow_mut().merge_overload(overload, true);
                }
                ClassMember::Property(property) => self.declare_property(&class, property)?,
            }
        }

        if !decl.supers.is_empty() {
            let supers = self.resolve_type_names(&decl.supers, decl.span)?;
            flatten_supers(&class, &supers, decl.span)?;
        }

        // Every user class sits under the object root.
        let object_root = self.builtins.object_class.clone();
        let mut ancestors = class.ancestors.borrow_mut();
        if !ancestors.iter().any(|a| Rc::ptr_eq(a, &object_root)) {
            ancestors.push(object_root);
        }
        drop(ancestors);

        Ok(Signal::Normal(self.builtins.null()))
    }

    fn declare_field(
        &mut self,
        class: &crate::interpreter::class::ClassRef,
        field: &FieldDecl,
    ) -> RuntimeResult<()> {
        let declared_types = self.resolve_type_names(&field.types, field.span)?;

        if field.is_static {
            let value = match &field.initializer {
                Some(init) => {
                    let scope = Scope::shared(Some(class.members.clone()), ScopeOwner::None);
                    let saved = std::mem::replace(&mut self.scope, scope);
                    let value = self.evaluate(init);
                    self.scope = saved;
                    value?
                }
                None => self.builtins.null(),
            };
            let mut slot = Slot::stored(field.name.clone(), value);
            slot.declared_types = declared_types;
            slot.is_constant = field.is_constant;
            slot.is_static = true;
            slot.access = field.access;
            class.members.borrow_mut().define(slot);
            return Ok(());
        }

        class.field_templates.borrow_mut().push(FieldTemplate {
            name: field.name.clone(),
            declared_types,
            initializer: field.initializer.clone(),
            is_constant: field.is_constant,
            access: field.access,
        });
        Ok(())
    }

    fn declare_method(
        &mut self,
        class: &crate::interpreter::class::ClassRef,
        method: &FunctionDecl,
    ) -> RuntimeResult<()> {
        let overload = self.build_overload(
            &method.params,
            &method.body,
            Some(class.members.clone()),
            method.is_static,
            method.access,
            method.span,
        )?;

        let existing = class.members.borrow().get_local(&method.name);
        match existing {
            Some(Slot {
                binding: Binding::Stored(Value::Functions(set)),
                ..
            }) => {
                set.borrow_mut().merge_overload(overload, true);
            }
            Some(_) => {
                return Err(RuntimeError::new(
                    format!("member '{}' is already declared", method.name),
                    method.span,
                ));
            }
            None => {
                let set = FunctionSet::single(method.name.clone(), overload);
                let slot = Slot::stored(method.name.clone(), functions_value(set))
                    .with_static(method.is_static)
                    .with_access(method.access);
                class.members.borrow_mut().define(slot);
            }
        }
        Ok(())
    }

    fn declare_property(
        &mut self,
        class: &crate::interpreter::class::ClassRef,
        property: &PropertyDecl,
    ) -> RuntimeResult<()> {
        let getter = match &property.getter {
            Some(body) => Some(self.build_overload(
                &[],
                body,
                Some(class.members.clone()),
                property.is_static,
                property.access,
                property.span,
            )?),
            None => None,
        };
        let setter = match &property.setter {
            Some((param, body)) => {
                let param = ParamDecl::untyped(param.clone(), property.span);
                Some(self.build_overload(
                    &[param],
                    body,
                    Some(class.members.clone()),
                    property.is_static,
                    property.access,
                    property.span,
                )?)
            }
            None => None,
        };

        let slot = Slot {
            name: property.name.clone(),
            declared_types: Vec::new(),
            binding: Binding::Accessor { getter, setter },
            is_constant: false,
            is_static: property.is_static,
            access: property.access,
        };
        class.members.borrow_mut().define(slot);
        Ok(())
    }

    /// An enum lowers to a static class of constant int members. Variants
    /// without an explicit value continue from the previous one.
    pub(crate) fn execute_enum_decl(&mut self, decl: &EnumDecl) -> RuntimeResult<Signal> {
        let class = Class::create(
            decl.name.clone(),
            Primitive::User,
            Some(self.scope.clone()),
            true,
            decl.access,
        );

        let mut next = 0i64;
        for (variant, explicit) in &decl.variants {
            let value = match explicit {
                Some(expr) => {
                    let value = self.evaluate(expr)?;
                    value.as_int().ok_or_else(|| {
                        RuntimeError::type_error(
                            format!("enum value for '{}' must be an int", variant),
                            expr.span,
                        )
                    })?
                }
                None => next,
            };
            next = value + 1;
            let slot = Slot::constant(variant.clone(), self.builtins.int(value)).with_static(true);
            class.members.borrow_mut().define(slot);
        }

        self.scope
            .borrow_mut()
            .define(Slot::constant(decl.name.clone(), Value::Class(class)));
        Ok(Signal::Normal(self.builtins.null()))
    }
}
