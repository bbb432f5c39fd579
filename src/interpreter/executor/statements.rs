//! Statement execution.

use crate::ast::*;
use crate::error::RuntimeError;
use crate::interpreter::iter::iterate;
use crate::interpreter::scope::{Scope, ScopeOwner, Slot};
use crate::interpreter::value::Value;
use crate::interpreter::Interpreter;
use crate::span::Span;

use super::{RuntimeResult, Signal};

impl Interpreter {
    /// Execute a statement, returning the control signal it produced.
    pub(crate) fn execute(&mut self, stmt: &Stmt) -> RuntimeResult<Signal> {
        match &stmt.kind {
            StmtKind::Expression(expr) => {
                let value = self.evaluate(expr)?;
                Ok(Signal::Normal(value))
            }

            StmtKind::Var(decl) => self.execute_var_decl(decl),

            StmtKind::Assign { targets, value } => {
                self.execute_assign(targets, value, stmt.span)
            }

            StmtKind::Block(statements) => {
                let scope = Scope::shared(Some(self.scope.clone()), ScopeOwner::None);
                self.execute_block(statements, scope)
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Signal::Normal(self.builtins.null()))
                }
            }

            StmtKind::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Signal::Break => break,
                        Signal::Continue | Signal::Normal(_) => {}
                        signal @ Signal::Return(_) => return Ok(signal),
                    }
                }
                Ok(Signal::Normal(self.builtins.null()))
            }

            StmtKind::For {
                names,
                iterable,
                body,
            } => self.execute_for(names, iterable, body),

            StmtKind::Switch {
                subject,
                cases,
                default,
            } => self.execute_switch(subject, cases, default.as_deref(), stmt.span),

            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => self.builtins.null(),
                };
                Ok(Signal::Return(value))
            }

            StmtKind::Break => Ok(Signal::Break),
            StmtKind::Continue => Ok(Signal::Continue),

            StmtKind::Throw(expr) => {
                let value = self.evaluate(expr)?;
                Err(self.fault_from_value(value, stmt.span))
            }

            StmtKind::Try {
                body,
                catches,
                finally,
            } => self.execute_try(body, catches, finally.as_deref()),

            StmtKind::Function(decl) => self.execute_function_decl(decl),
            StmtKind::Class(decl) => self.execute_class_decl(decl),
            StmtKind::Enum(decl) => self.execute_enum_decl(decl),
        }
    }

    fn execute_var_decl(&mut self, decl: &VarDecl) -> RuntimeResult<Signal> {
        let declared_types = self.resolve_type_names(&decl.types, decl.span)?;

        let values = match (&decl.initializer, decl.targets.len()) {
            (None, _) => vec![self.builtins.null(); decl.targets.len()],
            (Some(init), 1) => vec![self.evaluate(init)?],
            (Some(init), n) => {
                let value = self.evaluate(init)?;
                let items = iterate(self, &value, decl.span)?;
                self.spread_destructured(items, n, decl.span)
            }
        };

        for (name, value) in decl.targets.iter().zip(values) {
            if !declared_types.is_empty() {
                self.check_declared_types(name, &declared_types, &value, decl.span)?;
            }
            let mut slot = Slot::stored(name.clone(), value);
            slot.is_constant = decl.is_constant;
            slot.declared_types = declared_types.clone();
            self.scope.borrow_mut().define(slot);
        }
        Ok(Signal::Normal(self.builtins.null()))
    }

    /// Multi-target assignment through the iteration protocol.
    fn execute_assign(
        &mut self,
        targets: &[Expr],
        value: &Expr,
        span: Span,
    ) -> RuntimeResult<Signal> {
        let value = self.evaluate(value)?;
        if targets.len() == 1 {
            self.assign_to(&targets[0], value.clone())?;
            return Ok(Signal::Normal(value));
        }

        let items = iterate(self, &value, span)?;
        let values = self.spread_destructured(items, targets.len(), span);
        for (target, value) in targets.iter().zip(values) {
            self.assign_to(target, value)?;
        }
        Ok(Signal::Normal(self.builtins.null()))
    }

    /// Distribute `items` across `n` targets. On a count mismatch nothing
    /// is thrown: every target gets null except the last, which receives an
    /// Exception object describing the mismatch.
    pub(crate) fn spread_destructured(
        &mut self,
        items: Vec<Value>,
        n: usize,
        _span: Span,
    ) -> Vec<Value> {
        if items.len() == n {
            return items;
        }
        let mut values = vec![self.builtins.null(); n];
        let message = format!(
            "destructuring expected {} values, got {}",
            n,
            items.len()
        );
        values[n - 1] = self.builtins.exception(message, self.builtins.null());
        values
    }

    fn execute_for(
        &mut self,
        names: &[String],
        iterable: &Expr,
        body: &Stmt,
    ) -> RuntimeResult<Signal> {
        let span = iterable.span;
        let source = self.evaluate(iterable)?;
        let items = iterate(self, &source, span)?;

        for item in items {
            let scope = Scope::shared(Some(self.scope.clone()), ScopeOwner::None);
            if names.len() == 1 {
                scope.borrow_mut().define_value(names[0].clone(), item);
            } else {
                let parts = iterate(self, &item, span)?;
                let values = self.spread_destructured(parts, names.len(), span);
                for (name, value) in names.iter().zip(values) {
                    scope.borrow_mut().define_value(name.clone(), value);
                }
            }
            match self.execute_block_stmt(body, scope)? {
                Signal::Break => break,
                Signal::Continue | Signal::Normal(_) => {}
                signal @ Signal::Return(_) => return Ok(signal),
            }
        }
        Ok(Signal::Normal(self.builtins.null()))
    }

    fn execute_switch(
        &mut self,
        subject: &Expr,
        cases: &[SwitchCase],
        default: Option<&[Stmt]>,
        _span: Span,
    ) -> RuntimeResult<Signal> {
        let subject = self.evaluate(subject)?;

        for case in cases {
            for label in &case.labels {
                let candidate = self.evaluate(label)?;
                if self.values_equal(&subject, &candidate, label.span)? {
                    return self.execute_case_body(&case.body);
                }
            }
        }
        match default {
            Some(body) => self.execute_case_body(body),
            None => Ok(Signal::Normal(self.builtins.null())),
        }
    }

    /// A `break` inside a case exits the switch; return and continue pass
    /// through to the enclosing construct.
    fn execute_case_body(&mut self, body: &[Stmt]) -> RuntimeResult<Signal> {
        let scope = Scope::shared(Some(self.scope.clone()), ScopeOwner::None);
        match self.execute_block(body, scope)? {
            Signal::Break => Ok(Signal::Normal(self.builtins.null())),
            signal => Ok(signal),
        }
    }

    fn execute_try(
        &mut self,
        body: &[Stmt],
        catches: &[CatchClause],
        finally: Option<&[Stmt]>,
    ) -> RuntimeResult<Signal> {
        let scope = Scope::shared(Some(self.scope.clone()), ScopeOwner::None);
        let mut outcome = self.execute_block(body, scope);

        if let Err(err) = &outcome {
            if !err.is_fatal() {
                if let Some(clause) = self.matching_catch(catches, err)? {
                    let fault = self.fault_value(outcome.unwrap_err());
                    let scope = Scope::shared(Some(self.scope.clone()), ScopeOwner::None);
                    if let Some(name) = &clause.name {
                        scope.borrow_mut().define_value(name.clone(), fault);
                    }
                    outcome = self.execute_block(&clause.body, scope);
                }
            }
        }

        if let Some(finally) = finally {
            let scope = Scope::shared(Some(self.scope.clone()), ScopeOwner::None);
            let fin = self.execute_block(finally, scope);
            let pending_fatal = matches!(&outcome, Err(err) if err.is_fatal());
            match fin {
                Err(err) => {
                    if !pending_fatal || err.is_fatal() {
                        outcome = Err(err);
                    }
                }
                Ok(Signal::Normal(_)) => {}
                // A control signal from the finally block replaces whatever
                // was pending, including an in-flight fault.
                Ok(signal) => {
                    if !pending_fatal {
                        outcome = Ok(signal);
                    }
                }
            }
        }
        outcome
    }

    /// First catch clause whose declared types accept the fault. An empty
    /// type list is a catch-all.
    fn matching_catch<'c>(
        &mut self,
        catches: &'c [CatchClause],
        err: &RuntimeError,
    ) -> RuntimeResult<Option<&'c CatchClause>> {
        use crate::interpreter::class::is_type_or_sub_of;

        let fault_class = self.fault_class(err);
        for clause in catches {
            if clause.types.is_empty() {
                return Ok(Some(clause));
            }
            let accepted = self.resolve_type_names(&clause.types, clause.span)?;
            if accepted
                .iter()
                .any(|class| is_type_or_sub_of(&fault_class, class))
            {
                return Ok(Some(clause));
            }
        }
        Ok(None)
    }
}
