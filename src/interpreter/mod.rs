//! The tree-walking evaluator.

pub mod builtins;
pub mod class;
pub mod executor;
pub mod iter;
pub mod ops;
pub mod overloads;
pub mod scope;
pub mod value;

use colored::Colorize;

use crate::ast::{Program, Stmt, StmtKind};
use crate::error::RuntimeError;
use crate::span::Span;

use builtins::Builtins;
use class::ClassRef;
use executor::{RuntimeResult, Signal};
use scope::{Scope, ScopeOwner, ScopeRef, Slot};
use value::{NativeFn, Parameter, Value};

/// Interpreted call depth at which evaluation aborts with a fatal error.
/// Each interpreted frame costs several host frames, so the limit sits far
/// below what a 2 MiB thread stack can hold.
const MAX_CALL_DEPTH: usize = 100;

/// How a program run behaves at its edges.
#[derive(Debug, Clone, Copy)]
pub struct InterpretOptions {
    /// Marks the program as the process entry point (exposed to scripts as
    /// `Script.is_main`).
    pub is_main: bool,
    /// Propagate faults to the caller instead of reporting and swallowing
    /// them.
    pub throw_on_fault: bool,
    /// Echo the value of top-level expression statements, REPL style.
    pub print_top_level: bool,
}

impl Default for InterpretOptions {
    fn default() -> Self {
        Self {
            is_main: false,
            throw_on_fault: true,
            print_top_level: false,
        }
    }
}

/// The evaluator: a current scope, the global scope, and the built-in class
/// graph.
pub struct Interpreter {
    pub(crate) scope: ScopeRef,
    pub(crate) globals: ScopeRef,
    pub builtins: Builtins,
    depth: usize,
    /// Per interpreted frame, the class that declared the executing
    /// overload. `super` resolves against it, so an inherited method or
    /// constructor chains upward from its declaration site rather than
    /// from the receiver's class.
    method_owners: Vec<Option<ClassRef>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Scope::shared(None, ScopeOwner::None);
        let builtins = Builtins::bootstrap(&globals);
        Self {
            scope: globals.clone(),
            globals,
            builtins,
            depth: 0,
            method_owners: Vec::new(),
        }
    }

    /// Run a program and produce the value of its last statement.
    pub fn interpret(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        self.interpret_with_options(program, InterpretOptions::default())
    }

    pub fn interpret_with_options(
        &mut self,
        program: &Program,
        options: InterpretOptions,
    ) -> Result<Value, RuntimeError> {
        let is_main = self.builtins.bool_value(options.is_main);
        self.builtins
            .script_class
            .members
            .borrow_mut()
            .define(Slot::constant("is_main", is_main).with_static(true));

        let result = self.run_program(program, options.print_top_level);
        match result {
            Ok(value) => Ok(value),
            Err(err) if options.throw_on_fault || err.is_fatal() => Err(err),
            Err(err) => {
                self.report_fault(&err);
                Ok(self.builtins.null())
            }
        }
    }

    fn run_program(
        &mut self,
        program: &Program,
        print_top_level: bool,
    ) -> Result<Value, RuntimeError> {
        let mut last = self.builtins.null();
        for stmt in &program.statements {
            match self.execute(stmt)? {
                Signal::Normal(value) => {
                    if print_top_level
                        && matches!(stmt.kind, StmtKind::Expression(_))
                        && !value.is_null()
                    {
                        let text = self.display_value(&value, stmt.span)?;
                        println!("{}", text);
                    }
                    last = value;
                }
                Signal::Return(_) | Signal::Break | Signal::Continue => {
                    return Err(RuntimeError::new(
                        "control signal outside of its construct",
                        stmt.span,
                    ));
                }
            }
        }
        Ok(last)
    }

    /// Script-mode entry: run, report any fault with its cause chain, and
    /// produce the process exit code.
    pub fn run_script(&mut self, program: &Program) -> i32 {
        let options = InterpretOptions {
            is_main: true,
            throw_on_fault: true,
            print_top_level: false,
        };
        match self.interpret_with_options(program, options) {
            Ok(_) => 0,
            Err(err) => {
                self.report_fault(&err);
                if err.is_fatal() {
                    2
                } else {
                    1
                }
            }
        }
    }

    fn report_fault(&mut self, err: &RuntimeError) {
        eprintln!("{} {}", "error:".red().bold(), err);
        if let RuntimeError::Fault { value, .. } = err {
            let mut cause = self
                .get_member(value, "cause", Span::default())
                .unwrap_or_else(|_| self.builtins.null());
            while !cause.is_null() {
                let text = self
                    .display_value(&cause, Span::default())
                    .unwrap_or_else(|_| cause.to_string());
                eprintln!("{} {}", "caused by:".yellow(), text);
                cause = self
                    .get_member(&cause, "cause", Span::default())
                    .unwrap_or_else(|_| self.builtins.null());
            }
        }
    }

    // Registration points for host code.

    /// Define a global native function.
    pub fn register_native_function(&mut self, name: &str, params: Vec<Parameter>, f: NativeFn) {
        let value = builtins::native_function(name, params, f);
        self.globals.borrow_mut().define(Slot::stored(name, value));
    }

    /// Define a host-built class as a global.
    pub fn register_class(&mut self, class: ClassRef) {
        self.globals.borrow_mut().define(Slot::constant(
            class.name.clone(),
            Value::Class(class),
        ));
    }

    /// Attach a native method to an existing class.
    pub fn add_native_method(
        &mut self,
        class: &ClassRef,
        name: &str,
        params: Vec<Parameter>,
        f: NativeFn,
    ) {
        builtins::add_method(class, name, params, f);
    }

    // Shared plumbing used across the executor.

    /// The class of any value. Function sets and classes report their
    /// built-in descriptor classes.
    pub fn class_of(&self, value: &Value) -> ClassRef {
        match value {
            Value::Object(obj) => obj.borrow().class.clone(),
            Value::Functions(_) => self.builtins.function_class.clone(),
            Value::Class(_) => self.builtins.type_class.clone(),
        }
    }

    /// Wrap a host-side failure as a catchable fault carrying an Exception.
    pub fn host_fault(&mut self, message: impl Into<String>, span: Span) -> RuntimeError {
        let message = message.into();
        let value = self.builtins.exception(message.clone(), self.builtins.null());
        RuntimeError::Fault {
            value,
            message,
            span,
        }
    }

    /// The fault for a `throw`n value. Non-object throws are legal; the
    /// message falls back to the value's display form.
    pub(crate) fn fault_from_value(&mut self, value: Value, span: Span) -> RuntimeError {
        let message = self
            .display_value(&value, span)
            .unwrap_or_else(|_| value.to_string());
        RuntimeError::Fault {
            value,
            message,
            span,
        }
    }

    /// The language value a catch clause binds for a fault. Bind-time and
    /// host errors materialize as Exception objects here.
    pub(crate) fn fault_value(&mut self, err: RuntimeError) -> Value {
        match err {
            RuntimeError::Fault { value, .. } => value,
            other => self
                .builtins
                .exception(other.to_string(), self.builtins.null()),
        }
    }

    pub(crate) fn fault_class(&self, err: &RuntimeError) -> ClassRef {
        match err {
            RuntimeError::Fault { value, .. } => self.class_of(value),
            _ => self.builtins.exception_class.clone(),
        }
    }

    /// Equality through the left value's class.
    pub(crate) fn values_equal(
        &mut self,
        left: &Value,
        right: &Value,
        span: Span,
    ) -> RuntimeResult<bool> {
        let ops = ops::ops_for(self.class_of(left).primitive);
        ops.equals(self, left, right, span)
    }

    /// Human-readable form of a value. Objects with a `ToStr` method use
    /// it; everything else uses the built-in display.
    pub fn display_value(&mut self, value: &Value, span: Span) -> RuntimeResult<String> {
        if let Value::Object(obj) = value {
            let plain = obj.borrow().payload.is_some() || value.is_null();
            if !plain {
                if let Some(text) = self.invoke_method(value, "ToStr", Vec::new(), span)? {
                    if let Some(text) = text.as_str() {
                        return Ok(text);
                    }
                }
            }
        }
        Ok(value.to_string())
    }

    /// Run statements in the given scope, restoring the previous scope on
    /// the way out.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        scope: ScopeRef,
    ) -> RuntimeResult<Signal> {
        let saved = std::mem::replace(&mut self.scope, scope);
        let mut result = Ok(Signal::Normal(self.builtins.null()));
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Signal::Normal(_)) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }
        self.scope = saved;
        result
    }

    /// Run one statement (typically a loop body) in the given scope.
    pub(crate) fn execute_block_stmt(
        &mut self,
        stmt: &Stmt,
        scope: ScopeRef,
    ) -> RuntimeResult<Signal> {
        let saved = std::mem::replace(&mut self.scope, scope);
        let result = self.execute(stmt);
        self.scope = saved;
        result
    }

    pub(crate) fn enter_call(&mut self, span: Span) -> RuntimeResult<()> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::StackOverflow(span));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn exit_call(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn push_method_owner(&mut self, owner: Option<ClassRef>) {
        self.method_owners.push(owner);
    }

    pub(crate) fn pop_method_owner(&mut self) {
        self.method_owners.pop();
    }

    /// The class that declared the innermost interpreted frame, if any.
    pub(crate) fn current_method_owner(&self) -> Option<ClassRef> {
        self.method_owners.last().cloned().flatten()
    }
}
