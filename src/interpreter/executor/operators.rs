//! Binary and unary operator evaluation.

use std::cmp::Ordering;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::interpreter::ops::ops_for;
use crate::interpreter::value::Value;
use crate::interpreter::Interpreter;
use crate::span::Span;

use super::RuntimeResult;

impl Interpreter {
    /// Operators dispatch on the left operand's class.
    pub(crate) fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: BinaryOp,
        right: &Expr,
        span: Span,
    ) -> RuntimeResult<Value> {
        let lhs = self.evaluate(left)?;
        let rhs = self.evaluate(right)?;
        let ops = ops_for(self.class_of(&lhs).primitive);

        match operator {
            BinaryOp::Add => ops.add(self, &lhs, &rhs, span),
            BinaryOp::Subtract => ops.subtract(self, &lhs, &rhs, span),
            BinaryOp::Multiply => ops.multiply(self, &lhs, &rhs, span),
            BinaryOp::Divide => ops.divide(self, &lhs, &rhs, span),
            BinaryOp::Modulo => ops.modulo(self, &lhs, &rhs, span),
            BinaryOp::Equal => {
                let eq = ops.equals(self, &lhs, &rhs, span)?;
                Ok(self.builtins.bool_value(eq))
            }
            BinaryOp::NotEqual => {
                let eq = ops.equals(self, &lhs, &rhs, span)?;
                Ok(self.builtins.bool_value(!eq))
            }
            BinaryOp::Less => {
                let ordering = ops.compare(self, &lhs, &rhs, span)?;
                Ok(self.builtins.bool_value(ordering == Ordering::Less))
            }
            BinaryOp::LessEqual => {
                let ordering = ops.compare(self, &lhs, &rhs, span)?;
                Ok(self.builtins.bool_value(ordering != Ordering::Greater))
            }
            BinaryOp::Greater => {
                let ordering = ops.compare(self, &lhs, &rhs, span)?;
                Ok(self.builtins.bool_value(ordering == Ordering::Greater))
            }
            BinaryOp::GreaterEqual => {
                let ordering = ops.compare(self, &lhs, &rhs, span)?;
                Ok(self.builtins.bool_value(ordering != Ordering::Less))
            }
        }
    }

    pub(crate) fn evaluate_unary(
        &mut self,
        operator: UnaryOp,
        operand: &Expr,
        span: Span,
    ) -> RuntimeResult<Value> {
        let value = self.evaluate(operand)?;
        match operator {
            UnaryOp::Negate => {
                let ops = ops_for(self.class_of(&value).primitive);
                ops.negate(self, &value, span)
            }
            UnaryOp::Not => Ok(self.builtins.bool_value(!value.is_truthy())),
        }
    }
}
