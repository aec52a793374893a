//! Expression engines

use super::value::Value;
use crate::odx::evaluation::Scope;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A compiled expression, callable against any scope
pub type CompiledExpr = Arc<dyn Fn(&Scope<'_>) -> Result<Value, ExprError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// The expression text could not be compiled
    Syntax { expr: String, message: String },
    /// The expression failed while running
    Evaluation(String),
}

impl ExprError {
    pub fn syntax(expr: &str, message: impl Into<String>) -> Self {
        ExprError::Syntax {
            expr: expr.to_string(),
            message: message.into(),
        }
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        ExprError::Evaluation(message.into())
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::Syntax { expr, message } => {
                write!(f, "Cannot compile '{}': {}", expr, message)
            }
            ExprError::Evaluation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ExprError {}

/// The injectable expression language
pub trait ExpressionEngine: Send + Sync {
    fn compile(&self, expr: &str) -> Result<CompiledExpr, ExprError>;
}

impl<E: ExpressionEngine + ?Sized> ExpressionEngine for Arc<E> {
    fn compile(&self, expr: &str) -> Result<CompiledExpr, ExprError> {
        (**self).compile(expr)
    }
}

/// An engine backed by closures registered per expression text
///
/// Expressions without a closure go to the fallback engine when one is set, and fail to
/// compile otherwise.
#[derive(Default, Clone)]
pub struct FnEngine {
    functions: HashMap<String, CompiledExpr>,
    fallback: Option<Arc<dyn ExpressionEngine>>,
}

impl FnEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, expr: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Scope<'_>) -> Result<Value, ExprError> + Send + Sync + 'static,
    {
        self.functions.insert(expr.into(), Arc::new(f));
        self
    }

    /// Register an expression that always yields the same value
    pub fn with_value(self, expr: impl Into<String>, value: Value) -> Self {
        self.with(expr, move |_| Ok(value.clone()))
    }

    pub fn or_else(mut self, engine: impl ExpressionEngine + 'static) -> Self {
        self.fallback = Some(Arc::new(engine));
        self
    }
}

impl fmt::Debug for FnEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FnEngine")
            .field("functions", &names)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl ExpressionEngine for FnEngine {
    fn compile(&self, expr: &str) -> Result<CompiledExpr, ExprError> {
        if let Some(f) = self.functions.get(expr) {
            return Ok(f.clone());
        }
        match &self.fallback {
            Some(engine) => engine.compile(expr),
            None => Err(ExprError::syntax(expr, "no such expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odx::evaluation::ScopeStack;
    use crate::odx::expression::PathEngine;
    use serde_json::json;

    #[test]
    fn test_fn_engine_calls_registered_closure() {
        let engine = FnEngine::new().with("twice", |scope| {
            let n = scope.this().as_i64().unwrap_or(0);
            Ok(Value::from_json(json!(n * 2)))
        });
        let stack = ScopeStack::with_root(json!(21));
        let compiled = engine.compile("twice").unwrap();

        assert_eq!(
            compiled(&stack.current().unwrap()).unwrap(),
            Value::from_json(json!(42))
        );
    }

    #[test]
    fn test_fn_engine_unknown_expression() {
        let err = FnEngine::new().compile("nope").err().unwrap();
        assert_eq!(err.to_string(), "Cannot compile 'nope': no such expression");
    }

    #[test]
    fn test_fn_engine_fallback() {
        let engine = FnEngine::new()
            .with_value("greeting", Value::text("hi"))
            .or_else(PathEngine::new());
        let stack = ScopeStack::with_root(json!({"name": "Ada"}));
        let scope = stack.current().unwrap();

        assert_eq!(
            engine.compile("greeting").unwrap()(&scope).unwrap(),
            Value::text("hi")
        );
        assert_eq!(
            engine.compile("name").unwrap()(&scope).unwrap(),
            Value::text("Ada")
        );
    }
}
