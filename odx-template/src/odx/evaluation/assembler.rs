//! The XML-producing host
//!
//! `XmlAssembler` is the [`Host`] that turns an evaluation walk into the output data
//! document. It owns the scope stack, evaluates expressions through the injected engine
//! and collects missing values, errors and indirect insertions along the way. No single
//! failing expression stops the walk: failures are recorded and rendered inline.

use super::host::Host;
use super::result::EvaluationResult;
use super::scope::ScopeStack;
use super::xml::{XmlElement, ROOT_ELEMENT};
use super::EvaluatorOptions;
use crate::odx::expression::{CompiledExpr, ExprError, ExpressionEngine, Value};
use crate::odx::fields::node::PUNCTUATION_EXPR;
use crate::odx::indirect::IndirectRegistry;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::fmt::Write;
use tracing::{debug, warn};

const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d";

struct OpenList {
    atom: String,
    /// Whether a list frame was pushed for it
    pushed: bool,
}

pub struct XmlAssembler<'e> {
    engine: &'e dyn ExpressionEngine,
    options: &'e EvaluatorOptions,
    data: Json,
    scopes: ScopeStack,
    elements: Vec<XmlElement>,
    finished: Option<XmlElement>,
    lists: Vec<OpenList>,
    compiled: HashMap<String, Result<CompiledExpr, ExprError>>,
    missing: Vec<String>,
    errors: Vec<String>,
    registry: IndirectRegistry,
}

impl<'e> XmlAssembler<'e> {
    pub fn new(engine: &'e dyn ExpressionEngine, data: Json, options: &'e EvaluatorOptions) -> Self {
        Self {
            engine,
            options,
            data,
            scopes: ScopeStack::new(),
            elements: Vec::new(),
            finished: None,
            lists: Vec::new(),
            compiled: HashMap::new(),
            missing: Vec::new(),
            errors: Vec::new(),
            registry: IndirectRegistry::new(options.placeholder_base.clone()),
        }
    }

    /// The completed root element, once the top-level object has ended
    pub fn root(&self) -> Option<&XmlElement> {
        self.finished.as_ref()
    }

    pub fn finish(self) -> EvaluationResult {
        let root = self
            .finished
            .unwrap_or_else(|| XmlElement::new(ROOT_ELEMENT));
        debug!(
            missing = self.missing.len(),
            errors = self.errors.len(),
            indirects = self.registry.entries().len(),
            "evaluation finished"
        );
        EvaluationResult {
            has_errors: !self.errors.is_empty(),
            missing: self.missing,
            errors: self.errors,
            document: root.to_document(),
            indirects: self.registry.into_entries(),
        }
    }

    fn compile(&mut self, expr: &str) -> Result<CompiledExpr, ExprError> {
        if let Some(compiled) = self.compiled.get(expr) {
            return compiled.clone();
        }
        let compiled = self.engine.compile(expr);
        self.compiled.insert(expr.to_string(), compiled.clone());
        compiled
    }

    /// Evaluate against the current scope; nested results are merged and unwrapped
    fn evaluate(&mut self, expr: &str) -> Result<Value, String> {
        let value = if expr == PUNCTUATION_EXPR {
            let scope = self.scopes.current().map_err(|e| e.to_string())?;
            scope
                .local(PUNCTUATION_EXPR)
                .cloned()
                .map(Value::from_json)
                .unwrap_or(Value::Missing)
        } else {
            let compiled = self.compile(expr).map_err(|e| e.to_string())?;
            let scope = self.scopes.current().map_err(|e| e.to_string())?;
            compiled(&scope).map_err(|e| e.to_string())?
        };
        Ok(self.unwrap_nested(value))
    }

    fn unwrap_nested(&mut self, value: Value) -> Value {
        match value {
            Value::Result(nested) => {
                let nested = *nested;
                for expr in nested.missing {
                    self.note_missing(&expr);
                }
                self.errors.extend(nested.errors);
                self.unwrap_nested(nested.value)
            }
            other => other,
        }
    }

    fn note_missing(&mut self, expr: &str) {
        if !self.missing.iter().any(|m| m == expr) {
            self.missing.push(expr.to_string());
        }
    }

    fn note_error(&mut self, expr: &str, message: &str) -> String {
        warn!(%expr, "{}", message);
        self.errors.push(format!("{}: {}", expr, message));
        format!("*** {} ***", message)
    }

    /// Text for a value; `None` means no element at all
    fn render(&mut self, expr: &str, value: Value) -> Option<String> {
        match value {
            Value::Missing => {
                self.note_missing(expr);
                Some(format!("[{}]", expr))
            }
            Value::Data(Json::String(s)) if s.is_empty() => None,
            Value::Data(Json::String(s)) => Some(s),
            Value::Data(Json::Bool(b)) => Some(b.to_string()),
            Value::Data(Json::Number(n)) => Some(n.to_string()),
            Value::Data(Json::Null) => {
                self.note_missing(expr);
                Some(format!("[{}]", expr))
            }
            Value::Data(other) => Some(other.to_string()),
            Value::Date(date) => Some(self.format_date(date)),
            Value::Indirect(indirect) => Some(self.registry.substitute(indirect)),
            Value::Result(nested) => {
                let inner = self.unwrap_nested(Value::Result(nested));
                self.render(expr, inner)
            }
        }
    }

    fn format_date(&self, date: chrono::NaiveDate) -> String {
        let mut out = String::new();
        if write!(out, "{}", date.format(&self.options.date_format)).is_ok() {
            return out;
        }
        warn!(format = %self.options.date_format, "invalid date format, using the default");
        date.format(FALLBACK_DATE_FORMAT).to_string()
    }

    fn current_element(&mut self) -> Option<&mut XmlElement> {
        self.elements.last_mut()
    }

    fn already_written(&self, atom: &str) -> bool {
        self.elements.last().is_some_and(|e| e.has_child(atom))
    }

    fn write(&mut self, atom: &str, text: String) {
        if let Some(element) = self.current_element() {
            element.children.push(XmlElement::with_text(atom, text));
        }
    }

    fn close_element(&mut self) {
        let Some(element) = self.elements.pop() else {
            return;
        };
        match self.elements.last_mut() {
            Some(parent) => parent.children.push(element),
            None => self.finished = Some(element),
        }
    }
}

impl Host for XmlAssembler<'_> {
    fn begin_object(&mut self, index: Option<usize>) {
        match index {
            None => {
                self.scopes.push_object(self.data.clone());
                self.elements.push(XmlElement::new(ROOT_ELEMENT));
            }
            Some(i) => {
                if let Err(e) = self.scopes.push_item(i, &self.options.punctuation) {
                    self.note_error("item", &e.to_string());
                    self.scopes.push_object(Json::Null);
                }
                let name = self
                    .lists
                    .last()
                    .map(|l| format!("{}i", l.atom))
                    .unwrap_or_else(|| "item".to_string());
                self.elements.push(XmlElement::new(name));
            }
        }
    }

    fn end_object(&mut self) {
        self.scopes.pop();
        self.close_element();
    }

    fn define(&mut self, atom: &str, expr: &str) {
        if self.already_written(atom) {
            return;
        }
        let text = match self.evaluate(expr) {
            Ok(value) => self.render(expr, value),
            Err(message) => Some(self.note_error(expr, &message)),
        };
        if let Some(text) = text {
            self.write(atom, text);
        }
    }

    fn begin_condition(&mut self, atom: &str, expr: &str) -> bool {
        let truth = match self.evaluate(expr) {
            Ok(Value::Missing) => {
                self.note_missing(expr);
                false
            }
            Ok(value) => value.truthy(),
            Err(message) => {
                self.note_error(expr, &message);
                false
            }
        };
        if !self.already_written(atom) {
            self.write(atom, truth.to_string());
        }
        truth
    }

    fn begin_list(&mut self, atom: &str, expr: &str) -> usize {
        let mut list_element = XmlElement::new(atom);
        let items = match self.evaluate(expr).map(|v| self.unwrap_nested(v)) {
            Ok(Value::Data(Json::Array(items))) => items,
            Ok(Value::Missing | Value::Data(Json::Null)) => {
                self.note_missing(expr);
                Vec::new()
            }
            Ok(_) => {
                let message = format!("'{}' is not a list", expr);
                list_element.text = Some(self.note_error(expr, &message));
                Vec::new()
            }
            Err(message) => {
                list_element.text = Some(self.note_error(expr, &message));
                Vec::new()
            }
        };

        let (count, pushed) = match self.scopes.push_list(items) {
            Ok(count) => (count, true),
            Err(e) => {
                list_element.text = Some(self.note_error(expr, &e.to_string()));
                (0, false)
            }
        };
        self.lists.push(OpenList {
            atom: atom.to_string(),
            pushed,
        });
        self.elements.push(list_element);
        count
    }

    fn end_list(&mut self) {
        if let Some(list) = self.lists.pop() {
            if list.pushed {
                self.scopes.pop();
            }
        }
        self.close_element();
    }
}
