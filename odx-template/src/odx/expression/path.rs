//! A minimal path expression engine
//!
//! Grammar:
//!
//! ```text
//! expr      := unary (("==" | "!=") unary)?
//! unary     := ("!" | "not") unary | primary
//! primary   := string | number | "true" | "false" | "null" | current | path
//! current   := "this" | "." | "[]"
//! path      := name ("." segment)*
//! ```
//!
//! The first name of a path is looked up through the scope chain (item locals, then the
//! current object's members, then enclosing objects). Later segments index into the
//! value found: object members by key, array elements by position. A path that does not
//! resolve is [`Value::Missing`].
//!
//! A resolved object of the form `{"$insert": {"target": …, "contentType": …}}` is a
//! sub-document insertion request and evaluates to [`Value::Indirect`].

use super::engine::{CompiledExpr, ExprError, ExpressionEngine};
use super::value::Value;
use crate::odx::evaluation::Scope;
use crate::odx::indirect::IndirectVirtual;
use logos::Logos;
use serde_json::Value as Json;
use std::sync::Arc;

/// Expression tokens; whitespace between them is skipped
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"\s+")]
enum Token {
    #[regex(r#""([^"\\]|\\.)*""#, |lex| serde_json::from_str::<String>(lex.slice()).ok())]
    DoubleQuoted(String),
    #[regex(r"'([^'\\]|\\.)*'", |lex| unquote_single(lex.slice()))]
    SingleQuoted(String),
    #[regex(r"-?[0-9]+(\.[0-9]+)?", |lex| serde_json::from_str::<Json>(lex.slice()).ok())]
    Number(Json),

    #[token("==")]
    Equal,
    #[token("!=")]
    NotEqual,
    #[token("!")]
    #[token("not")]
    Not,

    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("this")]
    #[token("[]")]
    #[token(".")]
    Current,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z0-9_$]+)*", |lex| {
        lex.slice().split('.').map(str::to_string).collect::<Vec<_>>()
    })]
    Path(Vec<String>),
}

impl Token {
    fn literal(&self) -> Option<Json> {
        match self {
            Token::DoubleQuoted(s) | Token::SingleQuoted(s) => Some(Json::String(s.clone())),
            Token::Number(n) => Some(n.clone()),
            Token::True => Some(Json::Bool(true)),
            Token::False => Some(Json::Bool(false)),
            Token::Null => Some(Json::Null),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PathExpr {
    Literal(Json),
    Current,
    Path(Vec<String>),
    Not(Box<PathExpr>),
    Compare {
        left: Box<PathExpr>,
        right: Box<PathExpr>,
        negate: bool,
    },
}

fn tokenize(expr: &str) -> Result<Vec<Token>, ExprError> {
    let mut lexer = Token::lexer(expr);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(token),
            Err(()) => {
                return Err(ExprError::syntax(
                    expr,
                    format!("unexpected input '{}'", lexer.slice()),
                ))
            }
        }
    }

    Ok(tokens)
}

fn unquote_single(literal: &str) -> String {
    let inner = &literal[1..literal.len() - 1];
    inner.replace("\\'", "'").replace("\\\\", "\\")
}

struct Parser<'a> {
    expr: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse(expr: &'a str) -> Result<PathExpr, ExprError> {
        let tokens = tokenize(expr)?;
        if tokens.is_empty() {
            return Err(ExprError::syntax(expr, "empty expression"));
        }
        let mut parser = Parser {
            expr,
            tokens,
            pos: 0,
        };
        let parsed = parser.comparison()?;
        if parser.pos < parser.tokens.len() {
            return Err(ExprError::syntax(expr, "unexpected trailing input"));
        }
        Ok(parsed)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn comparison(&mut self) -> Result<PathExpr, ExprError> {
        let left = self.unary()?;
        let negate = match self.peek() {
            Some(Token::Equal) => false,
            Some(Token::NotEqual) => true,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.unary()?;
        Ok(PathExpr::Compare {
            left: Box::new(left),
            right: Box::new(right),
            negate,
        })
    }

    fn unary(&mut self) -> Result<PathExpr, ExprError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Ok(PathExpr::Not(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<PathExpr, ExprError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| ExprError::syntax(self.expr, "expression ends unexpectedly"))?;
        self.pos += 1;
        if let Some(json) = token.literal() {
            return Ok(PathExpr::Literal(json));
        }
        match token {
            Token::Current => Ok(PathExpr::Current),
            Token::Path(segments) => Ok(PathExpr::Path(segments)),
            other => Err(ExprError::syntax(
                self.expr,
                format!("unexpected operator {:?}", other),
            )),
        }
    }
}

fn member<'v>(value: &'v Json, segment: &str) -> Option<&'v Json> {
    match value {
        Json::Object(map) => map.get(segment),
        Json::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

impl PathExpr {
    fn eval(&self, scope: &Scope<'_>) -> Value {
        match self {
            PathExpr::Literal(json) => Value::from_json(json.clone()),
            PathExpr::Current => Value::from_json(scope.this().clone()),
            PathExpr::Path(segments) => {
                let Some((first, rest)) = segments.split_first() else {
                    return Value::Missing;
                };
                let found = scope
                    .lookup(first)
                    .and_then(|root| rest.iter().try_fold(root, |v, s| member(v, s)));
                found.map(resolved_value).unwrap_or(Value::Missing)
            }
            PathExpr::Not(inner) => Value::bool(!inner.eval(scope).truthy()),
            PathExpr::Compare {
                left,
                right,
                negate,
            } => {
                let equal = json_equal(&left.eval(scope).to_json(), &right.eval(scope).to_json());
                Value::bool(equal != *negate)
            }
        }
    }
}

const INSERT_KEY: &str = "$insert";

fn resolved_value(json: &Json) -> Value {
    if let Some(request) = json.as_object().and_then(|o| o.get(INSERT_KEY)) {
        if let Ok(indirect) = serde_json::from_value::<IndirectVirtual>(request.clone()) {
            return Value::Indirect(indirect);
        }
    }
    Value::from_json(json.clone())
}

/// Equality with numbers compared by value, so `1 == 1.0`
fn json_equal(a: &Json, b: &Json) -> bool {
    match (a, b) {
        (Json::Number(x), Json::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// The built-in path engine
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEngine;

impl PathEngine {
    pub fn new() -> Self {
        PathEngine
    }
}

impl ExpressionEngine for PathEngine {
    fn compile(&self, expr: &str) -> Result<CompiledExpr, ExprError> {
        let parsed = Parser::parse(expr)?;
        Ok(Arc::new(
            move |scope: &Scope<'_>| -> Result<Value, ExprError> { Ok(parsed.eval(scope)) },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odx::evaluation::ScopeStack;
    use rstest::rstest;
    use serde_json::json;

    fn eval(expr: &str, data: Json) -> Value {
        let stack = ScopeStack::with_root(data);
        let compiled = PathEngine::new().compile(expr).unwrap();
        let scope = stack.current().unwrap();
        compiled(&scope).unwrap()
    }

    #[rstest]
    #[case("Client.Name", json!({"Client": {"Name": "Ada"}}), json!("Ada"))]
    #[case("Items.1", json!({"Items": ["a", "b"]}), json!("b"))]
    #[case("'it\\'s'", json!({}), json!("it's"))]
    #[case("\"A\"", json!({}), json!("A"))]
    #[case("42", json!({}), json!(42))]
    #[case("!flag", json!({"flag": false}), json!(true))]
    #[case("not flag", json!({"flag": true}), json!(false))]
    #[case("Kind == 'dog'", json!({"Kind": "dog"}), json!(true))]
    #[case("Count != 2", json!({"Count": 2.0}), json!(false))]
    #[case("this", json!([1, 2]), json!([1, 2]))]
    #[case("[]", json!([1, 2]), json!([1, 2]))]
    #[case(".", json!("x"), json!("x"))]
    fn test_evaluates(#[case] expr: &str, #[case] data: Json, #[case] expected: Json) {
        assert_eq!(eval(expr, data), Value::from_json(expected));
    }

    #[rstest]
    #[case("Client.Missing")]
    #[case("Nope")]
    #[case("Client.Name.Deeper")]
    #[case("null")]
    fn test_missing(#[case] expr: &str) {
        assert!(eval(expr, json!({"Client": {"Name": "Ada"}})).is_missing());
    }

    #[rstest]
    #[case("")]
    #[case("a ==")]
    #[case("a b")]
    #[case("== a")]
    #[case("a + b")]
    fn test_syntax_errors(#[case] expr: &str) {
        let err = PathEngine::new().compile(expr).err().unwrap();
        assert!(matches!(err, ExprError::Syntax { .. }), "{expr}");
    }

    #[test]
    fn test_tokens() {
        let tokens = tokenize(" Client.Name != 'x'  ").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Path(vec!["Client".to_string(), "Name".to_string()]),
                Token::NotEqual,
                Token::SingleQuoted("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_keywords_only_match_whole_names() {
        assert_eq!(tokenize("not").unwrap(), vec![Token::Not]);
        assert_eq!(
            tokenize("nothing").unwrap(),
            vec![Token::Path(vec!["nothing".to_string()])]
        );
        assert_eq!(
            tokenize("this.Name").unwrap(),
            vec![Token::Path(vec!["this".to_string(), "Name".to_string()])]
        );
        assert_eq!(tokenize("-1.5").unwrap(), vec![Token::Number(json!(-1.5))]);
    }

    #[test]
    fn test_insert_marker_becomes_indirect() {
        let value = eval(
            "Clause",
            json!({"Clause": {"$insert": {"target": "clause.json", "scope": {"n": 1}, "contentType": "docx"}}}),
        );
        let Value::Indirect(indirect) = value else {
            panic!("expected an indirect, got {:?}", value);
        };
        assert_eq!(indirect.target, "clause.json");
        assert_eq!(indirect.scope, json!({"n": 1}));
    }

    #[test]
    fn test_malformed_insert_marker_is_plain_data() {
        let value = eval("Clause", json!({"Clause": {"$insert": 3}}));
        assert_eq!(value, Value::from_json(json!({"$insert": 3})));
    }

    #[test]
    fn test_lookup_falls_back_to_parent_object() {
        let mut stack = ScopeStack::with_root(json!({"Company": "Acme", "People": [{"Name": "Ada"}]}));
        stack.push_list(vec![json!({"Name": "Ada"})]).unwrap();
        stack.push_item(0, &Default::default()).unwrap();
        let scope = stack.current().unwrap();

        let name = PathEngine::new().compile("Name").unwrap();
        let company = PathEngine::new().compile("Company").unwrap();
        assert_eq!(name(&scope).unwrap(), Value::text("Ada"));
        assert_eq!(company(&scope).unwrap(), Value::text("Acme"));
    }
}
