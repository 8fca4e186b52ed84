#![deny(missing_docs)]

//! # Decorators
//!
//! Reads decorator calls (`@api.route(":id")`) and the literal arguments
//! they carry. Only literal syntax is evaluated; anything else is skipped.

use super::SourceNode;
use crate::model::MiddlewareRef;
use serde_json::{Map, Number, Value};
use tracing::trace;

/// A decorator application.
#[derive(Debug, Clone)]
pub struct Decorator<'p> {
    /// Called name: the property of a member call (`api.route` -> `route`)
    /// or the identifier of a plain call.
    pub name: &'p str,
    /// Argument expressions.
    pub args: Vec<SourceNode<'p>>,
}

impl<'p> Decorator<'p> {
    /// Parses a `decorator` node.
    pub fn parse(node: SourceNode<'p>) -> Option<Self> {
        let expr = node.children().into_iter().next()?;
        let (callee, args) = match expr.kind() {
            "call_expression" => {
                let args = expr
                    .field("arguments")
                    .map(|a| a.children())
                    .unwrap_or_default();
                (expr.field("function")?, args)
            }
            _ => (expr, Vec::new()),
        };
        let name = match callee.kind() {
            "identifier" => callee.text(),
            "member_expression" => callee.field_text("property")?,
            _ => return None,
        };
        Some(Self { name, args })
    }

    /// Decorators applied to `node` through its `decorator` field, plus
    /// those on a wrapping `export` statement.
    pub fn of(node: SourceNode<'p>) -> Vec<Self> {
        let mut found: Vec<Self> = Vec::new();
        if let Some(parent) = node.parent().filter(|p| p.kind() == "export_statement") {
            found.extend(parent.fields("decorator").into_iter().filter_map(Self::parse));
        }
        found.extend(node.fields("decorator").into_iter().filter_map(Self::parse));
        found
    }

    /// Argument at `index` as a string literal.
    pub fn string_arg(&self, index: usize) -> Option<String> {
        self.args.get(index).and_then(|a| literal(*a)).and_then(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    /// Argument at `index` as a non-negative integer literal.
    pub fn count_arg(&self, index: usize) -> Option<usize> {
        self.args
            .get(index)
            .and_then(|a| literal(*a))
            .and_then(|v| v.as_u64())
            .and_then(|n| usize::try_from(n).ok())
    }

    /// String literals among the arguments, flattening array literals.
    pub fn string_args(&self) -> Vec<String> {
        let mut out = Vec::new();
        for arg in &self.args {
            match literal(*arg) {
                Some(Value::String(s)) => out.push(s),
                Some(Value::Array(items)) => {
                    out.extend(items.into_iter().filter_map(|i| match i {
                        Value::String(s) => Some(s),
                        _ => None,
                    }))
                }
                _ => trace!("Ignoring non-literal decorator argument: {}", arg.text()),
            }
        }
        out
    }
}

fn unescape(escape: &str) -> String {
    let mut chars = escape.chars().skip(1);
    match chars.next() {
        Some('n') => "\n".into(),
        Some('t') => "\t".into(),
        Some('r') => "\r".into(),
        Some('0') => "\0".into(),
        Some(c) => c.to_string(),
        None => String::new(),
    }
}

/// Evaluates a literal expression (string, number, boolean, null, array, object).
pub fn literal(node: SourceNode<'_>) -> Option<Value> {
    match node.kind() {
        "string" => {
            let mut text = String::new();
            for part in node.children() {
                match part.kind() {
                    "string_fragment" => text.push_str(part.text()),
                    "escape_sequence" => text.push_str(&unescape(part.text())),
                    _ => {}
                }
            }
            Some(Value::String(text))
        }
        "template_string" => {
            if node.children().iter().any(|c| c.kind() == "template_substitution") {
                return None;
            }
            Some(Value::String(node.text().trim_matches('`').to_string()))
        }
        "number" => number(node.text()),
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "null" | "undefined" => Some(Value::Null),
        "unary_expression" => {
            let operand = node.field("argument")?;
            match (node.field_text("operator")?, operand.kind()) {
                ("-", "number") => number(&format!("-{}", operand.text())),
                _ => None,
            }
        }
        "parenthesized_expression" => literal(node.children().into_iter().next()?),
        "array" => Some(Value::Array(
            node.children().into_iter().filter_map(literal).collect(),
        )),
        "object" => {
            let mut map = Map::new();
            for pair in node.children().into_iter().filter(|c| c.kind() == "pair") {
                let key = pair.field("key")?;
                let key = match key.kind() {
                    "string" => literal(key)?.as_str()?.to_string(),
                    _ => key.text().to_string(),
                };
                map.insert(key, literal(pair.field("value")?)?);
            }
            Some(Value::Object(map))
        }
        _ => None,
    }
}

fn number(text: &str) -> Option<Value> {
    let clean = text.replace('_', "");
    if let Ok(i) = clean.parse::<i64>() {
        return Some(Value::from(i));
    }
    clean
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Reads middleware references from a decorator argument.
///
/// Accepts a key string, an array of keys or `{ key, params }` objects, or a
/// builder arrow function `b => b.add("key", 1).add("other")`.
pub fn middleware_refs(node: SourceNode<'_>) -> Vec<MiddlewareRef> {
    match node.kind() {
        "arrow_function" | "function_expression" => {
            let mut refs = Vec::new();
            if let Some(body) = node.field("body") {
                collect_builder_calls(body, &mut refs);
            }
            refs
        }
        _ => match literal(node) {
            Some(Value::Array(items)) => items.into_iter().filter_map(value_ref).collect(),
            Some(value) => value_ref(value).into_iter().collect(),
            None => {
                trace!("Ignoring non-literal middleware argument: {}", node.text());
                Vec::new()
            }
        },
    }
}

fn value_ref(value: Value) -> Option<MiddlewareRef> {
    match value {
        Value::String(key) => Some(MiddlewareRef::key(key)),
        Value::Object(mut map) => {
            let key = map.remove("key")?.as_str()?.to_string();
            let params = match map.remove("params") {
                Some(Value::Array(params)) => params,
                _ => Vec::new(),
            };
            Some(MiddlewareRef::provider(key, params))
        }
        _ => None,
    }
}

fn collect_builder_calls(node: SourceNode<'_>, refs: &mut Vec<MiddlewareRef>) {
    match node.kind() {
        "call_expression" => {
            let Some(callee) = node.field("function") else {
                return;
            };
            if callee.kind() != "member_expression" || callee.field_text("property") != Some("add") {
                return;
            }
            if let Some(object) = callee.field("object") {
                collect_builder_calls(object, refs);
            }
            let args = node.field("arguments").map(|a| a.children()).unwrap_or_default();
            let mut values = args.into_iter().map(literal);
            if let Some(Some(Value::String(key))) = values.next() {
                let params: Vec<Value> = values.map(|v| v.unwrap_or(Value::Null)).collect();
                refs.push(MiddlewareRef::provider(key, params));
            }
        }
        "statement_block" | "expression_statement" | "parenthesized_expression" => {
            for child in node.children() {
                collect_builder_calls(child, refs);
            }
        }
        _ => {}
    }
}
