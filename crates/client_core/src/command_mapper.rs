//! Route table translating REST-shaped operations into local command calls.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::types::{Method, Operation};

pub const FALLBACK_COMMAND: &str = "http_request";

#[derive(Debug, Clone, PartialEq)]
pub struct CommandCall {
    pub command: &'static str,
    pub args: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    Param(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RoutePattern {
    Segments(Vec<Segment>),
    Any,
}

impl RoutePattern {
    /// `/api/article/:id` style; `:name` marks a captured segment.
    fn parse(pattern: &'static str) -> Self {
        Self::Segments(
            pattern
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(|segment| match segment.strip_prefix(':') {
                    Some(name) => Segment::Param(name),
                    None => Segment::Literal(segment),
                })
                .collect(),
        )
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Segments(segments) if segments.iter().all(|s| matches!(s, Segment::Literal(_))) => 0,
            Self::Segments(_) => 1,
            Self::Any => 2,
        }
    }

    fn matches(&self, path: &str) -> Option<RouteMatch> {
        let segments = match self {
            Self::Any => return Some(RouteMatch::default()),
            Self::Segments(segments) => segments,
        };
        let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
        if parts.len() != segments.len() {
            return None;
        }

        let mut captured = RouteMatch::default();
        for (segment, part) in segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if *literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    let value = urlencoding::decode(part)
                        .map(|decoded| decoded.into_owned())
                        .unwrap_or_else(|_| part.to_string());
                    captured.params.insert(name, value);
                }
            }
        }
        Some(captured)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    params: BTreeMap<&'static str, String>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> &str {
        self.params.get(name).map(String::as_str).unwrap_or_default()
    }
}

/// Everything an argument builder can draw from.
pub struct BindingInput<'a> {
    pub route: &'a RouteMatch,
    pub operation: &'a Operation,
    pub path: &'a str,
    pub params: &'a BTreeMap<String, String>,
    pub token: &'a str,
}

type ArgsBuilder = fn(&BindingInput<'_>) -> Value;

struct Binding {
    method: Option<Method>,
    pattern: RoutePattern,
    command: &'static str,
    build: ArgsBuilder,
}

pub struct CommandMapper {
    bindings: Vec<Binding>,
}

impl Default for CommandMapper {
    fn default() -> Self {
        Self::standard()
    }
}

impl CommandMapper {
    pub fn standard() -> Self {
        let mut bindings = vec![
            route(Method::Post, "/api/register", "register", |input| {
                json!({ "user_info": body(input) })
            }),
            route(Method::Post, "/api/login", "login", |input| {
                json!({ "credentials": body(input) })
            }),
            route(Method::Get, "/api/users", "get_users", |input| {
                let mut args = token_args(input);
                if let Some(limit) = input.params.get("limit") {
                    let limit = limit
                        .parse::<i64>()
                        .map(Value::from)
                        .unwrap_or_else(|_| Value::String(limit.clone()));
                    args.insert("limit".into(), limit);
                }
                Value::Object(args)
            }),
            route(Method::Delete, "/api/users/:id", "delete_user", |input| {
                json!({ "token": input.token, "user_id": input.route.param("id") })
            }),
            route(Method::Put, "/api/editAccount", "edit_account", |input| {
                json!({ "token": input.token, "payload": body(input) })
            }),
            route(Method::Get, "/articles", "get_articles", |input| {
                let identity = input
                    .params
                    .get("identity")
                    .map(String::as_str)
                    .unwrap_or("visitor");
                let mut args = Map::new();
                args.insert("identity".into(), Value::from(identity));
                if let Some(condition) = input.params.get("condition") {
                    args.insert("condition".into(), Value::from(condition.as_str()));
                }
                Value::Object(args)
            }),
            route(Method::Get, "/article/:id", "get_article_by_id", |input| {
                json!({ "id": input.route.param("id") })
            }),
            route(Method::Post, "/api/article", "create_article", |input| {
                json!({ "token": input.token, "article_data": body(input) })
            }),
            route(Method::Put, "/api/article/:id", "update_article", |input| {
                json!({
                    "token": input.token,
                    "id": input.route.param("id"),
                    "article_data": body(input),
                })
            }),
            route(Method::Delete, "/api/article/:id", "delete_article", |input| {
                json!({ "token": input.token, "id": input.route.param("id") })
            }),
            route(Method::Patch, "/api/article/:id", "toggle_article_status", |input| {
                json!({
                    "token": input.token,
                    "id": input.route.param("id"),
                    "status": body(input),
                })
            }),
            route(Method::Get, "/suggestions/:keyword", "get_suggestions", |input| {
                json!({ "keyword": input.route.param("keyword") })
            }),
            route(Method::Get, "/comments/:articleId", "get_comments", |input| {
                let mut args = Map::new();
                args.insert(
                    "article_id".into(),
                    Value::from(input.route.param("articleId")),
                );
                if !input.token.is_empty() {
                    args.insert("token".into(), Value::from(input.token));
                }
                Value::Object(args)
            }),
            route(Method::Post, "/api/comment", "post_comment", |input| {
                json!({ "token": input.token, "comment_data": body(input) })
            }),
            route(Method::Delete, "/comment/:id", "delete_comment", |input| {
                json!({ "token": input.token, "comment_id": input.route.param("id") })
            }),
            route(Method::Put, "/api/comment/like", "like_comment", |input| {
                json!({ "token": input.token, "payload": body(input) })
            }),
        ];
        // Stable: literal routes keep their relative order ahead of parameterized ones.
        bindings.sort_by_key(|binding| binding.pattern.rank());
        bindings.push(Binding {
            method: None,
            pattern: RoutePattern::Any,
            command: FALLBACK_COMMAND,
            build: fallback_args,
        });
        Self { bindings }
    }

    /// First binding whose method and pattern match, with its arguments built.
    pub fn resolve(&self, operation: &Operation, token: Option<&str>) -> Option<CommandCall> {
        let (path, params) = operation.split();
        let token = token.unwrap_or_default();
        self.bindings.iter().find_map(|binding| {
            if binding.method.is_some_and(|method| method != operation.method) {
                return None;
            }
            let route = binding.pattern.matches(path)?;
            let input = BindingInput {
                route: &route,
                operation,
                path,
                params: &params,
                token,
            };
            Some(CommandCall {
                command: binding.command,
                args: (binding.build)(&input),
            })
        })
    }

    /// Command names in table order, fallback last.
    pub fn commands(&self) -> Vec<&'static str> {
        self.bindings.iter().map(|binding| binding.command).collect()
    }
}

fn route(method: Method, pattern: &'static str, command: &'static str, build: ArgsBuilder) -> Binding {
    Binding {
        method: Some(method),
        pattern: RoutePattern::parse(pattern),
        command,
        build,
    }
}

fn body(input: &BindingInput<'_>) -> Value {
    input.operation.options.data_or_null()
}

fn token_args(input: &BindingInput<'_>) -> Map<String, Value> {
    let mut args = Map::new();
    args.insert("token".into(), Value::from(input.token));
    args
}

fn fallback_args(input: &BindingInput<'_>) -> Value {
    json!({
        "request": {
            "method": input.operation.method.as_str(),
            "url": input.path,
            "params": input.params,
            "data": body(input),
            "token": input.token,
        }
    })
}

#[cfg(test)]
#[path = "tests/command_mapper_tests.rs"]
mod tests;
