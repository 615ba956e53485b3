//! HTTP routing stand-in.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::action::{ActionResult, ClassId};
use crate::container::Container;
use crate::error::ActionError;
use crate::probe::{self, CallFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A route bound to an action class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub method: Method,
    /// URI pattern; `{name}` segments capture parameters.
    pub uri: String,
    pub action: ClassId,
    pub name: Option<String>,
    pub middleware: Vec<String>,
}

impl Route {
    pub fn new(method: Method, uri: impl Into<String>, action: impl Into<ClassId>) -> Self {
        Self {
            method,
            uri: uri.into(),
            action: action.into(),
            name: None,
            middleware: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn middleware(mut self, middleware: impl Into<String>) -> Self {
        self.middleware.push(middleware.into());
        self
    }

    /// Match `path` against the URI pattern, returning captured parameters.
    pub fn matches(&self, method: Method, path: &str) -> Option<BTreeMap<String, String>> {
        if method != self.method {
            return None;
        }

        let pattern: Vec<_> = self.uri.trim_matches('/').split('/').collect();
        let segments: Vec<_> = path.trim_matches('/').split('/').collect();
        if pattern.len() != segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (expected, actual) in pattern.iter().zip(segments) {
            match expected.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => {
                    params.insert(name.to_string(), actual.to_string());
                }
                None if *expected == actual => {}
                None => return None,
            }
        }
        Some(params)
    }
}

/// Where action classes declare their routes.
pub trait Router {
    fn add_route(&mut self, route: Route);

    fn get(&mut self, uri: &str, action: &str) {
        self.add_route(Route::new(Method::Get, uri, action));
    }

    fn post(&mut self, uri: &str, action: &str) {
        self.add_route(Route::new(Method::Post, uri, action));
    }

    fn put(&mut self, uri: &str, action: &str) {
        self.add_route(Route::new(Method::Put, uri, action));
    }

    fn patch(&mut self, uri: &str, action: &str) {
        self.add_route(Route::new(Method::Patch, uri, action));
    }

    fn delete(&mut self, uri: &str, action: &str) {
        self.add_route(Route::new(Method::Delete, uri, action));
    }
}

/// Ordered list of routes; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct RouteCollection {
    routes: Vec<Route>,
}

impl RouteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn find(&self, method: Method, path: &str) -> Option<(&Route, BTreeMap<String, String>)> {
        self.routes
            .iter()
            .find_map(|r| r.matches(method, path).map(|params| (r, params)))
    }
}

impl Router for RouteCollection {
    fn add_route(&mut self, route: Route) {
        log::debug!("Route {} {} -> {}", route.method, route.uri, route.action);
        self.routes.push(route);
    }
}

/// An incoming HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub route_params: BTreeMap<String, String>,
    pub input: Value,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            route_params: BTreeMap::new(),
            input: Value::Null,
        }
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = input;
        self
    }

    pub fn with_route_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_params.insert(name.into(), value.into());
        self
    }

    pub fn input(&self, key: &str) -> Option<&Value> {
        self.input.get(key)
    }

    /// Input fields merged with route parameters; route parameters win.
    pub fn all(&self) -> Value {
        let mut all = match &self.input {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("input".to_string(), other.clone());
                map
            }
        };
        for (name, value) in &self.route_params {
            all.insert(name.clone(), Value::String(value.clone()));
        }
        Value::Object(all)
    }
}

/// Caller object of the dispatch frame: the route being dispatched.
#[derive(Debug, Clone)]
pub struct RouteDispatch {
    pub route: Route,
}

/// Matches requests to routes and invokes the bound action as a controller.
#[derive(Debug, Default)]
pub struct RouteDispatcher {
    routes: RouteCollection,
}

impl RouteDispatcher {
    pub fn new(routes: RouteCollection) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &RouteCollection {
        &self.routes
    }

    pub fn dispatch(&self, container: &Container, request: Request) -> ActionResult {
        let (route, params) = self
            .routes
            .find(request.method, &request.path)
            .ok_or_else(|| ActionError::RouteNotFound(format!("{} {}", request.method, request.path)))?;

        let mut request = request;
        request.route_params.extend(params);

        let frame = CallFrame::method(Arc::new(RouteDispatch { route: route.clone() }), "dispatch");
        let resolved = probe::within(frame, || container.resolve(route.action.as_str()))?;

        match resolved.into_controller() {
            Some(controller) => controller.call(&request),
            None => Err(ActionError::NotInvokable {
                class: route.action.to_string(),
                role: "controller".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_matching_captures_params() {
        let route = Route::new(Method::Post, "/posts/{post}/publish", "posts.publish");
        let params = route.matches(Method::Post, "/posts/42/publish").unwrap();
        assert_eq!(params.get("post").map(String::as_str), Some("42"));

        assert!(route.matches(Method::Get, "/posts/42/publish").is_none());
        assert!(route.matches(Method::Post, "/posts/42").is_none());
        assert!(route.matches(Method::Post, "/pages/42/publish").is_none());
    }

    #[test]
    fn test_collection_first_match_wins() {
        let mut routes = RouteCollection::new();
        routes.get("/reports/{period}", "reports.generate");
        routes.get("/reports/latest", "reports.latest");

        let (route, _) = routes.find(Method::Get, "/reports/latest").unwrap();
        assert_eq!(route.action.as_str(), "reports.generate");
        assert_eq!(routes.len(), 2);
    }

    #[test]
    fn test_router_helpers_set_methods() {
        let mut routes = RouteCollection::new();
        routes.put("/posts/{post}", "posts.replace");
        routes.patch("/posts/{post}", "posts.update");
        routes.delete("/posts/{post}", "posts.destroy");

        let (route, params) = routes.find(Method::Patch, "/posts/9").unwrap();
        assert_eq!(route.action.as_str(), "posts.update");
        assert_eq!(params.get("post").map(String::as_str), Some("9"));
        assert_eq!(routes.find(Method::Delete, "/posts/9").unwrap().0.action.as_str(), "posts.destroy");
    }

    #[test]
    fn test_request_all_merges_route_params() {
        let request = Request::new(Method::Post, "/posts/1")
            .with_input(json!({"title": "Hello", "post": "ignored"}))
            .with_route_param("post", "1");
        assert_eq!(request.all(), json!({"title": "Hello", "post": "1"}));
    }

    #[test]
    fn test_dispatch_unknown_route() {
        let dispatcher = RouteDispatcher::default();
        let err = dispatcher
            .dispatch(&Container::new(), Request::new(Method::Get, "/nowhere"))
            .unwrap_err();
        assert!(matches!(err, ActionError::RouteNotFound(_)));
    }
}
