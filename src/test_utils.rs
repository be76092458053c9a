// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use tower::Service;

/// A mock HTTP service that replays canned responses keyed by method and path.
///
/// Registering the same route twice queues a second response; once the
/// queue is down to its last response, that response repeats. Watch
/// requests (query string containing `watch=true`) only match routes
/// registered with `on_watch`, so list-then-watch flows can be scripted.
#[derive(Clone, Default)]
pub struct MockService {
    routes: Arc<Mutex<Vec<Route>>>,
}

struct Route {
    method: String,
    path: String,
    watch: bool,
    responses: VecDeque<(u16, String)>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.push("GET", path, false, status, body)
    }

    /// Add a response for POST requests matching the path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.push("POST", path, false, status, body)
    }

    /// Add a response for PUT requests matching the path
    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.push("PUT", path, false, status, body)
    }

    /// Add a response for DELETE requests matching the path
    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.push("DELETE", path, false, status, body)
    }

    /// Add a response for watch requests matching the path. The body is
    /// a sequence of newline-delimited watch event frames, or empty for
    /// a watch that ends immediately.
    pub fn on_watch(self, path: &str, status: u16, body: &str) -> Self {
        self.push("GET", path, true, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn push(self, method: &str, path: &str, watch: bool, status: u16, body: &str) -> Self {
        {
            let mut routes = self.routes.lock().unwrap();
            if let Some(route) = routes
                .iter_mut()
                .find(|r| r.method == method && r.path == path && r.watch == watch)
            {
                route.responses.push_back((status, body.to_string()));
            } else {
                routes.push(Route {
                    method: method.to_string(),
                    path: path.to_string(),
                    watch,
                    responses: VecDeque::from([(status, body.to_string())]),
                });
            }
        }
        self
    }

    fn take_response(&self, method: &str, path: &str, watch: bool) -> Option<(u16, String)> {
        let mut routes = self.routes.lock().unwrap();

        // Exact path match first, then prefix match
        let index = routes
            .iter()
            .position(|r| r.method == method && r.watch == watch && r.path == path)
            .or_else(|| {
                routes
                    .iter()
                    .position(|r| r.method == method && r.watch == watch && path.starts_with(&r.path))
            })?;

        let route = &mut routes[index];
        if route.responses.len() > 1 {
            route.responses.pop_front()
        } else {
            route.responses.front().cloned()
        }
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let watch = req
            .uri()
            .query()
            .is_some_and(|query| query.contains("watch=true"));

        let response = self.take_response(&method, &path, watch);

        Box::pin(async move {
            match response {
                Some((status, body)) => Ok(Response::builder()
                    .status(status)
                    .header("content-type", "application/json")
                    .body(Body::from(body.into_bytes()))
                    .unwrap()),
                None => {
                    // Default 404 for unmatched requests
                    let body = not_found_json("resource", &path);
                    Ok(Response::builder()
                        .status(404)
                        .header("content-type", "application/json")
                        .body(Body::from(body.into_bytes()))
                        .unwrap())
                }
            }
        })
    }
}

/// An Item object as the API server would return it
pub fn item_value(
    name: &str,
    namespace: &str,
    resource_version: &str,
    detail: &str,
) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "itemresource.dev/v1",
        "kind": "Item",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "resourceVersion": resource_version,
            "uid": format!("uid-{name}")
        },
        "spec": { "detail": detail }
    })
}

pub fn item_json(name: &str, namespace: &str, resource_version: &str, detail: &str) -> String {
    item_value(name, namespace, resource_version, detail).to_string()
}

pub fn item_list_json(resource_version: &str, items: &[serde_json::Value]) -> String {
    serde_json::json!({
        "apiVersion": "itemresource.dev/v1",
        "kind": "ItemList",
        "metadata": { "resourceVersion": resource_version },
        "items": items
    })
    .to_string()
}

/// A minimal Pod object as the API server would return it
pub fn pod_value(name: &str, namespace: &str) -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "resourceVersion": "1",
            "uid": format!("uid-{name}")
        }
    })
}

pub fn pod_list_json(resource_version: &str, pods: &[serde_json::Value]) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "PodList",
        "metadata": { "resourceVersion": resource_version },
        "items": pods
    })
    .to_string()
}

/// One newline-delimited watch event frame
pub fn watch_event_json(event_type: &str, object: serde_json::Value) -> String {
    format!(
        "{}\n",
        serde_json::json!({ "type": event_type, "object": object })
    )
}

/// A Status failure response
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// A 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", &format!("{resource} \"{name}\" not found"))
}
