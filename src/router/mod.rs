//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea (método, path) a handlers. Los patrones aceptan segmentos
//! variables con la forma `{nombre}`:
//!
//! ```text
//! GET /api/status/{id}  →  params["id"] = "abc"
//! ```
//!
//! - Path sin ninguna ruta que coincida → 404
//! - Path conocido pero con otro método → 405
//!
//! El router es genérico sobre el estado compartido `S` que reciben los
//! handlers (en el servidor, el `JobManager`).

use crate::http::{Method, Request, Response, StatusCode};
use std::collections::HashMap;

/// Parámetros extraídos de los segmentos `{nombre}` del patrón
pub type RouteParams = HashMap<String, String>;

/// Un handler recibe el request, los parámetros y el estado compartido
pub type Handler<S> = fn(&Request, &RouteParams, &S) -> Response;

struct Route<S> {
    method: Method,
    segments: Vec<String>,
    handler: Handler<S>,
}

/// Router que mapea métodos y paths a handlers
pub struct Router<S> {
    routes: Vec<Route<S>>,
}

impl<S> Router<S> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta con su handler
    ///
    /// # Ejemplo
    /// ```
    /// use download_server::router::{RouteParams, Router};
    /// use download_server::http::{Method, Request, Response, StatusCode};
    ///
    /// fn hello(_req: &Request, params: &RouteParams, _state: &()) -> Response {
    ///     Response::json(StatusCode::Ok, &serde_json::json!({ "name": params["name"] }))
    /// }
    ///
    /// let mut router = Router::new();
    /// router.register(Method::GET, "/hello/{name}", hello);
    ///
    /// let request = Request::parse(b"GET /hello/ana HTTP/1.0\r\n\r\n").unwrap();
    /// assert_eq!(router.route(&request, &()).status(), StatusCode::Ok);
    /// ```
    pub fn register(&mut self, method: Method, pattern: &str, handler: Handler<S>) {
        self.routes.push(Route {
            method,
            segments: split_path(pattern).map(str::to_string).collect(),
            handler,
        });
    }

    /// Encuentra y ejecuta el handler apropiado para un request
    ///
    /// `HEAD` se despacha como `GET`; el servidor omite el body al escribir.
    pub fn route(&self, request: &Request, state: &S) -> Response {
        let method = match request.method() {
            Method::HEAD => Method::GET,
            other => other,
        };

        let mut path_matched = false;
        for route in &self.routes {
            let Some(params) = match_segments(&route.segments, request.path()) else {
                continue;
            };
            path_matched = true;

            if route.method == method {
                let mut response = (route.handler)(request, &params, state);
                add_common_headers(&mut response);
                return response;
            }
        }

        let mut response = if path_matched {
            Response::error(StatusCode::MethodNotAllowed, "Method not allowed")
        } else {
            Response::error(StatusCode::NotFound, &format!("Route not found: {}", request.path()))
        };
        add_common_headers(&mut response);
        response
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Headers comunes a todas las respuestas
pub fn add_common_headers(response: &mut Response) {
    response.add_header("Server", "download-server/1.0");
    response.add_header("Connection", "close");
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn match_segments(pattern: &[String], path: &str) -> Option<RouteParams> {
    let segments: Vec<&str> = split_path(path).collect();
    if segments.len() != pattern.len() {
        return None;
    }

    let mut params = RouteParams::new();
    for (expected, actual) in pattern.iter().zip(segments) {
        match expected.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => {
                params.insert(name.to_string(), actual.to_string());
            }
            None if expected == actual => {}
            None => return None,
        }
    }
    Some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_handler(_req: &Request, params: &RouteParams, state: &String) -> Response {
        Response::json(
            StatusCode::Ok,
            &serde_json::json!({ "id": params.get("id"), "state": state }),
        )
    }

    fn ok_handler(_req: &Request, _params: &RouteParams, _state: &String) -> Response {
        Response::new(StatusCode::Ok)
    }

    fn request(raw: &[u8]) -> Request {
        Request::parse(raw).unwrap()
    }

    fn router() -> Router<String> {
        let mut router = Router::new();
        router.register(Method::POST, "/api/download", ok_handler);
        router.register(Method::GET, "/api/status/{id}", echo_handler);
        router
    }

    #[test]
    fn test_register_route() {
        let router = router();
        assert_eq!(router.len(), 2);
        assert!(Router::<()>::new().is_empty());
    }

    #[test]
    fn test_route_with_param() {
        let state = "shared".to_string();
        let response = router().route(&request(b"GET /api/status/abc-123 HTTP/1.0\r\n\r\n"), &state);

        assert_eq!(response.status(), StatusCode::Ok);
        let body: serde_json::Value = serde_json::from_slice(response.body_bytes().unwrap()).unwrap();
        assert_eq!(body["id"], "abc-123");
        assert_eq!(body["state"], "shared");
        assert_eq!(response.header("Connection"), Some("close"));
    }

    #[test]
    fn test_route_not_found() {
        let state = String::new();
        let response = router().route(&request(b"GET /nonexistent HTTP/1.0\r\n\r\n"), &state);
        assert_eq!(response.status(), StatusCode::NotFound);

        // Falta el segmento {id}
        let response = router().route(&request(b"GET /api/status HTTP/1.0\r\n\r\n"), &state);
        assert_eq!(response.status(), StatusCode::NotFound);
    }

    #[test]
    fn test_wrong_method() {
        let state = String::new();
        let response = router().route(&request(b"GET /api/download HTTP/1.0\r\n\r\n"), &state);
        assert_eq!(response.status(), StatusCode::MethodNotAllowed);

        let response = router().route(&request(b"POST /api/status/x HTTP/1.0\r\n\r\n"), &state);
        assert_eq!(response.status(), StatusCode::MethodNotAllowed);
    }

    #[test]
    fn test_head_dispatches_as_get() {
        let state = String::new();
        let response = router().route(&request(b"HEAD /api/status/x HTTP/1.0\r\n\r\n"), &state);
        assert_eq!(response.status(), StatusCode::Ok);
    }

    #[test]
    fn test_trailing_slash_ignored() {
        let state = String::new();
        let response = router().route(&request(b"POST /api/download/ HTTP/1.0\r\n\r\n"), &state);
        assert_eq!(response.status(), StatusCode::Ok);
    }
}
