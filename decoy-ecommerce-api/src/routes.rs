use honeypot_core::http::HttpRequest;
use honeypot_core::EventDetail;
use serde_json::{json, Value};

/// Fake product catalog, immutable for the process lifetime.
fn products() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Laptop Pro", "price": 999.99, "stock": 50}),
        json!({"id": 2, "name": "Smartphone X", "price": 699.99, "stock": 100}),
        json!({"id": 3, "name": "Tablet Air", "price": 499.99, "stock": 75}),
        json!({"id": 4, "name": "Wireless Earbuds", "price": 149.99, "stock": 200}),
    ]
}

/// Substring markers checked against `/api/search` queries, matched
/// lower-cased like the original demo (a coarser check than the shared
/// [`honeypot_core::AttackClassifier`], kept distinct on purpose).
const SEARCH_INJECTION_MARKERS: &[&str] = &["union", "select", "drop", "delete", "--", "or 1=1"];

pub struct RouteResult {
    pub status: u16,
    pub status_text: &'static str,
    pub body: String,
    pub event: Option<EventDetail>,
}

impl RouteResult {
    fn json(status: u16, status_text: &'static str, body: Value) -> Self {
        RouteResult { status, status_text, body: body.to_string(), event: None }
    }

    fn with_event(mut self, event: EventDetail) -> Self {
        self.event = Some(event);
        self
    }
}

/// Routes one parsed request to its fake handler, per spec §4.8. Every
/// route is single-shot: one request, one response, no session state.
pub fn route(request: &HttpRequest) -> RouteResult {
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/api/products") => RouteResult::json(200, "OK", json!({"products": products()})),

        ("GET", path) if path.starts_with("/api/products/") => {
            let id_str = path.rsplit('/').next().unwrap_or("");
            match id_str.parse::<i64>() {
                Ok(id) => match products().into_iter().find(|p| p["id"] == id) {
                    Some(product) => RouteResult::json(200, "OK", product),
                    None => RouteResult::json(404, "Not Found", json!({"error": "Product not found"})),
                },
                Err(_) => RouteResult::json(400, "Bad Request", json!({"error": "Invalid product ID"})),
            }
        }

        ("GET", "/api/health") => RouteResult::json(200, "OK", json!({"status": "healthy"})),

        ("GET", "/api/config") => RouteResult::json(
            200,
            "OK",
            json!({
                "db_host": "db.internal.local",
                "db_user": "app_user",
                "db_name": "ecommerce",
                "api_key": "sk-fake-api-key-12345",
            }),
        )
        .with_event(EventDetail::SuspiciousAccess {
            path: "/api/config".to_string(),
            detail: "fake config endpoint probed".to_string(),
        }),

        ("POST", "/api/login") => {
            let (username, _password) = parse_login_body(&request.body_str());
            RouteResult::json(401, "Unauthorized", json!({"error": "Invalid credentials"}))
                .with_event(EventDetail::LoginAttempt { username })
        }

        ("POST", "/api/search") => {
            let query = parse_search_query(&request.body_str());
            let is_injection = SEARCH_INJECTION_MARKERS
                .iter()
                .any(|marker| query.to_lowercase().contains(marker));

            let mut result = RouteResult::json(200, "OK", json!({"results": []}));
            if is_injection {
                result = result.with_event(EventDetail::sql_query(query, true));
            }
            result
        }

        _ => RouteResult::json(404, "Not Found", json!({"error": "Not found"})),
    }
}

/// Accepts either a JSON object body or `key=value&...` form encoding,
/// mirroring the original demo's fallback parser.
fn parse_login_body(body: &str) -> (String, String) {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        let username = map.get("username").and_then(Value::as_str).unwrap_or("").to_string();
        let password = map.get("password").and_then(Value::as_str).unwrap_or("").to_string();
        return (username, password);
    }

    let mut username = String::new();
    let mut password = String::new();
    for pair in body.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            match key {
                "username" => username = value.to_string(),
                "password" => password = value.to_string(),
                _ => {}
            }
        }
    }
    (username, password)
}

fn parse_search_query(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("q").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn request(method: &str, path: &str, body: &str) -> HttpRequest {
        HttpRequest {
            method: method.to_string(),
            path: path.to_string(),
            headers: BTreeMap::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn config_endpoint_leaks_fake_secret_and_raises_an_event() {
        let result = route(&request("GET", "/api/config", ""));
        assert_eq!(result.status, 200);
        assert!(result.body.contains("sk-fake-api-key-12345"));
        assert!(matches!(result.event, Some(EventDetail::SuspiciousAccess { .. })));
    }

    #[test]
    fn login_always_fails_but_captures_username() {
        let result = route(&request("POST", "/api/login", r#"{"username":"admin","password":"admin123"}"#));
        assert_eq!(result.status, 401);
        match result.event {
            Some(EventDetail::LoginAttempt { username }) => assert_eq!(username, "admin"),
            _ => panic!("expected a login_attempt event"),
        }
    }

    #[test]
    fn search_flags_sql_injection_markers() {
        let result = route(&request("POST", "/api/search", r#"{"q":"' OR 1=1 --"}"#));
        assert_eq!(result.status, 200);
        assert!(matches!(result.event, Some(EventDetail::SqlQuery { is_injection: true, .. })));
    }

    #[test]
    fn clean_search_has_no_event() {
        let result = route(&request("POST", "/api/search", r#"{"q":"laptop"}"#));
        assert!(result.event.is_none());
    }

    #[test]
    fn unknown_product_id_is_404() {
        let result = route(&request("GET", "/api/products/999", ""));
        assert_eq!(result.status, 404);
    }

    #[test]
    fn non_numeric_product_id_is_400() {
        let result = route(&request("GET", "/api/products/abc", ""));
        assert_eq!(result.status, 400);
    }
}
