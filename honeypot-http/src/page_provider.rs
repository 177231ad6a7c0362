use std::collections::HashMap;

use honeypot_core::http::build_response;

/// Read-only `exact_path -> prebuilt_response_bytes` table, per spec §4.7.
///
/// Lookup order: exact match, then the longest configured prefix other than
/// `/`, then a minimal 404.
pub struct PageProvider {
    pages: HashMap<&'static str, Vec<u8>>,
}

impl PageProvider {
    pub fn new() -> Self {
        let mut pages = HashMap::new();
        pages.insert("/", build_response(200, "OK", INDEX_PAGE));
        pages.insert("/health", build_response(200, "OK", r#"{"status": "healthy"}"#));
        pages.insert("/ready", build_response(200, "OK", r#"{"ready": true}"#));
        pages.insert(
            "/robots.txt",
            build_response(200, "OK", "User-agent: *\nDisallow: /admin\nDisallow: /api"),
        );
        pages.insert("/admin", build_response(401, "Unauthorized", LOGIN_PAGE));
        pages.insert("/wp-admin", build_response(200, "OK", WORDPRESS_ADMIN_PAGE));
        pages.insert("/phpmyadmin", build_response(200, "OK", PHPMYADMIN_PAGE));
        pages.insert(
            "/api",
            build_response(200, "OK", r#"{"version": "1.0", "endpoints": ["/users", "/products"]}"#),
        );
        PageProvider { pages }
    }

    pub fn response_for(&self, path: &str) -> Vec<u8> {
        if let Some(page) = self.pages.get(path) {
            return page.clone();
        }

        let mut best: Option<(&str, &Vec<u8>)> = None;
        for (&prefix, body) in &self.pages {
            if prefix == "/" {
                continue;
            }
            if path.starts_with(prefix) {
                if best.map(|(b, _)| prefix.len() > b.len()).unwrap_or(true) {
                    best = Some((prefix, body));
                }
            }
        }
        if let Some((_, body)) = best {
            return body.clone();
        }

        build_response(404, "Not Found", "<html><body><h1>404 Not Found</h1></body></html>")
    }
}

impl Default for PageProvider {
    fn default() -> Self {
        Self::new()
    }
}

const INDEX_PAGE: &str = "<!DOCTYPE html>\n\
<html><head><title>Welcome</title></head>\n\
<body><h1>Welcome to our service</h1><p>Please log in to continue.</p></body></html>";

const LOGIN_PAGE: &str = "<!DOCTYPE html>\n\
<html><head><title>Admin Login</title></head>\n\
<body><h1>Admin Login</h1>\n\
<form method=\"post\"><input name=\"user\" placeholder=\"Username\"><input name=\"pass\" type=\"password\"><button>Login</button></form></body></html>";

const WORDPRESS_ADMIN_PAGE: &str = "<!DOCTYPE html>\n\
<html><head><title>WordPress &rsaquo; Log In</title></head>\n\
<body class=\"login\"><div id=\"login\">\n\
<h1><a href=\"https://wordpress.org/\">WordPress</a></h1>\n\
<form method=\"post\"><p><label>Username<input name=\"log\" type=\"text\"></label></p>\n\
<p><label>Password<input name=\"pwd\" type=\"password\"></label></p>\n\
<p><input type=\"submit\" value=\"Log In\"></p></form></div></body></html>";

const PHPMYADMIN_PAGE: &str = "<!DOCTYPE html>\n\
<html><head><title>phpMyAdmin</title></head>\n\
<body><div id=\"pma_header\"><h1>phpMyAdmin</h1></div>\n\
<form method=\"post\"><input name=\"pma_username\" placeholder=\"Username\">\n\
<input name=\"pma_password\" type=\"password\"><button>Go</button></form></body></html>";

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(response: &[u8]) -> &str {
        let text = std::str::from_utf8(response).unwrap();
        text.split_whitespace().nth(1).unwrap()
    }

    #[test]
    fn exact_match_wins() {
        let provider = PageProvider::new();
        let response = provider.response_for("/phpmyadmin");
        assert_eq!(status_of(&response), "200");
        assert!(std::str::from_utf8(&response).unwrap().contains("phpMyAdmin"));
    }

    #[test]
    fn admin_is_401() {
        let provider = PageProvider::new();
        let response = provider.response_for("/admin");
        assert_eq!(status_of(&response), "401");
    }

    #[test]
    fn unknown_path_is_404() {
        let provider = PageProvider::new();
        let response = provider.response_for("/nope");
        assert_eq!(status_of(&response), "404");
    }

    #[test]
    fn prefix_match_excludes_root() {
        let provider = PageProvider::new();
        let response = provider.response_for("/admin/settings");
        assert_eq!(status_of(&response), "401");
    }
}
