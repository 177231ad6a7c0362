use std::collections::BTreeMap;

/// A parsed HTTP/1.x request, shared by the HTTP honeypot's `PageProvider`
/// dialog and the decoy e-commerce API's routing table.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|s| s.as_str())
    }

    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Parses one HTTP/1.x request from raw bytes, per spec §4.3:
/// - split on `\r\n`
/// - first non-empty line is `METHOD SP TARGET SP VERSION`; fewer than two
///   tokens is a parse failure
/// - subsequent lines up to the first blank line are `Name: Value` headers;
///   on duplicate names, later occurrences win
/// - remaining bytes are the body
pub fn parse_request(data: &[u8]) -> Option<HttpRequest> {
    // Split on the raw CRLF sequence at the byte level so an arbitrary
    // binary body doesn't have to round-trip through UTF-8 first.
    let mut lines: Vec<&[u8]> = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + 1 < data.len() {
        if data[i] == b'\r' && data[i + 1] == b'\n' {
            lines.push(&data[start..i]);
            i += 2;
            start = i;
        } else {
            i += 1;
        }
    }
    let tail = &data[start..];

    let request_line = lines.first().copied().unwrap_or(tail);
    let request_line = String::from_utf8_lossy(request_line);
    let tokens: Vec<&str> = request_line.split(' ').filter(|t| !t.is_empty()).collect();
    if tokens.len() < 2 {
        return None;
    }
    let method = tokens[0].to_string();
    let path = tokens[1].to_string();

    let mut headers = BTreeMap::new();
    let mut body_start_line = lines.len();
    for (idx, line) in lines.iter().enumerate().skip(1) {
        if line.is_empty() {
            body_start_line = idx + 1;
            break;
        }
        let line = String::from_utf8_lossy(line);
        if let Some((name, value)) = line.split_once(": ") {
            headers.insert(name.to_ascii_lowercase(), value.to_string());
        }
    }

    let body = if body_start_line < lines.len() {
        let mut body = Vec::new();
        for (idx, line) in lines.iter().enumerate().skip(body_start_line) {
            if idx > body_start_line {
                body.extend_from_slice(b"\r\n");
            }
            body.extend_from_slice(line);
        }
        if !tail.is_empty() {
            if !body.is_empty() {
                body.extend_from_slice(b"\r\n");
            }
            body.extend_from_slice(tail);
        }
        body
    } else if lines.len() > 1 {
        // Blank line never found: no body.
        tail.to_vec()
    } else {
        Vec::new()
    };

    Some(HttpRequest { method, path, headers, body })
}

/// Splits a `TARGET` of the form `/path?query` into its path component,
/// lower-cased, the way `urlparse(...).path` behaves in the original.
pub fn path_only(target: &str) -> &str {
    target.split('?').next().unwrap_or(target).split('#').next().unwrap_or(target)
}

/// Builds a complete `HTTP/1.1` response with the common honeypot headers:
/// `Server: Apache/2.4.41 (Ubuntu)`, `Connection: close`, and a
/// `Content-Type` chosen as `application/json` when the body begins with
/// `{`, else `text/html` (spec §4.7).
pub fn build_response(status: u16, status_text: &str, body: &str) -> Vec<u8> {
    let content_type = if body.trim_start().starts_with('{') {
        "application/json"
    } else {
        "text/html"
    };
    let mut response = format!(
        "HTTP/1.1 {status} {status_text}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Server: Apache/2.4.41 (Ubuntu)\r\n\
         Connection: close\r\n\
         \r\n",
        body.len()
    );
    response.push_str(body);
    response.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_method_path_headers_and_body() {
        let raw = b"POST /login HTTP/1.1\r\nHost: x\r\nContent-Length: 4\r\n\r\nabcd";
        let req = parse_request(raw).unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/login");
        assert_eq!(req.header("host"), Some("x"));
        assert_eq!(req.body_str(), "abcd");
    }

    #[test]
    fn duplicate_headers_last_value_wins() {
        let raw = b"GET / HTTP/1.1\r\nX-Foo: first\r\nX-Foo: second\r\n\r\n";
        let req = parse_request(raw).unwrap();
        assert_eq!(req.header("x-foo"), Some("second"));
    }

    #[test]
    fn request_line_with_one_token_is_rejected() {
        assert!(parse_request(b"GET\r\n\r\n").is_none());
    }

    #[test]
    fn response_picks_json_content_type_for_brace_bodies() {
        let resp = build_response(200, "OK", "{\"a\":1}");
        let text = String::from_utf8_lossy(&resp);
        assert!(text.contains("Content-Type: application/json"));
        assert!(text.contains("Connection: close"));
    }

    #[test]
    fn path_only_strips_query_string() {
        assert_eq!(path_only("/search?q=1"), "/search");
    }
}
