use regex::RegexSet;

/// SQL-injection patterns shared by every protocol (authoritative,
/// order-preserving per spec §4.6).
const SQL_INJECTION_PATTERNS: &[&str] = &[
    r"UNION\s+SELECT",
    r"OR\s+1\s*=\s*1",
    r"OR\s+'[^']*'\s*=\s*'[^']*'",
    r";\s*DROP\s+TABLE",
    r";\s*DELETE\s+FROM",
    r"--\s*$",
    r"SLEEP\s*\(",
    r"BENCHMARK\s*\(",
    r"LOAD_FILE\s*\(",
    r"INTO\s+OUTFILE",
    r"INTO\s+DUMPFILE",
    r"information_schema",
    r"CONCAT\s*\(",
    r"CHAR\s*\(",
    r"0x[0-9a-fA-F]+",
];

/// Additional patterns layered on top of [`SQL_INJECTION_PATTERNS`] for the
/// HTTP flow only, per spec §4.6.
const HTTP_SQL_INJECTION_EXTRA_PATTERNS: &[&str] = &[
    r"(%27)|(')|(--)|(%23)|(#)",
    r"((%3D)|(=))[^\n]*((%27)|(')|(--)|(%3B)|(;))",
    r"\w*((%27)|('))((%6F)|o|(%4F))((%72)|r|(%52))",
    r"((%27)|('))union",
    r"SELECT\s+.*\s+FROM",
    r"INSERT\s+INTO",
    r"DROP\s+TABLE",
    r"UPDATE\s+.*\s+SET",
];

const XSS_PATTERNS: &[&str] = &[
    r"<script[^>]*>",
    r"javascript:",
    r"onerror\s*=",
    r"onload\s*=",
    r"onclick\s*=",
    r"<iframe",
    r"<img[^>]+onerror",
];

const PATH_TRAVERSAL_PATTERNS: &[&str] = &[
    r"\.\./",
    r"\.\.\\",
    r"/etc/passwd",
    r"/etc/shadow",
    r"c:\\windows",
    r"boot\.ini",
];

/// Reconnaissance path list, matched as a case-insensitive substring of the
/// URL path only (not a regex set) per spec §4.6.
pub const RECONNAISSANCE_PATHS: &[&str] = &[
    "/admin",
    "/wp-admin",
    "/wp-login.php",
    "/phpmyadmin",
    "/phpMyAdmin",
    "/.env",
    "/config.php",
    "/wp-config.php",
    "/xmlrpc.php",
    "/.git",
    "/.svn",
    "/backup",
    "/db",
    "/sql",
    "/shell",
    "/cmd",
    "/console",
    "/manager",
    "/actuator",
    "/api/v1/pods",
    "/metrics",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackType {
    SqlInjection,
    Xss,
    PathTraversal,
    Reconnaissance,
}

impl AttackType {
    pub fn as_str(self) -> &'static str {
        match self {
            AttackType::SqlInjection => "sql_injection",
            AttackType::Xss => "xss",
            AttackType::PathTraversal => "path_traversal",
            AttackType::Reconnaissance => "reconnaissance",
        }
    }
}

/// Pure function from (path, headers, body, query) to attack tag, driven by
/// a compiled pattern set constructed once at startup and shared read-only
/// across sessions.
pub struct AttackClassifier {
    sql_basic: RegexSet,
    sql_http: RegexSet,
    xss: RegexSet,
    traversal: RegexSet,
}

impl AttackClassifier {
    pub fn new() -> Self {
        let sql_basic = build_set(SQL_INJECTION_PATTERNS);
        let sql_http = build_set(
            SQL_INJECTION_PATTERNS
                .iter()
                .chain(HTTP_SQL_INJECTION_EXTRA_PATTERNS.iter()),
        );
        let xss = build_set(XSS_PATTERNS);
        let traversal = build_set(PATH_TRAVERSAL_PATTERNS);
        AttackClassifier {
            sql_basic,
            sql_http,
            xss,
            traversal,
        }
    }

    /// SQL-injection test used by the MySQL dialog (authoritative pattern
    /// set only, no HTTP-specific extras).
    pub fn is_sql_injection(&self, query: &str) -> bool {
        self.sql_basic.is_match(query)
    }

    /// Classifies one HTTP request. Precedence is fixed and significant:
    /// sql_injection -> xss -> path_traversal -> reconnaissance -> none.
    /// The first match wins; later categories are not evaluated.
    ///
    /// `path` is the raw request-line path, query string included — SQL
    /// injection, XSS and path-traversal payloads are routinely smuggled in
    /// query parameters, so those three checks run against it directly.
    /// `recon_path` is the query-stripped path used only for the
    /// reconnaissance substring check, mirroring the original's split
    /// between `full_input` (raw) and `urlparse(path).path` (stripped).
    pub fn classify_http(&self, path: &str, recon_path: &str, headers_joined: &str, body: &str) -> Option<AttackType> {
        let combined = format!("{path} {body} {headers_joined}");

        if self.sql_http.is_match(&combined) {
            return Some(AttackType::SqlInjection);
        }
        if self.xss.is_match(&combined) {
            return Some(AttackType::Xss);
        }
        if self.traversal.is_match(path) {
            return Some(AttackType::PathTraversal);
        }
        let lower_path = recon_path.to_lowercase();
        if RECONNAISSANCE_PATHS
            .iter()
            .any(|p| lower_path.contains(&p.to_lowercase()))
        {
            return Some(AttackType::Reconnaissance);
        }
        None
    }
}

impl Default for AttackClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn build_set<'a, I: IntoIterator<Item = &'a &'a str>>(patterns: I) -> RegexSet {
    RegexSet::new(patterns.into_iter().map(|p| format!("(?i){p}")))
        .expect("attack classifier patterns must be valid regexes")
}

/// Heuristic, approximate extractor for SSH auth-attempt buffers (spec
/// §4.6). Decodes as UTF-8 with replacement, splits on NUL, and walks the
/// resulting tokens: the first alphanumeric token under 64 bytes is the
/// candidate username, the token immediately after it is the candidate
/// password. This is intentionally not a full SSH parser.
pub fn extract_ssh_credentials(data: &[u8]) -> Option<(String, String)> {
    let text = String::from_utf8_lossy(data);
    let mut username: Option<&str> = None;
    let mut password: Option<&str> = None;

    for part in text.split('\0') {
        if part.is_empty() || part.len() >= 64 {
            continue;
        }
        if username.is_none() && part.chars().all(|c| c.is_ascii_alphanumeric()) {
            username = Some(part);
        } else if username.is_some() && password.is_none() {
            password = Some(part);
        }
    }

    username.map(|u| (u.to_string(), password.unwrap_or("").to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_injection_precedes_everything_else() {
        let c = AttackClassifier::new();
        let tag = c.classify_http("/search?q=1%20UNION%20SELECT%201", "/search", "", "");
        assert_eq!(tag, Some(AttackType::SqlInjection));
    }

    #[test]
    fn recon_path_is_not_sql_injection() {
        let c = AttackClassifier::new();
        let tag = c.classify_http("/phpmyadmin", "/phpmyadmin", "", "");
        assert_eq!(tag, Some(AttackType::Reconnaissance));
    }

    #[test]
    fn xss_detected_in_body() {
        let c = AttackClassifier::new();
        let tag = c.classify_http("/comment", "/comment", "", "<script>alert(1)</script>");
        assert_eq!(tag, Some(AttackType::Xss));
    }

    #[test]
    fn path_traversal_detected() {
        let c = AttackClassifier::new();
        let tag = c.classify_http("/download?file=../../etc/passwd", "/download", "", "");
        assert_eq!(tag, Some(AttackType::PathTraversal));
    }

    #[test]
    fn clean_request_has_no_attack_type() {
        let c = AttackClassifier::new();
        assert_eq!(c.classify_http("/", "/", "", ""), None);
    }

    #[test]
    fn classification_is_stable_across_header_reordering() {
        let c = AttackClassifier::new();
        let a = c.classify_http("/x", "/x", "foo=1 bar=<script>x</script>", "");
        let b = c.classify_http("/x", "/x", "bar=<script>x</script> foo=1", "");
        assert_eq!(a, b);
    }

    #[test]
    fn mysql_injection_uses_basic_set_only() {
        let c = AttackClassifier::new();
        assert!(c.is_sql_injection("SELECT * FROM users WHERE id=1 OR 1=1"));
        assert!(!c.is_sql_injection("SELECT * FROM users WHERE id=1"));
    }

    #[test]
    fn extracts_username_and_password_from_nul_separated_buffer() {
        let (u, p) = extract_ssh_credentials(b"\x00user\x00pass\x00").unwrap();
        assert_eq!(u, "user");
        assert_eq!(p, "pass");
    }

    #[test]
    fn no_username_candidate_yields_none() {
        assert!(extract_ssh_credentials(b"\x00\x00\x00").is_none());
    }
}
