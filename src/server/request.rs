use crate::handler::InboundRequest;
use may_minihttp::Request;
use std::collections::HashMap;
use std::io::Read;
use tracing::debug;

/// Parse query string parameters from a URL path
///
/// Extracts everything after the `?` character and URL-decodes parameter names
/// and values. A repeated name keeps its last value.
///
/// # Arguments
///
/// * `path` - The full URL path (e.g., `/Add?a=2&b=3`)
pub fn parse_query_params(path: &str) -> HashMap<String, String> {
    match path.split_once('?') {
        Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        None => HashMap::new(),
    }
}

/// Path component of a request target, without the query string.
pub fn request_path(raw: &str) -> &str {
    let path = raw.split('?').next().unwrap_or("/");
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// Convert a `may_minihttp::Request` into an [`InboundRequest`].
///
/// The HTTP method is ignored: every verb reaches the same route.
pub fn parse_request(req: Request) -> InboundRequest {
    let method = req.method().to_string();
    let raw_path = req.path().to_string();
    let path = request_path(&raw_path).to_string();
    let query = parse_query_params(&raw_path);

    let mut raw_body = Vec::new();
    if let Err(err) = req.body().read_to_end(&mut raw_body) {
        debug!(error = %err, read_bytes = raw_body.len(), "request body read failed");
    }
    let body = body_text(raw_body);

    debug!(
        method = %method,
        path = %path,
        param_count = query.len(),
        body_size_bytes = body.len(),
        "request parsed"
    );

    InboundRequest { path, query, body }
}

/// Decode a request payload as UTF-8, replacing invalid sequences.
///
/// A non-empty payload never decodes to an empty string, so it always selects
/// the body overload of a route.
pub fn body_text(raw: Vec<u8>) -> String {
    match String::from_utf8(raw) {
        Ok(text) => text,
        Err(err) => {
            let lossy = String::from_utf8_lossy(err.as_bytes()).into_owned();
            debug!(
                valid_up_to = err.utf8_error().valid_up_to(),
                "request body is not valid UTF-8, invalid bytes replaced"
            );
            lossy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_text_keeps_invalid_payloads_non_empty() {
        assert_eq!(body_text(br#"{"a":1}"#.to_vec()), r#"{"a":1}"#);
        assert_eq!(body_text(Vec::new()), "");
        let text = body_text(vec![0xFF, 0xFE, b'{', b'}']);
        assert_eq!(text, "\u{FFFD}\u{FFFD}{}");
    }

    #[test]
    fn test_parse_query_params() {
        let params = parse_query_params("/Add?a=2&b=3");
        assert_eq!(params.get("a").map(String::as_str), Some("2"));
        assert_eq!(params.get("b").map(String::as_str), Some("3"));
        assert!(parse_query_params("/Add").is_empty());
    }

    #[test]
    fn test_parse_query_params_decodes() {
        let params = parse_query_params("/Set?name=hello%20world&d=2021-01-01T10%3A00%3A00");
        assert_eq!(params["name"], "hello world");
        assert_eq!(params["d"], "2021-01-01T10:00:00");
        let params = parse_query_params("/Set?name=a+b&name=c");
        assert_eq!(params["name"], "c");
    }

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("/calc/Add?a=1"), "/calc/Add");
        assert_eq!(request_path("/Ping"), "/Ping");
        assert_eq!(request_path("?a=1"), "/");
    }
}
