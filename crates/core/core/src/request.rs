//! The per-request view of an inbound webhook call.

use serde_json::Value;
use std::collections::HashMap;

/// Header mapping with lower-cased names.
pub type Headers = HashMap<String, String>;

/// An inbound webhook call as seen by the processor.
///
/// Built once per HTTP request and owned by the processor until the response
/// is produced. The raw body is kept byte-for-byte so signatures are checked
/// against exactly what the sender signed.
#[derive(Debug, Clone)]
pub struct IncomingWebhook {
    config_name: String,
    body: Vec<u8>,
    headers: Headers,
    payload: Value,
}

impl IncomingWebhook {
    /// Creates a request context for the config bound to the receiving route.
    ///
    /// Header names are lower-cased; when a name repeats, values are joined
    /// with `", "`.
    pub fn new<I, K, V>(config_name: impl Into<String>, body: impl Into<Vec<u8>>, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut normalized = Headers::new();
        for (name, value) in headers {
            let name = name.as_ref().to_ascii_lowercase();
            let value = value.into();
            normalized
                .entry(name)
                .and_modify(|existing: &mut String| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        let body = body.into();
        let payload = parse_payload(&body);

        Self {
            config_name: config_name.into(),
            body,
            headers: normalized,
            payload,
        }
    }

    /// Name of the config the request was routed to.
    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    /// The raw request body, exactly as received.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// All request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Looks up a header value, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The body parsed as structured data.
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

/// Parses a request body for storage.
///
/// JSON bodies are kept as structured values, anything else is stored as a
/// string, and an empty body becomes `null`.
fn parse_payload(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }

    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headers_are_case_insensitive() {
        let request = IncomingWebhook::new(
            "stripe",
            r#"{"a":1}"#,
            [("Signature", "abc"), ("Content-Type", "application/json")],
        );

        assert_eq!(request.header("signature"), Some("abc"));
        assert_eq!(request.header("SIGNATURE"), Some("abc"));
        assert!(request.headers().contains_key("content-type"));
        assert_eq!(request.header("missing"), None);
    }

    #[test]
    fn test_repeated_headers_are_joined() {
        let request = IncomingWebhook::new("a", "", [("Accept", "text/plain"), ("accept", "*/*")]);
        assert_eq!(request.header("accept"), Some("text/plain, */*"));
    }

    #[test]
    fn test_payload_parsing() {
        let json_body = IncomingWebhook::new("a", r#"{"a":1}"#, Headers::new());
        assert_eq!(json_body.payload(), &json!({"a": 1}));
        assert_eq!(json_body.body(), br#"{"a":1}"#);

        let text_body = IncomingWebhook::new("a", "event=ping", Headers::new());
        assert_eq!(text_body.payload(), &json!("event=ping"));

        let empty_body = IncomingWebhook::new("a", Vec::new(), Headers::new());
        assert_eq!(empty_body.payload(), &Value::Null);
    }
}
