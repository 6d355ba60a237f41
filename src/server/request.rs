//! Parsed control request

use std::collections::HashMap;

use axum::http::Uri;
use url::form_urlencoded;

/// Path and query of an incoming control request
///
/// The path is lower-cased for route matching. Query keys are matched
/// case-insensitively; the first occurrence of a key wins. Parsing never
/// fails: malformed pairs are decoded as far as possible and validated by
/// the handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlRequest {
    path: String,
    query: HashMap<String, String>,
}

impl ControlRequest {
    pub fn new(path: &str, query: Option<&str>) -> Self {
        let mut params = HashMap::new();

        if let Some(query) = query {
            for (key, value) in form_urlencoded::parse(query.as_bytes()) {
                params
                    .entry(key.to_lowercase())
                    .or_insert_with(|| value.into_owned());
            }
        }

        Self {
            path: path.to_lowercase(),
            query: params,
        }
    }

    pub fn from_uri(uri: &Uri) -> Self {
        Self::new(uri.path(), uri.query())
    }

    /// Lower-cased request path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameter by name; empty values count as missing
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .get(&name.to_lowercase())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}
