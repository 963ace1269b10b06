//! PJAX request headers and the fragment-request classifier.

use std::collections::HashMap;

/// Present on every request the client library sends.
pub const X_PJAX: &str = "x-pjax";

/// Space-delimited container selectors the client wants refreshed; only the
/// first one is matched.
pub const X_PJAX_CONTAINER: &str = "x-pjax-container";

/// Request headers keyed by lowercased name.
///
/// Proxies and load balancers are free to change header casing, so names are
/// normalized once on the way in.
#[derive(Debug, Clone, Default)]
pub struct RequestHeaders {
    values: HashMap<String, String>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.insert(name.as_ref(), value);
        }
        headers
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

impl From<HashMap<String, String>> for RequestHeaders {
    fn from(map: HashMap<String, String>) -> Self {
        Self::from_pairs(map)
    }
}

/// Whether the request asks for the fragment of the container `#id`.
pub fn requires_pjax(headers: &RequestHeaders, id: &str) -> bool {
    if headers.get(X_PJAX).is_none() {
        tracing::trace!("no X-Pjax header");
        return false;
    }

    let Some(container) = headers.get(X_PJAX_CONTAINER) else {
        tracing::trace!("no X-Pjax-Container header");
        return false;
    };

    let target = container.split(' ').next().unwrap_or_default();
    target == format!("#{id}")
}
