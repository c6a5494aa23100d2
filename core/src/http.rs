//! HTTP transport types exchanged with a [`Transport`](crate::transport::Transport).
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! dispatcher builds `HttpRequest` values and interprets `HttpResponse` values;
//! the transport is the only piece that touches the network. Status codes are
//! never interpreted here.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Ordered header mapping with ASCII case-insensitive keys.
///
/// Inserting a name that is already present replaces the value in place, so
/// the original position (and spelling) of the first insertion is kept.
/// [`append`](Headers::append) keeps every value instead, which is how
/// received responses are recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a header, returning the previous value for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => Some(std::mem::replace(&mut self.0[idx].1, value)),
            None => {
                self.0.push((name, value));
                None
            }
        }
    }

    /// Add a header without touching existing entries of the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// First value recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.0[idx].1.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove every entry for `name`, returning the first value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let first = self.get(name).map(str::to_string);
        self.0.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        first
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Layer `self` over `base`: every header of `base` is kept unless `self`
    /// carries the same name, in which case `self` wins.
    pub fn merged_over(&self, base: &Headers) -> Headers {
        let mut merged = base.clone();
        for (name, value) in self.iter() {
            merged.insert(name, value);
        }
        merged
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Serialized as an object keyed by the first spelling of each name.
/// Repeated `set-cookie` values become an array; other repeated values are
/// joined with `", "`.
impl Serialize for Headers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut names: Vec<&str> = Vec::new();
        for (name, _) in &self.0 {
            if !names.iter().any(|seen| seen.eq_ignore_ascii_case(name)) {
                names.push(name);
            }
        }

        let mut map = serializer.serialize_map(Some(names.len()))?;
        for name in names {
            let values: Vec<&str> = self.get_all(name).collect();
            match values.as_slice() {
                [single] => map.serialize_entry(name, single)?,
                _ if name.eq_ignore_ascii_case("set-cookie") => map.serialize_entry(name, &values)?,
                _ => map.serialize_entry(name, &values.join(", "))?,
            }
        }
        map.end()
    }
}

/// An HTTP request described as plain data, ready for a transport.
///
/// `url` is absolute and already carries any query parameters.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<String>,
}

/// An HTTP response described as plain data, as returned by a transport.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: String,
}
