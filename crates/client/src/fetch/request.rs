//! Intercepted request model.

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use stowaway_core::{Error, RequestIdentity};
use url::Url;

use super::url::canonicalize;

/// What the requester will do with the response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Top-level HTML navigation.
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    /// Programmatic fetch (e.g. the search index JSON).
    #[default]
    #[serde(rename = "")]
    Empty,
    Other,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Document => "document",
            Destination::Script => "script",
            Destination::Style => "style",
            Destination::Image => "image",
            Destination::Font => "font",
            Destination::Manifest => "manifest",
            Destination::Empty => "",
            Destination::Other => "other",
        }
    }
}

impl FromStr for Destination {
    type Err = std::convert::Infallible;

    /// Unknown destinations parse as `Other`; they all share the asset policy.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "document" => Destination::Document,
            "script" => Destination::Script,
            "style" => Destination::Style,
            "image" => Destination::Image,
            "font" => Destination::Font,
            "manifest" => Destination::Manifest,
            "" => Destination::Empty,
            _ => Destination::Other,
        })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the network layer treats intermediate HTTP caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    #[default]
    Default,
    /// Bypass HTTP caches on the way to the origin server.
    Reload,
}

/// A request issued by a page of the served origin.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub cache_mode: CacheMode,
    /// Page context that issued the request, if known.
    pub client_id: Option<String>,
}

impl Request {
    /// Build a request from an absolute URL, or a path resolved against `base`.
    pub fn new(method: Method, url: &str, base: Option<&Url>) -> Result<Self, Error> {
        let url = canonicalize(url, base).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self::from_url(method, url))
    }

    /// Build a request for an already canonical URL.
    pub fn from_url(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            destination: Destination::default(),
            headers: HeaderMap::new(),
            body: None,
            cache_mode: CacheMode::default(),
            client_id: None,
        }
    }

    /// Build a request from a textual method such as `"post"`.
    pub fn parse(method: &str, url: &str, base: Option<&Url>) -> Result<Self, Error> {
        let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::InvalidInput(format!("invalid HTTP method: {method:?}")))?;
        Self::new(method, url, base)
    }

    pub fn get(url: &str, base: Option<&Url>) -> Result<Self, Error> {
        Self::new(Method::GET, url, base)
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_cache_mode(mut self, cache_mode: CacheMode) -> Self {
        self.cache_mode = cache_mode;
        self
    }

    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Cache lookup key: method plus canonical URL.
    pub fn identity(&self) -> RequestIdentity {
        RequestIdentity::new(self.method.as_str(), self.url.as_str())
    }

    pub fn is_document(&self) -> bool {
        self.destination == Destination::Document
    }
}
