//! Ledger node endpoints.
//!
//! An endpoint is validated once, up front, so that a channel never reaches
//! the network with an address that cannot possibly resolve.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::{Host, Url};

use crate::error::CoreError;

const SCHEMES: &[&str] = &["http", "https", "ws", "wss", "tcp"];

/// A syntactically valid `scheme://host[:port][/path]` node address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint {
    raw: String,
    url: Url,
}

impl Endpoint {
    /// Parse and validate a node address. Performs no I/O.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let invalid = |reason: String| CoreError::InvalidEndpoint {
            input: input.to_string(),
            reason,
        };

        let url = Url::parse(input).map_err(|e| invalid(e.to_string()))?;
        if !SCHEMES.contains(&url.scheme()) {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(invalid("credentials are not allowed".into()));
        }

        match url.host() {
            None => return Err(invalid("missing host".into())),
            Some(Host::Domain(domain)) => {
                let bad_label = domain
                    .split('.')
                    .any(|label| label.is_empty() || label.starts_with('-') || label.ends_with('-'));
                if bad_label {
                    return Err(invalid(format!("invalid host {domain}")));
                }
            }
            Some(Host::Ipv4(_) | Host::Ipv6(_)) => {}
        }

        Ok(Self {
            raw: input.to_string(),
            url,
        })
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// The explicit port, or the scheme's default one.
    pub fn port(&self) -> Option<u16> {
        self.url.port_or_known_default()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Endpoint {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Endpoint {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.raw
    }
}
