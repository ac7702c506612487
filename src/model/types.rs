//! CDN HTTP Resource Types
//!
//! Mirrors the management API's JSON document. Every field is an `Option`:
//! `None` means no opinion, `Some` carries a value, including an explicitly
//! empty collection or an object with nothing set.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::set::UniqueList;

/// One CDN HTTP resource (distribution)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Unix timestamp assigned at creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<Cache>,
    /// Certificate identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slice_size_megabytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modern_tls_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strong_ssl_ciphers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_redirects: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_http2: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http2https: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_http3: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compress: Option<Compress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robots: Option<Robots>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<Auth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors: Option<Cors>,
    /// Alternate host names served by the distribution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub names: Option<UniqueList<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limitations: Option<Limitations>,
    /// Image optimization and modification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ioss: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging: Option<Packaging>,
    /// Overrides keyed by request path pattern
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<BTreeMap<String, Location>>,
}

impl HttpResource {
    /// True when any server-assigned field is set
    pub fn has_server_owned_fields(&self) -> bool {
        self.id.is_some() || self.creation_ts.is_some() || self.cdn_domain.is_some()
    }
}

/// Upstream servers and how to reach them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    /// Servers keyed by host name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<BTreeMap<String, Server>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni_hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws: Option<Aws>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_verify: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fails: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<bool>,
}

/// Object-storage origin credentials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aws {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AwsCredentials>,
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwsCredentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cache {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consider_args: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args_whitelist: Option<UniqueList<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consider_cookies: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies_whitelist: Option<UniqueList<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<CacheValidity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_stale: Option<bool>,
}

/// Cache lifetimes per response status class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheValidity {
    #[serde(rename = "2xx", skip_serializing_if = "Option::is_none")]
    pub c_2xx: Option<String>,
    #[serde(rename = "3xx", skip_serializing_if = "Option::is_none")]
    pub c_3xx: Option<String>,
    #[serde(rename = "4xx", skip_serializing_if = "Option::is_none")]
    pub c_4xx: Option<String>,
    #[serde(rename = "5xx", skip_serializing_if = "Option::is_none")]
    pub c_5xx: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brotli: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gzip: Option<bool>,
}

/// robots.txt policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Robots {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "robotsContent", skip_serializing_if = "Option::is_none")]
    pub robots_content: Option<String>,
}

/// Request authorization: signed links or an external check URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Auth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forbidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<Md5Auth>,
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Md5Auth {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forever: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anywhere: Option<bool>,
}

impl fmt::Debug for Md5Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Md5Auth")
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .field("forever", &self.forever)
            .field("anywhere", &self.anywhere)
            .finish()
    }
}

/// Header rewriting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Headers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_in_response: Option<UniqueList<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domains: Option<UniqueList<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<UniqueList<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expose: Option<UniqueList<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub methods: Option<UniqueList<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable: Option<bool>,
}

/// Access limitations along four independent axes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Limitations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<UniqueList<RuleSet<GeoExclusion>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<UniqueList<RuleSet<IpExclusion>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<UniqueList<RuleSet<RefererExclusion>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub useragent: Option<UniqueList<RuleSet<UserAgentExclusion>>>,
}

/// Default action, its exceptions, and when the rule-set applies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "E: Serialize",
    deserialize = "E: Deserialize<'de> + PartialEq"
))]
pub struct RuleSet<E> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<UniqueList<E>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub times: Option<Vec<TimeWindow>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoExclusion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IpExclusion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefererExclusion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserAgentExclusion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub useragent: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Packaging {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mp4: Option<Mp4Packaging>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mp4Packaging {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_protocols: Option<UniqueList<String>>,
}

/// Path-scoped override. Nothing is inherited from the enclosing resource:
/// a `None` section means no override for this path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<Cache>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<Auth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors: Option<Cors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limitations: Option<Limitations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compress: Option<Compress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ioss: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging: Option<Packaging>,
    /// Applied in order; a terminating flag stops further rewriting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<Vec<RewriteRule>>,
    /// Status code returned instead of content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_http_status_code: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewriteRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_and_empty_are_distinct() {
        let absent = HttpResource::default();
        let empty = HttpResource {
            cache: Some(Cache::default()),
            ..Default::default()
        };

        assert_ne!(absent, empty);
        assert_eq!(serde_json::to_value(&absent).unwrap(), json!({}));
        assert_eq!(serde_json::to_value(&empty).unwrap(), json!({"cache": {}}));
    }

    #[test]
    fn test_empty_collection_is_present() {
        let resource = HttpResource {
            names: Some(UniqueList::new()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&resource).unwrap(), json!({"names": []}));
    }

    #[test]
    fn test_wire_field_names() {
        let cache = Cache {
            valid: Some(CacheValidity {
                c_2xx: Some("1d".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let robots = Robots {
            kind: Some("custom".to_string()),
            robots_content: Some("User-agent: *".to_string()),
        };

        assert_eq!(serde_json::to_value(&cache).unwrap(), json!({"valid": {"2xx": "1d"}}));
        assert_eq!(
            serde_json::to_value(&robots).unwrap(),
            json!({"type": "custom", "robotsContent": "User-agent: *"})
        );
    }

    #[test]
    fn test_secrets_redacted_in_debug() {
        let creds = AwsCredentials {
            access_key: Some("AKIA".to_string()),
            secret_key: Some("hunter2".to_string()),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("AKIA"));
        assert!(!rendered.contains("hunter2"));
    }
}
