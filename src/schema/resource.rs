//! CDN HTTP resource schema
//!
//! The top-level resource and the per-path location override are built from
//! the same sub-schemas. They differ only in what is mandatory: the
//! top-level resource must name its origin servers, while a location
//! override may carry an origin block without any.

use std::sync::OnceLock;

use serde_json::json;

use super::{Attribute, Kind, ObjectSchema};

/// Schema of a complete CDN HTTP resource
pub fn http_resource() -> &'static ObjectSchema {
    static SCHEMA: OnceLock<ObjectSchema> = OnceLock::new();
    SCHEMA.get_or_init(build_http_resource)
}

/// Schema of one entry of the `locations` map
pub fn location() -> &'static ObjectSchema {
    static SCHEMA: OnceLock<ObjectSchema> = OnceLock::new();
    SCHEMA.get_or_init(build_location)
}

fn build_http_resource() -> ObjectSchema {
    ObjectSchema::new(vec![
        Attribute::computed("id", Kind::string()),
        Attribute::required("name", Kind::string()),
        Attribute::computed("creation_ts", Kind::int()),
        Attribute::computed("cdn_domain", Kind::string()),
        Attribute::optional_computed("active", Kind::bool()).default_on_create(json!(true)),
        Attribute::required("origin", origin(true)),
        Attribute::optional("cache", cache()),
        Attribute::optional("certificate", Kind::int()),
        Attribute::optional("tuning", Kind::string()),
        Attribute::optional("slice_size_megabytes", Kind::int()),
        Attribute::optional("modern_tls_only", Kind::bool()),
        Attribute::optional("strong_ssl_ciphers", Kind::bool()),
        Attribute::optional("follow_redirects", Kind::bool()),
        Attribute::optional("no_http2", Kind::bool()),
        Attribute::optional("http2https", Kind::bool()),
        Attribute::optional("https_only", Kind::bool()),
        Attribute::optional("use_http3", Kind::bool()),
        Attribute::optional("compress", compress()),
        Attribute::optional("robots", robots()),
        Attribute::optional("auth", auth()),
        Attribute::optional("headers", headers()),
        Attribute::optional("cors", cors()),
        Attribute::optional("names", Kind::set(Kind::string())),
        Attribute::optional("limitations", limitations()),
        Attribute::optional("ioss", Kind::bool()),
        Attribute::optional("packaging", packaging()),
        Attribute::optional("locations", Kind::map(Kind::Object(location().clone()))),
    ])
}

fn build_location() -> ObjectSchema {
    ObjectSchema::new(vec![
        Attribute::optional("cache", cache()),
        Attribute::optional("origin", origin(false)),
        Attribute::optional("auth", auth()),
        Attribute::optional("headers", headers()),
        Attribute::optional("cors", cors()),
        Attribute::optional("limitations", limitations()),
        Attribute::optional("compress", compress()),
        Attribute::optional("ioss", Kind::bool()),
        Attribute::optional("packaging", packaging()),
        Attribute::optional(
            "rewrite",
            Kind::list(Kind::object(vec![
                Attribute::optional("from", Kind::string()),
                Attribute::optional("to", Kind::string()),
                Attribute::optional("flag", Kind::string()),
            ])),
        ),
        Attribute::optional("return_http_status_code", Kind::int()),
    ])
}

fn origin(servers_required: bool) -> Kind {
    let servers = Kind::map(Kind::object(vec![
        Attribute::optional("port", Kind::int()),
        Attribute::optional("weight", Kind::int()),
        Attribute::optional("max_fails", Kind::int()),
        Attribute::optional("backup", Kind::bool()),
    ]));

    Kind::object(vec![
        if servers_required {
            Attribute::required("servers", servers)
        } else {
            Attribute::optional("servers", servers)
        },
        Attribute::optional("hostname", Kind::string()),
        Attribute::optional("https", Kind::bool()),
        Attribute::optional("sni_hostname", Kind::string()),
        Attribute::optional("read_timeout", Kind::string()),
        Attribute::optional("send_timeout", Kind::string()),
        Attribute::optional("connect_timeout", Kind::string()),
        Attribute::optional(
            "aws",
            Kind::object(vec![Attribute::required(
                "auth",
                Kind::object(vec![
                    Attribute::required("access_key", Kind::string()),
                    Attribute::required("secret_key", Kind::string()),
                ]),
            )]),
        ),
        Attribute::optional("s3_bucket", Kind::string()),
        Attribute::optional("ssl_verify", Kind::bool()),
    ])
}

fn cache() -> Kind {
    Kind::object(vec![
        Attribute::optional("disable", Kind::bool()),
        Attribute::optional("consider_args", Kind::bool()),
        Attribute::optional("args_whitelist", Kind::set(Kind::string())),
        Attribute::optional("consider_cookies", Kind::bool()),
        Attribute::optional("cookies_whitelist", Kind::set(Kind::string())),
        Attribute::optional(
            "valid",
            Kind::object(vec![
                Attribute::optional("c_2xx", Kind::string()).wire("2xx"),
                Attribute::optional("c_3xx", Kind::string()).wire("3xx"),
                Attribute::optional("c_4xx", Kind::string()).wire("4xx"),
                Attribute::optional("c_5xx", Kind::string()).wire("5xx"),
                Attribute::optional("force", Kind::bool()),
            ]),
        ),
        Attribute::optional("use_stale", Kind::bool()),
    ])
}

fn compress() -> Kind {
    Kind::object(vec![
        Attribute::optional("brotli", Kind::bool()),
        Attribute::optional("gzip", Kind::bool()),
    ])
}

fn robots() -> Kind {
    Kind::object(vec![
        Attribute::required("type", Kind::string()),
        Attribute::optional("robots_content", Kind::string()).wire("robotsContent"),
    ])
}

fn auth() -> Kind {
    Kind::object(vec![
        Attribute::optional("url", Kind::string()),
        Attribute::optional("forbidden", Kind::bool()),
        Attribute::optional(
            "md5",
            Kind::object(vec![
                Attribute::optional("secret", Kind::string()),
                Attribute::optional("forever", Kind::bool()),
                Attribute::optional("anywhere", Kind::bool()),
            ]),
        ),
    ])
}

fn headers() -> Kind {
    Kind::object(vec![
        Attribute::optional("request", Kind::map(Kind::string())),
        Attribute::optional("response", Kind::map(Kind::string())),
        Attribute::optional("hide_in_response", Kind::set(Kind::string())),
    ])
}

fn cors() -> Kind {
    Kind::object(vec![
        Attribute::optional("domains", Kind::set(Kind::string())),
        Attribute::optional("headers", Kind::set(Kind::string())),
        Attribute::optional("expose", Kind::set(Kind::string())),
        Attribute::optional("methods", Kind::set(Kind::string())),
        Attribute::optional("credentials", Kind::bool()),
        Attribute::optional("max_age", Kind::int()),
        Attribute::optional("disable", Kind::bool()),
    ])
}

fn limitations() -> Kind {
    Kind::object(vec![
        Attribute::optional(
            "geo",
            rule_sets(vec![
                Attribute::required("action", Kind::string()),
                Attribute::required("country", Kind::string()),
                Attribute::required("region", Kind::string()),
            ]),
        ),
        Attribute::optional("ip", rule_sets(vec![Attribute::required("ip", Kind::string())])),
        Attribute::optional(
            "referer",
            rule_sets(vec![Attribute::required("referer", Kind::string())]),
        ),
        Attribute::optional(
            "useragent",
            rule_sets(vec![Attribute::required("useragent", Kind::string())]),
        ),
    ])
}

/// A set of rule-sets, each with a default action, its exclusions and
/// optional time windows
fn rule_sets(exclusion: Vec<Attribute>) -> Kind {
    Kind::set(Kind::object(vec![
        Attribute::required("default_action", Kind::string()),
        Attribute::required("exclude", Kind::set(Kind::object(exclusion))),
        Attribute::optional(
            "times",
            Kind::list(Kind::object(vec![
                Attribute::required("start", Kind::string()),
                Attribute::required("end", Kind::string()),
            ])),
        ),
    ]))
}

fn packaging() -> Kind {
    Kind::object(vec![Attribute::optional(
        "mp4",
        Kind::object(vec![Attribute::required(
            "output_protocols",
            Kind::set(Kind::string()),
        )]),
    )])
}
