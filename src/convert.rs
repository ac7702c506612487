//! Desired/Observed Tree Converter
//!
//! The desired tree is what the operator wrote: operator-facing keys,
//! possibly under-specified, possibly containing server-owned fields that
//! must not be sent. The observed tree is the last document confirmed by the
//! server, rendered with the same keys so the two can be compared.
//!
//! A key written with `null` for an object means "object present, nothing
//! set"; a missing key means "no opinion". Keyed maps keep their keys, sets
//! keep first occurrences, ordered lists keep their order.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{CdnError, Result};
use crate::model::HttpResource;
use crate::schema::walk::{Policy, Walker};
use crate::schema::{http_resource, ConversionWarning, ObjectSchema, Phase};

/// Operator-authored configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesiredTree(Value);

/// Configuration last confirmed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservedTree(Value);

macro_rules! tree_accessors {
    ($tree:ident) => {
        impl $tree {
            pub fn new(value: Value) -> Self {
                Self(value)
            }

            pub fn as_value(&self) -> &Value {
                &self.0
            }

            pub fn into_value(self) -> Value {
                self.0
            }

            /// Top-level string attribute, if set
            pub fn str_attr(&self, key: &str) -> Option<&str> {
                self.0.get(key).and_then(Value::as_str)
            }
        }

        impl From<Value> for $tree {
            fn from(value: Value) -> Self {
                Self(value)
            }
        }

        impl FromStr for $tree {
            type Err = serde_json::Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                serde_json::from_str(s).map(Self)
            }
        }
    };
}

tree_accessors!(DesiredTree);
tree_accessors!(ObservedTree);

impl ObservedTree {
    /// Server-assigned identifier
    pub fn id(&self) -> Option<&str> {
        self.str_attr("id")
    }
}

/// Result of converting a desired tree
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub model: HttpResource,
    pub warnings: Vec<ConversionWarning>,
}

/// Converts between the reconciliation-facing trees and the typed model
#[derive(Debug, Clone, Copy)]
pub struct Converter {
    schema: &'static ObjectSchema,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    pub fn new() -> Self {
        Self {
            schema: http_resource(),
        }
    }

    /// Build the typed model a request is encoded from.
    ///
    /// Server-owned fields are dropped with a warning. `active` is defaulted
    /// to `true` only for [`Phase::Create`].
    pub fn to_typed_model(&self, desired: &DesiredTree, phase: Phase) -> Result<Conversion> {
        let mut walker = Walker::new(Policy::desired(phase));
        let wire = walker.walk(self.schema, desired.as_value())?;
        let warnings = walker.into_warnings();

        for warning in &warnings {
            warn!(%warning, "Desired tree conversion warning");
        }

        let model = serde_json::from_value(wire).map_err(|e| CdnError::SchemaMismatch {
            path: "$".to_string(),
            expected: "http resource".to_string(),
            actual: e.to_string(),
        })?;
        debug!(?phase, warnings = warnings.len(), "Converted desired tree");

        Ok(Conversion { model, warnings })
    }

    /// Render a model with operator-facing keys, presence preserved
    pub fn to_observed_tree(&self, model: &HttpResource) -> Result<ObservedTree> {
        let wire = serde_json::to_value(model)?;
        let observed = Walker::new(Policy::observed()).walk(self.schema, &wire)?;
        Ok(ObservedTree(observed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::error::CdnError;
    use crate::schema::WarningKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn desired(value: Value) -> DesiredTree {
        DesiredTree::new(value)
    }

    fn full_desired() -> Value {
        json!({
            "name": "site",
            "active": true,
            "origin": {
                "servers": {
                    "google.com": {"port": 443, "weight": 1, "max_fails": 10, "backup": false},
                    "storage.yandexcloud.net": {}
                },
                "hostname": "origin.example",
                "https": true,
                "read_timeout": "10s",
                "aws": {"auth": {"access_key": "ak", "secret_key": "sk"}},
                "ssl_verify": false
            },
            "cache": {
                "consider_args": true,
                "args_whitelist": ["param1"],
                "valid": {"c_2xx": "1d", "c_4xx": "1s", "force": false}
            },
            "robots": {"type": "custom", "robots_content": "User-agent: *"},
            "headers": {"request": {"X-A": "1"}, "hide_in_response": []},
            "names": ["cdn.example", "static.example"],
            "limitations": {
                "geo": [{
                    "default_action": "allow",
                    "exclude": [
                        {"action": "deny", "country": "RU", "region": "MOW"},
                        {"action": "deny", "country": "US", "region": "CA"}
                    ],
                    "times": [{"start": "09:00", "end": "18:00"}]
                }],
                "ip": [{"default_action": "deny", "exclude": [{"ip": "10.0.0.0/8"}]}]
            },
            "packaging": {"mp4": {"output_protocols": ["hls", "dash"]}},
            "locations": {
                "/img": {
                    "compress": {"gzip": true},
                    "rewrite": [
                        {"from": "^/a", "to": "/b", "flag": "break"},
                        {"from": "^/a", "to": "/c"}
                    ],
                    "return_http_status_code": 403
                },
                "/api": {"origin": {"hostname": "api.example"}}
            }
        })
    }

    #[test]
    fn test_round_trip_idempotence() {
        let converter = Converter::new();
        let model = converter
            .to_typed_model(&desired(full_desired()), Phase::Update)
            .unwrap()
            .model;

        let observed = converter.to_observed_tree(&model).unwrap();
        let again = converter
            .to_typed_model(&DesiredTree::new(observed.into_value()), Phase::Update)
            .unwrap();

        assert_eq!(again.model, model);
        assert!(again.warnings.is_empty());
    }

    #[test]
    fn test_null_versus_absent_cache() {
        let converter = Converter::new();
        let with_null = converter
            .to_typed_model(
                &desired(json!({"name": "s", "origin": {"servers": {}}, "cache": null})),
                Phase::Update,
            )
            .unwrap()
            .model;
        let without = converter
            .to_typed_model(&desired(json!({"name": "s", "origin": {"servers": {}}})), Phase::Update)
            .unwrap()
            .model;

        assert_eq!(with_null.cache, Some(Default::default()));
        assert_eq!(without.cache, None);

        let with_null_wire: Value = serde_json::from_slice(&codec::encode(&with_null).unwrap()).unwrap();
        let without_wire: Value = serde_json::from_slice(&codec::encode(&without).unwrap()).unwrap();
        assert_eq!(with_null_wire["cache"], json!({}));
        assert!(without_wire.get("cache").is_none());
    }

    #[test]
    fn test_collection_fidelity() {
        let converter = Converter::new();
        let model = converter
            .to_typed_model(
                &desired(json!({
                    "name": "s",
                    "origin": {"servers": {"a.com": {"port": 443}, "b.com": {}}}
                })),
                Phase::Update,
            )
            .unwrap()
            .model;

        let servers = model.origin.as_ref().unwrap().servers.as_ref().unwrap();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers["a.com"].port, Some(443));
        assert_eq!(servers["b.com"], Default::default());

        let wire: Value = serde_json::from_slice(&codec::encode(&model).unwrap()).unwrap();
        assert_eq!(wire["origin"]["servers"], json!({"a.com": {"port": 443}, "b.com": {}}));
    }

    #[test]
    fn test_rewrite_order_preserved() {
        let converter = Converter::new();
        let model = converter
            .to_typed_model(&desired(full_desired()), Phase::Update)
            .unwrap()
            .model;

        let rules = model.locations.as_ref().unwrap()["/img"].rewrite.clone().unwrap();
        let targets: Vec<_> = rules.iter().map(|r| r.to.clone().unwrap()).collect();
        assert_eq!(targets, vec!["/b", "/c"]);

        let observed = converter.to_observed_tree(&model).unwrap();
        assert_eq!(
            observed.as_value()["locations"]["/img"]["rewrite"],
            json!([
                {"from": "^/a", "to": "/b", "flag": "break"},
                {"from": "^/a", "to": "/c"}
            ])
        );
    }

    #[test]
    fn test_time_window_order_preserved() {
        let converter = Converter::new();
        let windows = json!([
            {"start": "18:00", "end": "23:00"},
            {"start": "06:00", "end": "09:00"}
        ]);
        let model = converter
            .to_typed_model(
                &desired(json!({
                    "name": "s",
                    "origin": {"servers": {}},
                    "limitations": {
                        "geo": [{
                            "default_action": "deny",
                            "exclude": [{"action": "allow", "country": "RU", "region": "MOW"}],
                            "times": windows.clone()
                        }]
                    }
                })),
                Phase::Update,
            )
            .unwrap()
            .model;

        let geo = model.limitations.as_ref().unwrap().geo.as_ref().unwrap();
        let times = geo.as_slice()[0].times.as_ref().unwrap();
        assert_eq!(times[0].start.as_deref(), Some("18:00"));
        assert_eq!(times[1].start.as_deref(), Some("06:00"));

        let observed = converter.to_observed_tree(&model).unwrap();
        assert_eq!(observed.as_value()["limitations"]["geo"][0]["times"], windows);
    }

    #[test]
    fn test_computed_fields_ignored() {
        let converter = Converter::new();
        let conversion = converter
            .to_typed_model(
                &desired(json!({
                    "id": "999",
                    "cdn_domain": "x.cdnvideo.ru",
                    "creation_ts": 1700000000,
                    "name": "s",
                    "origin": {"servers": {}}
                })),
                Phase::Update,
            )
            .unwrap();

        assert!(!conversion.model.has_server_owned_fields());
        let ignored: Vec<_> = conversion
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::ComputedIgnored)
            .map(|w| w.path.to_string())
            .collect();
        assert_eq!(ignored, vec!["id", "creation_ts", "cdn_domain"]);
    }

    #[test]
    fn test_active_defaults_only_on_create() {
        let converter = Converter::new();
        let tree = desired(json!({"name": "s", "origin": {"servers": {}}}));

        let created = converter.to_typed_model(&tree, Phase::Create).unwrap().model;
        let updated = converter.to_typed_model(&tree, Phase::Update).unwrap().model;
        assert_eq!(created.active, Some(true));
        assert_eq!(updated.active, None);

        let explicit = desired(json!({"name": "s", "active": false, "origin": {"servers": {}}}));
        let created = converter.to_typed_model(&explicit, Phase::Create).unwrap().model;
        assert_eq!(created.active, Some(false));
    }

    #[test]
    fn test_schema_mismatch_reports_path() {
        let converter = Converter::new();
        let err = converter
            .to_typed_model(
                &desired(json!({
                    "name": "s",
                    "origin": {"servers": {}},
                    "locations": {"/x": {"cache": "yes"}}
                })),
                Phase::Update,
            )
            .unwrap_err();

        match err {
            CdnError::SchemaMismatch { path, expected, actual } => {
                assert_eq!(path, "locations[\"/x\"].cache");
                assert_eq!(expected, "object");
                assert_eq!(actual, "string");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_reported_as_absent() {
        let converter = Converter::new();
        let err = converter
            .to_typed_model(&desired(json!({"name": "s", "origin": {"hostname": "h"}})), Phase::Create)
            .unwrap_err();
        assert!(matches!(err, CdnError::SchemaMismatch { path, actual, .. } if path == "origin.servers" && actual == "absent"));
    }

    #[test]
    fn test_location_origin_may_omit_servers() {
        let converter = Converter::new();
        let model = converter
            .to_typed_model(&desired(full_desired()), Phase::Update)
            .unwrap()
            .model;
        let api = &model.locations.as_ref().unwrap()["/api"];
        assert_eq!(api.origin.as_ref().unwrap().servers, None);
        assert_eq!(api.cache, None);
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let converter = Converter::new();
        let err = converter
            .to_typed_model(
                &desired(json!({"name": "s", "origin": {"servers": {}}, "cahce": {}})),
                Phase::Update,
            )
            .unwrap_err();
        assert!(matches!(err, CdnError::SchemaMismatch { path, .. } if path == "cahce"));
    }

    #[test]
    fn test_observed_tree_uses_operator_keys() {
        let converter = Converter::new();
        let model = codec::decode(
            br#"{"id": "7", "cdn_domain": "7.cdnvideo.ru", "cache": {"valid": {"2xx": "1h"}}, "robots": {"type": "t", "robotsContent": "c"}}"#,
        )
        .unwrap();

        let observed = converter.to_observed_tree(&model).unwrap();
        assert_eq!(observed.id(), Some("7"));
        assert_eq!(observed.as_value()["cache"]["valid"], json!({"c_2xx": "1h"}));
        assert_eq!(observed.as_value()["robots"]["robots_content"], json!("c"));
        assert_eq!(observed.str_attr("cdn_domain"), Some("7.cdnvideo.ru"));
    }
}
