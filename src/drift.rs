//! Drift detection
//!
//! Compares what the operator asked for with what the server reports. Only
//! fields the desired model has an opinion on are compared; fields the
//! server fills in on its own are not drift. Keyed maps are replaced as a
//! whole on update, so extra observed keys are drift too.

use std::fmt;

use serde_json::Value;

use crate::error::Result;
use crate::model::HttpResource;
use crate::schema::{http_resource, AttrPath, Kind, ObjectSchema};

/// One field whose observed value differs from the desired one
#[derive(Debug, Clone, PartialEq)]
pub struct Drift {
    pub path: AttrPath,
    pub desired: Option<Value>,
    pub observed: Option<Value>,
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show(value: &Option<Value>) -> String {
            value
                .as_ref()
                .map(Value::to_string)
                .unwrap_or_else(|| "(absent)".to_string())
        }
        write!(
            f,
            "{}: desired {}, observed {}",
            self.path,
            show(&self.desired),
            show(&self.observed)
        )
    }
}

/// Every drifted field, in schema order. Empty when in sync.
pub fn detect(desired: &HttpResource, observed: &HttpResource) -> Result<Vec<Drift>> {
    let desired = serde_json::to_value(desired)?;
    let observed = serde_json::to_value(observed)?;

    let mut drifts = Vec::new();
    compare_object(http_resource(), &desired, &observed, &AttrPath::root(), &mut drifts);
    Ok(drifts)
}

fn compare_object(
    schema: &ObjectSchema,
    desired: &Value,
    observed: &Value,
    path: &AttrPath,
    drifts: &mut Vec<Drift>,
) {
    let Some(wanted) = desired.as_object() else {
        return;
    };
    let actual = observed.as_object();

    for attr in schema.attributes() {
        if attr.is_computed_only() {
            continue;
        }
        let Some(want) = wanted.get(attr.wire_name) else {
            continue;
        };
        let child = path.attr(attr.name);
        match actual.and_then(|fields| fields.get(attr.wire_name)) {
            Some(have) => compare(&attr.kind, want, have, &child, drifts),
            None => drifts.push(Drift {
                path: child,
                desired: Some(want.clone()),
                observed: None,
            }),
        }
    }
}

fn compare(kind: &Kind, desired: &Value, observed: &Value, path: &AttrPath, drifts: &mut Vec<Drift>) {
    match kind {
        Kind::Object(schema) => compare_object(schema, desired, observed, path, drifts),
        Kind::Map(elem) => {
            let (Some(wanted), Some(actual)) = (desired.as_object(), observed.as_object()) else {
                push(drifts, path, desired, observed);
                return;
            };
            for (key, want) in wanted {
                match actual.get(key) {
                    Some(have) => compare(elem, want, have, &path.key(key), drifts),
                    None => drifts.push(Drift {
                        path: path.key(key),
                        desired: Some(want.clone()),
                        observed: None,
                    }),
                }
            }
            for (key, have) in actual {
                if !wanted.contains_key(key) {
                    drifts.push(Drift {
                        path: path.key(key),
                        desired: None,
                        observed: Some(have.clone()),
                    });
                }
            }
        }
        Kind::Set(_) | Kind::List(_) | Kind::Scalar(_) => {
            if !equivalent(kind, desired, observed) {
                push(drifts, path, desired, observed);
            }
        }
    }
}

/// Whole-value equality under the schema: sets ignore order at every depth,
/// lists and scalars compare exactly
fn equivalent(kind: &Kind, left: &Value, right: &Value) -> bool {
    match kind {
        Kind::Scalar(_) => left == right,
        Kind::List(elem) => match (left.as_array(), right.as_array()) {
            (Some(l), Some(r)) => {
                l.len() == r.len() && l.iter().zip(r).all(|(a, b)| equivalent(elem, a, b))
            }
            _ => left == right,
        },
        Kind::Set(elem) => match (left.as_array(), right.as_array()) {
            (Some(l), Some(r)) => {
                let covers = |from: &[Value], to: &[Value]| {
                    from.iter().all(|a| to.iter().any(|b| equivalent(elem, a, b)))
                };
                l.len() == r.len() && covers(l.as_slice(), r.as_slice()) && covers(r.as_slice(), l.as_slice())
            }
            _ => left == right,
        },
        Kind::Map(elem) => match (left.as_object(), right.as_object()) {
            (Some(l), Some(r)) => {
                l.len() == r.len()
                    && l.iter()
                        .all(|(key, a)| r.get(key).is_some_and(|b| equivalent(elem, a, b)))
            }
            _ => left == right,
        },
        Kind::Object(schema) => match (left.as_object(), right.as_object()) {
            (Some(l), Some(r)) => schema.attributes().iter().all(|attr| {
                match (l.get(attr.wire_name), r.get(attr.wire_name)) {
                    (None, None) => true,
                    (Some(a), Some(b)) => equivalent(&attr.kind, a, b),
                    _ => false,
                }
            }),
            _ => left == right,
        },
    }
}

fn push(drifts: &mut Vec<Drift>, path: &AttrPath, desired: &Value, observed: &Value) {
    drifts.push(Drift {
        path: path.clone(),
        desired: Some(desired.clone()),
        observed: Some(observed.clone()),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{Converter, DesiredTree};
    use crate::schema::Phase;
    use crate::codec;
    use serde_json::json;

    fn model(value: Value) -> HttpResource {
        Converter::new()
            .to_typed_model(&DesiredTree::new(value), Phase::Update)
            .unwrap()
            .model
    }

    #[test]
    fn test_no_drift_when_server_adds_fields() {
        let desired = model(json!({"name": "s", "origin": {"servers": {"a.com": {"port": 443}}}}));
        let observed = codec::decode(
            br#"{"id": "1", "name": "s", "active": true, "cdn_domain": "d", "origin": {"servers": {"a.com": {"port": 443}}, "https": false}}"#,
        )
        .unwrap();

        assert!(detect(&desired, &observed).unwrap().is_empty());
    }

    #[test]
    fn test_scalar_and_missing_drift() {
        let desired = model(json!({
            "name": "s",
            "origin": {"servers": {"a.com": {"port": 443}}},
            "cache": {"disable": true}
        }));
        let observed = codec::decode(br#"{"name": "s", "origin": {"servers": {"a.com": {"port": 80}}}}"#).unwrap();

        let drifts = detect(&desired, &observed).unwrap();
        let paths: Vec<_> = drifts.iter().map(|d| d.path.to_string()).collect();
        assert_eq!(paths, vec!["origin.servers[\"a.com\"].port", "cache"]);
        assert_eq!(drifts[0].observed, Some(json!(80)));
        assert_eq!(drifts[1].observed, None);
    }

    #[test]
    fn test_extra_map_key_is_drift() {
        let desired = model(json!({"name": "s", "origin": {"servers": {"a.com": {}}}}));
        let observed = codec::decode(br#"{"name": "s", "origin": {"servers": {"a.com": {}, "b.com": {}}}}"#).unwrap();

        let drifts = detect(&desired, &observed).unwrap();
        assert_eq!(drifts.len(), 1);
        assert_eq!(drifts[0].path.to_string(), "origin.servers[\"b.com\"]");
        assert_eq!(drifts[0].desired, None);
    }

    #[test]
    fn test_set_order_is_not_drift_but_list_order_is() {
        let desired = model(json!({
            "name": "s",
            "origin": {"servers": {}},
            "names": ["a", "b"],
            "locations": {"/": {"rewrite": [{"from": "1"}, {"from": "2"}]}}
        }));
        let observed = codec::decode(
            br#"{"name": "s", "origin": {"servers": {}}, "names": ["b", "a"], "locations": {"/": {"rewrite": [{"from": "2"}, {"from": "1"}]}}}"#,
        )
        .unwrap();

        let drifts = detect(&desired, &observed).unwrap();
        assert_eq!(drifts.len(), 1);
        assert_eq!(drifts[0].path.to_string(), "locations[\"/\"].rewrite");
    }

    #[test]
    fn test_nested_set_order_is_not_drift() {
        let desired = model(json!({
            "name": "s",
            "origin": {"servers": {}},
            "limitations": {"geo": [{
                "default_action": "allow",
                "exclude": [
                    {"action": "deny", "country": "RU", "region": "MOW"},
                    {"action": "deny", "country": "US", "region": "CA"}
                ]
            }]},
            "packaging": {"mp4": {"output_protocols": ["hls", "dash"]}}
        }));
        let observed = codec::decode(
            br#"{"name": "s", "origin": {"servers": {}},
                "limitations": {"geo": [{"default_action": "allow", "exclude": [
                    {"action": "deny", "country": "US", "region": "CA"},
                    {"action": "deny", "country": "RU", "region": "MOW"}
                ]}]},
                "packaging": {"mp4": {"output_protocols": ["dash", "hls"]}}}"#,
        )
        .unwrap();

        assert_eq!(desired.limitations, observed.limitations);
        assert!(detect(&desired, &observed).unwrap().is_empty());
    }

    #[test]
    fn test_nested_set_member_change_is_drift() {
        let desired = model(json!({
            "name": "s",
            "origin": {"servers": {}},
            "limitations": {"geo": [{
                "default_action": "allow",
                "exclude": [{"action": "deny", "country": "RU", "region": "MOW"}]
            }]}
        }));
        let observed = codec::decode(
            br#"{"name": "s", "origin": {"servers": {}},
                "limitations": {"geo": [{"default_action": "allow", "exclude": [
                    {"action": "deny", "country": "RU", "region": "SPE"}
                ]}]}}"#,
        )
        .unwrap();

        let drifts = detect(&desired, &observed).unwrap();
        assert_eq!(drifts.len(), 1);
        assert_eq!(drifts[0].path.to_string(), "limitations.geo");
    }

    #[test]
    fn test_display() {
        let drift = Drift {
            path: AttrPath::parse("cache.disable"),
            desired: Some(json!(true)),
            observed: None,
        };
        assert_eq!(drift.to_string(), "cache.disable: desired true, observed (absent)");
    }
}
