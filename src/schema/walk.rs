//! Schema-driven tree walker
//!
//! One depth-first walk validates a JSON tree against the schema, renames
//! keys between the desired and wire namings, and applies the null and
//! default-fill rules. The Converter and the Wire Codec both go through it
//! with different policies, so neither carries its own copy of the
//! per-field mapping.

use std::fmt;

use serde_json::{Map, Value};

use super::{AttrPath, Kind, Naming, ObjectSchema, Phase, Presence, ScalarKind};
use crate::error::{CdnError, Result};

/// Non-fatal observations made while walking a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// A server-owned attribute was supplied and dropped
    ComputedIgnored,
    /// A repeated set member was collapsed into the first occurrence
    DuplicateCollapsed,
    /// An attribute the schema does not know was skipped
    UnknownIgnored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionWarning {
    pub path: AttrPath,
    pub kind: WarningKind,
}

impl fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            WarningKind::ComputedIgnored => {
                write!(f, "{} is assigned by the server and was ignored", self.path)
            }
            WarningKind::DuplicateCollapsed => {
                write!(f, "{} duplicates an earlier set member and was dropped", self.path)
            }
            WarningKind::UnknownIgnored => write!(f, "{} is not a known attribute", self.path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnknownKeys {
    Reject,
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Failure {
    SchemaMismatch,
    MalformedPayload,
}

/// How a walk treats its input
#[derive(Debug, Clone, Copy)]
pub(crate) struct Policy {
    pub from: Naming,
    pub to: Naming,
    pub unknown_keys: UnknownKeys,
    pub strip_computed: bool,
    pub enforce_required: bool,
    pub phase: Option<Phase>,
    pub failure: Failure,
}

impl Policy {
    /// Operator-authored desired tree into wire shape
    pub fn desired(phase: Phase) -> Self {
        Self {
            from: Naming::Desired,
            to: Naming::Wire,
            unknown_keys: UnknownKeys::Reject,
            strip_computed: true,
            enforce_required: true,
            phase: Some(phase),
            failure: Failure::SchemaMismatch,
        }
    }

    /// Server payload validated in place
    pub fn payload() -> Self {
        Self {
            from: Naming::Wire,
            to: Naming::Wire,
            unknown_keys: UnknownKeys::Ignore,
            strip_computed: false,
            enforce_required: false,
            phase: None,
            failure: Failure::MalformedPayload,
        }
    }

    /// Wire shape into the operator-facing observed tree
    pub fn observed() -> Self {
        Self {
            to: Naming::Desired,
            ..Self::payload()
        }
    }

    /// Caller-supplied model values addressed by wire path
    pub fn model_edit() -> Self {
        Self {
            unknown_keys: UnknownKeys::Reject,
            failure: Failure::SchemaMismatch,
            ..Self::payload()
        }
    }
}

pub(crate) struct Walker {
    policy: Policy,
    warnings: Vec<ConversionWarning>,
}

impl Walker {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            warnings: Vec::new(),
        }
    }

    pub fn into_warnings(self) -> Vec<ConversionWarning> {
        self.warnings
    }

    /// Walk a whole tree rooted at `schema`
    pub fn walk(&mut self, schema: &ObjectSchema, node: &Value) -> Result<Value> {
        self.object(schema, node, &AttrPath::root()).map(Value::Object)
    }

    fn object(
        &mut self,
        schema: &ObjectSchema,
        node: &Value,
        path: &AttrPath,
    ) -> Result<Map<String, Value>> {
        let fields = match node {
            // Key written with no value: the object exists with nothing set
            Value::Null => return Ok(Map::new()),
            Value::Object(fields) => fields,
            other => return Err(self.mismatch(path, "object", describe(other))),
        };

        for key in fields.keys() {
            if schema.attribute(key, self.policy.from).is_none() {
                match self.policy.unknown_keys {
                    UnknownKeys::Reject => {
                        return Err(self.mismatch(&path.attr(key), "a known attribute", "unknown attribute"))
                    }
                    UnknownKeys::Ignore => self.warn(path.attr(key), WarningKind::UnknownIgnored),
                }
            }
        }

        // Required children are only checked once a nested object carries a
        // field; an empty nested object is the zero-initialized instance. The
        // resource itself always needs its required attributes.
        let carries_fields = path.is_root() || fields.values().any(|v| !v.is_null());

        let mut out = Map::new();
        for attr in schema.attributes() {
            let from_key = attr.key(self.policy.from);
            let to_key = attr.key(self.policy.to).to_string();
            let child = path.attr(from_key);
            let value = fields.get(from_key);

            if attr.is_computed_only() && self.policy.strip_computed {
                if value.is_some_and(|v| !v.is_null()) {
                    self.warn(child, WarningKind::ComputedIgnored);
                }
                continue;
            }

            match value {
                Some(Value::Null) if attr.kind.is_object() => {
                    out.insert(to_key, Value::Object(Map::new()));
                }
                Some(v) if !v.is_null() => {
                    let converted = self.value(&attr.kind, v, &child)?;
                    out.insert(to_key, converted);
                }
                _ => {
                    let default = self
                        .policy
                        .phase
                        .and_then(|phase| attr.default.as_ref()?.value_for(phase));
                    if let Some(default) = default {
                        out.insert(to_key, default.clone());
                    } else if self.policy.enforce_required
                        && carries_fields
                        && attr.presence == Presence::Required
                    {
                        return Err(self.mismatch(&child, attr.kind.describe(), "absent"));
                    }
                }
            }
        }

        Ok(out)
    }

    fn value(&mut self, kind: &Kind, node: &Value, path: &AttrPath) -> Result<Value> {
        match kind {
            Kind::Scalar(scalar) => self.scalar(*scalar, node, path),
            Kind::List(elem) => {
                let items = self.array(kind, node, path)?;
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(self.element(elem, item, &path.index(i))?);
                }
                Ok(Value::Array(out))
            }
            Kind::Set(elem) => {
                let items = self.array(kind, node, path)?;
                let mut members: Vec<Value> = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let member = self.element(elem, item, &path.index(i))?;
                    if members.contains(&member) {
                        self.warn(path.index(i), WarningKind::DuplicateCollapsed);
                    } else {
                        members.push(member);
                    }
                }
                Ok(Value::Array(members))
            }
            Kind::Map(elem) => {
                let entries = match node {
                    Value::Object(entries) => entries,
                    other => return Err(self.mismatch(path, kind.describe(), describe(other))),
                };
                let mut out = Map::new();
                for (key, item) in entries {
                    out.insert(key.clone(), self.element(elem, item, &path.key(key))?);
                }
                Ok(Value::Object(out))
            }
            Kind::Object(schema) => self.object(schema, node, path).map(Value::Object),
        }
    }

    /// Collection members and map values: a null object entry is an empty
    /// object, any other null is a shape error
    fn element(&mut self, kind: &Kind, node: &Value, path: &AttrPath) -> Result<Value> {
        if node.is_null() {
            if kind.is_object() {
                return Ok(Value::Object(Map::new()));
            }
            return Err(self.mismatch(path, kind.describe(), "null"));
        }
        self.value(kind, node, path)
    }

    fn scalar(&self, scalar: ScalarKind, node: &Value, path: &AttrPath) -> Result<Value> {
        let matches = match scalar {
            ScalarKind::Bool => node.is_boolean(),
            ScalarKind::Int => node.as_i64().is_some(),
            ScalarKind::String => node.is_string(),
        };
        if matches {
            Ok(node.clone())
        } else {
            Err(self.mismatch(path, Kind::Scalar(scalar).describe(), describe(node)))
        }
    }

    fn array<'v>(&self, kind: &Kind, node: &'v Value, path: &AttrPath) -> Result<&'v Vec<Value>> {
        match node {
            Value::Array(items) => Ok(items),
            other => Err(self.mismatch(path, kind.describe(), describe(other))),
        }
    }

    fn warn(&mut self, path: AttrPath, kind: WarningKind) {
        self.warnings.push(ConversionWarning { path, kind });
    }

    fn mismatch(&self, path: &AttrPath, expected: &str, actual: &str) -> CdnError {
        let (path, expected, actual) = (path.to_string(), expected.to_string(), actual.to_string());
        match self.policy.failure {
            Failure::SchemaMismatch => CdnError::SchemaMismatch {
                path,
                expected,
                actual,
            },
            Failure::MalformedPayload => CdnError::MalformedPayload {
                path,
                expected,
                actual,
            },
        }
    }
}

/// JSON kind of a node, as reported in mismatch errors
pub(crate) fn describe(node: &Value) -> &'static str {
    match node {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() => "integer",
        Value::Number(n) if n.is_u64() => "out-of-range integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::http_resource;
    use serde_json::json;

    fn walk(policy: Policy, node: Value) -> Result<(Value, Vec<ConversionWarning>)> {
        let mut walker = Walker::new(policy);
        let out = walker.walk(http_resource(), &node)?;
        Ok((out, walker.into_warnings()))
    }

    #[test]
    fn test_desired_renames_to_wire_keys() {
        let (out, _) = walk(
            Policy::desired(Phase::Update),
            json!({
                "name": "site",
                "origin": {"servers": {"a.com": {}}},
                "cache": {"valid": {"c_2xx": "1d"}},
                "robots": {"type": "disallow", "robots_content": "x"}
            }),
        )
        .unwrap();

        assert_eq!(out["cache"]["valid"], json!({"2xx": "1d"}));
        assert_eq!(out["robots"], json!({"type": "disallow", "robotsContent": "x"}));
    }

    #[test]
    fn test_strips_computed_with_warning() {
        let (out, warnings) = walk(
            Policy::desired(Phase::Update),
            json!({"id": "17", "name": "site", "origin": {"servers": {}}}),
        )
        .unwrap();

        assert!(out.get("id").is_none());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::ComputedIgnored);
        assert_eq!(warnings[0].path.to_string(), "id");
    }

    #[test]
    fn test_int_rejects_float_and_string() {
        let err = walk(
            Policy::desired(Phase::Update),
            json!({"name": "site", "origin": {"servers": {"a.com": {"port": "443"}}}}),
        )
        .unwrap_err();

        match err {
            CdnError::SchemaMismatch { path, expected, actual } => {
                assert_eq!(path, "origin.servers[\"a.com\"].port");
                assert_eq!(expected, "integer");
                assert_eq!(actual, "string");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = walk(
            Policy::desired(Phase::Update),
            json!({"name": "site", "origin": {"servers": {}}, "certificate": 1.5}),
        )
        .unwrap_err();
        assert!(matches!(err, CdnError::SchemaMismatch { actual, .. } if actual == "number"));
    }

    #[test]
    fn test_payload_policy_reports_malformed_and_ignores_unknown() {
        let (out, warnings) = walk(Policy::payload(), json!({"name": "x", "billing": {"plan": 1}})).unwrap();
        assert!(out.get("billing").is_none());
        assert_eq!(warnings[0].kind, WarningKind::UnknownIgnored);

        let err = walk(Policy::payload(), json!({"cache": "on"})).unwrap_err();
        assert!(matches!(err, CdnError::MalformedPayload { path, .. } if path == "cache"));
    }

    #[test]
    fn test_set_members_collapse() {
        let (out, warnings) = walk(
            Policy::desired(Phase::Update),
            json!({"name": "s", "origin": {"servers": {}}, "names": ["a", "b", "a"]}),
        )
        .unwrap();

        assert_eq!(out["names"], json!(["a", "b"]));
        assert_eq!(warnings[0].kind, WarningKind::DuplicateCollapsed);
        assert_eq!(warnings[0].path.to_string(), "names[2]");
    }

    #[test]
    fn test_required_checked_only_on_populated_objects() {
        let (out, _) = walk(
            Policy::desired(Phase::Update),
            json!({"name": "s", "origin": {"servers": {}}, "robots": {}}),
        )
        .unwrap();
        assert_eq!(out["robots"], json!({}));

        let err = walk(
            Policy::desired(Phase::Update),
            json!({"name": "s", "origin": {"servers": {}}, "robots": {"robots_content": "x"}}),
        )
        .unwrap_err();
        assert!(matches!(err, CdnError::SchemaMismatch { path, actual, .. } if path == "robots.type" && actual == "absent"));
    }

    #[test]
    fn test_resource_required_attributes_always_checked() {
        for tree in [json!({}), json!({"cache": null})] {
            let err = walk(Policy::desired(Phase::Create), tree).unwrap_err();
            match err {
                CdnError::SchemaMismatch { path, expected, actual } => {
                    assert_eq!(path, "name");
                    assert_eq!(expected, "string");
                    assert_eq!(actual, "absent");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        let err = walk(Policy::desired(Phase::Update), json!({"name": "s"})).unwrap_err();
        assert!(matches!(err, CdnError::SchemaMismatch { path, .. } if path == "origin"));
    }

    #[test]
    fn test_server_payload_needs_no_required_attributes() {
        let (out, _) = walk(Policy::payload(), json!({})).unwrap();
        assert_eq!(out, json!({}));
    }

    #[test]
    fn test_describe_out_of_range_integer() {
        assert_eq!(describe(&json!(7)), "integer");
        assert_eq!(describe(&json!(u64::MAX)), "out-of-range integer");
        assert_eq!(describe(&json!(1.5)), "number");

        let err = walk(
            Policy::desired(Phase::Update),
            json!({"name": "s", "origin": {"servers": {}}, "certificate": u64::MAX}),
        )
        .unwrap_err();
        match err {
            CdnError::SchemaMismatch { expected, actual, .. } => {
                assert_eq!(expected, "integer");
                assert_eq!(actual, "out-of-range integer");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
