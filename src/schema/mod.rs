//! Schema Tree
//!
//! Static description of every attribute of a CDN HTTP resource: its kind,
//! whether the operator must, may or may not supply it, and default-fill
//! rules. The schema carries two names per attribute because the operator's
//! desired tree and the API's wire format disagree on a handful of keys
//! (`c_2xx` vs `2xx`, `robots_content` vs `robotsContent`).

mod path;
pub mod resource;
pub(crate) mod walk;

pub use path::{AttrPath, Segment};
pub use resource::{http_resource, location};
pub use walk::{ConversionWarning, WarningKind};

use serde_json::Value;

/// Scalar leaf kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int,
    String,
}

/// Shape of an attribute
#[derive(Debug, Clone)]
pub enum Kind {
    Scalar(ScalarKind),
    /// Ordered sequence; position is significant
    List(Box<Kind>),
    /// Unordered collection without duplicates
    Set(Box<Kind>),
    /// Entries keyed by an identifier (server host, path pattern, header name)
    Map(Box<Kind>),
    /// Nested object
    Object(ObjectSchema),
}

impl Kind {
    pub fn bool() -> Self {
        Kind::Scalar(ScalarKind::Bool)
    }

    pub fn int() -> Self {
        Kind::Scalar(ScalarKind::Int)
    }

    pub fn string() -> Self {
        Kind::Scalar(ScalarKind::String)
    }

    pub fn list(elem: Kind) -> Self {
        Kind::List(Box::new(elem))
    }

    pub fn set(elem: Kind) -> Self {
        Kind::Set(Box::new(elem))
    }

    pub fn map(elem: Kind) -> Self {
        Kind::Map(Box::new(elem))
    }

    pub fn object(attributes: Vec<Attribute>) -> Self {
        Kind::Object(ObjectSchema::new(attributes))
    }

    /// Name used in mismatch reports
    pub fn describe(&self) -> &'static str {
        match self {
            Kind::Scalar(ScalarKind::Bool) => "boolean",
            Kind::Scalar(ScalarKind::Int) => "integer",
            Kind::Scalar(ScalarKind::String) => "string",
            Kind::List(_) => "list",
            Kind::Set(_) => "set",
            Kind::Map(_) => "map",
            Kind::Object(_) => "object",
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Kind::Object(_))
    }
}

/// Who owns an attribute's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Operator must supply it whenever the enclosing object carries fields
    Required,
    /// Operator may supply it
    Optional,
    /// Assigned by the server; never read from the desired tree
    Computed,
    /// Operator may supply it, otherwise the server (or a default) decides
    OptionalComputed,
}

/// Lifecycle phase a desired tree is converted for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Create,
    Update,
}

/// Default-fill rule
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultFill {
    /// Filled only when creating; updates never re-default
    OnCreate(Value),
}

impl DefaultFill {
    pub fn value_for(&self, phase: Phase) -> Option<&Value> {
        match (self, phase) {
            (DefaultFill::OnCreate(value), Phase::Create) => Some(value),
            (DefaultFill::OnCreate(_), Phase::Update) => None,
        }
    }
}

/// Which naming a tree uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming {
    /// Operator-facing keys of the desired and observed trees
    Desired,
    /// Keys of the API's JSON envelope
    Wire,
}

/// One attribute of an object schema
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: &'static str,
    pub wire_name: &'static str,
    pub kind: Kind,
    pub presence: Presence,
    pub default: Option<DefaultFill>,
}

impl Attribute {
    fn with_presence(name: &'static str, kind: Kind, presence: Presence) -> Self {
        Self {
            name,
            wire_name: name,
            kind,
            presence,
            default: None,
        }
    }

    pub fn required(name: &'static str, kind: Kind) -> Self {
        Self::with_presence(name, kind, Presence::Required)
    }

    pub fn optional(name: &'static str, kind: Kind) -> Self {
        Self::with_presence(name, kind, Presence::Optional)
    }

    pub fn computed(name: &'static str, kind: Kind) -> Self {
        Self::with_presence(name, kind, Presence::Computed)
    }

    pub fn optional_computed(name: &'static str, kind: Kind) -> Self {
        Self::with_presence(name, kind, Presence::OptionalComputed)
    }

    /// Use a different key on the wire
    pub fn wire(mut self, wire_name: &'static str) -> Self {
        self.wire_name = wire_name;
        self
    }

    pub fn default_on_create(mut self, value: Value) -> Self {
        self.default = Some(DefaultFill::OnCreate(value));
        self
    }

    pub fn key(&self, naming: Naming) -> &'static str {
        match naming {
            Naming::Desired => self.name,
            Naming::Wire => self.wire_name,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.presence != Presence::Required
    }

    pub fn is_defaultable(&self) -> bool {
        self.default.is_some()
    }

    pub fn is_computed_only(&self) -> bool {
        self.presence == Presence::Computed
    }

    /// Nested object schema, when this attribute holds one (directly or as
    /// the element of a collection)
    pub fn child_schema(&self) -> Option<&ObjectSchema> {
        element_object(&self.kind)
    }
}

fn element_object(kind: &Kind) -> Option<&ObjectSchema> {
    match kind {
        Kind::Object(schema) => Some(schema),
        Kind::List(elem) | Kind::Set(elem) | Kind::Map(elem) => element_object(elem),
        Kind::Scalar(_) => None,
    }
}

/// Attributes of one object
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    attributes: Vec<Attribute>,
}

impl ObjectSchema {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, key: &str, naming: Naming) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.key(naming) == key)
    }

    /// Resolve an attribute path. Map keys and indices step into the
    /// collection's element schema.
    pub fn lookup(&self, path: &AttrPath, naming: Naming) -> Option<&Attribute> {
        let mut schema = Some(self);
        let mut found: Option<&Attribute> = None;
        for segment in path.segments() {
            match segment {
                Segment::Attr(name) => {
                    let attr = schema?.attribute(name, naming)?;
                    found = Some(attr);
                    schema = attr.child_schema();
                }
                Segment::Key(_) => {
                    if !matches!(found?.kind, Kind::Map(_)) {
                        return None;
                    }
                }
                Segment::Index(_) => {
                    if !matches!(found?.kind, Kind::List(_) | Kind::Set(_)) {
                        return None;
                    }
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_fill_only_on_create() {
        let fill = DefaultFill::OnCreate(json!(true));
        assert_eq!(fill.value_for(Phase::Create), Some(&json!(true)));
        assert_eq!(fill.value_for(Phase::Update), None);
    }

    #[test]
    fn test_lookup_walks_nested_collections() {
        let schema = http_resource();

        let port = schema
            .lookup(&AttrPath::parse("origin.servers").key("a.com").attr("port"), Naming::Desired)
            .expect("port attribute");
        assert_eq!(port.kind.describe(), "integer");
        assert!(port.is_optional());

        let country = schema
            .lookup(
                &AttrPath::parse("limitations.geo").index(0).attr("exclude").index(0).attr("country"),
                Naming::Wire,
            )
            .expect("country attribute");
        assert_eq!(country.presence, Presence::Required);
    }

    #[test]
    fn test_lookup_respects_naming() {
        let schema = http_resource();
        assert!(schema.lookup(&AttrPath::parse("cache.valid.c_2xx"), Naming::Desired).is_some());
        assert!(schema.lookup(&AttrPath::parse("cache.valid.2xx"), Naming::Wire).is_some());
        assert!(schema.lookup(&AttrPath::parse("cache.valid.2xx"), Naming::Desired).is_none());
    }

    #[test]
    fn test_computed_and_defaultable_flags() {
        let schema = http_resource();
        let id = schema.attribute("id", Naming::Desired).unwrap();
        let active = schema.attribute("active", Naming::Desired).unwrap();

        assert!(id.is_computed_only());
        assert!(!active.is_computed_only());
        assert!(active.is_defaultable());
    }
}
