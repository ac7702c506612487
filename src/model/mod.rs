//! Typed Value Model
//!
//! The canonical in-memory resource. The Wire Codec and the Converter both
//! translate to and from this model and never to each other.

mod set;
mod types;

pub use set::UniqueList;
pub use types::*;

use serde_json::{Map, Value};

use crate::error::{CdnError, Result};
use crate::schema::walk::{Policy, Walker};
use crate::schema::{http_resource, AttrPath, Naming, Segment};

impl HttpResource {
    /// Value at a wire-named path, `None` when absent
    pub fn get(&self, path: &AttrPath) -> Result<Option<Value>> {
        let tree = serde_json::to_value(self)?;
        Ok(navigate(&tree, path.segments()).cloned())
    }

    /// Set (`Some`) or clear (`None`) the value at a wire-named path.
    ///
    /// Missing intermediate objects and map entries are created. The new
    /// value is validated against the schema before the model is replaced,
    /// so a failed `set` leaves the model untouched.
    pub fn set(&mut self, path: &AttrPath, value: Option<Value>) -> Result<()> {
        if path.is_root() || http_resource().lookup(path, Naming::Wire).is_none() {
            return Err(CdnError::SchemaMismatch {
                path: path.to_string(),
                expected: "a known attribute".to_string(),
                actual: "unknown attribute".to_string(),
            });
        }

        let mut tree = serde_json::to_value(&*self)?;
        place(&mut tree, path.segments(), value).map_err(|actual| CdnError::SchemaMismatch {
            path: path.to_string(),
            expected: "an addressable node".to_string(),
            actual,
        })?;

        let normalized = Walker::new(Policy::model_edit()).walk(http_resource(), &tree)?;
        *self = serde_json::from_value(normalized)?;
        Ok(())
    }
}

fn navigate<'v>(node: &'v Value, segments: &[Segment]) -> Option<&'v Value> {
    segments.iter().try_fold(node, |node, segment| match segment {
        Segment::Attr(key) | Segment::Key(key) => node.as_object()?.get(key),
        Segment::Index(index) => node.as_array()?.get(*index),
    })
}

fn place(node: &mut Value, segments: &[Segment], value: Option<Value>) -> std::result::Result<(), String> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(());
    };

    match segment {
        Segment::Attr(key) | Segment::Key(key) => {
            if node.is_null() {
                *node = Value::Object(Map::new());
            }
            let fields = node
                .as_object_mut()
                .ok_or_else(|| "a non-object node".to_string())?;
            if rest.is_empty() {
                match value {
                    Some(value) => {
                        fields.insert(key.clone(), value);
                    }
                    None => {
                        fields.remove(key);
                    }
                }
                return Ok(());
            }
            if value.is_none() && !fields.contains_key(key) {
                return Ok(());
            }
            let child = fields
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            place(child, rest, value)
        }
        Segment::Index(index) => {
            let items = node
                .as_array_mut()
                .ok_or_else(|| "a non-list node".to_string())?;
            if *index >= items.len() {
                return Err(format!("index {} beyond {} elements", index, items.len()));
            }
            if rest.is_empty() {
                match value {
                    Some(value) => items[*index] = value,
                    None => {
                        items.remove(*index);
                    }
                }
                return Ok(());
            }
            place(&mut items[*index], rest, value)
        }
    }
}
