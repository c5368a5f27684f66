//! JSON:API envelopes and response normalization.
//!
//! Every response carries an [`Envelope`]: `{data, meta, included}` where
//! `data` is one [`Entity`] or a list of them. [`normalize`] turns it into
//! either the bare simple representation or leaves it untouched.
//!
//! In the simple representation an entity flattens to
//! `{id, type, ...attributes, relationship: "id" | ["id", ...] | null}`.
//!
//! The reverse direction, turning a simple request body into a JSON:API
//! document, lives in [`to_document`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

/// A JSON:API resource identifier (`{type, id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    /// The related record's type.
    #[serde(rename = "type")]
    pub kind: String,
    /// The related record's id.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
}

/// Linkage of a relationship: one record or many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipData {
    /// To-many linkage.
    Many(Vec<ResourceIdentifier>),
    /// To-one linkage.
    One(ResourceIdentifier),
}

/// A relationship object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Linkage, or `None` for an empty to-one relationship.
    #[serde(default)]
    pub data: Option<RelationshipData>,
    /// Any other members (`links`, `meta`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A generic record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Record id.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Record type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Attributes.
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Relationships.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub relationships: Map<String, Value>,
    /// Any other members (`meta`, `links`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity {
    /// Returns a parsed relationship, if present and well-formed.
    #[must_use]
    pub fn relationship(&self, name: &str) -> Option<Relationship> {
        self.relationships
            .get(name)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Flattens the entity into its simple representation.
    #[must_use]
    pub fn to_simple(&self) -> Value {
        let mut map = self.attributes.clone();

        for (name, raw) in &self.relationships {
            if map.contains_key(name) {
                continue;
            }
            let linkage = match serde_json::from_value::<Relationship>(raw.clone()) {
                Ok(Relationship {
                    data: Some(RelationshipData::One(target)),
                    ..
                }) => Value::String(target.id),
                Ok(Relationship {
                    data: Some(RelationshipData::Many(targets)),
                    ..
                }) => Value::Array(targets.into_iter().map(|t| Value::String(t.id)).collect()),
                _ => Value::Null,
            };
            map.insert(name.clone(), linkage);
        }

        map.insert("id".to_string(), Value::String(self.id.clone()));
        map.insert("type".to_string(), Value::String(self.kind.clone()));
        Value::Object(map)
    }
}

/// Primary data of an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryData {
    /// A collection.
    Many(Vec<Entity>),
    /// A single record.
    One(Box<Entity>),
}

/// Envelope metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Size of the whole filtered collection (offset pagination).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    /// Cursor for the next page (cursor pagination).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    /// Any other members.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A wire-level response document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Primary data; `None` for empty bodies such as `204` responses.
    #[serde(default)]
    pub data: Option<PrimaryData>,
    /// Metadata.
    #[serde(default)]
    pub meta: Meta,
    /// Side-loaded records.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<Entity>,
    /// Any other top-level members.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// Parses an envelope from a response body.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if `body` is not a JSON:API document.
    pub fn from_value(body: Value) -> Result<Self, serde_json::Error> {
        if body.as_object().is_some_and(Map::is_empty) {
            return Ok(Self::default());
        }
        serde_json::from_value(body)
    }

    /// Returns the primary entities as a slice (one element for single data).
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        match &self.data {
            Some(PrimaryData::Many(items)) => items,
            Some(PrimaryData::One(item)) => std::slice::from_ref(item.as_ref()),
            None => &[],
        }
    }

    /// Returns `meta.total_count`.
    #[must_use]
    pub const fn total_count(&self) -> Option<u64> {
        self.meta.total_count
    }

    /// Returns `meta.next_token`.
    #[must_use]
    pub fn next_token(&self) -> Option<&str> {
        self.meta.next_token.as_deref()
    }

    /// Returns the simple representation of the primary data.
    ///
    /// A collection becomes an array, a single record an object, and missing
    /// data `null`.
    #[must_use]
    pub fn simple_data(&self) -> Value {
        match &self.data {
            Some(PrimaryData::Many(items)) => {
                Value::Array(items.iter().map(Entity::to_simple).collect())
            }
            Some(PrimaryData::One(item)) => item.to_simple(),
            None => Value::Null,
        }
    }
}

/// Which view of a response the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Bare data with ids merged in.
    Simple,
    /// The untouched envelope, including `meta`.
    Raw,
}

/// The result of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Simple data.
    Simple(Value),
    /// The full envelope.
    Raw(Envelope),
}

/// Converts an envelope into the requested view.
#[must_use]
pub fn normalize(envelope: Envelope, mode: ResponseMode) -> Normalized {
    match mode {
        ResponseMode::Simple => Normalized::Simple(envelope.simple_data()),
        ResponseMode::Raw => Normalized::Raw(envelope),
    }
}

/// Builds a JSON:API request document from a simple body.
///
/// Keys listed in `relationships` (attribute name to related type) move to
/// the `relationships` member as linkage; `id` and `type` keys are dropped
/// from the attributes. A body that already has a `data` member is passed
/// through unchanged.
///
/// Returns `None` if `body` is not a JSON object.
#[must_use]
pub fn to_document(
    entity_type: &str,
    id: Option<&str>,
    body: Value,
    relationships: &[(&str, &str)],
) -> Option<Value> {
    let Value::Object(mut attributes) = body else {
        return None;
    };
    if attributes.contains_key("data") {
        return Some(Value::Object(attributes));
    }

    attributes.remove("id");
    attributes.remove("type");

    let mut links = Map::new();
    for (name, related_type) in relationships {
        let Some(value) = attributes.remove(*name) else {
            continue;
        };
        let linkage = match value {
            Value::Null => Value::Null,
            Value::Array(ids) => Value::Array(
                ids.into_iter()
                    .map(|id| json!({"type": related_type, "id": id_to_string(id)}))
                    .collect(),
            ),
            other => json!({"type": related_type, "id": id_to_string(other)}),
        };
        links.insert((*name).to_string(), json!({ "data": linkage }));
    }

    let mut data = Map::new();
    data.insert("type".to_string(), json!(entity_type));
    if let Some(id) = id {
        data.insert("id".to_string(), json!(id));
    }
    data.insert("attributes".to_string(), Value::Object(attributes));
    if !links.is_empty() {
        data.insert("relationships".to_string(), Value::Object(links));
    }

    Some(json!({ "data": data }))
}

fn id_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Accepts string or numeric ids.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
