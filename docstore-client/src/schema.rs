//! Collection schema definitions: settings plus per-schema field mappings.

use crate::version::ProtocolVersion;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Storage settings for a new collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSettings {
    /// Number of primary shards.
    pub number_of_shards: Option<u32>,
    /// Number of replicas per shard.
    pub number_of_replicas: Option<u32>,
    /// Refresh interval, e.g. `1s` or `-1`.
    pub refresh_interval: Option<String>,
    /// Analysis settings, passed through.
    pub analysis: Option<Value>,
}

impl CollectionSettings {
    /// Create empty settings (store defaults apply).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of shards.
    pub fn shards(mut self, shards: u32) -> Self {
        self.number_of_shards = Some(shards);
        self
    }

    /// Set number of replicas.
    pub fn replicas(mut self, replicas: u32) -> Self {
        self.number_of_replicas = Some(replicas);
        self
    }

    /// Set refresh interval.
    pub fn refresh_interval(mut self, interval: impl Into<String>) -> Self {
        self.refresh_interval = Some(interval.into());
        self
    }

    /// Set analysis settings.
    pub fn analysis(mut self, analysis: Value) -> Self {
        self.analysis = Some(analysis);
        self
    }

    fn to_json(&self) -> Map<String, Value> {
        let mut settings = Map::new();

        if let Some(shards) = self.number_of_shards {
            settings.insert("number_of_shards".to_string(), json!(shards));
        }
        if let Some(replicas) = self.number_of_replicas {
            settings.insert("number_of_replicas".to_string(), json!(replicas));
        }
        if let Some(interval) = &self.refresh_interval {
            settings.insert("refresh_interval".to_string(), json!(interval));
        }
        if let Some(analysis) = &self.analysis {
            settings.insert("analysis".to_string(), analysis.clone());
        }

        settings
    }
}

/// Everything needed to declare a collection.
///
/// Either structured (settings plus one mapping per schema name) or a raw
/// JSON body forwarded to the store unmodified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDefinition {
    /// Storage settings.
    pub settings: CollectionSettings,
    /// Mappings keyed by schema name.
    pub mappings: BTreeMap<String, Mapping>,
    raw: Option<String>,
}

impl SchemaDefinition {
    /// An empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// A pre-written body, sent as-is regardless of store version.
    pub fn raw(body: impl Into<String>) -> Self {
        Self {
            raw: Some(body.into()),
            ..Self::default()
        }
    }

    /// Set storage settings.
    pub fn settings(mut self, settings: CollectionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Declare the mapping of one schema.
    pub fn mapping(mut self, schema: impl Into<String>, mapping: Mapping) -> Self {
        self.mappings.insert(schema.into(), mapping);
        self
    }

    /// Whether this definition is a raw body.
    pub fn is_raw(&self) -> bool {
        self.raw.is_some()
    }

    /// Render the request body for `version`.
    ///
    /// Stores without mapping types accept a single mapping only.
    pub fn render(&self, version: &ProtocolVersion) -> Result<String, String> {
        if let Some(raw) = &self.raw {
            return Ok(raw.clone());
        }

        let mut body = Map::new();

        let settings = self.settings.to_json();
        if !settings.is_empty() {
            body.insert("settings".to_string(), Value::Object(settings));
        }

        if !self.mappings.is_empty() {
            let mappings = if version.uses_mapping_types() {
                let typed: Map<String, Value> = self
                    .mappings
                    .iter()
                    .map(|(schema, mapping)| (schema.clone(), mapping.to_json(version)))
                    .collect();
                Value::Object(typed)
            } else {
                let mut iter = self.mappings.values();
                match (iter.next(), iter.next()) {
                    (Some(mapping), None) => mapping.to_json(version),
                    _ => {
                        return Err(format!(
                            "store {} supports one mapping per collection, got {} ({})",
                            version,
                            self.mappings.len(),
                            self.mappings.keys().cloned().collect::<Vec<_>>().join(", ")
                        ));
                    }
                }
            };
            body.insert("mappings".to_string(), mappings);
        }

        Ok(Value::Object(body).to_string())
    }
}

/// Field mappings of one schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    /// Field definitions.
    pub properties: BTreeMap<String, MappingField>,
    /// Dynamic mapping setting (`true`, `false`, `strict`).
    pub dynamic: Option<String>,
}

impl Mapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field.
    pub fn field(mut self, name: impl Into<String>, field: MappingField) -> Self {
        self.properties.insert(name.into(), field);
        self
    }

    /// Set dynamic mapping.
    pub fn dynamic(mut self, dynamic: impl Into<String>) -> Self {
        self.dynamic = Some(dynamic.into());
        self
    }

    fn to_json(&self, version: &ProtocolVersion) -> Value {
        let mut mapping = Map::new();

        if let Some(dynamic) = &self.dynamic {
            mapping.insert("dynamic".to_string(), json!(dynamic));
        }

        let properties: Map<String, Value> = self
            .properties
            .iter()
            .map(|(name, field)| (name.clone(), field.to_json(version)))
            .collect();
        mapping.insert("properties".to_string(), Value::Object(properties));

        Value::Object(mapping)
    }
}

/// One field's type and indexing options.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingField {
    /// Field type.
    pub field_type: FieldType,
    /// Keep the original value retrievable on its own ("retain original text").
    pub store: Option<bool>,
    /// Whether the field is searchable.
    pub index: Option<bool>,
    /// Index-time analyzer.
    pub analyzer: Option<String>,
    /// Search-time analyzer.
    pub search_analyzer: Option<String>,
    /// Date format.
    pub format: Option<String>,
    /// Value indexed in place of explicit nulls.
    pub null_value: Option<Value>,
    /// Sub-fields of object and nested fields.
    pub properties: Option<BTreeMap<String, MappingField>>,
}

impl MappingField {
    /// A field of the given type with no options.
    pub fn of(field_type: FieldType) -> Self {
        Self {
            field_type,
            store: None,
            index: None,
            analyzer: None,
            search_analyzer: None,
            format: None,
            null_value: None,
            properties: None,
        }
    }

    /// Analyzed full-text field.
    pub fn text() -> Self {
        Self::of(FieldType::Text)
    }

    /// Exact-value field.
    pub fn keyword() -> Self {
        Self::of(FieldType::Keyword)
    }

    /// 32-bit integer field.
    pub fn integer() -> Self {
        Self::of(FieldType::Integer)
    }

    /// 64-bit integer field.
    pub fn long() -> Self {
        Self::of(FieldType::Long)
    }

    /// Double field.
    pub fn double() -> Self {
        Self::of(FieldType::Double)
    }

    /// Boolean field.
    pub fn boolean() -> Self {
        Self::of(FieldType::Boolean)
    }

    /// Date field.
    pub fn date() -> Self {
        Self::of(FieldType::Date)
    }

    /// Geo-coordinate field.
    pub fn geo_point() -> Self {
        Self::of(FieldType::GeoPoint)
    }

    /// Autocompletion field.
    pub fn completion() -> Self {
        Self::of(FieldType::Completion)
    }

    /// Object field.
    pub fn object() -> Self {
        Self::of(FieldType::Object)
    }

    /// Nested field.
    pub fn nested() -> Self {
        Self::of(FieldType::Nested)
    }

    /// Retain the original value.
    pub fn stored(mut self) -> Self {
        self.store = Some(true);
        self
    }

    /// Make the field searchable or not.
    pub fn indexed(mut self, index: bool) -> Self {
        self.index = Some(index);
        self
    }

    /// Set analyzer.
    pub fn analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    /// Set search analyzer.
    pub fn search_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.search_analyzer = Some(analyzer.into());
        self
    }

    /// Set date format.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Add a sub-field.
    pub fn property(mut self, name: impl Into<String>, field: MappingField) -> Self {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), field);
        self
    }

    fn to_json(&self, version: &ProtocolVersion) -> Value {
        let mut field = Map::new();
        let legacy_string = version.uses_string_fields()
            && matches!(self.field_type, FieldType::Text | FieldType::Keyword);

        let type_name = if legacy_string {
            "string"
        } else {
            self.field_type.as_str()
        };
        field.insert("type".to_string(), json!(type_name));

        // Old stores spell `index` as analyzed / not_analyzed / no.
        if version.uses_string_fields() {
            let keyword = self.field_type == FieldType::Keyword;
            match (self.index, keyword) {
                (Some(false), _) => {
                    field.insert("index".to_string(), json!("no"));
                }
                (_, true) => {
                    field.insert("index".to_string(), json!("not_analyzed"));
                }
                (Some(true), false) if legacy_string => {
                    field.insert("index".to_string(), json!("analyzed"));
                }
                (Some(true), false) => {
                    field.insert("index".to_string(), json!("not_analyzed"));
                }
                (None, false) => {}
            }
        } else if let Some(index) = self.index {
            field.insert("index".to_string(), json!(index));
        }

        if let Some(store) = self.store {
            field.insert("store".to_string(), json!(store));
        }
        if let Some(analyzer) = &self.analyzer {
            field.insert("analyzer".to_string(), json!(analyzer));
        }
        if let Some(search_analyzer) = &self.search_analyzer {
            field.insert("search_analyzer".to_string(), json!(search_analyzer));
        }
        if let Some(format) = &self.format {
            field.insert("format".to_string(), json!(format));
        }
        if let Some(null_value) = &self.null_value {
            field.insert("null_value".to_string(), null_value.clone());
        }
        if let Some(properties) = &self.properties {
            let props: Map<String, Value> = properties
                .iter()
                .map(|(name, prop)| (name.clone(), prop.to_json(version)))
                .collect();
            field.insert("properties".to_string(), Value::Object(props));
        }

        Value::Object(field)
    }
}

/// Field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Full-text searchable field.
    Text,
    /// Exact match field.
    Keyword,
    /// 64-bit integer.
    Long,
    /// 32-bit integer.
    Integer,
    /// 16-bit integer.
    Short,
    /// 8-bit integer.
    Byte,
    /// Double precision float.
    Double,
    /// Single precision float.
    Float,
    /// Boolean.
    Boolean,
    /// Date.
    Date,
    /// Binary data.
    Binary,
    /// IP address.
    Ip,
    /// Completion suggester input.
    Completion,
    /// Geo point.
    GeoPoint,
    /// Geo shape.
    GeoShape,
    /// Nested object.
    Nested,
    /// Object.
    Object,
}

impl FieldType {
    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Keyword => "keyword",
            FieldType::Long => "long",
            FieldType::Integer => "integer",
            FieldType::Short => "short",
            FieldType::Byte => "byte",
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Binary => "binary",
            FieldType::Ip => "ip",
            FieldType::Completion => "completion",
            FieldType::GeoPoint => "geo_point",
            FieldType::GeoShape => "geo_shape",
            FieldType::Nested => "nested",
            FieldType::Object => "object",
        }
    }
}
