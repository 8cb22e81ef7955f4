//! Scripted and partial document updates.

use crate::{
    client::{DocStoreClient, decode, refused},
    document::WriteResponse,
    error::{DocStoreError, ErrorKind, Operation, Reason, Result, Target},
    version::ScriptStyle,
    wire,
};
use docstore_log::debug;
use opensearch::http::Method;
use serde::Serialize;
use serde_json::{Map, Value, json};

/// A server-side update script with named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    /// Script text.
    pub source: String,
    /// Script language; the store's default when unset.
    pub lang: Option<String>,
    /// Named parameters bound into the script.
    pub params: Map<String, Value>,
}

impl Script {
    /// Create a script.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            lang: None,
            params: Map::new(),
        }
    }

    /// Bind a parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Set the script language.
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Fields this script contributes to an update body, in `style`.
    pub fn to_json(&self, style: ScriptStyle) -> Map<String, Value> {
        let mut out = Map::new();

        match style {
            ScriptStyle::Flat => {
                out.insert("script".to_string(), json!(self.source));
                if let Some(lang) = &self.lang {
                    out.insert("lang".to_string(), json!(lang));
                }
                if !self.params.is_empty() {
                    out.insert("params".to_string(), Value::Object(self.params.clone()));
                }
            }
            ScriptStyle::Inline | ScriptStyle::Source => {
                let key = if style == ScriptStyle::Inline {
                    "inline"
                } else {
                    "source"
                };
                let mut script = Map::new();
                script.insert(key.to_string(), json!(self.source));
                if let Some(lang) = &self.lang {
                    script.insert("lang".to_string(), json!(lang));
                }
                if !self.params.is_empty() {
                    script.insert("params".to_string(), Value::Object(self.params.clone()));
                }
                out.insert("script".to_string(), Value::Object(script));
            }
        }

        out
    }
}

/// Outcome of an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    /// Document id.
    pub id: String,
    /// Version after the update.
    pub version: i64,
    /// `created`, `updated` or `noop`, on stores that report it.
    pub result: Option<String>,
    /// Whether the upsert document was inserted.
    pub created: bool,
}

/// Builder for one update request, from [`DocStoreClient::update_document`].
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    client: DocStoreClient,
    collection: String,
    schema: String,
    id: String,
    script: Option<Script>,
    doc: Option<Value>,
    upsert: Option<Value>,
    doc_as_upsert: bool,
    invalid: Option<String>,
}

impl UpdateBuilder {
    pub(crate) fn new(client: DocStoreClient, collection: String, schema: String, id: String) -> Self {
        Self {
            client,
            collection,
            schema,
            id,
            script: None,
            doc: None,
            upsert: None,
            doc_as_upsert: false,
            invalid: None,
        }
    }

    /// Run a script against the stored document.
    pub fn script(mut self, script: Script) -> Self {
        self.script = Some(script);
        self
    }

    /// Merge a partial document into the stored one.
    pub fn doc<T: Serialize>(mut self, doc: &T) -> Self {
        match serde_json::to_value(doc) {
            Ok(value) => self.doc = Some(value),
            Err(e) => self.invalid = Some(format!("cannot serialise partial document: {}", e)),
        }
        self
    }

    /// Document inserted as-is when the target does not exist yet.
    pub fn upsert<T: Serialize>(mut self, doc: &T) -> Self {
        match serde_json::to_value(doc) {
            Ok(value) => self.upsert = Some(value),
            Err(e) => self.invalid = Some(format!("cannot serialise upsert document: {}", e)),
        }
        self
    }

    /// Insert the partial document when the target does not exist yet.
    pub fn doc_as_upsert(mut self, enabled: bool) -> Self {
        self.doc_as_upsert = enabled;
        self
    }

    fn path(&self) -> std::result::Result<String, Reason> {
        if self.client.version().uses_mapping_types() {
            wire::path([
                self.collection.as_str(),
                self.schema.as_str(),
                self.id.as_str(),
                "_update",
            ])
        } else {
            wire::path([self.collection.as_str(), "_update", self.id.as_str()])
        }
    }

    fn build_body(&self) -> std::result::Result<Value, String> {
        if let Some(invalid) = &self.invalid {
            return Err(invalid.clone());
        }

        let mut body = match (&self.script, &self.doc) {
            (Some(script), _) => script.to_json(self.client.version().script_style()),
            (None, Some(doc)) => {
                let mut body = Map::new();
                body.insert("doc".to_string(), doc.clone());
                if self.doc_as_upsert {
                    body.insert("doc_as_upsert".to_string(), json!(true));
                }
                body
            }
            (None, None) => return Err("update needs a script or a partial document".to_string()),
        };

        if let (Some(_), Some(doc)) = (&self.script, &self.doc) {
            debug!("Script takes precedence; ignoring partial document {}", doc);
        }
        if let Some(upsert) = &self.upsert {
            body.insert("upsert".to_string(), upsert.clone());
        }

        Ok(Value::Object(body))
    }

    /// Send the update.
    ///
    /// Without an upsert document, a missing target fails with
    /// [`DocStoreError::NotFound`].
    pub async fn execute(self) -> Result<UpdateResult> {
        let op = Operation::UpdateDocument;
        let target = Target::document(&self.collection, &self.schema, &self.id);

        let body = self.build_body().map_err(|message| DocStoreError::Write {
            operation: op,
            target: target.clone(),
            reason: Reason::message(message),
        })?;
        let path = self.path().map_err(refused(ErrorKind::Write, op, &target))?;
        debug!("Updating document {}: {}", target, body);

        let reply = self
            .client
            .request(op, Method::Post, &path, &[], Some(body.to_string()))
            .await?;
        if !reply.is_success() {
            return Err(self.client.reject(ErrorKind::Write, op, target, &reply));
        }

        let response: WriteResponse = decode(&reply, ErrorKind::Write, op, &target)?;
        let version = response
            .required_version(reply.status)
            .map_err(refused(ErrorKind::Write, op, &target))?;
        let created = response.created();

        Ok(UpdateResult {
            id: response.id.unwrap_or(self.id),
            version,
            result: response.result,
            created,
        })
    }
}
