use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Field names modelled explicitly on [`Label`] / [`LabelFields`].
pub const RESERVED_LABEL_FIELDS: [&str; 6] = ["id", "ref", "type", "label", "origin", "spendable"];

/// Server-assigned ids arrive as strings or integers depending on the deployment.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Text fields the server may send as `null`; read those as empty.
fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Labelbases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Labelbase {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub fingerprint: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub about: String,
}

/// Body for creating or replacing a labelbase.
///
/// Updates are a full replace, so leaving a field empty clears it remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelbaseParams {
    pub name: String,
    pub fingerprint: String,
    pub about: String,
}

impl LabelbaseParams {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }

    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = about.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Label types
// ---------------------------------------------------------------------------

/// What a label's `ref` points at.
///
/// Only `tx` and `output` carry extra rules; any other value is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LabelType {
    Tx,
    Output,
    Other(String),
}

impl LabelType {
    pub fn as_str(&self) -> &str {
        match self {
            LabelType::Tx => "tx",
            LabelType::Output => "output",
            LabelType::Other(s) => s,
        }
    }
}

impl From<String> for LabelType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "tx" => LabelType::Tx,
            "output" => LabelType::Output,
            _ => LabelType::Other(s),
        }
    }
}

impl From<&str> for LabelType {
    fn from(s: &str) -> Self {
        LabelType::from(s.to_string())
    }
}

impl From<LabelType> for String {
    fn from(t: LabelType) -> Self {
        match t {
            LabelType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LabelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// A label record as stored by the server.
///
/// Fields the client does not model are kept in `extra` and sent back
/// unchanged on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "type")]
    pub label_type: LabelType,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spendable: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Label {
    /// Whether this label annotates `reference` with the given type.
    ///
    /// Both comparisons are exact and case-sensitive.
    pub fn matches(&self, reference: &str, label_type: &LabelType) -> bool {
        self.reference == reference && &self.label_type == label_type
    }

    /// Overlay `fields` onto this record; values present in `fields` win.
    ///
    /// Extra fields that collide with a modelled name are skipped.
    pub fn merge(&mut self, fields: &LabelFields) {
        if let Some(reference) = &fields.reference {
            self.reference = reference.clone();
        }
        if let Some(label_type) = &fields.label_type {
            self.label_type = label_type.clone();
        }
        if let Some(label) = &fields.label {
            self.label = label.clone();
        }
        if let Some(origin) = &fields.origin {
            self.origin = Some(origin.clone());
        }
        if let Some(spendable) = fields.spendable {
            self.spendable = Some(spendable);
        }
        for (key, value) in &fields.extra {
            if !RESERVED_LABEL_FIELDS.contains(&key.as_str()) {
                self.extra.insert(key.clone(), value.clone());
            }
        }
    }

    /// Drop `spendable` unless this is an `output` label.
    pub fn strip_spendable_unless_output(&mut self) {
        if self.label_type != LabelType::Output {
            self.spendable = None;
        }
    }

    /// Drop whichever of `origin` / `spendable` is not allowed for `label_type`.
    pub fn strip_fields_invalid_for(&mut self, label_type: &LabelType) {
        if *label_type != LabelType::Output {
            self.spendable = None;
        }
        if *label_type != LabelType::Tx {
            self.origin = None;
        }
    }
}

/// Input for creating a label, or the subset of fields to change on update.
///
/// Absent fields are not sent on create and keep their stored value on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabelFields {
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub label_type: Option<LabelType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spendable: Option<bool>,
    /// Fields passed through to the server without interpretation.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LabelFields {
    /// Fields for a label annotating `reference` as `label_type`.
    pub fn new(reference: impl Into<String>, label_type: impl Into<LabelType>) -> Self {
        Self {
            reference: Some(reference.into()),
            label_type: Some(label_type.into()),
            ..Default::default()
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_type(mut self, label_type: impl Into<LabelType>) -> Self {
        self.label_type = Some(label_type.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_spendable(mut self, spendable: bool) -> Self {
        self.spendable = Some(spendable);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_none()
            && self.label_type.is_none()
            && self.label.is_none()
            && self.origin.is_none()
            && self.spendable.is_none()
            && self.extra.is_empty()
    }

    /// Check the type-conditional rules for `origin` and `spendable`.
    ///
    /// Nothing is enforced when `type` itself is absent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::NoData);
        }
        if let Some(key) = self
            .extra
            .keys()
            .find(|k| RESERVED_LABEL_FIELDS.contains(&k.as_str()))
        {
            return Err(ValidationError::ReservedField { key: key.clone() });
        }
        if let Some(label_type) = &self.label_type {
            if self.origin.is_some() && *label_type != LabelType::Tx {
                return Err(ValidationError::OriginRequiresTx {
                    found: label_type.to_string(),
                });
            }
            if self.spendable.is_some() && *label_type != LabelType::Output {
                return Err(ValidationError::SpendableRequiresOutput {
                    found: label_type.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl From<Label> for LabelFields {
    fn from(label: Label) -> Self {
        Self {
            reference: Some(label.reference),
            label_type: Some(label.label_type),
            label: Some(label.label),
            origin: label.origin,
            spendable: label.spendable,
            extra: label.extra,
        }
    }
}
