//! Type-specific node configuration.
//!
//! Each [`NodeKind`] has exactly one configuration record. The records are
//! edited by external configuration screens; this crate only needs the
//! parts that shape the node's ports, plus enough of the rest to round-trip
//! the configuration unchanged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::kind::NodeKind;

/// Configuration record keyed by node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeConfig {
    /// Manual upload trigger.
    ManualUpload(ManualUploadConfig),
    /// Webhook trigger.
    Webhook(WebhookConfig),
    /// Document splitting.
    Splitting(SplittingConfig),
    /// Categorisation by prompt labels.
    Categorisation(CategorisationConfig),
    /// Two-way conditional.
    ConditionalIf(ConditionalIfConfig),
    /// Multi-way conditional.
    ConditionalSwitch(ConditionalSwitchConfig),
    /// Field assignment.
    SetValue(SetValueConfig),
    /// Schema-based extraction.
    Extractor(ExtractorConfig),
    /// Lookup-table mapping.
    DataMapper(DataMapperConfig),
    /// Multi-input reconciliation.
    Reconciliation(ReconciliationConfig),
    /// Holding folder.
    DocumentFolder(DocumentFolderConfig),
    /// Outbound HTTP delivery.
    HttpOutput(HttpOutputConfig),
}

impl NodeConfig {
    /// Returns the default configuration for the given node type.
    pub fn default_for(kind: NodeKind) -> Self {
        match kind {
            NodeKind::ManualUpload => Self::ManualUpload(Default::default()),
            NodeKind::Webhook => Self::Webhook(Default::default()),
            NodeKind::Splitting => Self::Splitting(Default::default()),
            NodeKind::Categorisation => Self::Categorisation(Default::default()),
            NodeKind::ConditionalIf => Self::ConditionalIf(Default::default()),
            NodeKind::ConditionalSwitch => Self::ConditionalSwitch(Default::default()),
            NodeKind::SetValue => Self::SetValue(Default::default()),
            NodeKind::Extractor => Self::Extractor(Default::default()),
            NodeKind::DataMapper => Self::DataMapper(Default::default()),
            NodeKind::Reconciliation => Self::Reconciliation(Default::default()),
            NodeKind::DocumentFolder => Self::DocumentFolder(Default::default()),
            NodeKind::HttpOutput => Self::HttpOutput(Default::default()),
        }
    }

    /// Parses the untagged configuration object for the given node type.
    ///
    /// A JSON `null` is treated as "not configured yet" and yields the
    /// type's default configuration.
    pub fn from_value(kind: NodeKind, value: serde_json::Value) -> serde_json::Result<Self> {
        if value.is_null() {
            return Ok(Self::default_for(kind));
        }

        let config = match kind {
            NodeKind::ManualUpload => Self::ManualUpload(serde_json::from_value(value)?),
            NodeKind::Webhook => Self::Webhook(serde_json::from_value(value)?),
            NodeKind::Splitting => Self::Splitting(serde_json::from_value(value)?),
            NodeKind::Categorisation => Self::Categorisation(serde_json::from_value(value)?),
            NodeKind::ConditionalIf => Self::ConditionalIf(serde_json::from_value(value)?),
            NodeKind::ConditionalSwitch => {
                Self::ConditionalSwitch(serde_json::from_value(value)?)
            }
            NodeKind::SetValue => Self::SetValue(serde_json::from_value(value)?),
            NodeKind::Extractor => Self::Extractor(serde_json::from_value(value)?),
            NodeKind::DataMapper => Self::DataMapper(serde_json::from_value(value)?),
            NodeKind::Reconciliation => Self::Reconciliation(serde_json::from_value(value)?),
            NodeKind::DocumentFolder => Self::DocumentFolder(serde_json::from_value(value)?),
            NodeKind::HttpOutput => Self::HttpOutput(serde_json::from_value(value)?),
        };

        Ok(config)
    }

    /// Serializes the configuration record without its type tag.
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::ManualUpload(c) => serde_json::to_value(c),
            Self::Webhook(c) => serde_json::to_value(c),
            Self::Splitting(c) => serde_json::to_value(c),
            Self::Categorisation(c) => serde_json::to_value(c),
            Self::ConditionalIf(c) => serde_json::to_value(c),
            Self::ConditionalSwitch(c) => serde_json::to_value(c),
            Self::SetValue(c) => serde_json::to_value(c),
            Self::Extractor(c) => serde_json::to_value(c),
            Self::DataMapper(c) => serde_json::to_value(c),
            Self::Reconciliation(c) => serde_json::to_value(c),
            Self::DocumentFolder(c) => serde_json::to_value(c),
            Self::HttpOutput(c) => serde_json::to_value(c),
        }
    }

    /// Returns the node type this configuration belongs to.
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::ManualUpload(_) => NodeKind::ManualUpload,
            Self::Webhook(_) => NodeKind::Webhook,
            Self::Splitting(_) => NodeKind::Splitting,
            Self::Categorisation(_) => NodeKind::Categorisation,
            Self::ConditionalIf(_) => NodeKind::ConditionalIf,
            Self::ConditionalSwitch(_) => NodeKind::ConditionalSwitch,
            Self::SetValue(_) => NodeKind::SetValue,
            Self::Extractor(_) => NodeKind::Extractor,
            Self::DataMapper(_) => NodeKind::DataMapper,
            Self::Reconciliation(_) => NodeKind::Reconciliation,
            Self::DocumentFolder(_) => NodeKind::DocumentFolder,
            Self::HttpOutput(_) => NodeKind::HttpOutput,
        }
    }
}

/// Manual upload trigger. Has no settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualUploadConfig {}

/// Webhook trigger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebhookConfig {
    /// Path segment the webhook listens on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Splitting configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SplittingConfig {
    /// Name of the split strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

/// Categorisation configuration.
///
/// Each label becomes an output port whose id is the label itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CategorisationConfig {
    /// Categorisation prompt in use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<String>,
    /// Labels the prompt can assign.
    pub labels: Vec<String>,
}

impl CategorisationConfig {
    /// Returns whether a prompt with at least one label has been chosen.
    pub fn is_configured(&self) -> bool {
        self.prompt_id.is_some() && !self.labels.is_empty()
    }
}

/// A single field comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Document field the condition reads.
    pub field: String,
    /// Comparison operator.
    pub operator: ConditionOperator,
    /// Value compared against.
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Comparison operators available to conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConditionOperator {
    /// Field equals the value.
    Equals,
    /// Field differs from the value.
    NotEquals,
    /// Field contains the value.
    Contains,
    /// Field is greater than the value.
    GreaterThan,
    /// Field is less than the value.
    LessThan,
    /// Field is present.
    Exists,
}

/// Two-way conditional configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConditionalIfConfig {
    /// Condition deciding between the `true` and `false` branches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

/// Multi-way conditional configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConditionalSwitchConfig {
    /// Cases, evaluated in order.
    pub cases: Vec<SwitchCase>,
}

/// One case of a switch node.
///
/// The `id` doubles as the output port id, so it must survive edits to the
/// label or condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchCase {
    /// Stable case identifier.
    pub id: String,
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Condition selecting this case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl SwitchCase {
    /// Creates an unlabeled case with no condition.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            condition: None,
        }
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Field assignment configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SetValueConfig {
    /// Assignments applied in order.
    pub assignments: Vec<Assignment>,
}

/// A single field assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Target field.
    pub field: String,
    /// Value written to the field.
    pub value: serde_json::Value,
}

/// Extraction configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractorConfig {
    /// Extractor schema in use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,
}

/// Data mapping configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataMapperConfig {
    /// Lookup table in use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_table_id: Option<String>,
    /// Field mappings.
    pub mappings: Vec<FieldMapping>,
}

/// Maps one source field onto one target field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    /// Source field.
    pub source: String,
    /// Target field.
    pub target: String,
}

/// Reconciliation configuration.
///
/// Slots are the only source of named input ports in the system; each slot
/// yields one input and one output port keyed by the slot id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReconciliationConfig {
    /// Reconciliation rule in use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    /// Document slots being reconciled.
    pub slots: Vec<ReconciliationSlot>,
}

/// One document slot of a reconciliation node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSlot {
    /// Stable slot identifier.
    pub id: String,
    /// Display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ReconciliationSlot {
    /// Creates an unlabeled slot.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
        }
    }
}

/// Document folder configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentFolderConfig {
    /// Folder name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Whether documents pass through without being held.
    pub auto_release: bool,
}

/// HTTP output configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpOutputConfig {
    /// Endpoint receiving documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// HTTP method used for delivery.
    pub method: HttpMethod,
    /// Extra request headers.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

/// HTTP methods supported by the HTTP output node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `POST`
    #[default]
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_value_null_is_default() {
        let config = NodeConfig::from_value(NodeKind::ConditionalSwitch, json!(null)).unwrap();
        assert_eq!(config, NodeConfig::default_for(NodeKind::ConditionalSwitch));
    }

    #[test]
    fn test_from_value_switch_cases() {
        let value = json!({ "cases": [{ "id": "case_1", "label": "Invoices" }, { "id": "case_2" }] });
        let NodeConfig::ConditionalSwitch(config) =
            NodeConfig::from_value(NodeKind::ConditionalSwitch, value).unwrap()
        else {
            panic!("expected switch config");
        };

        assert_eq!(config.cases.len(), 2);
        assert_eq!(config.cases[0].label.as_deref(), Some("Invoices"));
    }

    #[test]
    fn test_from_value_rejects_wrong_shape() {
        let value = json!({ "labels": "not-a-list" });
        assert!(NodeConfig::from_value(NodeKind::Categorisation, value).is_err());
    }

    #[test]
    fn test_to_value_is_untagged() {
        let config = NodeConfig::Extractor(ExtractorConfig {
            schema_id: Some("invoice".into()),
        });
        assert_eq!(config.to_value().unwrap(), json!({ "schemaId": "invoice" }));
    }

    #[test]
    fn test_tagged_serialization() {
        let config = NodeConfig::default_for(NodeKind::ManualUpload);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["type"], "MANUAL_UPLOAD");
    }

    #[test]
    fn test_categorisation_configured() {
        let mut config = CategorisationConfig::default();
        assert!(!config.is_configured());

        config.prompt_id = Some("prompt".into());
        assert!(!config.is_configured());

        config.labels.push("invoice".into());
        assert!(config.is_configured());
    }
}
