//! Node type enumeration.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use super::config::NodeConfig;

/// The closed set of node types a workflow can contain.
///
/// The wire form is `SCREAMING_SNAKE_CASE` (`"CONDITIONAL_IF"`), matching
/// what the remote API and the node catalogue send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString, IntoStaticStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    /// Documents are uploaded by hand.
    ManualUpload,
    /// Documents arrive through an inbound webhook.
    Webhook,
    /// Splits multi-document files into individual documents.
    Splitting,
    /// Routes documents by a categorisation prompt's labels.
    Categorisation,
    /// Routes documents into a true/false branch.
    ConditionalIf,
    /// Routes documents into one of several cases.
    ConditionalSwitch,
    /// Assigns fixed values to document fields.
    SetValue,
    /// Extracts structured data with an extractor schema.
    Extractor,
    /// Maps extracted fields through a lookup table.
    DataMapper,
    /// Matches documents arriving on several slots against a rule.
    Reconciliation,
    /// Collects documents into a folder where they may be held.
    DocumentFolder,
    /// Sends documents to an external HTTP endpoint.
    HttpOutput,
}

impl NodeKind {
    /// Returns whether documents enter the workflow at this node type.
    #[inline]
    pub const fn is_trigger(self) -> bool {
        matches!(self, Self::ManualUpload | Self::Webhook)
    }

    /// Returns whether documents can be held at this node type.
    #[inline]
    pub const fn can_hold_documents(self) -> bool {
        matches!(self, Self::DocumentFolder | Self::Reconciliation)
    }

    /// Returns the human readable label shown in the node catalogue.
    pub const fn label(self) -> &'static str {
        match self {
            Self::ManualUpload => "Manual upload",
            Self::Webhook => "Webhook",
            Self::Splitting => "Splitting",
            Self::Categorisation => "Categorisation",
            Self::ConditionalIf => "If",
            Self::ConditionalSwitch => "Switch",
            Self::SetValue => "Set value",
            Self::Extractor => "Extractor",
            Self::DataMapper => "Data mapper",
            Self::Reconciliation => "Reconciliation",
            Self::DocumentFolder => "Document folder",
            Self::HttpOutput => "HTTP output",
        }
    }

    /// Returns the configuration a freshly created node of this type starts with.
    pub fn default_config(self) -> NodeConfig {
        NodeConfig::default_for(self)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(NodeKind::Extractor.to_string(), "EXTRACTOR");
        assert_eq!(NodeKind::from_str("CONDITIONAL_SWITCH").unwrap(), NodeKind::ConditionalSwitch);
        assert_eq!(
            serde_json::to_string(&NodeKind::HttpOutput).unwrap(),
            "\"HTTP_OUTPUT\""
        );
    }

    #[test]
    fn test_capabilities() {
        let triggers: Vec<_> = NodeKind::iter().filter(|k| k.is_trigger()).collect();
        assert_eq!(triggers, vec![NodeKind::ManualUpload, NodeKind::Webhook]);

        assert!(NodeKind::DocumentFolder.can_hold_documents());
        assert!(!NodeKind::Extractor.can_hold_documents());
    }

    #[test]
    fn test_default_config_matches_kind() {
        for kind in NodeKind::iter() {
            assert_eq!(kind.default_config().kind(), kind);
        }
    }
}
