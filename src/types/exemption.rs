//! Members excluded from a dynamic group's computed membership.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::wire::ExemptionWire;

/// Subject type assumed when the directory omits one.
pub const DEFAULT_SUBJECT_TYPE: &str = "USER";

fn default_subject_type() -> String {
    DEFAULT_SUBJECT_TYPE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct Exemption {
    pub subject_id: String,
    #[serde(default = "default_subject_type")]
    pub subject_type: String,
}

impl Exemption {
    /// Exempt a user.
    pub fn user(subject_id: impl Into<String>) -> Self {
        Self::new(subject_id, DEFAULT_SUBJECT_TYPE)
    }

    pub fn new(subject_id: impl Into<String>, subject_type: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            subject_type: subject_type.into(),
        }
    }
}

impl From<&Exemption> for ExemptionWire {
    fn from(exemption: &Exemption) -> Self {
        ExemptionWire {
            id: exemption.subject_id.clone(),
            subject_type: Some(exemption.subject_type.clone()),
        }
    }
}

impl From<&ExemptionWire> for Exemption {
    fn from(wire: &ExemptionWire) -> Self {
        let subject_type = wire
            .subject_type
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_SUBJECT_TYPE);
        Exemption::new(wire.id.clone(), subject_type)
    }
}

/// Encode exemptions for the wire, preserving order.
pub fn encode_exemptions(exemptions: &[Exemption]) -> Vec<ExemptionWire> {
    exemptions.iter().map(ExemptionWire::from).collect()
}

/// Decode exemptions from the wire, preserving order.
pub fn decode_exemptions(wire: &[ExemptionWire]) -> Vec<Exemption> {
    wire.iter().map(Exemption::from).collect()
}
