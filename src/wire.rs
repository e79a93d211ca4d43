//! JSON shapes exchanged with the directory API.
//!
//! - FilterQuery: `{"queryType": "FilterQuery", "filters": [{"field", "operator", "value"}]}`
//! - Search: `{"queryType": "Search", "searchFilters": "{\"filter\":[\"field:$op:value\"]}"}`
//! - Exemptions: `[{"id", "type"}]`

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::types::MembershipMethod;

/// One entry of a FilterQuery `filters` list.
///
/// Missing members deserialize as empty strings so that the decoder can report
/// them as malformed instead of failing the whole payload parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterWire {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub value: String,
}

/// The `memberQuery` object of a group, tagged by `queryType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "queryType")]
pub enum MemberQueryWire {
    FilterQuery {
        #[serde(default)]
        filters: Vec<FilterWire>,
    },
    Search {
        #[serde(rename = "searchFilters")]
        search_filters: String,
    },
}

impl MemberQueryWire {
    pub fn from_json(text: &str) -> Result<Self, QueryError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, QueryError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The document embedded, as a string, in `searchFilters`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub filter: Vec<String>,
}

/// One member excluded from a dynamic group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExemptionWire {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub subject_type: Option<String>,
}

/// Body of a create or update call for a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPayload {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub membership_method: MembershipMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_query: Option<MemberQueryWire>,
    #[serde(default)]
    pub member_query_exemptions: Vec<ExemptionWire>,
}

impl GroupPayload {
    pub fn to_json(&self) -> Result<String, QueryError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A group as returned by the directory on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: String,
    #[serde(flatten)]
    pub payload: GroupPayload,
}

impl GroupRecord {
    pub fn from_json(text: &str) -> Result<Self, QueryError> {
        Ok(serde_json::from_str(text)?)
    }
}
