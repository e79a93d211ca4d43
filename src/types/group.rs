//! Group identity, declared configuration and observed state.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::config::CompilerOptions;
use crate::error::QueryError;
use crate::fields::AttributeNames;
use crate::wire::{GroupPayload, GroupRecord};

use super::exemption::{Exemption, decode_exemptions, encode_exemptions};
use super::member_query::MemberQuery;

/// A group as identified by the directory. The directory assigns `id`; `name` is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct GroupIdentity {
    pub id: String,
    pub name: String,
}

impl GroupIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// How the directory maintains a group's members.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipMethod {
    #[default]
    Static,
    /// Query matches are suggested and wait for approval.
    DynamicReviewRequired,
    /// Query matches are added and removed automatically.
    DynamicAutomated,
}

/// The declared configuration of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GroupSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub membership_method: MembershipMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_query: Option<MemberQuery>,
    #[serde(default)]
    pub exemptions: Vec<Exemption>,
}

impl GroupSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            membership_method: MembershipMethod::default(),
            member_query: None,
            exemptions: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_membership_method(mut self, method: MembershipMethod) -> Self {
        self.membership_method = method;
        self
    }

    /// Attach a membership query. A static group becomes `DYNAMIC_AUTOMATED`.
    pub fn with_member_query(mut self, query: MemberQuery) -> Self {
        if self.membership_method == MembershipMethod::Static {
            self.membership_method = MembershipMethod::DynamicAutomated;
        }
        self.member_query = Some(query);
        self
    }

    pub fn with_exemptions(mut self, exemptions: Vec<Exemption>) -> Self {
        self.exemptions = exemptions;
        self
    }

    /// Spellings of the custom attributes this spec declares.
    pub fn attribute_names(&self) -> AttributeNames {
        self.member_query
            .as_ref()
            .map(|query| AttributeNames::from_predicates(query.predicates()))
            .unwrap_or_default()
    }

    /// Compile into the body of a create or update call.
    pub fn to_payload(&self, options: &CompilerOptions) -> Result<GroupPayload, QueryError> {
        let member_query = self
            .member_query
            .as_ref()
            .map(|query| query.to_wire(options))
            .transpose()?;

        Ok(GroupPayload {
            name: self.name.clone(),
            description: self.description.clone(),
            membership_method: self.membership_method,
            member_query,
            member_query_exemptions: encode_exemptions(&self.exemptions),
        })
    }
}

/// A group as read back from the directory, with its query decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GroupState {
    pub identity: GroupIdentity,
    pub description: Option<String>,
    pub membership_method: MembershipMethod,
    pub member_query: Option<MemberQuery>,
    pub exemptions: Vec<Exemption>,
}

impl GroupState {
    pub fn from_record(record: &GroupRecord, options: &CompilerOptions) -> Result<Self, QueryError> {
        let payload = &record.payload;
        let member_query = payload
            .member_query
            .as_ref()
            .map(|wire| MemberQuery::from_wire(wire, options))
            .transpose()?;

        Ok(Self {
            identity: GroupIdentity::new(record.id.clone(), payload.name.clone()),
            description: payload.description.clone(),
            membership_method: payload.membership_method,
            member_query,
            exemptions: decode_exemptions(&payload.member_query_exemptions),
        })
    }

    /// Rename decoded custom attributes back to the caller's spelling.
    pub fn with_attribute_names(mut self, names: &AttributeNames) -> Self {
        if let Some(query) = self.member_query.take() {
            let restored = names.restore(query.predicates().to_vec());
            self.member_query = Some(query.with_predicates(restored));
        }
        self
    }
}
