//! Field-name resolution between user-facing names and wire names.
//!
//! Standard fields pass through unchanged (with one rename, `state` is sent as
//! `userState`). Every other name is a custom attribute and is addressed on the
//! wire as `attributes[name=<sanitized>].value`, where sanitizing strips every
//! character outside `[A-Za-z0-9]`.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::FilterPredicate;

/// `(user-facing name, wire name)` for every field the directory understands natively.
const STANDARD_FIELDS: &[(&str, &str)] = &[
    ("company", "company"),
    ("costCenter", "costCenter"),
    ("department", "department"),
    ("description", "description"),
    ("displayname", "displayname"),
    ("email", "email"),
    ("employeeIdentifier", "employeeIdentifier"),
    ("employeeType", "employeeType"),
    ("firstname", "firstname"),
    ("jobTitle", "jobTitle"),
    ("lastname", "lastname"),
    ("location", "location"),
    ("manager", "manager"),
    ("middlename", "middlename"),
    ("state", "userState"),
    ("username", "username"),
];

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9]").expect("sanitizer pattern is valid"));

static CUSTOM_ATTRIBUTE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^attributes\[name=([^\]]*)\]\.value$").expect("attribute path pattern is valid")
});

/// How a user-facing field is addressed on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedField {
    Standard { wire: &'static str },
    Custom { sanitized: String },
}

impl ResolvedField {
    pub fn wire_name(&self) -> String {
        match self {
            ResolvedField::Standard { wire } => wire.to_string(),
            ResolvedField::Custom { sanitized } => custom_attribute_path(sanitized),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ResolvedField::Custom { .. })
    }
}

/// Strip every character outside `[A-Za-z0-9]`.
pub fn sanitize(name: &str) -> String {
    UNSAFE_CHARS.replace_all(name, "").into_owned()
}

pub fn custom_attribute_path(sanitized: &str) -> String {
    format!("attributes[name={sanitized}].value")
}

pub fn is_standard_field(field: &str) -> bool {
    STANDARD_FIELDS.iter().any(|(user, _)| *user == field)
}

/// Classify a user-facing field name.
pub fn resolve(field: &str) -> ResolvedField {
    if let Some((_, wire)) = STANDARD_FIELDS.iter().find(|(user, _)| *user == field) {
        return ResolvedField::Standard { wire: *wire };
    }

    let sanitized = sanitize(field);
    debug!(
        event = "FieldResolution",
        phase = "CustomAttribute",
        field = field,
        sanitized = sanitized.as_str()
    );
    ResolvedField::Custom { sanitized }
}

/// The wire name for a user-facing field.
pub fn to_wire(field: &str) -> String {
    resolve(field).wire_name()
}

/// The user-facing name for a wire field.
///
/// Custom attribute paths yield the sanitized attribute name; see [`AttributeNames`]
/// for recovering the original spelling. Unknown wire fields are returned verbatim.
pub fn from_wire(wire_field: &str) -> String {
    if let Some((user, _)) = STANDARD_FIELDS.iter().find(|(_, wire)| *wire == wire_field) {
        return user.to_string();
    }

    if let Some(captures) = CUSTOM_ATTRIBUTE_PATH.captures(wire_field) {
        return captures[1].to_string();
    }

    wire_field.to_string()
}

/// Caller-owned side table from sanitized attribute names back to the user's spelling.
///
/// Sanitizing is lossy (`cost-center` and `costcenter` share a wire path), so a caller
/// that wants decoded predicates to carry the names it declared keeps one of these
/// per resource and feeds decoded predicates through [`AttributeNames::restore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeNames(BTreeMap<String, String>);

impl AttributeNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the spelling of every custom attribute in `predicates`.
    pub fn from_predicates<'a, I>(predicates: I) -> Self
    where
        I: IntoIterator<Item = &'a FilterPredicate>,
    {
        let mut names = Self::new();
        for predicate in predicates {
            names.remember(&predicate.field);
        }
        names
    }

    /// Remember `field` if it is a custom attribute whose sanitized form differs from it.
    pub fn remember(&mut self, field: &str) {
        let ResolvedField::Custom { sanitized } = resolve(field) else {
            return;
        };
        if sanitized == field {
            return;
        }
        if is_standard_field(&sanitized) {
            // The decoded name would be indistinguishable from the standard field.
            warn!(
                event = "FieldResolution",
                phase = "Remember",
                field = field,
                sanitized = sanitized.as_str(),
                "custom attribute sanitizes to a standard field name"
            );
            return;
        }
        self.0.insert(sanitized, field.to_string());
    }

    pub fn original(&self, sanitized: &str) -> Option<&str> {
        self.0.get(sanitized).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Rename decoded fields back to their remembered spelling, keeping the result sorted.
    pub fn restore(&self, predicates: Vec<FilterPredicate>) -> Vec<FilterPredicate> {
        let mut restored: Vec<FilterPredicate> = predicates
            .into_iter()
            .map(|mut predicate| {
                if let Some(original) = self.original(&predicate.field) {
                    predicate.field = original.to_string();
                }
                predicate
            })
            .collect();
        restored.sort();
        restored
    }
}
