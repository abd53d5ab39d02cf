//! Change detection between prior state and desired configuration
//!
//! Planning compares the flattened prior state with the flattened desired
//! configuration, attribute by attribute:
//! - computed-only attributes are never planned
//! - optional+computed attributes left unset keep their remote value
//! - local-only blocks (timeouts) never produce remote changes
//! - any change to a replace-forcing attribute turns the plan into a replacement

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::attributes::{AttributeChange, AttributeMap};
use crate::schema::Schema;

/// What applying a plan will do to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanAction {
    NoOp,
    Create,
    Update,
    Replace,
    Delete,
}

impl PlanAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanAction::NoOp => "no-op",
            PlanAction::Create => "create",
            PlanAction::Update => "update",
            PlanAction::Replace => "replace",
            PlanAction::Delete => "delete",
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, PlanAction::NoOp)
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Changes grouped by the top-level attribute they belong to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    changes: BTreeMap<String, Vec<AttributeChange>>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the planned changes from `prior` state to `desired` configuration
    pub fn between(schema: &Schema, prior: &AttributeMap, desired: &AttributeMap) -> Self {
        let names: BTreeSet<&str> = prior
            .top_level_names()
            .into_iter()
            .chain(desired.top_level_names())
            .collect();

        let mut set = ChangeSet::new();
        for name in names {
            if !schema.is_known(name) || schema.is_computed_only(name) || schema.is_local_only(name)
            {
                continue;
            }

            let wanted = desired.attribute(name);
            if wanted.is_empty() && schema.is_optional_computed(name) {
                continue;
            }

            for change in prior.attribute(name).diff(&wanted) {
                set.push(change);
            }
        }
        set
    }

    /// Every attribute of `desired` as an addition
    pub fn additions(desired: &AttributeMap) -> Self {
        AttributeMap::new().diff(desired).into_iter().collect()
    }

    pub fn push(&mut self, change: AttributeChange) {
        self.changes
            .entry(change.attribute().to_string())
            .or_default()
            .push(change);
    }

    /// Whether the top-level attribute or block `name` differs
    pub fn has_change(&self, name: &str) -> bool {
        self.changes.contains_key(name)
    }

    /// Whether any of the named top-level attributes differ
    pub fn has_changes(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.has_change(name))
    }

    /// Names of the changed top-level attributes, sorted
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    pub fn changes_for(&self, name: &str) -> &[AttributeChange] {
        self.changes.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All changes, ordered by path
    pub fn iter(&self) -> impl Iterator<Item = &AttributeChange> {
        self.changes.values().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

impl FromIterator<AttributeChange> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = AttributeChange>>(iter: I) -> Self {
        let mut set = ChangeSet::new();
        for change in iter {
            set.push(change);
        }
        set
    }
}

/// Outcome of planning a single resource
#[derive(Debug, Clone, Serialize)]
pub struct PlanResult {
    pub action: PlanAction,
    pub changes: ChangeSet,
    /// Changed attributes that force replacement
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replace_because: Vec<String>,
}

impl PlanResult {
    pub fn noop() -> Self {
        Self {
            action: PlanAction::NoOp,
            changes: ChangeSet::new(),
            replace_because: Vec::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.action.is_noop()
    }

    /// Short summary, e.g. `update (2 attribute(s))`
    pub fn summary(&self) -> String {
        match self.action {
            PlanAction::NoOp => "no changes".to_string(),
            PlanAction::Replace => format!(
                "replace (forced by {})",
                self.replace_because.join(", ")
            ),
            action => format!("{} ({} attribute(s))", action, self.changes.len()),
        }
    }
}

/// Plan a resource given its prior state and desired configuration
///
/// `None` for `prior` means the resource does not exist; `None` for
/// `desired` means it is no longer configured.
pub fn plan(schema: &Schema, prior: Option<&AttributeMap>, desired: Option<&AttributeMap>) -> PlanResult {
    match (prior, desired) {
        (None, None) => PlanResult::noop(),
        (None, Some(desired)) => PlanResult {
            action: PlanAction::Create,
            changes: ChangeSet::additions(desired),
            replace_because: Vec::new(),
        },
        (Some(prior), None) => PlanResult {
            action: PlanAction::Delete,
            changes: prior.diff(&AttributeMap::new()).into_iter().collect(),
            replace_because: Vec::new(),
        },
        (Some(prior), Some(desired)) => {
            let changes = ChangeSet::between(schema, prior, desired);
            let replace_because: Vec<String> = changes
                .attributes()
                .filter(|name| schema.requires_replace(name))
                .map(str::to_string)
                .collect();

            let action = if !replace_because.is_empty() {
                PlanAction::Replace
            } else if changes.is_empty() {
                PlanAction::NoOp
            } else {
                PlanAction::Update
            };

            PlanResult {
                action,
                changes,
                replace_because,
            }
        }
    }
}
