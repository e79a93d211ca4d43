//! "Ensure a group named N exists with this configuration" against a directory
//! that treats group names as natural keys.
//!
//! ```text
//! Resolving ──found──▶ Adopting ──▶ Converged
//!     │
//!     └─none──▶ Creating ──ok──▶ Converged
//!                   │
//!                   └─name conflict──▶ Resolving (once) ──none──▶ Error
//! ```
//!
//! Only a name conflict on create is retried, and only once. Every other directory
//! error is returned unchanged.

use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use tracing::{debug, info, warn};

use crate::config::{AmbiguityPolicy, CompilerOptions, ReconcilerOptions};
use crate::diff::GroupDelta;
use crate::error::{CreateError, ReconcileError};
use crate::types::{GroupIdentity, GroupSpec, GroupState};
use crate::wire::{GroupPayload, GroupRecord};

/// The caller's directory client. The reconciler performs no I/O of its own.
pub trait GroupDirectory {
    type Error: std::error::Error + 'static;

    /// Groups matching `name`. Only exact matches are kept by the reconciler.
    fn find_by_name(&self, name: &str) -> Result<Vec<GroupIdentity>, Self::Error>;

    /// Create a group, reporting `CreateError::NameConflict` if the name is taken.
    fn create(&self, payload: &GroupPayload) -> Result<GroupIdentity, CreateError<Self::Error>>;

    fn update(&self, id: &str, payload: &GroupPayload) -> Result<GroupIdentity, Self::Error>;

    fn read(&self, id: &str) -> Result<GroupRecord, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display)]
pub enum ReconcileState {
    Resolving,
    Adopting,
    Creating,
    Converged,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display)]
pub enum Outcome {
    Created,
    Adopted,
}

/// A converged group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciled {
    pub identity: GroupIdentity,
    pub outcome: Outcome,
    /// The group as re-read after converging, when verification is enabled.
    pub state: Option<GroupState>,
    /// Differences between the declaration and `state`.
    pub drift: Option<GroupDelta>,
    /// Every state visited, in order, ending with `Converged`.
    pub transitions: Vec<ReconcileState>,
}

impl Reconciled {
    /// True when the group was verified and matches its declaration.
    pub fn is_in_sync(&self) -> bool {
        self.drift.as_ref().is_some_and(GroupDelta::is_empty)
    }
}

struct Transitions<'a> {
    name: &'a str,
    visited: Vec<ReconcileState>,
}

impl<'a> Transitions<'a> {
    fn new(name: &'a str) -> Self {
        Self {
            name,
            visited: Vec::new(),
        }
    }

    fn enter(&mut self, state: ReconcileState) {
        debug!(
            event = "Reconcile",
            phase = "Transition",
            group = self.name,
            from = self.visited.last().map(|s| s.as_ref()).unwrap_or("Start"),
            to = state.as_ref()
        );
        self.visited.push(state);
    }

    fn fail<E>(&mut self, err: ReconcileError<E>) -> ReconcileError<E>
    where
        E: std::error::Error,
    {
        self.enter(ReconcileState::Error);
        warn!(
            event = "Reconcile",
            phase = "Error",
            group = self.name,
            error = %err
        );
        err
    }
}

/// Drives a [`GroupSpec`] to convergence against a [`GroupDirectory`].
pub struct Reconciler<'d, D: GroupDirectory> {
    directory: &'d D,
    compiler: CompilerOptions,
    options: ReconcilerOptions,
}

impl<'d, D: GroupDirectory> Reconciler<'d, D> {
    pub fn new(directory: &'d D) -> Self {
        Self {
            directory,
            compiler: CompilerOptions::default(),
            options: ReconcilerOptions::default(),
        }
    }

    pub fn with_compiler_options(mut self, compiler: CompilerOptions) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_options(mut self, options: ReconcilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Create or adopt the group named `spec.name` and bring it to `spec`.
    pub fn ensure(&self, spec: &GroupSpec) -> Result<Reconciled, ReconcileError<D::Error>> {
        let name = spec.name.as_str();
        let mut transitions = Transitions::new(name);

        // Compile before touching the directory so a bad declaration has no side effects.
        let payload = spec
            .to_payload(&self.compiler)
            .map_err(|e| transitions.fail(ReconcileError::<D::Error>::Compile(e)))?;

        let mut conflicted = false;
        let (identity, outcome) = loop {
            transitions.enter(ReconcileState::Resolving);
            let found = self.resolve(name).map_err(|e| transitions.fail(e))?;

            if let Some(existing) = found {
                transitions.enter(ReconcileState::Adopting);
                let identity = self
                    .directory
                    .update(&existing.id, &payload)
                    .map_err(|e| transitions.fail(ReconcileError::Backend(e)))?;
                break (identity, Outcome::Adopted);
            }

            if conflicted {
                return Err(transitions.fail(ReconcileError::UnresolvedConflict {
                    name: name.to_string(),
                }));
            }

            transitions.enter(ReconcileState::Creating);
            match self.directory.create(&payload) {
                Ok(identity) => break (identity, Outcome::Created),
                Err(CreateError::NameConflict(_)) => {
                    info!(
                        event = "Reconcile",
                        phase = "Conflict",
                        group = name,
                        "group was created concurrently, resolving again"
                    );
                    conflicted = true;
                }
                Err(CreateError::Backend(e)) => {
                    return Err(transitions.fail(ReconcileError::Backend(e)));
                }
            }
        };

        transitions.enter(ReconcileState::Converged);
        info!(
            event = "Reconcile",
            phase = "Converged",
            group = name,
            id = identity.id.as_str(),
            outcome = outcome.as_ref()
        );

        let (state, drift) = if self.options.verify {
            let (state, drift) = self
                .verify(spec, &identity)
                .map_err(|e| transitions.fail(e))?;
            (Some(state), Some(drift))
        } else {
            (None, None)
        };

        Ok(Reconciled {
            identity,
            outcome,
            state,
            drift,
            transitions: transitions.visited,
        })
    }

    /// Look up a group by exact name, applying the ambiguity policy to multiple matches.
    pub fn resolve(&self, name: &str) -> Result<Option<GroupIdentity>, ReconcileError<D::Error>> {
        let matches: Vec<GroupIdentity> = self
            .directory
            .find_by_name(name)
            .map_err(ReconcileError::Backend)?
            .into_iter()
            .filter(|g| g.name == name)
            .collect();

        if matches.len() > 1 {
            match self.options.ambiguity {
                AmbiguityPolicy::Fail => {
                    return Err(ReconcileError::AmbiguousName {
                        name: name.to_string(),
                        matches: matches.len(),
                    });
                }
                AmbiguityPolicy::PickFirst => {
                    warn!(
                        event = "Reconcile",
                        phase = "Resolving",
                        group = name,
                        matches = matches.len(),
                        chosen = matches[0].id.as_str(),
                        "several groups share this name, adopting the first"
                    );
                }
            }
        }

        Ok(matches.into_iter().next())
    }

    /// Re-read the converged group and compare it with the declaration.
    fn verify(
        &self,
        spec: &GroupSpec,
        identity: &GroupIdentity,
    ) -> Result<(GroupState, GroupDelta), ReconcileError<D::Error>> {
        let record = self
            .directory
            .read(&identity.id)
            .map_err(ReconcileError::Backend)?;
        let state = GroupState::from_record(&record, &self.compiler)?
            .with_attribute_names(&spec.attribute_names());
        let drift = GroupDelta::between(spec, &state, &self.compiler);

        if !drift.is_empty() {
            warn!(
                event = "Reconcile",
                phase = "Verify",
                group = spec.name.as_str(),
                id = identity.id.as_str(),
                drift = ?drift,
                "group read back differs from its declaration"
            );
        }

        Ok((state, drift))
    }
}

#[cfg(test)]
mod tests;
