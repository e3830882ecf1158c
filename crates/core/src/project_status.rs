//! Project lifecycle statuses and the transition table.
//!
//! A project moves through the workshop pipeline
//! `devis -> en_preparation -> en_traitement -> sechage -> controle_qualite -> pret -> livre`,
//! with a rework loop from quality control back to treatment and a
//! cancellation exit (`annule`) reserved for owners and admins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles;

// ---------------------------------------------------------------------------
// Status enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Devis,
    EnPreparation,
    EnTraitement,
    Sechage,
    ControleQualite,
    Pret,
    Livre,
    Annule,
}

impl ProjectStatus {
    /// Every status, in pipeline order.
    pub const ALL: [ProjectStatus; 8] = [
        ProjectStatus::Devis,
        ProjectStatus::EnPreparation,
        ProjectStatus::EnTraitement,
        ProjectStatus::Sechage,
        ProjectStatus::ControleQualite,
        ProjectStatus::Pret,
        ProjectStatus::Livre,
        ProjectStatus::Annule,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Devis => "devis",
            ProjectStatus::EnPreparation => "en_preparation",
            ProjectStatus::EnTraitement => "en_traitement",
            ProjectStatus::Sechage => "sechage",
            ProjectStatus::ControleQualite => "controle_qualite",
            ProjectStatus::Pret => "pret",
            ProjectStatus::Livre => "livre",
            ProjectStatus::Annule => "annule",
        }
    }

    /// Terminal statuses accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, ProjectStatus::Livre | ProjectStatus::Annule)
    }

    /// Entering this status starts consuming powder.
    pub fn consumes_material(self) -> bool {
        self == ProjectStatus::EnTraitement
    }

    /// Statuses a tenant may pick as its automatic invoicing trigger.
    pub fn is_invoice_trigger_candidate(self) -> bool {
        matches!(self, ProjectStatus::Pret | ProjectStatus::Livre)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid project status '{s}'. Must be one of: {}",
                    ProjectStatus::ALL.map(ProjectStatus::as_str).join(", ")
                ))
            })
    }
}

impl TryFrom<String> for ProjectStatus {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Forward edges of the pipeline, excluding cancellation.
fn forward_transitions(from: ProjectStatus) -> &'static [ProjectStatus] {
    use ProjectStatus::*;
    match from {
        Devis => &[EnPreparation],
        EnPreparation => &[EnTraitement],
        EnTraitement => &[Sechage],
        Sechage => &[ControleQualite],
        ControleQualite => &[Pret, EnTraitement],
        Pret => &[Livre],
        Livre | Annule => &[],
    }
}

/// Whether `from -> to` is an edge of the table, ignoring role.
///
/// Every non-terminal status may be cancelled.
pub fn is_listed_transition(from: ProjectStatus, to: ProjectStatus) -> bool {
    if to == ProjectStatus::Annule {
        return !from.is_terminal();
    }
    forward_transitions(from).contains(&to)
}

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    InvalidTransition,
    InsufficientPermission,
}

/// A refused transition, carrying what the caller needs for actionable feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRejection {
    pub reason: RejectionReason,
    pub from: ProjectStatus,
    pub to: ProjectStatus,
    /// Statuses the same actor could move to instead.
    pub allowed: Vec<ProjectStatus>,
}

impl From<TransitionRejection> for CoreError {
    fn from(rejection: TransitionRejection) -> Self {
        let from = rejection.from.to_string();
        let to = rejection.to.to_string();
        let allowed = rejection.allowed.iter().map(|s| s.to_string()).collect();
        match rejection.reason {
            RejectionReason::InvalidTransition => CoreError::InvalidTransition { from, to, allowed },
            RejectionReason::InsufficientPermission => {
                CoreError::TransitionForbidden { from, to, allowed }
            }
        }
    }
}

/// Statuses `role` may move a project to from `from`.
pub fn allowed_targets(from: ProjectStatus, role: &str) -> Vec<ProjectStatus> {
    let mut targets = forward_transitions(from).to_vec();
    if !from.is_terminal() && roles::is_privileged(role) {
        targets.push(ProjectStatus::Annule);
    }
    targets
}

/// Validate a transition for the given role.
pub fn check_transition(
    from: ProjectStatus,
    to: ProjectStatus,
    role: &str,
) -> Result<(), TransitionRejection> {
    let reject = |reason| TransitionRejection {
        reason,
        from,
        to,
        allowed: allowed_targets(from, role),
    };

    if !is_listed_transition(from, to) {
        return Err(reject(RejectionReason::InvalidTransition));
    }
    if to == ProjectStatus::Annule && !roles::is_privileged(role) {
        return Err(reject(RejectionReason::InsufficientPermission));
    }
    Ok(())
}

/// Boolean form of [`check_transition`].
pub fn is_transition_allowed(from: ProjectStatus, to: ProjectStatus, role: &str) -> bool {
    check_transition(from, to, role).is_ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
