use serde::{Deserialize, Serialize};

use crate::{
    draft::SessionType,
    error::{Result, WizardError},
};

/// Semantic role of a wizard step, independent of its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    SessionBasics,
    UploadLeads,
    SelectAgent,
    SetGoal,
    Review,
}

impl StepKind {
    pub fn label(&self) -> &'static str {
        match self {
            StepKind::SessionBasics => "Session basics",
            StepKind::UploadLeads => "Upload leads",
            StepKind::SelectAgent => "Select agent",
            StepKind::SetGoal => "Set goal",
            StepKind::Review => "Review",
        }
    }
}

const OUTBOUND_STEPS: &[StepKind] = &[
    StepKind::SessionBasics,
    StepKind::UploadLeads,
    StepKind::SelectAgent,
    StepKind::SetGoal,
    StepKind::Review,
];

// Inbound sessions receive calls, so there is no lead list to collect.
const INBOUND_STEPS: &[StepKind] = &[
    StepKind::SessionBasics,
    StepKind::SelectAgent,
    StepKind::SetGoal,
    StepKind::Review,
];

/// Lookup table from session type and step index to step meaning.
pub struct StepGraph;

impl StepGraph {
    pub fn steps(session_type: SessionType) -> &'static [StepKind] {
        match session_type {
            SessionType::Outbound => OUTBOUND_STEPS,
            SessionType::Inbound => INBOUND_STEPS,
        }
    }

    pub fn step_count(session_type: SessionType) -> usize {
        Self::steps(session_type).len()
    }

    pub fn last_index(session_type: SessionType) -> usize {
        Self::step_count(session_type) - 1
    }

    /// Resolve a step index to its kind for the given session type.
    pub fn resolve(session_type: SessionType, index: usize) -> Result<StepKind> {
        let steps = Self::steps(session_type);
        steps
            .get(index)
            .copied()
            .ok_or(WizardError::StepOutOfRange {
                session_type,
                index,
                count: steps.len(),
            })
    }

    pub fn position(session_type: SessionType, kind: StepKind) -> Option<usize> {
        Self::steps(session_type).iter().position(|k| *k == kind)
    }

    pub fn labels(session_type: SessionType) -> Vec<&'static str> {
        Self::steps(session_type).iter().map(StepKind::label).collect()
    }

    /// Derived view of the wizard at `index`.
    pub fn state(session_type: SessionType, index: usize) -> Result<WizardState> {
        Self::resolve(session_type, index)?;
        Ok(Self::state_clamped(session_type, index))
    }

    /// Like [`StepGraph::state`], pinning an out-of-range index to the final step.
    pub(crate) fn state_clamped(session_type: SessionType, index: usize) -> WizardState {
        let steps = Self::steps(session_type);
        let index = index.min(steps.len() - 1);
        WizardState {
            active_step_index: index,
            active_step: steps[index],
            step_labels: Self::labels(session_type),
            is_terminal_step: index == steps.len() - 1,
        }
    }
}

/// Render-time view of the wizard, recomputed from the draft and step pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardState {
    pub active_step_index: usize,
    pub active_step: StepKind,
    pub step_labels: Vec<&'static str>,
    pub is_terminal_step: bool,
}
