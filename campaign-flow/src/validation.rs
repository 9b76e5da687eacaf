use serde::{Deserialize, Serialize};

use crate::{
    draft::{SessionType, WizardDraft},
    error::Result,
    graph::{StepGraph, StepKind},
};

/// Result of checking a step before moving past it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Fail { reason: String },
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    fn fail(reason: &str) -> Self {
        Verdict::Fail {
            reason: reason.to_string(),
        }
    }
}

/// Forward-transition checks, keyed by step kind. Never mutates the draft.
pub struct ValidationGate;

impl ValidationGate {
    pub fn check(session_type: SessionType, index: usize, draft: &WizardDraft) -> Result<Verdict> {
        let kind = StepGraph::resolve(session_type, index)?;
        Ok(Self::check_step(kind, draft))
    }

    pub fn check_step(kind: StepKind, draft: &WizardDraft) -> Verdict {
        let missing = match kind {
            StepKind::SessionBasics => draft.name.trim().is_empty(),
            StepKind::UploadLeads => draft.leads.is_empty(),
            StepKind::SetGoal => draft.goal.trim().is_empty(),
            // An unset agent means the backend default is used.
            StepKind::SelectAgent | StepKind::Review => false,
        };
        if !missing {
            return Verdict::Pass;
        }
        match kind {
            StepKind::SessionBasics => Verdict::fail("Please enter a name for this session."),
            StepKind::UploadLeads => {
                Verdict::fail("Please upload at least one lead before continuing.")
            }
            _ => Verdict::fail("Please describe the goal of this session."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{AgentChoice, Lead};

    fn lead() -> Lead {
        Lead {
            name: "Ada".to_string(),
            phone: "+15550100".to_string(),
            email: None,
        }
    }

    #[test]
    fn session_basics_requires_name() {
        let mut draft = WizardDraft::default();
        assert!(!ValidationGate::check_step(StepKind::SessionBasics, &draft).passed());

        draft.name = "   ".to_string();
        assert!(!ValidationGate::check_step(StepKind::SessionBasics, &draft).passed());

        draft.name = "Q1 Outreach".to_string();
        assert_eq!(
            ValidationGate::check_step(StepKind::SessionBasics, &draft),
            Verdict::Pass
        );
    }

    #[test]
    fn upload_leads_requires_one_lead() {
        let mut draft = WizardDraft::default();
        let verdict = ValidationGate::check_step(StepKind::UploadLeads, &draft);
        assert!(matches!(verdict, Verdict::Fail { ref reason } if reason.contains("lead")));

        draft.leads.push(lead());
        assert!(ValidationGate::check_step(StepKind::UploadLeads, &draft).passed());
    }

    #[test]
    fn select_agent_accepts_default() {
        let mut draft = WizardDraft::default();
        assert!(ValidationGate::check_step(StepKind::SelectAgent, &draft).passed());
        draft.agent = AgentChoice::Default;
        assert!(ValidationGate::check_step(StepKind::SelectAgent, &draft).passed());
    }

    #[test]
    fn goal_and_review() {
        let mut draft = WizardDraft::default();
        assert!(!ValidationGate::check_step(StepKind::SetGoal, &draft).passed());
        draft.goal = "Qualify book buyers".to_string();
        assert!(ValidationGate::check_step(StepKind::SetGoal, &draft).passed());
        assert!(ValidationGate::check_step(StepKind::Review, &WizardDraft::default()).passed());
    }

    #[test]
    fn check_resolves_by_session_type() {
        let draft = WizardDraft::default();
        // index 1 is lead upload for outbound but agent selection for inbound
        assert!(
            !ValidationGate::check(SessionType::Outbound, 1, &draft)
                .unwrap()
                .passed()
        );
        assert!(
            ValidationGate::check(SessionType::Inbound, 1, &draft)
                .unwrap()
                .passed()
        );
        assert!(ValidationGate::check(SessionType::Inbound, 9, &draft).is_err());
    }
}
