use anyhow::{Context, Result, bail};
use campaign_flow::{AgentId, SessionType};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Answers for every wizard step, read from a YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct WizardPlan {
    pub name: String,
    #[serde(rename = "type", default)]
    pub session_type: SessionType,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub ideal_customer_description: String,
    /// CSV with at least a `phone` column. Outbound only.
    pub leads_file: Option<PathBuf>,
    /// Omit to use the default agent.
    pub agent_id: Option<AgentId>,
}

impl WizardPlan {
    pub fn parse(yaml: &str) -> Result<Self> {
        let plan: Self = serde_yaml::from_str(yaml).context("invalid wizard plan")?;
        if plan.session_type == SessionType::Inbound && plan.leads_file.is_some() {
            bail!("inbound sessions do not take a leads_file");
        }
        Ok(plan)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut plan = Self::parse(&yaml)?;
        // leads_file is relative to the plan itself
        if let (Some(leads), Some(dir)) = (plan.leads_file.as_mut(), path.parent()) {
            if leads.is_relative() {
                *leads = dir.join(&*leads);
            }
        }
        Ok(plan)
    }
}
