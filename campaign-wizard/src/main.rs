mod plan;

use anyhow::{Context, Result, bail};
use campaign_flow::{
    ApiConfig, ClassifiedError, CredentialSource, HttpBridge, InMemoryBridge, LeadFile,
    PersistenceBridge, StaticCredentials, StepKind, StepOutcome, WizardController,
};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::plan::WizardPlan;

#[derive(Parser, Debug)]
#[command(name = "campaign-wizard", about = "Create call campaigns step by step")]
struct Cli {
    /// Campaign API base URL (overrides CAMPAIGN_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Bearer token (overrides CAMPAIGN_API_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Run against an in-memory backend instead of the API
    #[arg(long)]
    dry_run: bool,

    /// json or pretty (overrides LOG_FORMAT)
    #[arg(long)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the creation wizard with answers from a YAML plan
    Run { plan: PathBuf },
    /// List agents available for selection
    Agents,
    /// List phone numbers and their agents
    PhoneNumbers,
}

/// Initialize structured JSON tracing based on environment variables
fn init_tracing(log_format: Option<&str>) {
    let log_format = log_format
        .map(str::to_string)
        .or_else(|| std::env::var("LOG_FORMAT").ok())
        .unwrap_or_else(|| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "campaign_wizard=info,campaign_flow=info".into());

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

fn build_bridge(
    cli: &Cli,
    credentials: Arc<dyn CredentialSource>,
) -> Result<Arc<dyn PersistenceBridge>> {
    if cli.dry_run {
        info!("Using in-memory campaign backend");
        return Ok(Arc::new(InMemoryBridge::new()));
    }
    let config = api_config(cli)?;
    info!(base_url = %config.base_url, "Using campaign API");
    Ok(Arc::new(HttpBridge::new(config, credentials)?))
}

fn api_config(cli: &Cli) -> Result<ApiConfig> {
    let mut config = match &cli.api_url {
        Some(url) => {
            let mut config = ApiConfig::new(url.clone())?;
            config.token = ApiConfig::from_env().ok().and_then(|c| c.token);
            config
        }
        None => ApiConfig::from_env().context("campaign API is not configured")?,
    };
    if let Some(token) = &cli.token {
        config = config.with_token(token.clone());
    }
    Ok(config)
}

fn credentials(cli: &Cli) -> Arc<dyn CredentialSource> {
    if cli.dry_run {
        let token = cli.token.clone().unwrap_or_else(|| "dry-run".to_string());
        return Arc::new(StaticCredentials::new(token));
    }
    let token = cli
        .token
        .clone()
        .or_else(|| api_config(cli).ok().and_then(|c| c.token));
    Arc::new(StaticCredentials::from(token))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format.as_deref());

    let credentials = credentials(&cli);
    let bridge = build_bridge(&cli, credentials.clone())?;
    let controller = WizardController::new(bridge, credentials);

    match &cli.command {
        Command::Run { plan } => {
            let plan = WizardPlan::load(plan).await?;
            run_wizard(&controller, &plan).await
        }
        Command::Agents => {
            let agents = controller.available_agents().await?;
            if agents.is_empty() {
                println!("No agents yet.");
            }
            for agent in agents {
                println!(
                    "{}\t{}\t{} / {} / {}",
                    agent.id, agent.name, agent.llm_provider, agent.tts_provider, agent.stt_provider
                );
            }
            Ok(())
        }
        Command::PhoneNumbers => {
            for number in controller.available_phone_numbers().await? {
                let agent = number
                    .agent_id
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{}", number.id, number.number, agent);
            }
            Ok(())
        }
    }
}

/// Walk the wizard until it completes, answering each step from the plan.
async fn run_wizard(controller: &WizardController, plan: &WizardPlan) -> Result<()> {
    controller.set_session_type(plan.session_type).await?;
    controller.set_name(plan.name.clone()).await?;
    controller.set_goal(plan.goal.clone()).await?;
    controller
        .set_ideal_customer_description(plan.ideal_customer_description.clone())
        .await?;

    loop {
        let snapshot = controller.snapshot().await;
        let step = snapshot.state.active_step;
        info!(
            step = snapshot.state.active_step_index,
            of = snapshot.state.step_labels.len(),
            label = step.label(),
            "wizard step"
        );

        let outcome = match step {
            StepKind::UploadLeads => {
                let path = plan
                    .leads_file
                    .as_ref()
                    .context("outbound plans need a leads_file")?;
                let file = LeadFile::from_path(path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?;
                check(controller.upload_leads(file).await?)?;
                controller.next().await?
            }
            StepKind::SelectAgent => {
                controller.select_agent(plan.agent_id.clone()).await?;
                controller.next().await?
            }
            StepKind::Review => controller.finish().await?,
            StepKind::SessionBasics | StepKind::SetGoal => controller.next().await?,
        };

        if let StepOutcome::Completed { remote_id } = check(outcome)? {
            println!("Campaign {} created ({})", plan.name, remote_id);
            return Ok(());
        }
    }
}

fn check(outcome: StepOutcome) -> Result<StepOutcome> {
    match outcome {
        StepOutcome::Blocked { kind, reason } => bail!("{}: {}", kind.label(), reason),
        StepOutcome::Failed(err) => {
            report(&err);
            bail!("{}", err.title)
        }
        StepOutcome::LoginRequired => {
            bail!("login required: set CAMPAIGN_API_TOKEN or pass --token")
        }
        StepOutcome::Ignored => bail!("a submission is already in flight"),
        other => Ok(other),
    }
}

fn report(err: &ClassifiedError) {
    error!(kind = ?err.kind, raw = %err.raw, "campaign request failed");
    eprintln!("{}\n  {}", err.title, err.description);
    if let Some(action) = &err.action {
        eprintln!(
            "  Next: {} ({})",
            action.label,
            serde_json::to_string(&action.target).unwrap_or_default()
        );
    }
}
