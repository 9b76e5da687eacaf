//! WizardController – drives one campaign draft through its steps and persists it.
//!
//! The controller owns the draft and a single status value. Every transition goes through a
//! named method (`next`, `back`, `finish`, `dismiss_error`, `upload_leads`) and every
//! network-reaching transition passes through `Submitting`, which doubles as the re-entrancy
//! guard: while a request is in flight, further transitions return [`StepOutcome::Ignored`].
//!
//! ## Persistence points
//! * `next()` on the session-basics step creates the campaign the first time and updates it on
//!   later passes.
//! * `upload_leads()` sends the lead file for an outbound campaign.
//! * `finish()` sends the complete draft as a final update.
//!
//! Steps in between are kept in memory only.
//!
//! ## Example
//! ```rust,ignore
//! let controller = WizardController::new(bridge, credentials);
//! controller.set_name("Q1 Sales").await?;
//! match controller.next().await? {
//!     StepOutcome::Moved { kind, .. } => render(kind),
//!     StepOutcome::Blocked { reason, .. } => show_inline(reason),
//!     StepOutcome::Failed(err) => show_error(err),
//!     StepOutcome::LoginRequired => redirect_to_login(),
//!     _ => {}
//! }
//! ```

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{debug, info, warn};

use crate::{
    auth::CredentialSource,
    bridge::PersistenceBridge,
    classifier::ClassifiedError,
    draft::{
        Agent, AgentChoice, AgentId, LeadFile, PhoneNumber, RemoteId, SessionType, WizardDraft,
    },
    error::{BridgeError, Result, WizardError},
    graph::{StepGraph, StepKind, WizardState},
    validation::{ValidationGate, Verdict},
};

/// Which backend call a submission is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Update,
    UploadLeads,
    Finish,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WizardStatus {
    Editing { step: usize },
    Submitting { step: usize, operation: Operation },
    Error { step: usize, error: ClassifiedError },
    Done { remote_id: RemoteId },
}

/// What a transition did, from the caller's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step pointer moved to `step`.
    Moved { step: usize, kind: StepKind },
    /// Nothing to do (back on the first step, next on the last).
    Stayed,
    /// The current step failed validation. No request was made.
    Blocked { kind: StepKind, reason: String },
    /// A submission was already in flight.
    Ignored,
    /// The backend rejected the request; the wizard is now in the error state.
    Failed(ClassifiedError),
    /// No usable credential. The caller should send the user to log in.
    LoginRequired,
    LeadsUploaded { count: usize },
    Completed { remote_id: RemoteId },
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardSnapshot {
    pub status: WizardStatus,
    pub state: WizardState,
    pub draft: WizardDraft,
}

struct Inner {
    status: WizardStatus,
    draft: WizardDraft,
}

enum Submission {
    Create,
    Update(RemoteId),
}

pub struct WizardController {
    bridge: Arc<dyn PersistenceBridge>,
    credentials: Arc<dyn CredentialSource>,
    inner: Mutex<Inner>,
    status_tx: watch::Sender<WizardStatus>,
}

impl WizardController {
    pub fn new(bridge: Arc<dyn PersistenceBridge>, credentials: Arc<dyn CredentialSource>) -> Self {
        Self::with_draft(bridge, credentials, WizardDraft::default())
    }

    pub fn with_draft(
        bridge: Arc<dyn PersistenceBridge>,
        credentials: Arc<dyn CredentialSource>,
        draft: WizardDraft,
    ) -> Self {
        let status = WizardStatus::Editing { step: 0 };
        let (status_tx, _) = watch::channel(status.clone());
        Self {
            bridge,
            credentials,
            inner: Mutex::new(Inner { status, draft }),
            status_tx,
        }
    }

    /// Follow status changes, e.g. to re-render.
    pub fn subscribe(&self) -> watch::Receiver<WizardStatus> {
        self.status_tx.subscribe()
    }

    pub async fn snapshot(&self) -> WizardSnapshot {
        let inner = self.inner.lock().await;
        let session_type = inner.draft.session_type;
        let step = match &inner.status {
            WizardStatus::Editing { step }
            | WizardStatus::Submitting { step, .. }
            | WizardStatus::Error { step, .. } => *step,
            WizardStatus::Done { .. } => StepGraph::last_index(session_type),
        };
        let state = StepGraph::state_clamped(session_type, step);
        WizardSnapshot {
            status: inner.status.clone(),
            state,
            draft: inner.draft.clone(),
        }
    }

    pub async fn status(&self) -> WizardStatus {
        self.inner.lock().await.status.clone()
    }

    pub async fn set_session_type(&self, session_type: SessionType) -> Result<()> {
        let mut inner = self.editable().await?;
        if inner.draft.session_type == session_type {
            return Ok(());
        }
        if inner.draft.remote_id.is_some()
            || matches!(inner.status, WizardStatus::Submitting { .. })
        {
            return Err(WizardError::SessionTypeLocked);
        }
        info!(session_type = %session_type, "session type selected");
        inner.draft.session_type = session_type;
        if session_type == SessionType::Inbound {
            inner.draft.leads.clear();
        }
        Ok(())
    }

    pub async fn set_name(&self, name: impl Into<String>) -> Result<()> {
        self.editable().await?.draft.name = name.into();
        Ok(())
    }

    pub async fn set_goal(&self, goal: impl Into<String>) -> Result<()> {
        self.editable().await?.draft.goal = goal.into();
        Ok(())
    }

    pub async fn set_ideal_customer_description(
        &self,
        description: impl Into<String>,
    ) -> Result<()> {
        self.editable().await?.draft.ideal_customer_description = description.into();
        Ok(())
    }

    /// `None` chooses the backend's default agent.
    pub async fn select_agent(&self, agent_id: Option<AgentId>) -> Result<()> {
        self.editable().await?.draft.agent = AgentChoice::from(agent_id);
        Ok(())
    }

    pub async fn available_agents(&self) -> Result<Vec<Agent>> {
        Ok(self.bridge.list_agents().await?)
    }

    pub async fn available_phone_numbers(&self) -> Result<Vec<PhoneNumber>> {
        Ok(self.bridge.list_phone_numbers().await?)
    }

    /// Validate the current step and move forward. Leaving the session-basics step persists
    /// the draft (create on the first pass, update afterwards).
    pub async fn next(&self) -> Result<StepOutcome> {
        let (step, submission, operation, payload_draft) = {
            let mut inner = self.inner.lock().await;
            let step = match Self::current_step(&inner.status)? {
                Some(step) => step,
                None => return Ok(Self::ignored("next")),
            };
            let session_type = inner.draft.session_type;
            let kind = StepGraph::resolve(session_type, step)?;

            if let Verdict::Fail { reason } = ValidationGate::check_step(kind, &inner.draft) {
                info!(step, kind = ?kind, reason = %reason, "step blocked by validation");
                return Ok(StepOutcome::Blocked { kind, reason });
            }
            if step == StepGraph::last_index(session_type) {
                return Ok(StepOutcome::Stayed);
            }
            if kind != StepKind::SessionBasics {
                return self.move_to(&mut inner, step + 1);
            }
            if !self.credentials.is_authenticated() {
                warn!(step, "no credential, login required");
                return Ok(StepOutcome::LoginRequired);
            }

            let (submission, operation) = match inner.draft.remote_id.clone() {
                None => (Submission::Create, Operation::Create),
                Some(id) => (Submission::Update(id), Operation::Update),
            };
            self.set_status(&mut inner, WizardStatus::Submitting { step, operation });
            (step, submission, operation, inner.draft.clone())
        };

        let result = match &submission {
            Submission::Create => self
                .bridge
                .create_session(&payload_draft.new_session())
                .await
                .map(Some),
            Submission::Update(id) => self
                .bridge
                .update_session(id, &payload_draft.session_update())
                .await
                .map(|()| None),
        };

        let mut inner = self.inner.lock().await;
        match result {
            Ok(created) => {
                if let Some(id) = created {
                    info!(
                        remote_id = %id,
                        session_type = %inner.draft.session_type,
                        "campaign created"
                    );
                    inner.draft.assign_remote_id(id);
                } else {
                    info!(remote_id = ?inner.draft.remote_id, "campaign updated");
                }
                self.move_to(&mut inner, step + 1)
            }
            Err(err) => Ok(self.fail(&mut inner, step, operation, err)),
        }
    }

    pub async fn back(&self) -> Result<StepOutcome> {
        let mut inner = self.inner.lock().await;
        let Some(step) = Self::current_step(&inner.status)? else {
            return Ok(Self::ignored("back"));
        };
        if step == 0 {
            return Ok(StepOutcome::Stayed);
        }
        self.move_to(&mut inner, step - 1)
    }

    /// Send the complete draft from the final step and mark the wizard done.
    pub async fn finish(&self) -> Result<StepOutcome> {
        let (step, id, update) = {
            let mut inner = self.inner.lock().await;
            let Some(step) = Self::current_step(&inner.status)? else {
                return Ok(Self::ignored("finish"));
            };
            let session_type = inner.draft.session_type;
            let last = StepGraph::last_index(session_type);
            if step != last {
                return Err(WizardError::NotAtFinalStep {
                    current: step,
                    last,
                });
            }
            let kind = StepGraph::resolve(session_type, step)?;
            if let Verdict::Fail { reason } = ValidationGate::check_step(kind, &inner.draft) {
                return Ok(StepOutcome::Blocked { kind, reason });
            }
            let id = inner.draft.remote_id.clone().ok_or(WizardError::NotYetCreated)?;
            if !self.credentials.is_authenticated() {
                warn!(step, "no credential, login required");
                return Ok(StepOutcome::LoginRequired);
            }
            self.set_status(
                &mut inner,
                WizardStatus::Submitting {
                    step,
                    operation: Operation::Finish,
                },
            );
            (step, id, inner.draft.session_update())
        };

        let result = self.bridge.update_session(&id, &update).await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(()) => {
                info!(remote_id = %id, "campaign wizard completed");
                self.set_status(
                    &mut inner,
                    WizardStatus::Done {
                        remote_id: id.clone(),
                    },
                );
                Ok(StepOutcome::Completed { remote_id: id })
            }
            Err(err) => Ok(self.fail(&mut inner, step, Operation::Finish, err)),
        }
    }

    /// Upload a lead file for an outbound campaign that already exists. The parsed leads
    /// replace the draft's lead list.
    pub async fn upload_leads(&self, file: LeadFile) -> Result<StepOutcome> {
        let (step, id) = {
            let mut inner = self.inner.lock().await;
            let Some(step) = Self::current_step(&inner.status)? else {
                return Ok(Self::ignored("upload_leads"));
            };
            let session_type = inner.draft.session_type;
            if StepGraph::position(session_type, StepKind::UploadLeads).is_none() {
                return Err(WizardError::LeadsNotApplicable(session_type));
            }
            let id = inner.draft.remote_id.clone().ok_or(WizardError::NotYetCreated)?;
            if !self.credentials.is_authenticated() {
                warn!(step, "no credential, login required");
                return Ok(StepOutcome::LoginRequired);
            }
            self.set_status(
                &mut inner,
                WizardStatus::Submitting {
                    step,
                    operation: Operation::UploadLeads,
                },
            );
            (step, id)
        };

        info!(remote_id = %id, file_name = %file.file_name, "uploading leads");
        let result = self.bridge.upload_leads(&id, file).await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(leads) => {
                let count = leads.len();
                info!(remote_id = %id, count, "leads uploaded");
                inner.draft.leads = leads;
                self.set_status(&mut inner, WizardStatus::Editing { step });
                Ok(StepOutcome::LeadsUploaded { count })
            }
            Err(err) => Ok(self.fail(&mut inner, step, Operation::UploadLeads, err)),
        }
    }

    /// Leave the error state and return to the step the error happened on.
    pub async fn dismiss_error(&self) -> Result<StepOutcome> {
        let mut inner = self.inner.lock().await;
        let WizardStatus::Error { step, .. } = inner.status else {
            return Err(WizardError::NoErrorToDismiss);
        };
        self.set_status(&mut inner, WizardStatus::Editing { step });
        let kind = StepGraph::resolve(inner.draft.session_type, step)?;
        Ok(StepOutcome::Moved { step, kind })
    }

    /// `Ok(None)` means a submission is in flight.
    fn current_step(status: &WizardStatus) -> Result<Option<usize>> {
        match status {
            WizardStatus::Editing { step } => Ok(Some(*step)),
            WizardStatus::Submitting { .. } => Ok(None),
            WizardStatus::Error { .. } => Err(WizardError::ErrorPending),
            WizardStatus::Done { .. } => Err(WizardError::AlreadyCompleted),
        }
    }

    fn ignored(action: &str) -> StepOutcome {
        debug!(action, "submission in flight, ignoring");
        StepOutcome::Ignored
    }

    /// Lock the draft for a field edit. Edits are allowed while a request is in flight since
    /// the request works on a copy.
    async fn editable(&self) -> Result<MutexGuard<'_, Inner>> {
        let inner = self.inner.lock().await;
        if matches!(inner.status, WizardStatus::Done { .. }) {
            return Err(WizardError::AlreadyCompleted);
        }
        Ok(inner)
    }

    fn move_to(&self, inner: &mut Inner, step: usize) -> Result<StepOutcome> {
        let kind = StepGraph::resolve(inner.draft.session_type, step)?;
        debug!(step, kind = ?kind, "step changed");
        self.set_status(inner, WizardStatus::Editing { step });
        Ok(StepOutcome::Moved { step, kind })
    }

    fn fail(
        &self,
        inner: &mut Inner,
        step: usize,
        operation: Operation,
        err: BridgeError,
    ) -> StepOutcome {
        if err == BridgeError::AuthRequired {
            warn!(step, "backend rejected credential, login required");
            self.set_status(inner, WizardStatus::Editing { step });
            return StepOutcome::LoginRequired;
        }
        let classified = match operation {
            Operation::Create | Operation::Update | Operation::Finish => {
                ClassifiedError::from_session_failure(&err)
            }
            Operation::UploadLeads => ClassifiedError::unrefined(&err),
        }
        .for_agent(inner.draft.agent.agent_id());
        warn!(
            step,
            ?operation,
            kind = ?classified.kind,
            origin = ?classified.origin,
            error = %err,
            "campaign request failed"
        );
        self.set_status(
            inner,
            WizardStatus::Error {
                step,
                error: classified.clone(),
            },
        );
        StepOutcome::Failed(classified)
    }

    fn set_status(&self, inner: &mut Inner, status: WizardStatus) {
        inner.status = status.clone();
        self.status_tx.send_replace(status);
    }
}
