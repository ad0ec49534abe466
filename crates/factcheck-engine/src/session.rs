use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use factcheck_core::error::{Error, Result};
use factcheck_core::settings::SessionSettings;
use factcheck_core::types::{AdvocateArgument, CanonicalVerdict, Claim, Degradation, MediatorVerdict, RetrievedEvidence};
use factcheck_verdict::VerdictMapper;

use crate::advocate::Advocate;
use crate::mediator::Mediator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    AdvocatesRunning,
    Adjudicating,
    Normalizing,
    Complete,
    Failed,
}

impl SessionState {
    /// Forward-only transitions; any non-terminal state may fail.
    pub fn can_advance_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Created, AdvocatesRunning)
                | (AdvocatesRunning, Adjudicating)
                | (Adjudicating, Normalizing)
                | (Normalizing, Complete)
                | (Created | AdvocatesRunning | Adjudicating | Normalizing, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Complete | SessionState::Failed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub claim: Claim,
    pub mediator: MediatorVerdict,
    pub verdict: CanonicalVerdict,
    /// Taxonomy the mediator label was normalized with.
    pub taxonomy: String,
    pub transitions: Vec<SessionState>,
}

impl VerificationResult {
    /// All advocate arguments, in advocate configuration order.
    pub fn arguments(&self) -> &[AdvocateArgument] {
        &self.mediator.considered
    }
}

struct Transitions(Vec<SessionState>);

impl Transitions {
    fn new() -> Self {
        Self(vec![SessionState::Created])
    }

    fn current(&self) -> SessionState {
        self.0.last().copied().unwrap_or(SessionState::Created)
    }

    fn advance(&mut self, next: SessionState) {
        debug_assert!(self.current().can_advance_to(next), "{:?} -> {next:?}", self.current());
        tracing::debug!(from = ?self.current(), to = ?next, "Session transition");
        self.0.push(next);
    }

    fn fail(&mut self, err: &Error) {
        tracing::error!(state = ?self.current(), error = %err, "Session failed");
        self.advance(SessionState::Failed);
    }
}

/// One verification run over a fixed panel of advocates and a mediator.
pub struct Session {
    advocates: Vec<Advocate>,
    mediator: Mediator,
    mapper: Arc<VerdictMapper>,
    settings: SessionSettings,
}

impl Session {
    pub fn new(
        advocates: Vec<Advocate>,
        mediator: Mediator,
        mapper: Arc<VerdictMapper>,
        settings: SessionSettings,
    ) -> Result<Self> {
        settings.validate()?;
        if advocates.is_empty() {
            return Err(Error::config("a session needs at least one advocate"));
        }
        if !mapper.has_taxonomy(&settings.verdict_taxonomy) {
            return Err(Error::config(format!("unknown verdict taxonomy '{}'", settings.verdict_taxonomy)));
        }
        Ok(Self { advocates, mediator, mapper, settings })
    }

    pub fn advocates(&self) -> &[Advocate] {
        &self.advocates
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Verify one claim: all advocates, then the mediator, then normalization.
    pub async fn run(&self, claim: &Claim) -> Result<VerificationResult> {
        let mut transitions = Transitions::new();
        match self.drive(claim, &mut transitions).await {
            Ok((mediator, verdict)) => {
                transitions.advance(SessionState::Complete);
                tracing::info!(claim = %claim, verdict = %verdict, "Claim verified");
                Ok(VerificationResult {
                    claim: claim.clone(),
                    mediator,
                    verdict,
                    taxonomy: self.settings.verdict_taxonomy.clone(),
                    transitions: transitions.0,
                })
            }
            Err(err) => {
                transitions.fail(&err);
                Err(err)
            }
        }
    }

    /// Like [`Session::run`], but gives up with [`Error::Cancelled`] as soon
    /// as `cancel` resolves. In-flight backend calls are dropped.
    pub async fn run_until<F>(&self, claim: &Claim, cancel: F) -> Result<VerificationResult>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = cancel => {
                tracing::warn!(claim = %claim, "Session cancelled");
                Err(Error::Cancelled)
            }
            result = self.run(claim) => result,
        }
    }

    async fn drive(&self, claim: &Claim, transitions: &mut Transitions) -> Result<(MediatorVerdict, CanonicalVerdict)> {
        transitions.advance(SessionState::AdvocatesRunning);
        let arguments = join_all(self.advocates.iter().map(|a| self.argue_guarded(a, claim))).await;
        let degraded = arguments.iter().filter(|a| a.is_degraded()).count();
        tracing::info!(advocates = arguments.len(), degraded, "Advocates finished");

        transitions.advance(SessionState::Adjudicating);
        let mediator = self.mediator.adjudicate(claim, &arguments).await?;

        transitions.advance(SessionState::Normalizing);
        let verdict = self.mapper.normalize(&mediator.raw_label, &self.settings.verdict_taxonomy)?;
        Ok((mediator, verdict))
    }

    async fn argue_guarded(&self, advocate: &Advocate, claim: &Claim) -> AdvocateArgument {
        let limit = self.settings.advocate_timeout();
        match advocate.argue_within(claim, Some(limit)).await {
            Ok(argument) => argument,
            Err(err) => {
                let source_id = advocate.source_id();
                tracing::warn!(source_id, error = %err, "Advocate failed before reasoning");
                AdvocateArgument::degraded(
                    source_id,
                    Degradation::BackendFailure { message: err.to_string() },
                    RetrievedEvidence::default(),
                    err.to_string(),
                )
            }
        }
    }
}
