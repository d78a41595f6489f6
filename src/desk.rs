use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{Flow, TradeAmount, TradeReceipt, TradeRequest};
use crate::form::{FieldValue, FormDefaults, TradeForm};
use crate::pumpportal::{TradeApi, TradeError};

pub const MISSING_MINT_MESSAGE: &str = "Please enter a token contract address";

/// Last submission result of one flow.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Idle,
    Loading,
    Success(TradeReceipt),
    Failure(TradeError),
}

impl SubmissionOutcome {
    pub fn is_loading(&self) -> bool {
        matches!(self, SubmissionOutcome::Loading)
    }
}

/// What to do when a flow is submitted again while its request is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPolicy {
    Reject,
    /// The newer submission wins; the older result is discarded on arrival.
    Supersede,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a {0} submission is already in flight")]
    Busy(Flow),
}

/// Identifies one submission. Results are applied only while the ticket's
/// generation is still the flow's current one.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub flow: Flow,
    generation: u64,
    preset: Option<TradeAmount>,
}

/// A submission that passed validation and is waiting for the API.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub ticket: Ticket,
    pub request: TradeRequest,
}

impl PendingSubmission {
    /// Performs the HTTP round trip. Does not touch desk state.
    pub async fn execute(self, api: &dyn TradeApi) -> Completion {
        let result = api.trade(&self.request).await;
        Completion {
            ticket: self.ticket,
            result,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub ticket: Ticket,
    pub result: Result<TradeReceipt, TradeError>,
}

#[derive(Debug, Clone)]
struct FlowState {
    form: TradeForm,
    outcome: SubmissionOutcome,
    generation: u64,
    resolved_at: Option<DateTime<Local>>,
}

impl FlowState {
    fn new(defaults: &FormDefaults) -> Self {
        Self {
            form: TradeForm::new(defaults),
            outcome: SubmissionOutcome::Idle,
            generation: 0,
            resolved_at: None,
        }
    }

    fn resolve(&mut self, outcome: SubmissionOutcome) {
        self.outcome = outcome;
        self.resolved_at = Some(Local::now());
    }

    /// Failure found before any request went out. Anything still in flight
    /// for this flow becomes stale.
    fn reject(&mut self, err: TradeError) {
        self.generation += 1;
        self.resolve(SubmissionOutcome::Failure(err));
    }
}

/// Buy and sell forms with their submission outcomes. Flows share no state.
#[derive(Debug, Clone)]
pub struct TradingDesk {
    defaults: FormDefaults,
    overlap: OverlapPolicy,
    flows: [FlowState; 2],
}

impl TradingDesk {
    pub fn new(defaults: FormDefaults, overlap: OverlapPolicy) -> Self {
        let flows = [FlowState::new(&defaults), FlowState::new(&defaults)];
        Self {
            defaults,
            overlap,
            flows,
        }
    }

    fn flow(&self, flow: Flow) -> &FlowState {
        &self.flows[flow.index()]
    }

    fn flow_mut(&mut self, flow: Flow) -> &mut FlowState {
        &mut self.flows[flow.index()]
    }

    pub fn form(&self, flow: Flow) -> &TradeForm {
        &self.flow(flow).form
    }

    pub fn outcome(&self, flow: Flow) -> &SubmissionOutcome {
        &self.flow(flow).outcome
    }

    pub fn resolved_at(&self, flow: Flow) -> Option<DateTime<Local>> {
        self.flow(flow).resolved_at
    }

    pub fn set_field(&mut self, flow: Flow, value: FieldValue) {
        self.flow_mut(flow).form.set_field(value);
    }

    /// Restores the form defaults and forgets the outcome. A result still in
    /// flight for this flow will be discarded.
    pub fn reset(&mut self, flow: Flow) {
        let defaults = self.defaults.clone();
        let st = self.flow_mut(flow);
        st.form = TradeForm::new(&defaults);
        st.outcome = SubmissionOutcome::Idle;
        st.resolved_at = None;
        st.generation += 1;
        info!(%flow, generation = st.generation, "desk.reset");
    }

    /// Starts a preset shortcut submission. Returns `Ok(None)` when the
    /// submission failed validation; the flow then holds the failure.
    pub fn begin_preset(
        &mut self,
        flow: Flow,
        preset: TradeAmount,
    ) -> Result<Option<PendingSubmission>, SubmitError> {
        self.ensure_idle(flow)?;

        let st = self.flow_mut(flow);
        if st.form.mint.is_empty() {
            info!(%flow, "desk.preset.missing_mint");
            st.reject(TradeError::Validation(MISSING_MINT_MESSAGE.to_string()));
            return Ok(None);
        }

        let request = st.form.preset_request(flow, preset.clone());
        Ok(self.start(flow, request, Some(preset)))
    }

    /// Starts a submission of the whole form.
    pub fn begin_form(&mut self, flow: Flow) -> Result<Option<PendingSubmission>, SubmitError> {
        self.ensure_idle(flow)?;
        let request = self.flow(flow).form.full_request(flow);
        Ok(self.start(flow, request, None))
    }

    fn ensure_idle(&self, flow: Flow) -> Result<(), SubmitError> {
        if self.overlap == OverlapPolicy::Reject && self.outcome(flow).is_loading() {
            warn!(%flow, "desk.submit.busy");
            return Err(SubmitError::Busy(flow));
        }
        Ok(())
    }

    fn start(
        &mut self,
        flow: Flow,
        request: Result<TradeRequest, TradeError>,
        preset: Option<TradeAmount>,
    ) -> Option<PendingSubmission> {
        let st = self.flow_mut(flow);
        let request = match request {
            Ok(r) => r,
            Err(err) => {
                info!(%flow, error = %err, "desk.submit.invalid");
                st.reject(err);
                return None;
            }
        };

        st.generation += 1;
        st.outcome = SubmissionOutcome::Loading;
        info!(
            %flow,
            generation = st.generation,
            mint = %request.mint,
            amount = %request.amount,
            pool = %request.pool,
            preset = preset.is_some(),
            "desk.submit.start"
        );

        Some(PendingSubmission {
            ticket: Ticket {
                flow,
                generation: st.generation,
                preset,
            },
            request,
        })
    }

    /// Applies a finished request. Returns false when the result was stale
    /// and dropped.
    pub fn complete(&mut self, completion: Completion) -> bool {
        let Completion { ticket, result } = completion;
        let flow = ticket.flow;
        let st = self.flow_mut(flow);

        if ticket.generation != st.generation {
            warn!(
                %flow,
                ticket = ticket.generation,
                current = st.generation,
                "desk.submit.stale_discarded"
            );
            return false;
        }

        match result {
            Ok(receipt) => {
                info!(
                    %flow,
                    signature = %receipt.signature,
                    response = %receipt.raw,
                    "desk.submit.success"
                );
                if let Some(preset) = ticket.preset {
                    st.form.amount = preset.to_string();
                }
                st.resolve(SubmissionOutcome::Success(receipt));
            }
            Err(err) => {
                warn!(
                    %flow,
                    kind = err.kind(),
                    status = ?err.http_status(),
                    error = %err,
                    "desk.submit.failure"
                );
                st.resolve(SubmissionOutcome::Failure(err));
            }
        }
        true
    }
}
