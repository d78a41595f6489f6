use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, error};

use crate::desk::{Completion, PendingSubmission, SubmitError, Ticket, TradingDesk};
use crate::domain::{Flow, TradeAmount};
use crate::form::FieldValue;
use crate::pumpportal::{TradeApi, TradeError};
use crate::status::{flow_status, FlowStatus};

/// Runs desk submissions as background tasks so the caller's loop keeps
/// handling input while requests are in flight. Finished requests come back
/// through [`Session::next_completion`] and are applied with
/// [`Session::apply`].
pub struct Session {
    desk: TradingDesk,
    api: Arc<dyn TradeApi>,
    explorer_tx_url: String,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: [Option<AbortHandle>; 2],
}

impl Session {
    pub fn new(desk: TradingDesk, api: Arc<dyn TradeApi>, explorer_tx_url: String) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            desk,
            api,
            explorer_tx_url,
            tx,
            rx,
            in_flight: [None, None],
        }
    }

    pub fn desk(&self) -> &TradingDesk {
        &self.desk
    }

    pub fn status(&self, flow: Flow) -> FlowStatus {
        flow_status(&self.desk, flow, &self.explorer_tx_url)
    }

    pub fn set_field(&mut self, flow: Flow, value: FieldValue) {
        self.desk.set_field(flow, value);
    }

    /// Returns true when a request was sent; false when validation failed
    /// locally and the flow already holds the failure.
    pub fn submit_preset(&mut self, flow: Flow, preset: TradeAmount) -> Result<bool, SubmitError> {
        let pending = self.desk.begin_preset(flow, preset)?;
        Ok(self.spawn(flow, pending))
    }

    pub fn submit_form(&mut self, flow: Flow) -> Result<bool, SubmitError> {
        let pending = self.desk.begin_form(flow)?;
        Ok(self.spawn(flow, pending))
    }

    /// Aborts the flow's in-flight request and restores its defaults.
    pub fn reset(&mut self, flow: Flow) {
        if let Some(handle) = self.in_flight[flow.index()].take() {
            handle.abort();
        }
        self.desk.reset(flow);
    }

    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.rx.recv().await
    }

    pub fn apply(&mut self, completion: Completion) -> bool {
        let flow = completion.ticket.flow;
        let applied = self.desk.complete(completion);
        if applied {
            self.in_flight[flow.index()] = None;
        }
        applied
    }

    fn spawn(&mut self, flow: Flow, pending: Option<PendingSubmission>) -> bool {
        let Some(pending) = pending else {
            // A local rejection made any in-flight request stale.
            if let Some(old) = self.in_flight[flow.index()].take() {
                debug!(%flow, "session.rejected_abort");
                old.abort();
            }
            return false;
        };
        let api = Arc::clone(&self.api);
        let mut guard = CompletionGuard {
            ticket: Some(pending.ticket.clone()),
            tx: self.tx.clone(),
        };

        let handle = tokio::spawn(async move {
            let done = pending.execute(api.as_ref()).await;
            guard.finish(done);
        });

        if let Some(old) = self.in_flight[flow.index()].replace(handle.abort_handle()) {
            debug!(%flow, "session.superseded_abort");
            old.abort();
        }
        true
    }
}

/// Reports a failure for the ticket if the task ends without delivering a
/// result (panic or abort), so the flow never stays loading.
struct CompletionGuard {
    ticket: Option<Ticket>,
    tx: mpsc::UnboundedSender<Completion>,
}

impl CompletionGuard {
    fn finish(&mut self, done: Completion) {
        self.ticket = None;
        let _ = self.tx.send(done);
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            error!(flow = %ticket.flow, "session.task_ended_without_result");
            let _ = self.tx.send(Completion {
                ticket,
                result: Err(TradeError::Transport(
                    "submission ended before a response arrived".to_string(),
                )),
            });
        }
    }
}
