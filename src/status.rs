use chrono::{DateTime, Local};

use crate::desk::{SubmissionOutcome, TradingDesk};
use crate::domain::{Flow, TradeAmount};
use crate::form::TradeForm;

pub const DEFAULT_EXPLORER_TX_URL: &str = "https://solscan.io/tx";

/// What the UI shows for one flow. Recomputed from the outcome on every
/// render.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowStatus {
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub success_signature: Option<String>,
    pub success_link: Option<String>,
    pub resolved_at: Option<DateTime<Local>>,
}

pub fn explorer_link(explorer_tx_url: &str, signature: &str) -> String {
    format!("{}/{}", explorer_tx_url.trim_end_matches('/'), signature)
}

pub fn project(outcome: &SubmissionOutcome, explorer_tx_url: &str) -> FlowStatus {
    match outcome {
        SubmissionOutcome::Idle => FlowStatus::default(),
        SubmissionOutcome::Loading => FlowStatus {
            is_loading: true,
            ..FlowStatus::default()
        },
        SubmissionOutcome::Success(receipt) => FlowStatus {
            success_signature: Some(receipt.signature.clone()),
            success_link: Some(explorer_link(explorer_tx_url, &receipt.signature)),
            ..FlowStatus::default()
        },
        SubmissionOutcome::Failure(err) => FlowStatus {
            error_message: Some(err.to_string()),
            ..FlowStatus::default()
        },
    }
}

pub fn flow_status(desk: &TradingDesk, flow: Flow, explorer_tx_url: &str) -> FlowStatus {
    FlowStatus {
        resolved_at: desk.resolved_at(flow),
        ..project(desk.outcome(flow), explorer_tx_url)
    }
}

/// A preset button is active when the form amount equals its value.
pub fn preset_is_active(form: &TradeForm, preset: &TradeAmount) -> bool {
    form.amount == preset.to_string()
}

pub fn preset_label(flow: Flow, form: &TradeForm, is_loading: bool, preset: &TradeAmount) -> String {
    if is_loading && preset_is_active(form, preset) {
        return match flow {
            Flow::Buy => "Buying...".to_string(),
            Flow::Sell => "Selling...".to_string(),
        };
    }
    match (flow, preset) {
        (Flow::Buy, TradeAmount::Sol(v)) => format!("{v} SOL"),
        _ => preset.to_string(),
    }
}

pub fn submit_label(flow: Flow, is_loading: bool) -> &'static str {
    match (flow, is_loading) {
        (Flow::Buy, true) => "Processing buy...",
        (Flow::Buy, false) => "Execute Buy",
        (Flow::Sell, true) => "Processing sell...",
        (Flow::Sell, false) => "Execute Sell",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TradeReceipt;
    use crate::form::{FieldValue, FormDefaults};
    use crate::pumpportal::TradeError;
    use serde_json::json;

    #[test]
    fn success_links_to_solscan() {
        let outcome = SubmissionOutcome::Success(TradeReceipt {
            signature: "sig1".into(),
            raw: json!({"signature": "sig1"}),
        });
        let st = project(&outcome, DEFAULT_EXPLORER_TX_URL);
        assert_eq!(st.success_link.as_deref(), Some("https://solscan.io/tx/sig1"));
        assert_eq!(st.success_signature.as_deref(), Some("sig1"));
        assert!(!st.is_loading);
        assert!(st.error_message.is_none());
    }

    #[test]
    fn explorer_prefix_tolerates_trailing_slash() {
        assert_eq!(explorer_link("https://solscan.io/tx/", "abc"), "https://solscan.io/tx/abc");
    }

    #[test]
    fn loading_and_failure_projection() {
        let st = project(&SubmissionOutcome::Loading, DEFAULT_EXPLORER_TX_URL);
        assert!(st.is_loading);
        assert!(st.success_link.is_none());

        let err = TradeError::Api {
            status: 400,
            message: "slippage too high".into(),
        };
        let st = project(&SubmissionOutcome::Failure(err), DEFAULT_EXPLORER_TX_URL);
        assert!(!st.is_loading);
        assert_eq!(st.error_message.as_deref(), Some("slippage too high"));

        assert_eq!(project(&SubmissionOutcome::Idle, DEFAULT_EXPLORER_TX_URL), FlowStatus::default());
    }

    #[test]
    fn preset_labels_follow_loading_and_amount() {
        let mut form = TradeForm::new(&FormDefaults::default());
        let preset = TradeAmount::Sol(0.25);
        assert_eq!(preset_label(Flow::Buy, &form, true, &preset), "0.25 SOL");

        form.set_field(FieldValue::Amount("0.25".into()));
        assert!(preset_is_active(&form, &preset));
        assert_eq!(preset_label(Flow::Buy, &form, true, &preset), "Buying...");
        assert_eq!(preset_label(Flow::Buy, &form, false, &preset), "0.25 SOL");

        let pct = TradeAmount::Text("100%".into());
        form.set_field(FieldValue::Amount("100%".into()));
        assert_eq!(preset_label(Flow::Sell, &form, true, &pct), "Selling...");
        assert_eq!(preset_label(Flow::Sell, &form, false, &pct), "100%");
    }

    #[test]
    fn submit_labels() {
        assert_eq!(submit_label(Flow::Buy, true), "Processing buy...");
        assert_eq!(submit_label(Flow::Sell, false), "Execute Sell");
    }
}
