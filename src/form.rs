use crate::domain::{Flow, Pool, TradeAmount, TradeRequest};
use crate::pumpportal::TradeError;

/// Values a fresh form starts with.
#[derive(Debug, Clone, PartialEq)]
pub struct FormDefaults {
    pub slippage: String,
    pub priority_fee: String,
    pub pool: Pool,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            slippage: "50".into(),
            priority_fee: "0.01".into(),
            pool: Pool::Pump,
        }
    }
}

/// Current input values of one flow. Numeric fields stay strings until a
/// request is built.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeForm {
    pub mint: String,
    pub amount: String,
    pub denominated_in_sol: bool,
    pub slippage: String,
    pub priority_fee: String,
    pub pool: Pool,
}

impl TradeForm {
    pub fn new(defaults: &FormDefaults) -> Self {
        Self {
            mint: String::new(),
            amount: String::new(),
            denominated_in_sol: true,
            slippage: defaults.slippage.clone(),
            priority_fee: defaults.priority_fee.clone(),
            pool: defaults.pool,
        }
    }

    /// Replaces exactly one field.
    pub fn set_field(&mut self, value: FieldValue) {
        match value {
            FieldValue::Mint(v) => self.mint = v,
            FieldValue::Amount(v) => self.amount = v,
            FieldValue::DenominatedInSol(v) => self.denominated_in_sol = v,
            FieldValue::Slippage(v) => self.slippage = v,
            FieldValue::PriorityFee(v) => self.priority_fee = v,
            FieldValue::Pool(v) => self.pool = v,
        }
    }

    /// Request for a preset shortcut: the preset amount plus this form's
    /// mint, slippage, priority fee and pool.
    pub fn preset_request(&self, flow: Flow, preset: TradeAmount) -> Result<TradeRequest, TradeError> {
        Ok(TradeRequest {
            action: flow,
            mint: self.mint.clone(),
            amount: preset,
            denominated_in_sol: flow.presets_in_sol(),
            slippage: coerce(&self.slippage, "Slippage")?,
            priority_fee: coerce(&self.priority_fee, "Priority fee")?,
            pool: self.pool,
        })
    }

    /// Request from the whole form. `amount` is numeric only when the form is
    /// denominated in SOL; otherwise the raw string goes through.
    pub fn full_request(&self, flow: Flow) -> Result<TradeRequest, TradeError> {
        let amount = if self.denominated_in_sol {
            TradeAmount::Sol(coerce(&self.amount, "Amount")?)
        } else {
            TradeAmount::Text(self.amount.clone())
        };
        Ok(TradeRequest {
            action: flow,
            mint: self.mint.clone(),
            amount,
            denominated_in_sol: self.denominated_in_sol,
            slippage: coerce(&self.slippage, "Slippage")?,
            priority_fee: coerce(&self.priority_fee, "Priority fee")?,
            pool: self.pool,
        })
    }
}

/// One field assignment, already parsed into the field's type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Mint(String),
    Amount(String),
    DenominatedInSol(bool),
    Slippage(String),
    PriorityFee(String),
    Pool(Pool),
}

impl FieldValue {
    /// Parses `name=value` input using the wire field names.
    pub fn parse(name: &str, value: &str) -> anyhow::Result<Self> {
        let v = value.trim().to_string();
        let field = match name.trim().to_ascii_lowercase().as_str() {
            "mint" => FieldValue::Mint(v),
            "amount" => FieldValue::Amount(v),
            "denominatedinsol" | "denominated_in_sol" => FieldValue::DenominatedInSol(match v.as_str() {
                "true" => true,
                "false" => false,
                other => anyhow::bail!("denominatedInSol must be true or false, got {other:?}"),
            }),
            "slippage" => FieldValue::Slippage(v),
            "priorityfee" | "priority_fee" => FieldValue::PriorityFee(v),
            "pool" => FieldValue::Pool(v.parse()?),
            other => anyhow::bail!("unknown field: {other}"),
        };
        Ok(field)
    }
}

fn coerce(raw: &str, label: &str) -> Result<f64, TradeError> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(TradeError::Validation(format!(
            "{label} must be a non-negative number"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_form_uses_defaults() {
        let form = TradeForm::new(&FormDefaults::default());
        assert_eq!(form.mint, "");
        assert_eq!(form.amount, "");
        assert!(form.denominated_in_sol);
        assert_eq!(form.slippage, "50");
        assert_eq!(form.priority_fee, "0.01");
        assert_eq!(form.pool, Pool::Pump);
    }

    #[test]
    fn set_field_touches_one_field() {
        let mut form = TradeForm::new(&FormDefaults::default());
        let before = form.clone();
        form.set_field(FieldValue::Slippage("10".into()));
        assert_eq!(form.slippage, "10");
        assert_eq!(TradeForm { slippage: before.slippage.clone(), ..form.clone() }, before);
    }

    #[test]
    fn full_request_keeps_percentage_as_text() {
        let mut form = TradeForm::new(&FormDefaults::default());
        form.set_field(FieldValue::Mint("ABC123".into()));
        form.set_field(FieldValue::DenominatedInSol(false));
        form.set_field(FieldValue::Amount("25%".into()));
        let req = form.full_request(Flow::Buy).unwrap();
        assert_eq!(req.amount, TradeAmount::Text("25%".into()));
        assert!(!req.denominated_in_sol);
    }

    #[test]
    fn full_request_rejects_bad_numbers() {
        let mut form = TradeForm::new(&FormDefaults::default());
        form.set_field(FieldValue::Amount("lots".into()));
        let err = form.full_request(Flow::Buy).unwrap_err();
        assert_eq!(err.to_string(), "Amount must be a non-negative number");

        form.set_field(FieldValue::Amount("0.5".into()));
        form.set_field(FieldValue::PriorityFee("-1".into()));
        let err = form.full_request(Flow::Buy).unwrap_err();
        assert_eq!(err.to_string(), "Priority fee must be a non-negative number");
    }

    #[test]
    fn parse_accepts_wire_names() {
        assert_eq!(
            FieldValue::parse("priorityFee", "0.02").unwrap(),
            FieldValue::PriorityFee("0.02".into())
        );
        assert_eq!(
            FieldValue::parse("denominatedInSol", "false").unwrap(),
            FieldValue::DenominatedInSol(false)
        );
        assert_eq!(FieldValue::parse("pool", "raydium").unwrap(), FieldValue::Pool(Pool::Raydium));
        assert!(FieldValue::parse("pool", "orca").is_err());
        assert!(FieldValue::parse("wallet", "x").is_err());
    }
}
