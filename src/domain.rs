use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Buy,
    Sell,
}

impl Flow {
    pub const ALL: [Flow; 2] = [Flow::Buy, Flow::Sell];

    pub fn as_str(self) -> &'static str {
        match self {
            Flow::Buy => "buy",
            Flow::Sell => "sell",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Flow::Buy => 0,
            Flow::Sell => 1,
        }
    }

    /// Whether preset amounts of this flow are SOL quantities.
    pub fn presets_in_sol(self) -> bool {
        matches!(self, Flow::Buy)
    }

    pub fn presets(self) -> Vec<TradeAmount> {
        match self {
            Flow::Buy => BUY_PRESETS_SOL.iter().map(|v| TradeAmount::Sol(*v)).collect(),
            Flow::Sell => SELL_PRESETS_PCT
                .iter()
                .map(|v| TradeAmount::Text((*v).to_string()))
                .collect(),
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Flow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Flow::Buy),
            "sell" => Ok(Flow::Sell),
            other => Err(anyhow::anyhow!("unknown flow: {other} (expected buy or sell)")),
        }
    }
}

pub const BUY_PRESETS_SOL: [f64; 5] = [0.1, 0.25, 0.5, 0.75, 1.0];
pub const SELL_PRESETS_PCT: [&str; 3] = ["25%", "50%", "100%"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pool {
    Pump,
    Raydium,
}

impl Pool {
    pub fn as_str(self) -> &'static str {
        match self {
            Pool::Pump => "pump",
            Pool::Raydium => "raydium",
        }
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Pool {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pump" => Ok(Pool::Pump),
            "raydium" => Ok(Pool::Raydium),
            other => Err(anyhow::anyhow!("unknown pool: {other} (expected pump or raydium)")),
        }
    }
}

/// Trade size as sent on the wire: a SOL quantity (JSON number) or a raw
/// string such as a token percentage (`"50%"`).
#[derive(Debug, Clone, PartialEq)]
pub enum TradeAmount {
    Sol(f64),
    Text(String),
}

impl fmt::Display for TradeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAmount::Sol(v) => write!(f, "{v}"),
            TradeAmount::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for TradeAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TradeAmount::Sol(v) => json_number(v, serializer),
            TradeAmount::Text(s) => serializer.serialize_str(s),
        }
    }
}

// Largest integer an f64 represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Writes integral floats without a fractional part (`50` rather than `50.0`).
pub(crate) fn json_number<S: Serializer>(v: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < MAX_SAFE_INTEGER {
        serializer.serialize_i64(*v as i64)
    } else {
        serializer.serialize_f64(*v)
    }
}

fn bool_as_str<S: Serializer>(v: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *v { "true" } else { "false" })
}

/// Body of `POST /api/trade`. Built fresh per submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRequest {
    pub action: Flow,
    pub mint: String,
    pub amount: TradeAmount,
    #[serde(serialize_with = "bool_as_str")]
    pub denominated_in_sol: bool,
    #[serde(serialize_with = "json_number")]
    pub slippage: f64,
    #[serde(serialize_with = "json_number")]
    pub priority_fee: f64,
    pub pool: Pool,
}

/// Successful trade response.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeReceipt {
    pub signature: String,
    /// Full response body, kept as JSON for forward-compat.
    pub raw: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_with_wire_names() {
        let req = TradeRequest {
            action: Flow::Sell,
            mint: "ABC123".into(),
            amount: TradeAmount::Text("50%".into()),
            denominated_in_sol: false,
            slippage: 12.5,
            priority_fee: 0.005,
            pool: Pool::Raydium,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({
                "action": "sell",
                "mint": "ABC123",
                "amount": "50%",
                "denominatedInSol": "false",
                "slippage": 12.5,
                "priorityFee": 0.005,
                "pool": "raydium"
            })
        );
    }

    #[test]
    fn integral_numbers_have_no_fraction() {
        let raw = serde_json::to_string(&TradeAmount::Sol(1.0)).unwrap();
        assert_eq!(raw, "1");
        let raw = serde_json::to_string(&TradeAmount::Sol(0.25)).unwrap();
        assert_eq!(raw, "0.25");
    }

    #[test]
    fn preset_display_matches_button_values() {
        let labels: Vec<String> = Flow::Buy.presets().iter().map(|p| p.to_string()).collect();
        assert_eq!(labels, ["0.1", "0.25", "0.5", "0.75", "1"]);
        let labels: Vec<String> = Flow::Sell.presets().iter().map(|p| p.to_string()).collect();
        assert_eq!(labels, ["25%", "50%", "100%"]);
    }

    #[test]
    fn flow_and_pool_parse_case_insensitively() {
        assert_eq!("BUY".parse::<Flow>().unwrap(), Flow::Buy);
        assert_eq!(" Raydium ".parse::<Pool>().unwrap(), Pool::Raydium);
        assert!("swap".parse::<Flow>().is_err());
    }
}
