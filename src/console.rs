use anyhow::{anyhow, bail, Result};
use std::fmt::Write as _;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use crate::desk::{SubmissionOutcome, MISSING_MINT_MESSAGE};
use crate::domain::{Flow, TradeAmount, BUY_PRESETS_SOL, SELL_PRESETS_PCT};
use crate::form::FieldValue;
use crate::session::Session;
use crate::status::{preset_is_active, preset_label, submit_label};

pub const HELP: &str = "\
commands:
  set <buy|sell> <field> <value>   fields: mint amount denominatedInSol slippage priorityFee pool
  buy <sol>                        preset buy (0.1 0.25 0.5 0.75 1)
  sell <pct>                       preset sell (25% 50% 100%)
  submit <buy|sell>                submit the whole form
  status [buy|sell]                show form and last result
  reset <buy|sell>                 restore defaults, drop any pending result
  presets                          list preset amounts
  help
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set { flow: Flow, value: FieldValue },
    Preset { flow: Flow, amount: TradeAmount },
    Submit(Flow),
    Status(Option<Flow>),
    Reset(Flow),
    Presets,
    Help,
    Quit,
}

impl Command {
    /// Parses one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let cmd = match (head.to_ascii_lowercase().as_str(), rest.as_slice()) {
            ("set", [flow, field, value @ ..]) if !value.is_empty() => Command::Set {
                flow: flow.parse()?,
                value: FieldValue::parse(field, &value.join(" "))?,
            },
            ("buy", [amount]) => Command::Preset {
                flow: Flow::Buy,
                amount: buy_preset(amount)?,
            },
            ("sell", [pct]) => Command::Preset {
                flow: Flow::Sell,
                amount: sell_preset(pct)?,
            },
            ("submit", [flow]) => Command::Submit(flow.parse()?),
            ("status", []) => Command::Status(None),
            ("status", [flow]) => Command::Status(Some(flow.parse()?)),
            ("reset", [flow]) => Command::Reset(flow.parse()?),
            ("presets", []) => Command::Presets,
            ("help", _) | ("?", _) => Command::Help,
            ("quit", []) | ("exit", []) => Command::Quit,
            _ => bail!("unrecognized command: {line:?} (try `help`)"),
        };
        Ok(Some(cmd))
    }
}

fn buy_preset(raw: &str) -> Result<TradeAmount> {
    let v: f64 = raw
        .parse()
        .map_err(|_| anyhow!("buy preset must be a number, got {raw:?}"))?;
    BUY_PRESETS_SOL
        .iter()
        .find(|p| **p == v)
        .map(|p| TradeAmount::Sol(*p))
        .ok_or_else(|| anyhow!("no {v} SOL preset; use `submit buy` for custom amounts"))
}

fn sell_preset(raw: &str) -> Result<TradeAmount> {
    let pct = if raw.ends_with('%') {
        raw.to_string()
    } else {
        format!("{raw}%")
    };
    SELL_PRESETS_PCT
        .iter()
        .find(|p| **p == pct)
        .map(|p| TradeAmount::Text((*p).to_string()))
        .ok_or_else(|| anyhow!("no {pct} sell preset"))
}

pub fn render_presets() -> String {
    let mut out = String::new();
    for flow in Flow::ALL {
        let values: Vec<String> = flow.presets().iter().map(|p| p.to_string()).collect();
        let _ = writeln!(out, "{flow}: {}", values.join(" "));
    }
    out
}

pub fn render_flow(session: &Session, flow: Flow) -> String {
    let form = session.desk().form(flow);
    let status = session.status(flow);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "[{flow}] mint={} amount={} denominatedInSol={} slippage={} priorityFee={} pool={}",
        if form.mint.is_empty() { "-" } else { form.mint.as_str() },
        if form.amount.is_empty() { "-" } else { form.amount.as_str() },
        form.denominated_in_sol,
        form.slippage,
        form.priority_fee,
        form.pool,
    );

    let buttons: Vec<String> = flow
        .presets()
        .iter()
        .map(|p| {
            let label = preset_label(flow, form, status.is_loading, p);
            if preset_is_active(form, p) {
                format!("[{label}]")
            } else {
                label
            }
        })
        .collect();
    let _ = writeln!(out, "  presets: {}", buttons.join("  "));
    let _ = writeln!(out, "  {}", submit_label(flow, status.is_loading));

    let at = status
        .resolved_at
        .map(|t| format!(" ({})", t.format("%H:%M:%S")))
        .unwrap_or_default();
    if let Some(msg) = &status.error_message {
        let _ = writeln!(out, "  error: {msg}{at}");
    }
    if let (Some(sig), Some(link)) = (&status.success_signature, &status.success_link) {
        let _ = writeln!(out, "  Transaction successful!{at}");
        let _ = writeln!(out, "  Signature: {sig}");
        let _ = writeln!(out, "  {link}");
    }
    out
}

fn render_outcome(session: &Session, flow: Flow) -> String {
    let status = session.status(flow);
    match session.desk().outcome(flow) {
        SubmissionOutcome::Success(_) => format!(
            "{flow}: Transaction successful! {}",
            status.success_link.unwrap_or_default()
        ),
        SubmissionOutcome::Failure(_) => {
            format!("{flow}: {}", status.error_message.unwrap_or_default())
        }
        SubmissionOutcome::Loading => format!("{flow}: {}", submit_label(flow, true)),
        SubmissionOutcome::Idle => format!("{flow}: idle"),
    }
}

/// Applies one command. Returns false when the user asked to quit.
pub fn handle(session: &mut Session, cmd: Command) -> (bool, String) {
    let out = match cmd {
        Command::Quit => return (false, String::new()),
        Command::Help => HELP.to_string(),
        Command::Presets => render_presets(),
        Command::Set { flow, value } => {
            session.set_field(flow, value);
            render_flow(session, flow)
        }
        Command::Preset { flow, amount } => match session.submit_preset(flow, amount) {
            Ok(_) => render_outcome(session, flow),
            Err(err) => err.to_string(),
        },
        // The form's mint is a required field; presets check it in the desk.
        Command::Submit(flow) if session.desk().form(flow).mint.is_empty() => {
            format!("{flow}: {MISSING_MINT_MESSAGE}")
        }
        Command::Submit(flow) => match session.submit_form(flow) {
            Ok(_) => render_outcome(session, flow),
            Err(err) => err.to_string(),
        },
        Command::Status(Some(flow)) => render_flow(session, flow),
        Command::Status(None) => {
            let session = &*session;
            Flow::ALL
                .iter()
                .map(|f| render_flow(session, *f))
                .collect::<Vec<_>>()
                .join("\n")
        }
        Command::Reset(flow) => {
            session.reset(flow);
            render_flow(session, flow)
        }
    };
    (true, out)
}

/// Interactive loop over stdin. Completions are applied as they arrive,
/// between input lines.
pub async fn run(mut session: Session) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    stdout.write_all(format!("{HELP}\n> ").as_bytes()).await?;
    stdout.flush().await?;

    loop {
        let out = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("console.eof");
                    break;
                };
                match Command::parse(&line) {
                    Ok(None) => String::new(),
                    Ok(Some(cmd)) => {
                        let (keep_going, out) = handle(&mut session, cmd);
                        if !keep_going {
                            break;
                        }
                        out
                    }
                    Err(err) => format!("error: {err}"),
                }
            }
            Some(done) = session.next_completion() => {
                let flow = done.ticket.flow;
                if session.apply(done) {
                    format!("\n{}", render_outcome(&session, flow))
                } else {
                    continue;
                }
            }
        };

        if !out.is_empty() {
            stdout.write_all(out.trim_end().as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }
    Ok(())
}
