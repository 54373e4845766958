use serde::{Deserialize, Serialize};

use crate::{
    coin_resolver::CoinSnapshot,
    error::{ApiError, Result},
    providers::gemini::Content,
    utils::{clamp, escape_html},
};

pub const SYSTEM_PROMPT: &str = "You are a crypto trading assistant. Using only the market \
context and the conversation provided, answer with a single JSON object with these keys: \
coin (string or null), bias (\"long\", \"short\" or \"neutral\"), timeframe (string), \
entry (number or null), stopLoss (number or null), takeProfit (array of numbers), \
confidence (integer 0-100), rationale (string), risks (array of strings). \
If there is no market context, set coin to null, bias to \"neutral\" and explain what is missing. \
Never invent prices that are not supported by the context.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Long,
    Short,
    #[default]
    #[serde(other)]
    Neutral,
}

impl Bias {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bias::Long => "long",
            Bias::Short => "short",
            Bias::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradePlan {
    pub coin: Option<String>,
    pub bias: Bias,
    pub timeframe: Option<String>,
    pub entry: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Vec<f64>,
    pub confidence: Option<f64>,
    pub rationale: String,
    pub risks: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Conversation turns in Gemini's shape, with the market context prepended to the
/// final user turn.
pub fn build_contents(messages: &[ChatMessage], snapshot: Option<&CoinSnapshot>) -> Result<Vec<Content>> {
    let context = match snapshot {
        Some(s) => format!("Market context (JSON):\n{}", serde_json::to_string_pretty(s)?),
        None => "Market context: none found for this message.".to_string(),
    };

    let last = messages.len().saturating_sub(1);
    Ok(messages
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            if i == last {
                Content::text(Some(role), format!("{context}\n\n{}", m.content))
            } else {
                Content::text(Some(role), m.content.clone())
            }
        })
        .collect())
}

/// First balanced `{...}` in `text`, honouring string literals.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_str = false;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if in_str {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_str = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_str = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse model output into a plan. Tolerates code fences and prose around the object.
pub fn parse_plan(text: &str) -> Result<TradePlan> {
    let obj = first_json_object(text)
        .ok_or_else(|| ApiError::parse("model output contained no JSON object"))?;
    let mut plan: TradePlan = serde_json::from_str(obj)
        .map_err(|e| ApiError::parse(format!("model output is not a trade plan: {e}")))?;
    plan.confidence = plan
        .confidence
        .filter(|c| c.is_finite())
        .map(|c| clamp(c, 0.0, 100.0).round());
    plan.take_profit.retain(|x| x.is_finite());
    Ok(plan)
}

fn fmt_price(x: f64) -> String {
    let a = x.abs();
    if a >= 1000.0 {
        format!("${x:.2}")
    } else if a >= 1.0 {
        format!("${x:.4}")
    } else {
        format!("${x:.8}")
    }
}

fn row(out: &mut String, label: &str, value: &str) {
    out.push_str(&format!(
        "<tr><th>{}</th><td>{}</td></tr>",
        escape_html(label),
        escape_html(value)
    ));
}

/// HTML fragment for the chat bubble. All model-provided strings are escaped.
pub fn render_html(plan: &TradePlan) -> String {
    let mut out = String::from("<div class=\"trade-plan\">");

    let title = plan.coin.as_deref().unwrap_or("No coin identified");
    out.push_str(&format!(
        "<h3>{} <span class=\"bias bias-{}\">{}</span></h3>",
        escape_html(title),
        plan.bias.as_str(),
        plan.bias.as_str().to_uppercase()
    ));

    out.push_str("<table>");
    if let Some(tf) = plan.timeframe.as_deref() {
        row(&mut out, "Timeframe", tf);
    }
    if let Some(e) = plan.entry {
        row(&mut out, "Entry", &fmt_price(e));
    }
    if let Some(sl) = plan.stop_loss {
        row(&mut out, "Stop loss", &fmt_price(sl));
    }
    if !plan.take_profit.is_empty() {
        let tps: Vec<String> = plan.take_profit.iter().map(|x| fmt_price(*x)).collect();
        row(&mut out, "Take profit", &tps.join(" / "));
    }
    if let Some(c) = plan.confidence {
        row(&mut out, "Confidence", &format!("{c:.0}%"));
    }
    out.push_str("</table>");

    if !plan.rationale.trim().is_empty() {
        out.push_str(&format!("<p>{}</p>", escape_html(plan.rationale.trim())));
    }
    if !plan.risks.is_empty() {
        out.push_str("<ul class=\"risks\">");
        for r in &plan.risks {
            out.push_str(&format!("<li>{}</li>", escape_html(r)));
        }
        out.push_str("</ul>");
    }
    out.push_str("</div>");
    out
}
