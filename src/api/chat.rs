use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use super::parse_body;
use crate::{
    coin_resolver::{extract_coin_ref, CoinRef, CoinSnapshot},
    error::{ApiError, Result},
    server::AppState,
    trade_plan::{build_contents, parse_plan, render_html, ChatMessage, Role, TradePlan, SYSTEM_PROMPT},
};

/// Older turns are dropped to bound the prompt size.
const MAX_HISTORY: usize = 20;
const MAX_MESSAGE_CHARS: usize = 4_000;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Rendered HTML fragment.
    pub reply: String,
    pub plan: TradePlan,
    pub coin: Option<CoinSnapshot>,
    pub coin_ref: Option<CoinRef>,
}

fn validate(messages: Option<Vec<ChatMessage>>) -> Result<Vec<ChatMessage>> {
    let mut messages = messages.unwrap_or_default();
    let Some(last) = messages.last() else {
        return Err(ApiError::bad_request("messages must be a non-empty array"));
    };
    if last.role != Role::User {
        return Err(ApiError::bad_request("last message must come from the user"));
    }
    if last.content.trim().is_empty() {
        return Err(ApiError::bad_request("last message is empty"));
    }
    if messages.iter().any(|m| m.content.chars().count() > MAX_MESSAGE_CHARS) {
        return Err(ApiError::bad_request(format!(
            "messages are limited to {MAX_MESSAGE_CHARS} characters"
        )));
    }
    if messages.len() > MAX_HISTORY {
        messages.drain(..messages.len() - MAX_HISTORY);
    }
    // The conversation sent upstream has to open with a user turn.
    let first_user = messages
        .iter()
        .position(|m| m.role == Role::User)
        .unwrap_or(0);
    messages.drain(..first_user);
    Ok(messages)
}

/// The newest user turn that mentions a coin wins.
fn find_coin_ref(messages: &[ChatMessage]) -> Option<CoinRef> {
    messages
        .iter()
        .rev()
        .filter(|m| m.role == Role::User)
        .find_map(|m| extract_coin_ref(&m.content))
}

pub async fn chat(
    State(st): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let req = parse_body(payload)?;
    let messages = validate(req.messages)?;

    let coin_ref = find_coin_ref(&messages);
    let coin = match &coin_ref {
        Some(r) => st.resolver.resolve(r).await?,
        None => None,
    };
    log::info!(
        "chat.resolve ref={:?} resolved={}",
        coin_ref,
        coin.as_ref()
            .and_then(|c| c.symbol.as_deref())
            .unwrap_or("-")
    );

    let contents = build_contents(&messages, coin.as_ref())?;
    let text = st.gemini.generate_json(SYSTEM_PROMPT, &contents).await?;
    let plan = parse_plan(&text)?;
    let reply = render_html(&plan);

    Ok(Json(ChatResponse {
        reply,
        plan,
        coin,
        coin_ref,
    }))
}
