pub mod chat;
pub mod rugpull;
pub mod vault;

use axum::{extract::rejection::JsonRejection, Json};

use crate::{
    error::{ApiError, Result},
    utils::is_solana_address,
};

pub(crate) fn parse_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| ApiError::bad_request(format!("invalid request body: {}", e.body_text())))
}

/// Trimmed, non-empty Solana address from an optional body field.
pub(crate) fn required_address<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str> {
    let addr = value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{field} is required")))?;
    if !is_solana_address(addr) {
        return Err(ApiError::bad_request(format!(
            "{field} is not a valid Solana address"
        )));
    }
    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_address_rules() {
        assert!(matches!(
            required_address("address", None),
            Err(ApiError::BadRequest(m)) if m == "address is required"
        ));
        assert!(matches!(
            required_address("address", Some("   ")),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            required_address("address", Some("nope")),
            Err(ApiError::BadRequest(m)) if m.contains("not a valid")
        ));
        assert_eq!(
            required_address("address", Some(" So11111111111111111111111111111111111111112 ")).unwrap(),
            "So11111111111111111111111111111111111111112"
        );
    }
}
