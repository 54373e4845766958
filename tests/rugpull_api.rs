mod common;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use common::{app, post_json, settings_for, MORALIS_KEY};

const MINT: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

fn mint_account(mint_authority: Option<&str>, freeze_authority: Option<&str>) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "context": { "slot": 1 },
            "value": {
                "data": {
                    "parsed": {
                        "info": {
                            "decimals": 5,
                            "freezeAuthority": freeze_authority,
                            "isInitialized": true,
                            "mintAuthority": mint_authority,
                            "supply": "88000000000000000"
                        },
                        "type": "mint"
                    },
                    "program": "spl-token",
                    "space": 82
                },
                "executable": false,
                "lamports": 1461600,
                "owner": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
            }
        }
    })
}

async fn mount_rpc(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .and(body_partial_json(json!({ "method": "getAccountInfo" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_moralis(server: &MockServer, top10: f64, holders: u64, mutable: bool) {
    Mock::given(method("GET"))
        .and(path(format!("/moralis/token/mainnet/{MINT}/metadata")))
        .and(header("X-API-Key", MORALIS_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mint": MINT,
            "standard": "metaplex",
            "name": "Bonk",
            "symbol": "Bonk",
            "decimals": "5",
            "metaplex": { "isMutable": mutable, "updateAuthority": "9AhKqLR67hwapvG8SA2JFXaCshXc9nALJjpKaHZrsbkw" }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/moralis/token/mainnet/holders/{MINT}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalHolders": holders,
            "holderSupply": { "top10": { "supply": "1", "supplyPercent": top10 } }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn missing_token_address_is_400() {
    let server = MockServer::start().await;
    let (status, body) = post_json(app(settings_for(&server)), "/api/rugpull", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "tokenAddress is required");
}

#[tokio::test]
async fn malformed_body_is_400_json() {
    let server = MockServer::start().await;
    let (status, body) = post_json(app(settings_for(&server)), "/api/rugpull", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("invalid request body"));
}

#[tokio::test]
async fn safe_token_scores_low_risk() {
    let server = MockServer::start().await;
    mount_rpc(&server, mint_account(None, None)).await;
    mount_moralis(&server, 18.0, 900_000, false).await;

    let body = json!({ "tokenAddress": MINT }).to_string();
    let (status, out) = post_json(app(settings_for(&server)), "/api/rugpull", &body).await;
    assert_eq!(status, StatusCode::OK, "{out}");
    assert_eq!(out["score"], 100);
    assert_eq!(out["risk"], "Low Risk");
    assert_eq!(out["name"], "Bonk");
    assert_eq!(out["totalHolders"], 900_000);
    assert_eq!(out["flags"].as_array().unwrap().len(), 0);
    assert_eq!(out["mint"]["owner"], "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
}

#[tokio::test]
async fn active_authorities_and_whales_score_high_risk() {
    let server = MockServer::start().await;
    mount_rpc(&server, mint_account(Some("dev"), Some("dev"))).await;
    mount_moralis(&server, 81.0, 40, true).await;

    let body = json!({ "tokenAddress": MINT }).to_string();
    let (status, out) = post_json(app(settings_for(&server)), "/api/rugpull", &body).await;
    assert_eq!(status, StatusCode::OK, "{out}");
    assert_eq!(out["score"], 0);
    assert_eq!(out["risk"], "High Risk");
    let codes: Vec<&str> = out["flags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["code"].as_str().unwrap())
        .collect();
    assert_eq!(
        codes,
        vec![
            "mint_authority",
            "freeze_authority",
            "holder_concentration",
            "low_holder_count",
            "mutable_metadata"
        ]
    );
}

#[tokio::test]
async fn unknown_mint_is_404() {
    let server = MockServer::start().await;
    mount_rpc(
        &server,
        json!({ "jsonrpc": "2.0", "id": 1, "result": { "context": { "slot": 1 }, "value": null } }),
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Token not found" })))
        .mount(&server)
        .await;

    let body = json!({ "tokenAddress": MINT }).to_string();
    let (status, out) = post_json(app(settings_for(&server)), "/api/rugpull", &body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(out["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn missing_api_key_is_500() {
    let server = MockServer::start().await;
    mount_rpc(&server, mint_account(None, None)).await;
    let settings = intel_desk::config::Settings {
        moralis_api_key: None,
        ..settings_for(&server)
    };

    let body = json!({ "tokenAddress": MINT }).to_string();
    let (status, out) = post_json(app(settings), "/api/rugpull", &body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(out["error"].as_str().unwrap().contains("MORALIS_API_KEY"));
}

#[tokio::test]
async fn provider_failure_is_500() {
    let server = MockServer::start().await;
    mount_rpc(&server, mint_account(None, None)).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let body = json!({ "tokenAddress": MINT }).to_string();
    let (status, out) = post_json(app(settings_for(&server)), "/api/rugpull", &body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(out["error"].as_str().unwrap().contains("moralis returned 401"));
}
