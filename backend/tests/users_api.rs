mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use solana_sdk::signature::{Keypair, Signer};

use common::{app, get, post, register, send, ADMIN};

const TCKN: &str = "12345678901";

#[tokio::test]
async fn root_greets() {
    let app = app();
    let (status, body) = get(&app, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("MedipolDAO Digiathon API"));
}

#[tokio::test]
async fn registration_validates_tckn_length() {
    let app = app();

    for bad in ["1234567890", "123456789012", "abcdefghijk"] {
        let (status, body) = post(&app, "/set_user", None, json!({ "tckn": bad })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "tckn {}", bad);
        assert_eq!(body["error"], "Invalid TCKN");
    }

    let (_, exists) = send(
        &app,
        Method::GET,
        "/user_exists",
        None,
        Some(json!({ "tckn": "1234567890" })),
    )
    .await;
    assert_eq!(exists, json!(false));
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = app();

    let (status, body) = post(&app, "/set_user", None, json!({ "tckn": TCKN })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["tckn"], TCKN);

    let (status, body) = post(&app, "/set_user", None, json!({ "tckn": TCKN })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User already exists. Try updating it!");

    let (_, exists) = post(&app, "/user_exists", None, json!({ "tckn": TCKN })).await;
    assert_eq!(exists, json!(true));
}

#[tokio::test]
async fn user_exists_requires_tckn() {
    let app = app();
    let (status, body) = post(&app, "/user_exists", None, json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please provide TCKN!");
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = app();

    for (uri, body) in [
        ("/set_user", json!({})),
        ("/set_user", json!({ "password": "pw" })),
        ("/login", json!({ "tckn": TCKN })),
        ("/login", json!({ "tckn": 12345678901u64, "password": "pw" })),
    ] {
        let (status, reply) = post(&app, uri, None, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(reply["code"], "bad_request", "{}", uri);
        assert!(reply["error"].is_string());
    }
}

#[tokio::test]
async fn missing_content_type_is_a_bad_request() {
    let app = app();
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/login")
        .body(axum::body::Body::from(r#"{"tckn":"12345678901","password":"pw"}"#))
        .unwrap();

    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_compares_password() {
    let app = app();
    post(&app, "/set_user", None, json!({ "tckn": TCKN, "password": "hunter2" })).await;

    let (status, ok) = post(&app, "/login", None, json!({ "tckn": TCKN, "password": "hunter2" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ok, json!(true));

    let (_, wrong) = post(&app, "/login", None, json!({ "tckn": TCKN, "password": "nope" })).await;
    assert_eq!(wrong, json!(false));

    let (status, body) = post(
        &app,
        "/login",
        None,
        json!({ "tckn": "10987654321", "password": "hunter2" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User does not exist!");
}

#[tokio::test]
async fn issued_token_verifies_back_to_tckn() {
    let app = app();
    let token = register(&app, TCKN).await;

    let (status, body) = post(&app, "/verify", None, json!({ "token": token })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User verified");
    assert_eq!(body["user"]["tckn"], TCKN);

    let mut tampered = token.clone();
    tampered.push('x');
    let (status, _) = post(&app, "/verify", None, json!({ "token": tampered })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_unknown_user_is_not_issued() {
    let app = app();
    let (status, body) = post(&app, "/user_jwt", None, json!({ "tckn": TCKN })).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn address_binding_keeps_latest_value() {
    let app = app();
    let admin_token = register(&app, ADMIN).await;
    register(&app, TCKN).await;

    let first = Keypair::new().pubkey().to_string();
    let second = Keypair::new().pubkey().to_string();

    for address in [&first, &second] {
        let (status, body) = post(
            &app,
            "/update_public_address",
            None,
            json!({ "tckn": TCKN, "publicAddress": address }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User public address updated successfully");
    }

    let (_, user) = post(&app, "/get_user_by_tckn", Some(&admin_token), json!({ "tckn": TCKN })).await;
    assert_eq!(user["publicAddress"], second.as_str());

    let (status, _) = post(&app, "/get_user", Some(&admin_token), json!({ "publicAddress": first })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn address_binding_rejects_bad_input() {
    let app = app();
    register(&app, TCKN).await;

    let (status, _) = post(
        &app,
        "/update_public_address",
        None,
        json!({ "tckn": TCKN, "publicAddress": "0xnot-base58" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post(
        &app,
        "/update_public_address",
        None,
        json!({ "tckn": "10987654321", "publicAddress": Keypair::new().pubkey().to_string() }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User does not exist");
}

#[tokio::test]
async fn address_cannot_be_shared() {
    let app = app();
    register(&app, TCKN).await;
    register(&app, "10987654321").await;
    let address = Keypair::new().pubkey().to_string();

    let (status, _) = post(
        &app,
        "/update_public_address",
        None,
        json!({ "tckn": TCKN, "publicAddress": address }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        &app,
        "/update_public_address",
        None,
        json!({ "tckn": "10987654321", "publicAddress": address }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn listing_users_requires_admin() {
    let app = app();
    let user_token = register(&app, TCKN).await;
    let admin_token = register(&app, ADMIN).await;

    let (status, _) = get(&app, "/get_users", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(&app, "/get_users", Some(&user_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, users) = get(&app, "/get_users", Some(&admin_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);
    assert!(users[0].get("passwordHash").is_none());
}

#[tokio::test]
async fn wallet_login_consumes_nonce() {
    let app = app();
    register(&app, TCKN).await;
    let wallet = Keypair::new();
    let address = wallet.pubkey().to_string();
    post(
        &app,
        "/update_public_address",
        None,
        json!({ "tckn": TCKN, "publicAddress": address }),
    )
    .await;

    let (status, challenge) = post(&app, "/nonce", None, json!({ "publicAddress": address })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(challenge["nonce"], 0);

    let message = challenge["message"].as_str().unwrap();
    let signature = wallet.sign_message(message.as_bytes()).to_string();
    let login = json!({ "publicAddress": address, "signature": signature });

    let (status, body) = post(&app, "/wallet_login", None, login.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (_, verified) = post(&app, "/verify", None, json!({ "token": body["token"] })).await;
    assert_eq!(verified["user"]["tckn"], TCKN);

    // Same signature again: the challenge has moved on.
    let (status, _) = post(&app, "/wallet_login", None, login).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, challenge) = post(&app, "/nonce", None, json!({ "publicAddress": address })).await;
    assert_eq!(challenge["nonce"], 1);
}

#[tokio::test]
async fn wallet_login_rejects_foreign_signature() {
    let app = app();
    register(&app, TCKN).await;
    let wallet = Keypair::new();
    let address = wallet.pubkey().to_string();
    post(
        &app,
        "/update_public_address",
        None,
        json!({ "tckn": TCKN, "publicAddress": address }),
    )
    .await;

    let (_, challenge) = post(&app, "/nonce", None, json!({ "publicAddress": address })).await;
    let message = challenge["message"].as_str().unwrap();
    let signature = Keypair::new().sign_message(message.as_bytes()).to_string();

    let (status, body) = post(
        &app,
        "/wallet_login",
        None,
        json!({ "publicAddress": address, "signature": signature }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Signature verification failed");
}
