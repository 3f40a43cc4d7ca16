use super::*;
use axum::http::Request;
use jsonwebtoken::{EncodingKey, Header, encode};
use std::env;

const SECRET: &str = "supersecretjwtsecretforunittesting123";
const USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

fn set_env_vars() {
    unsafe {
        env::set_var("AUTH_JWT_SECRET", SECRET);
    }
}

fn token(sub: &str, aud: &str, exp: usize, secret: &str) -> String {
    let claims = AccessClaims {
        sub: sub.to_string(),
        aud: aud.to_string(),
        exp,
        email: Some("test@example.com".to_string()),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[test]
fn test_validate_access_token_success() {
    let jwt = token(USER_ID, "authenticated", 9999999999, SECRET);

    let claims = validate_access_token(&jwt, SECRET).expect("Valid token should pass");
    assert_eq!(claims.sub, USER_ID);
    assert_eq!(claims.email.as_deref(), Some("test@example.com"));
}

#[test]
fn test_validate_access_token_expired() {
    let jwt = token(USER_ID, "authenticated", 1, SECRET);
    assert!(validate_access_token(&jwt, SECRET).is_err());
}

#[test]
fn test_validate_access_token_invalid_signature() {
    let jwt = token(USER_ID, "authenticated", 9999999999, "wrongsecret");
    assert!(validate_access_token(&jwt, SECRET).is_err());
}

#[test]
fn test_validate_access_token_wrong_audience() {
    let jwt = token(USER_ID, "service_role", 9999999999, SECRET);
    assert!(validate_access_token(&jwt, SECRET).is_err());
}

#[test]
fn test_bearer_token_parsing() {
    assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
    assert_eq!(bearer_token("Basic abc"), None);
    assert_eq!(bearer_token("Bearer "), None);
}

#[tokio::test]
async fn test_extractor_accepts_bearer_token() {
    set_env_vars();
    let jwt = token(USER_ID, "authenticated", 9999999999, SECRET);
    let request = Request::builder()
        .header("Authorization", format!("Bearer {}", jwt))
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    let user = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
    assert_eq!(user.user_id.to_string(), USER_ID);
}

#[tokio::test]
async fn test_extractor_rejects_missing_header() {
    set_env_vars();
    let request = Request::builder().body(()).unwrap();
    let (mut parts, _) = request.into_parts();

    let (status, _) = AuthUser::from_request_parts(&mut parts, &())
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_extractor_rejects_non_uuid_subject() {
    set_env_vars();
    let jwt = token("not-a-uuid", "authenticated", 9999999999, SECRET);
    let request = Request::builder()
        .header("Authorization", format!("Bearer {}", jwt))
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();

    assert!(AuthUser::from_request_parts(&mut parts, &()).await.is_err());
}
