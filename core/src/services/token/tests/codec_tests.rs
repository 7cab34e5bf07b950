//! Unit tests for token encoding and decoding

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::{Claims, NewCredential, Owner, Role, TokenClass};
use crate::errors::TokenError;
use crate::services::token::{fingerprint, KeyRing, TokenCodec, TokenServiceConfig};

use super::support::{shared_keys, test_codec, test_keys};

fn claims(class: TokenClass, lifetime: Duration) -> Claims {
    let owner = Owner::new("admin@agency.test", Role::Admin);
    let issued_at = Utc::now();
    let credential = NewCredential {
        owner_id: owner.id,
        class,
        security_version: 2,
        issued_at,
        expires_at: issued_at + lifetime,
    }
    .into_credential(Uuid::new_v4());
    let config = TokenServiceConfig::default();
    Claims::for_credential(&owner, &credential, &config.issuer, &config.audience)
}

#[test]
fn test_encode_decode_access_token() {
    let codec = test_codec(test_keys());
    let original = claims(TokenClass::Access, Duration::hours(1));

    let token = codec.encode(&original).unwrap();
    let decoded = codec.decode(&token, TokenClass::Access).unwrap();

    assert_eq!(decoded, original);
    assert_eq!(token.split('.').count(), 3);
}

#[test]
fn test_class_keys_are_independent() {
    let codec = test_codec(test_keys());
    let token = codec.encode(&claims(TokenClass::Refresh, Duration::hours(1))).unwrap();

    // Signed with the refresh key, so the access key rejects the signature
    assert_eq!(
        codec.decode(&token, TokenClass::Access),
        Err(TokenError::Malformed)
    );
}

#[test]
fn test_class_claim_is_checked_with_shared_keys() {
    let codec = test_codec(shared_keys());
    let token = codec.encode(&claims(TokenClass::Access, Duration::hours(1))).unwrap();

    assert_eq!(
        codec.decode(&token, TokenClass::PasswordReset),
        Err(TokenError::ClassMismatch {
            expected: TokenClass::PasswordReset,
            actual: TokenClass::Access,
        })
    );
}

#[test]
fn test_tampered_token_is_malformed() {
    let codec = test_codec(test_keys());
    let token = codec.encode(&claims(TokenClass::Access, Duration::hours(1))).unwrap();

    let mut parts: Vec<String> = token.split('.').map(String::from).collect();
    let forged = codec.encode(&claims(TokenClass::Access, Duration::days(365))).unwrap();
    parts[1] = forged.split('.').nth(1).unwrap().to_string();
    let tampered = parts.join(".");

    assert_eq!(
        codec.decode(&tampered, TokenClass::Access),
        Err(TokenError::Malformed)
    );
    assert_eq!(
        codec.decode("not-a-token", TokenClass::Access),
        Err(TokenError::Malformed)
    );
}

#[test]
fn test_embedded_expiry_is_enforced_without_leeway() {
    let codec = test_codec(test_keys());
    let token = codec
        .encode(&claims(TokenClass::Access, Duration::seconds(-5)))
        .unwrap();

    assert_eq!(
        codec.decode(&token, TokenClass::Access),
        Err(TokenError::Expired)
    );
}

#[test]
fn test_foreign_issuer_is_rejected() {
    let foreign = TokenCodec::new(test_keys(), "someone-else", "agency-portal-api");
    let token = foreign
        .encode(&claims(TokenClass::Access, Duration::hours(1)))
        .unwrap();

    let codec = test_codec(test_keys());
    assert_eq!(
        codec.decode(&token, TokenClass::Access),
        Err(TokenError::Malformed)
    );
}

#[test]
fn test_missing_key_is_reported_per_class() {
    let codec = test_codec(KeyRing::empty().with_secret(TokenClass::Access, "only-access"));

    assert_eq!(
        codec.encode(&claims(TokenClass::EmailVerification, Duration::hours(1))),
        Err(TokenError::MissingSigningKey {
            class: TokenClass::EmailVerification
        })
    );
    assert_eq!(
        codec.decode("a.b.c", TokenClass::Refresh),
        Err(TokenError::MissingSigningKey {
            class: TokenClass::Refresh
        })
    );
}

#[test]
fn test_fingerprint_is_stable_sha256_hex() {
    let first = fingerprint("header.payload.signature");
    assert_eq!(first, fingerprint("header.payload.signature"));
    assert_ne!(first, fingerprint("header.payload.signaturf"));
    assert_eq!(first.len(), 64);
    assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
}
