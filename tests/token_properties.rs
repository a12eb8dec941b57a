//! Randomized tamper checks for issued tokens.

use chrono::{Duration, TimeZone, Utc};
use merchant_auth_service::{AuthError, auth::TokenManager};
use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

fn manager() -> TokenManager {
    TokenManager::new(b"property-test-secret".as_slice(), Duration::hours(24))
}

#[test]
fn test_random_signature_tampering_is_rejected() {
    let manager = manager();
    let mut rng = rand::rng();
    let trials = 1_000;
    let mut rejected = 0;

    for _ in 0..trials {
        let merchant_id = rng.random_range(1..1_000_000);
        let token = manager.issue(merchant_id, "acme@example.com").unwrap();

        let signature_start = token.rfind('.').unwrap() + 1;
        let mut bytes = token.clone().into_bytes();
        let index = rng.random_range(signature_start..bytes.len());

        let replacement = loop {
            let candidate = ALPHABET[rng.random_range(0..ALPHABET.len())];
            if candidate != bytes[index] {
                break candidate;
            }
        };
        bytes[index] = replacement;

        let tampered = String::from_utf8(bytes).unwrap();
        if matches!(
            manager.validate(&tampered),
            Err(AuthError::InvalidSignature)
        ) {
            rejected += 1;
        }
    }

    assert!(
        rejected * 100 >= trials * 99,
        "only {rejected}/{trials} tampered tokens were rejected"
    );
}

#[test]
fn test_random_claims_tampering_never_validates() {
    let manager = manager();
    let mut rng = rand::rng();

    for _ in 0..500 {
        let token = manager.issue(42, "acme@example.com").unwrap();
        let first_dot = token.find('.').unwrap();
        let second_dot = token.rfind('.').unwrap();

        let mut bytes = token.clone().into_bytes();
        let index = rng.random_range(first_dot + 1..second_dot);
        bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };

        let tampered = String::from_utf8(bytes).unwrap();
        let err = manager.validate(&tampered).unwrap_err();
        assert!(
            matches!(err, AuthError::InvalidSignature | AuthError::MalformedToken),
            "unexpected error {err:?}"
        );
    }
}

#[test]
fn test_validity_window_boundaries() {
    let manager = manager();
    let issued = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let token = manager.issue_at(7, "acme@example.com", issued).unwrap();

    assert!(manager.validate_at(&token, issued).is_ok());
    assert!(
        manager
            .validate_at(&token, issued + Duration::hours(24) - Duration::seconds(1))
            .is_ok()
    );
    assert!(matches!(
        manager.validate_at(&token, issued + Duration::hours(24)),
        Err(AuthError::Expired)
    ));
    assert!(matches!(
        manager.validate_at(&token, issued - Duration::seconds(1)),
        Err(AuthError::NotYetValid)
    ));
}
