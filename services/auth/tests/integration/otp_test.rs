use chrono::{Duration, Utc};

use bazaar_auth::crypto;
use bazaar_auth::domain::types::OtpPurpose;
use bazaar_auth::error::AuthServiceError;
use bazaar_auth::usecase::otp::{
    IssueOtpInput, IssueOtpUseCase, OtpConfig, VerifyOtpInput, VerifyOtpUseCase, cleanup_expired,
};

use crate::helpers::{
    MockNotifier, MockOtpRepo, TEST_IDENTIFIER, test_otp_config, test_otp_record,
};

fn issue_input(purpose: OtpPurpose) -> IssueOtpInput {
    IssueOtpInput {
        identifier: TEST_IDENTIFIER.to_owned(),
        purpose,
        metadata: serde_json::Value::Null,
    }
}

fn verify_input(code: &str, purpose: OtpPurpose) -> VerifyOtpInput {
    VerifyOtpInput {
        identifier: TEST_IDENTIFIER.to_owned(),
        code: code.to_owned(),
        purpose,
    }
}

// ── issue ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_six_digit_code_and_dispatch_via_notifier() {
    let repo = MockOtpRepo::empty();
    let records = repo.records_handle();
    let notifier = MockNotifier::new();
    let sent = notifier.sent_handle();

    let uc = IssueOtpUseCase {
        otps: repo,
        notifier,
        config: test_otp_config(),
    };

    let out = uc.execute(issue_input(OtpPurpose::Verification)).await.unwrap();

    assert!(out.expires_at > Utc::now());
    assert!(out.debug_code.is_none(), "codes must not leak by default");

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, TEST_IDENTIFIER);
    assert_eq!(sent[0].purpose, OtpPurpose::Verification);
    assert_eq!(sent[0].code.len(), 6);
    assert!(sent[0].code.chars().all(|c| c.is_ascii_digit()));
    assert_ne!(sent[0].code.as_bytes()[0], b'0', "no leading zero");

    let records = records.lock().unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.code_hash, crypto::hash_code(&sent[0].code));
    assert_ne!(record.code_hash, sent[0].code, "plaintext must not be stored");
    assert_eq!(record.attempts, 0);
    assert!(!record.verified);
}

#[tokio::test]
async fn should_reject_reissue_within_cooldown_with_remaining_seconds() {
    let existing = test_otp_record(TEST_IDENTIFIER, OtpPurpose::Login, "111111");
    let uc = IssueOtpUseCase {
        otps: MockOtpRepo::new(vec![existing]),
        notifier: MockNotifier::new(),
        config: test_otp_config(),
    };

    let result = uc.execute(issue_input(OtpPurpose::Login)).await;

    match result {
        Err(AuthServiceError::TooManyRequests { retry_after_secs }) => {
            assert!(
                (1..=60).contains(&retry_after_secs),
                "remaining wait out of range: {retry_after_secs}"
            );
        }
        other => panic!("expected TooManyRequests, got {other:?}"),
    }
}

#[tokio::test]
async fn should_not_apply_cooldown_across_purposes() {
    // A fresh login code must not block a password-reset issue.
    let existing = test_otp_record(TEST_IDENTIFIER, OtpPurpose::Login, "111111");
    let uc = IssueOtpUseCase {
        otps: MockOtpRepo::new(vec![existing]),
        notifier: MockNotifier::new(),
        config: test_otp_config(),
    };

    uc.execute(issue_input(OtpPurpose::PasswordReset))
        .await
        .unwrap();
}

#[tokio::test]
async fn should_replace_prior_unverified_record_on_reissue() {
    let mut old = test_otp_record(TEST_IDENTIFIER, OtpPurpose::Login, "111111");
    old.created_at = Utc::now() - Duration::seconds(120); // past cooldown
    let old_id = old.id;

    let repo = MockOtpRepo::new(vec![old]);
    let records = repo.records_handle();

    let uc = IssueOtpUseCase {
        otps: repo,
        notifier: MockNotifier::new(),
        config: test_otp_config(),
    };

    uc.execute(issue_input(OtpPurpose::Login)).await.unwrap();

    let records = records.lock().unwrap();
    let unverified: Vec<_> = records.iter().filter(|r| !r.verified).collect();
    assert_eq!(
        unverified.len(),
        1,
        "exactly one unverified record may exist per (identifier, purpose)"
    );
    assert_ne!(unverified[0].id, old_id, "the old record must be replaced");
}

#[tokio::test]
async fn should_fail_issue_loudly_when_notifier_fails() {
    let uc = IssueOtpUseCase {
        otps: MockOtpRepo::empty(),
        notifier: MockNotifier::failing(),
        config: test_otp_config(),
    };

    let result = uc.execute(issue_input(OtpPurpose::Login)).await;

    assert!(
        matches!(result, Err(AuthServiceError::NotificationFailed)),
        "expected NotificationFailed, got {result:?}"
    );
}

#[tokio::test]
async fn should_surface_code_when_codes_are_exposed_even_if_notifier_fails() {
    let repo = MockOtpRepo::empty();
    let records = repo.records_handle();

    let uc = IssueOtpUseCase {
        otps: repo,
        notifier: MockNotifier::failing(),
        config: OtpConfig {
            expose_codes: true,
            ..test_otp_config()
        },
    };

    let out = uc.execute(issue_input(OtpPurpose::Login)).await.unwrap();

    let code = out.debug_code.expect("exposed builds surface the code");
    let records = records.lock().unwrap();
    assert_eq!(records[0].code_hash, crypto::hash_code(&code));
}

// ── verify ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_verify_valid_code_exactly_once() {
    let mut record = test_otp_record(TEST_IDENTIFIER, OtpPurpose::Login, "123456");
    record.metadata = serde_json::json!({ "user_id": "u-1" });

    let uc = VerifyOtpUseCase {
        otps: MockOtpRepo::new(vec![record]),
    };

    let out = uc
        .execute(verify_input("123456", OtpPurpose::Login))
        .await
        .unwrap();
    assert_eq!(out.metadata["user_id"], "u-1");

    // Verified records are not re-matchable.
    let second = uc.execute(verify_input("123456", OtpPurpose::Login)).await;
    assert!(
        matches!(second, Err(AuthServiceError::InvalidOtp)),
        "expected InvalidOtp on second use, got {second:?}"
    );
}

#[tokio::test]
async fn should_scope_codes_to_their_purpose() {
    let record = test_otp_record(TEST_IDENTIFIER, OtpPurpose::Verification, "123456");

    let uc = VerifyOtpUseCase {
        otps: MockOtpRepo::new(vec![record]),
    };

    let result = uc.execute(verify_input("123456", OtpPurpose::Login)).await;

    assert!(
        matches!(result, Err(AuthServiceError::InvalidOtp)),
        "a verification code must not pass for login, got {result:?}"
    );
}

#[tokio::test]
async fn should_destroy_record_at_attempt_ceiling() {
    let record = test_otp_record(TEST_IDENTIFIER, OtpPurpose::Login, "123456");
    let repo = MockOtpRepo::new(vec![record]);
    let records = repo.records_handle();

    let uc = VerifyOtpUseCase { otps: repo };

    // Four wrong guesses are tolerated (attempts 1..=4).
    for i in 0..4 {
        let result = uc.execute(verify_input("000000", OtpPurpose::Login)).await;
        assert!(
            matches!(result, Err(AuthServiceError::InvalidOtp)),
            "guess {i}: expected InvalidOtp, got {result:?}"
        );
    }

    // The fifth failure destroys the record.
    let fifth = uc.execute(verify_input("000000", OtpPurpose::Login)).await;
    assert!(
        matches!(fifth, Err(AuthServiceError::TooManyAttempts)),
        "expected TooManyAttempts, got {fifth:?}"
    );
    assert!(records.lock().unwrap().is_empty(), "record must be deleted");

    // Even the original correct code is now useless — a re-issue is forced.
    let sixth = uc.execute(verify_input("123456", OtpPurpose::Login)).await;
    assert!(
        matches!(sixth, Err(AuthServiceError::InvalidOtp)),
        "expected InvalidOtp after destruction, got {sixth:?}"
    );
}

#[tokio::test]
async fn should_delete_expired_record_on_matching_verify() {
    let mut record = test_otp_record(TEST_IDENTIFIER, OtpPurpose::Login, "123456");
    record.expires_at = Utc::now() - Duration::seconds(1);

    let repo = MockOtpRepo::new(vec![record]);
    let records = repo.records_handle();

    let uc = VerifyOtpUseCase { otps: repo };

    let first = uc.execute(verify_input("123456", OtpPurpose::Login)).await;
    assert!(
        matches!(first, Err(AuthServiceError::OtpExpired)),
        "expected OtpExpired, got {first:?}"
    );
    assert!(records.lock().unwrap().is_empty(), "expired record must be deleted");

    // The record is gone, so the identical call now reports a plain mismatch.
    let second = uc.execute(verify_input("123456", OtpPurpose::Login)).await;
    assert!(
        matches!(second, Err(AuthServiceError::InvalidOtp)),
        "expected InvalidOtp, got {second:?}"
    );
}

#[tokio::test]
async fn should_report_invalid_when_no_record_exists() {
    let uc = VerifyOtpUseCase {
        otps: MockOtpRepo::empty(),
    };

    let result = uc.execute(verify_input("123456", OtpPurpose::Login)).await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidOtp)),
        "expected InvalidOtp, got {result:?}"
    );
}

// ── cleanup ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_sweep_only_expired_records() {
    let mut stale_login = test_otp_record(TEST_IDENTIFIER, OtpPurpose::Login, "111111");
    stale_login.expires_at = Utc::now() - Duration::minutes(5);
    let mut stale_reset = test_otp_record("other@example.com", OtpPurpose::PasswordReset, "222222");
    stale_reset.expires_at = Utc::now() - Duration::hours(2);
    let live = test_otp_record(TEST_IDENTIFIER, OtpPurpose::Verification, "333333");

    let repo = MockOtpRepo::new(vec![stale_login, stale_reset, live]);
    let records = repo.records_handle();

    let removed = cleanup_expired(&repo).await.unwrap();

    assert_eq!(removed, 2);
    let records = records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].purpose, OtpPurpose::Verification);
}
