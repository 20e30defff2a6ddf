use chrono::{Duration, Utc};

use bazaar_auth::crypto;
use bazaar_auth::domain::types::OtpPurpose;
use bazaar_auth::error::AuthServiceError;
use bazaar_auth::usecase::otp::{IssueOtpUseCase, VerifyOtpUseCase};
use bazaar_auth::usecase::password_reset::{
    CompletePasswordResetInput, CompletePasswordResetUseCase, StartPasswordResetUseCase,
};

use crate::helpers::{
    MockDirectory, MockNotifier, MockOtpRepo, MockRefreshTokenRepo, TEST_BCRYPT_COST,
    TEST_IDENTIFIER, test_otp_config, test_otp_record, test_refresh_record, test_user,
};

fn start_usecase(
    directory: MockDirectory,
    otps: MockOtpRepo,
    notifier: MockNotifier,
) -> StartPasswordResetUseCase<MockDirectory, MockOtpRepo, MockNotifier> {
    StartPasswordResetUseCase {
        directory,
        issue: IssueOtpUseCase {
            otps,
            notifier,
            config: test_otp_config(),
        },
    }
}

fn reset_record(user_id: uuid::Uuid) -> bazaar_auth::domain::types::OtpRecord {
    let mut record = test_otp_record(TEST_IDENTIFIER, OtpPurpose::PasswordReset, "123456");
    record.metadata = serde_json::json!({ "user_id": user_id });
    record
}

// ── start ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_answer_identically_for_known_and_unknown_identifier() {
    let known = start_usecase(
        MockDirectory::new(vec![test_user()]),
        MockOtpRepo::empty(),
        MockNotifier::new(),
    )
    .execute(TEST_IDENTIFIER.to_owned())
    .await
    .unwrap();

    let unknown = start_usecase(MockDirectory::empty(), MockOtpRepo::empty(), MockNotifier::new())
        .execute("nobody@example.com".to_owned())
        .await
        .unwrap();

    // Same shape, nothing distinguishing: a future expiry and no code either way.
    assert!(known.expires_at > Utc::now());
    assert!(unknown.expires_at > Utc::now());
    assert!(known.debug_code.is_none());
    assert!(unknown.debug_code.is_none());
}

#[tokio::test]
async fn should_send_reset_code_only_to_known_identifier() {
    let notifier = MockNotifier::new();
    let sent = notifier.sent_handle();
    let otps = MockOtpRepo::empty();
    let records = otps.records_handle();

    start_usecase(MockDirectory::new(vec![test_user()]), otps, notifier.clone())
        .execute(TEST_IDENTIFIER.to_owned())
        .await
        .unwrap();

    start_usecase(MockDirectory::empty(), MockOtpRepo::empty(), notifier)
        .execute("nobody@example.com".to_owned())
        .await
        .unwrap();

    // One mail, one record: the unknown identifier produced neither.
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, TEST_IDENTIFIER);
    assert_eq!(sent[0].purpose, OtpPurpose::PasswordReset);

    let records = records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].metadata["user_id"], test_user().id.to_string());
}

// ── complete ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_update_password_revoke_sessions_and_burn_the_record() {
    let user = test_user();

    let directory = MockDirectory::new(vec![user.clone()]);
    let users = directory.users_handle();
    let otps = MockOtpRepo::new(vec![reset_record(user.id)]);
    let otp_records = otps.records_handle();
    let refresh_tokens = MockRefreshTokenRepo::new(vec![
        test_refresh_record("session-1", user.id),
        test_refresh_record("session-2", user.id),
    ]);
    let sessions = refresh_tokens.records_handle();

    let uc = CompletePasswordResetUseCase {
        directory,
        verify: VerifyOtpUseCase { otps },
        refresh_tokens,
        bcrypt_cost: TEST_BCRYPT_COST,
    };

    uc.execute(CompletePasswordResetInput {
        identifier: TEST_IDENTIFIER.to_owned(),
        code: "123456".to_owned(),
        new_password: "brand-new-password".to_owned(),
    })
    .await
    .unwrap();

    // The stored digest now verifies the new password.
    let users = users.lock().unwrap();
    assert!(crypto::verify_password(
        "brand-new-password",
        users[0].password_hash.as_deref().unwrap()
    ));

    // Every open session died with the password.
    assert!(sessions.lock().unwrap().is_empty());

    // And the reset record is single-use.
    assert!(otp_records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_fail_second_completion_with_the_same_code() {
    let user = test_user();
    let otps = MockOtpRepo::new(vec![reset_record(user.id)]);

    let uc = CompletePasswordResetUseCase {
        directory: MockDirectory::new(vec![user]),
        verify: VerifyOtpUseCase { otps },
        refresh_tokens: MockRefreshTokenRepo::empty(),
        bcrypt_cost: TEST_BCRYPT_COST,
    };

    let input = || CompletePasswordResetInput {
        identifier: TEST_IDENTIFIER.to_owned(),
        code: "123456".to_owned(),
        new_password: "brand-new-password".to_owned(),
    };

    uc.execute(input()).await.unwrap();

    let second = uc.execute(input()).await;
    assert!(
        matches!(second, Err(AuthServiceError::InvalidOtp)),
        "expected InvalidOtp on reuse, got {second:?}"
    );
}

#[tokio::test]
async fn should_reject_expired_reset_code() {
    let user = test_user();
    let mut record = reset_record(user.id);
    record.expires_at = Utc::now() - Duration::seconds(1);

    let uc = CompletePasswordResetUseCase {
        directory: MockDirectory::new(vec![user]),
        verify: VerifyOtpUseCase {
            otps: MockOtpRepo::new(vec![record]),
        },
        refresh_tokens: MockRefreshTokenRepo::empty(),
        bcrypt_cost: TEST_BCRYPT_COST,
    };

    let result = uc
        .execute(CompletePasswordResetInput {
            identifier: TEST_IDENTIFIER.to_owned(),
            code: "123456".to_owned(),
            new_password: "brand-new-password".to_owned(),
        })
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::OtpExpired)),
        "expected OtpExpired, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_short_replacement_password() {
    let user = test_user();

    let uc = CompletePasswordResetUseCase {
        directory: MockDirectory::new(vec![user.clone()]),
        verify: VerifyOtpUseCase {
            otps: MockOtpRepo::new(vec![reset_record(user.id)]),
        },
        refresh_tokens: MockRefreshTokenRepo::empty(),
        bcrypt_cost: TEST_BCRYPT_COST,
    };

    let result = uc
        .execute(CompletePasswordResetInput {
            identifier: TEST_IDENTIFIER.to_owned(),
            code: "123456".to_owned(),
            new_password: "short".to_owned(),
        })
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::Validation(_))),
        "expected Validation, got {result:?}"
    );
}
