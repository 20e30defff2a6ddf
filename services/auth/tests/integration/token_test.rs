use chrono::{Duration, Utc};

use bazaar_auth::error::AuthServiceError;
use bazaar_auth::usecase::token::{
    RevokeTokenUseCase, RotateTokenUseCase, issue_refresh_token, mint_session,
};
use bazaar_auth_types::token::validate_token;

use crate::helpers::{
    MockDirectory, MockRefreshTokenRepo, test_keys, test_refresh_record, test_user,
};

// ── mint_session ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_mint_session_pair_that_validates_under_the_right_secrets() {
    let user = test_user();
    let keys = test_keys();
    let repo = MockRefreshTokenRepo::empty();

    let session = mint_session(&user, &keys, &repo).await.unwrap();

    let access_claims = validate_token(&session.access_token, &keys.access_secret).unwrap();
    assert_eq!(access_claims.sub, user.id.to_string());
    assert_eq!(access_claims.email, user.email);
    assert_eq!(access_claims.role, user.role.as_u8());
    assert_eq!(access_claims.exp, session.access_token_exp);

    let refresh_claims = validate_token(&session.refresh_token, &keys.refresh_secret).unwrap();
    assert_eq!(refresh_claims.sub, user.id.to_string());

    // The refresh side is persisted; the access side is stateless.
    let records = repo.records_handle();
    let records = records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].token, session.refresh_token);
    assert_eq!(records[0].user_id, user.id);
    assert!(records[0].expires_at > Utc::now() + Duration::hours(23));
}

#[tokio::test]
async fn should_sign_access_and_refresh_tokens_with_distinct_secrets() {
    let user = test_user();
    let keys = test_keys();
    let repo = MockRefreshTokenRepo::empty();

    let session = mint_session(&user, &keys, &repo).await.unwrap();

    assert!(validate_token(&session.access_token, &keys.refresh_secret).is_err());
    assert!(validate_token(&session.refresh_token, &keys.access_secret).is_err());
}

// ── RotateTokenUseCase ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_rotate_refresh_token_and_consume_the_presented_one() {
    let user = test_user();
    let keys = test_keys();
    let repo = MockRefreshTokenRepo::empty();

    let first = mint_session(&user, &keys, &repo).await.unwrap();

    let uc = RotateTokenUseCase {
        directory: MockDirectory::new(vec![user.clone()]),
        refresh_tokens: repo.clone(),
        keys: keys.clone(),
    };

    let second = uc.execute(&first.refresh_token).await.unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);

    {
        let records = repo.records_handle();
        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1, "old row replaced by exactly one new row");
        assert_eq!(records[0].token, second.refresh_token);
    }

    // Replaying the consumed token must fail even though it once succeeded.
    let replay = uc.execute(&first.refresh_token).await;
    assert!(
        matches!(replay, Err(AuthServiceError::InvalidRefreshToken)),
        "expected InvalidRefreshToken on replay, got {replay:?}"
    );
}

#[tokio::test]
async fn should_reject_well_signed_but_unpersisted_refresh_token() {
    let user = test_user();
    let keys = test_keys();

    // Signed with the right secret, but never persisted (e.g. already revoked).
    let token = issue_refresh_token(&user, &keys).unwrap();

    let uc = RotateTokenUseCase {
        directory: MockDirectory::new(vec![user]),
        refresh_tokens: MockRefreshTokenRepo::empty(),
        keys,
    };

    let result = uc.execute(&token).await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidRefreshToken)),
        "expected InvalidRefreshToken, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_garbage_refresh_token() {
    let uc = RotateTokenUseCase {
        directory: MockDirectory::empty(),
        refresh_tokens: MockRefreshTokenRepo::empty(),
        keys: test_keys(),
    };

    let result = uc.execute("not-a-jwt").await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidRefreshToken)),
        "expected InvalidRefreshToken, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_and_delete_stale_refresh_token_row() {
    let user = test_user();
    let keys = test_keys();

    let token = issue_refresh_token(&user, &keys).unwrap();
    let mut record = test_refresh_record(&token, user.id);
    record.expires_at = Utc::now() - Duration::seconds(1);

    let repo = MockRefreshTokenRepo::new(vec![record]);

    let uc = RotateTokenUseCase {
        directory: MockDirectory::new(vec![user]),
        refresh_tokens: repo.clone(),
        keys,
    };

    let result = uc.execute(&token).await;
    assert!(
        matches!(result, Err(AuthServiceError::ExpiredRefreshToken)),
        "expected ExpiredRefreshToken, got {result:?}"
    );

    let records = repo.records_handle();
    assert!(
        records.lock().unwrap().is_empty(),
        "stale row must be deleted on rejection"
    );
}

#[tokio::test]
async fn should_reject_rotation_when_user_no_longer_exists() {
    let user = test_user();
    let keys = test_keys();

    let token = issue_refresh_token(&user, &keys).unwrap();
    let repo = MockRefreshTokenRepo::new(vec![test_refresh_record(&token, user.id)]);

    let uc = RotateTokenUseCase {
        directory: MockDirectory::empty(), // user deleted since login
        refresh_tokens: repo,
        keys,
    };

    let result = uc.execute(&token).await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidRefreshToken)),
        "expected InvalidRefreshToken, got {result:?}"
    );
}

// ── RevokeTokenUseCase ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_revoke_only_the_presented_token() {
    let user = test_user();
    let repo = MockRefreshTokenRepo::new(vec![
        test_refresh_record("token-a", user.id),
        test_refresh_record("token-b", user.id),
    ]);

    let uc = RevokeTokenUseCase {
        refresh_tokens: repo.clone(),
    };

    uc.execute(user.id, Some("token-a")).await.unwrap();

    let records = repo.records_handle();
    let records = records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].token, "token-b");
}

#[tokio::test]
async fn should_revoke_every_token_for_the_user_when_none_is_given() {
    let user = test_user();
    let other = uuid::Uuid::new_v4();
    let repo = MockRefreshTokenRepo::new(vec![
        test_refresh_record("token-a", user.id),
        test_refresh_record("token-b", user.id),
        test_refresh_record("token-c", other),
    ]);

    let uc = RevokeTokenUseCase {
        refresh_tokens: repo.clone(),
    };

    uc.execute(user.id, None).await.unwrap();

    {
        let records = repo.records_handle();
        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1, "other users' sessions must survive");
        assert_eq!(records[0].user_id, other);
    }

    // Any of the revoked tokens is now dead for rotation.
    let rotate = RotateTokenUseCase {
        directory: MockDirectory::new(vec![user]),
        refresh_tokens: repo,
        keys: test_keys(),
    };
    let result = rotate.execute("token-a").await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidRefreshToken)),
        "expected InvalidRefreshToken, got {result:?}"
    );
}

#[tokio::test]
async fn should_treat_logout_of_unknown_token_as_noop() {
    let user = test_user();
    let uc = RevokeTokenUseCase {
        refresh_tokens: MockRefreshTokenRepo::empty(),
    };

    uc.execute(user.id, Some("long-gone")).await.unwrap();
}
