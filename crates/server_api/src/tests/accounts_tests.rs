use super::*;
use crate::test_support::{account, context};
use shared::error::ErrorCode;

fn register_request(username: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.into(),
        password: password.into(),
        identity: None,
    }
}

#[tokio::test]
async fn first_registration_becomes_owner_and_later_ones_users() {
    let ctx = context().await;
    let first = register(&ctx, register_request("root", "secret"))
        .await
        .expect("first");
    assert_eq!(first.identity, Identity::Owner);

    let second = register(
        &ctx,
        RegisterRequest {
            identity: Some(Identity::Admin),
            ..register_request("eve", "secret")
        },
    )
    .await
    .expect("second");
    assert_eq!(second.identity, Identity::User);
    assert!(!second.token.is_empty());
}

#[tokio::test]
async fn register_rejects_short_passwords_and_duplicates() {
    let ctx = context().await;
    let err = register(&ctx, register_request("alice", "ab"))
        .await
        .expect_err("short password");
    assert_eq!(err.code, ErrorCode::Validation);

    register(&ctx, register_request("alice", "secret"))
        .await
        .expect("register");
    let err = register(&ctx, register_request("alice", "secret"))
        .await
        .expect_err("duplicate");
    assert_eq!(err.code, ErrorCode::Conflict);
}

#[tokio::test]
async fn login_checks_password() {
    let ctx = context().await;
    register(&ctx, register_request("alice", "secret"))
        .await
        .expect("register");

    let ok = login(
        &ctx,
        LoginRequest {
            username: "alice".into(),
            password: "secret".into(),
        },
    )
    .await
    .expect("login");
    assert_eq!(ok.username, "alice");

    let err = login(
        &ctx,
        LoginRequest {
            username: "alice".into(),
            password: "wrong".into(),
        },
    )
    .await
    .expect_err("bad password");
    assert_eq!(err.code, ErrorCode::Unauthorized);
}

#[tokio::test]
async fn listing_users_requires_admin_and_honours_limit() {
    let ctx = context().await;
    let (_, admin_token) = account(&ctx, "admin", Identity::Admin).await;
    let (_, user_token) = account(&ctx, "user", Identity::User).await;
    account(&ctx, "third", Identity::User).await;

    let err = list_users(&ctx, Some(&user_token), UsersQuery::default())
        .await
        .expect_err("not admin");
    assert_eq!(err.code, ErrorCode::Forbidden);

    let page = list_users(&ctx, Some(&admin_token), UsersQuery { limit: Some(2) })
        .await
        .expect("users");
    assert_eq!(page.users.len(), 2);
}

#[tokio::test]
async fn owner_cannot_be_demoted_or_deleted() {
    let ctx = context().await;
    let (owner, _) = account(&ctx, "owner", Identity::Owner).await;
    let (_, admin_token) = account(&ctx, "admin", Identity::Admin).await;

    let err = edit_account(
        &ctx,
        Some(&admin_token),
        EditAccountPayload {
            edited_id: owner.id.clone(),
            edited_username: None,
            edited_password: None,
            edited_identity: Some(Identity::User),
        },
    )
    .await
    .expect_err("demotion");
    assert_eq!(err.code, ErrorCode::Forbidden);

    let err = delete_user(&ctx, Some(&admin_token), &owner.id)
        .await
        .expect_err("delete owner");
    assert_eq!(err.code, ErrorCode::Forbidden);
}

#[tokio::test]
async fn admin_edits_and_deletes_accounts() {
    let ctx = context().await;
    let (_, admin_token) = account(&ctx, "admin", Identity::Admin).await;
    let (user, _) = account(&ctx, "user", Identity::User).await;

    edit_account(
        &ctx,
        Some(&admin_token),
        EditAccountPayload {
            edited_id: user.id.clone(),
            edited_username: Some("renamed".into()),
            edited_password: Some("new-secret".into()),
            edited_identity: Some(Identity::Admin),
        },
    )
    .await
    .expect("edit");

    let relogin = login(
        &ctx,
        LoginRequest {
            username: "renamed".into(),
            password: "new-secret".into(),
        },
    )
    .await
    .expect("login with new credentials");
    assert_eq!(relogin.identity, Identity::Admin);

    delete_user(&ctx, Some(&admin_token), &user.id)
        .await
        .expect("delete");
    let err = delete_user(&ctx, Some(&admin_token), &user.id)
        .await
        .expect_err("already gone");
    assert_eq!(err.code, ErrorCode::NotFound);
}
