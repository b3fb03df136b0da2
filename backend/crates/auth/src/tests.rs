//! Integration-style tests over the in-memory repository

#[cfg(test)]
mod support {
    use platform::client::ClientContext;

    use crate::application::{AuthServices, SignInInput, SignUpInput};
    use crate::domain::entity::{AdminAccount, Buyer};
    use crate::domain::value_object::AdminRole;
    use crate::infra::memory::MemoryAuthRepository;
    use crate::AuthConfig;

    pub const PASSWORD: &str = "maple-Lantern-47";

    pub fn services() -> (AuthServices<MemoryAuthRepository>, MemoryAuthRepository) {
        let repo = MemoryAuthRepository::new();
        let services = AuthServices::new(repo.clone(), AuthConfig::testing()).unwrap();
        (services, repo)
    }

    pub fn client(ip: &str) -> ClientContext {
        ClientContext::new(Some(ip.parse().unwrap()), Some("test-agent".into()))
    }

    /// Register a buyer and return it with a fresh session token
    pub async fn buyer(
        services: &AuthServices<MemoryAuthRepository>,
        email: &str,
        user_name: &str,
    ) -> (Buyer, String) {
        let output = services
            .sign_up()
            .execute(
                SignUpInput {
                    email: email.into(),
                    user_name: user_name.into(),
                    password: PASSWORD.into(),
                },
                &client("203.0.113.5"),
            )
            .await
            .unwrap();
        (output.buyer, output.session.token.expose().to_string())
    }

    pub async fn admin(
        services: &AuthServices<MemoryAuthRepository>,
        user_name: &str,
        role: AdminRole,
        ip: &str,
    ) -> (AdminAccount, String) {
        let admin = services
            .credentials
            .create_admin(user_name, &format!("{user_name}@staff.example"), PASSWORD.into(), role)
            .await
            .unwrap();
        let session = services
            .admin_sessions
            .issue(admin.admin_id, admin.role, &client(ip))
            .await
            .unwrap();
        (admin, session.token.expose().to_string())
    }

    pub async fn sign_in(
        services: &AuthServices<MemoryAuthRepository>,
        email: &str,
        password: &str,
    ) -> crate::AuthResult<String> {
        let output = services
            .sign_in()
            .execute(
                SignInInput {
                    email: email.into(),
                    password: password.into(),
                },
                &client("203.0.113.5"),
            )
            .await?;
        Ok(output.session.token.expose().to_string())
    }
}

#[cfg(test)]
mod credential_tests {
    use super::support::*;
    use crate::domain::repository::BuyerRepository;
    use crate::domain::value_object::{AdminRole, Email};
    use crate::error::AuthError;

    #[tokio::test]
    async fn test_duplicate_email_or_user_name_rejected() {
        let (services, _) = services();
        buyer(&services, "alice@example.com", "alice").await;

        let err = services
            .credentials
            .create_buyer("ALICE@example.com", "someone", PASSWORD.into())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateIdentity));

        let err = services
            .credentials
            .create_buyer("other@example.com", "Alice", PASSWORD.into())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateIdentity));
    }

    #[tokio::test]
    async fn test_same_identity_allowed_across_role_tables() {
        let (services, _) = services();
        buyer(&services, "ops@example.com", "opslead").await;
        let admin = services
            .credentials
            .create_admin("opslead", "ops@example.com", PASSWORD.into(), AdminRole::Admin)
            .await;
        assert!(admin.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_and_wrong_password_look_the_same() {
        let (services, _) = services();
        buyer(&services, "bob@example.com", "bobby").await;

        let unknown = sign_in(&services, "nobody@example.com", PASSWORD).await.unwrap_err();
        let wrong = sign_in(&services, "bob@example.com", "not-the-password").await.unwrap_err();
        let malformed = sign_in(&services, "not-an-email", PASSWORD).await.unwrap_err();

        for err in [&unknown, &wrong, &malformed] {
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_weak_password_rejected_at_registration() {
        let (services, _) = services();
        let err = services
            .credentials
            .create_buyer("carol@example.com", "carol", "password".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordPolicy(_)));
    }

    #[tokio::test]
    async fn test_disabled_buyer_cannot_sign_in() {
        let (services, repo) = services();
        let (buyer, _) = buyer(&services, "dave@example.com", "dave").await;
        repo.set_buyer_active(&buyer.buyer_id, false).await;

        let err = sign_in(&services, "dave@example.com", PASSWORD).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountDisabled));
    }

    #[tokio::test]
    async fn test_login_records_last_login() {
        let (services, repo) = services();
        buyer(&services, "erin@example.com", "erin").await;
        sign_in(&services, "erin@example.com", PASSWORD).await.unwrap();

        let email = Email::new("erin@example.com").unwrap();
        let stored = repo.find_buyer_by_email(&email).await.unwrap().unwrap();
        assert!(stored.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_admin_login_by_user_name_or_email() {
        let (services, _) = services();
        services
            .credentials
            .create_admin("frank", "frank@staff.example", PASSWORD.into(), AdminRole::Admin)
            .await
            .unwrap();

        assert!(services.credentials.verify_admin("Frank", PASSWORD.into()).await.is_ok());
        assert!(
            services
                .credentials
                .verify_admin("frank@staff.example", PASSWORD.into())
                .await
                .is_ok()
        );
        assert!(matches!(
            services.credentials.verify_admin("frank", "wrong-password".into()).await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}

#[cfg(test)]
mod session_tests {
    use super::support::*;
    use crate::domain::value_object::{AdminRole, SessionToken};
    use crate::error::AuthError;

    #[tokio::test]
    async fn test_raw_token_is_never_stored() {
        let (services, repo) = services();
        let (_, token) = buyer(&services, "gina@example.com", "gina").await;

        let stored = repo.buyer_sessions().await;
        assert_eq!(stored.len(), 1);
        assert_ne!(stored[0].token_digest, token.as_bytes());
        assert_eq!(token.len(), 43);
    }

    #[tokio::test]
    async fn test_buyer_resolve_slides_expiry() {
        let (services, _) = services();
        let (_, raw) = buyer(&services, "hank@example.com", "hank").await;
        let token = SessionToken::from_presented(&raw).unwrap();

        let first = services.buyer_sessions.resolve(&token).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = services.buyer_sessions.resolve(&token).await.unwrap();
        assert!(second.expires_at > first.expires_at);
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted_on_resolve() {
        let (services, repo) = services();
        let (_, raw) = buyer(&services, "ivy@example.com", "ivy").await;
        repo.expire_all_sessions().await;

        let token = SessionToken::from_presented(&raw).unwrap();
        let err = services.buyer_sessions.resolve(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::SessionExpired));
        assert_eq!(repo.session_counts().await, (0, 0));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (services, _) = services();
        let (_, raw) = buyer(&services, "jack@example.com", "jack").await;

        services.sign_out().buyer(Some(&raw)).await.unwrap();
        services.sign_out().buyer(Some(&raw)).await.unwrap();
        services.sign_out().buyer(None).await.unwrap();

        let token = SessionToken::from_presented(&raw).unwrap();
        assert!(matches!(
            services.buyer_sessions.resolve(&token).await,
            Err(AuthError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn test_admin_token_unknown_to_buyer_registry() {
        let (services, _) = services();
        let (_, raw) = admin(&services, "kate", AdminRole::Admin, "10.0.0.1").await;
        let token = SessionToken::from_presented(&raw).unwrap();

        assert!(services.buyer_sessions.peek(&token).await.unwrap().is_none());
        assert!(services.admin_sessions.peek(&token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_admin_ip_mismatch_revokes_session() {
        let (services, _) = services();
        let (_, raw) = admin(&services, "liam", AdminRole::Admin, "10.0.0.1").await;
        let token = SessionToken::from_presented(&raw).unwrap();

        assert!(services.admin_sessions.resolve(&token, &client("10.0.0.1")).await.is_ok());
        assert!(matches!(
            services.admin_sessions.resolve(&token, &client("10.0.0.2")).await,
            Err(AuthError::SessionIpMismatch)
        ));
        // Gone, even from the original address
        assert!(matches!(
            services.admin_sessions.resolve(&token, &client("10.0.0.1")).await,
            Err(AuthError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let (services, repo) = services();
        buyer(&services, "mia@example.com", "mia").await;
        admin(&services, "noah", AdminRole::Admin, "10.0.0.1").await;
        repo.expire_all_sessions().await;

        let (buyers, admins) = services.cleanup_expired_sessions().await.unwrap();
        assert_eq!((buyers, admins), (1, 1));
    }
}

#[cfg(test)]
mod guard_tests {
    use super::support::*;
    use crate::application::{GuardDecision, PresentedCredentials};
    use crate::domain::value_object::{AdminRole, DenialReason, Principal, PrincipalKind};

    fn bearer(token: &str, ip: &str) -> PresentedCredentials {
        PresentedCredentials {
            bearer: Some(token.to_string()),
            client: client(ip),
            operation: "GET /test".into(),
            ..Default::default()
        }
    }

    fn rejected(decision: GuardDecision) -> DenialReason {
        match decision {
            GuardDecision::Rejected(reason) => reason,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_admin_token_rejected_on_buyer_operation() {
        let (services, repo) = services();
        let (admin, raw) = admin(&services, "olga", AdminRole::SuperAdmin, "10.0.0.1").await;

        let decision = services
            .guard
            .require_buyer(&bearer(&raw, "10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(rejected(decision), DenialReason::AdminAccessDenied);

        let denials = repo.denials().await;
        assert_eq!(denials.len(), 1);
        assert_eq!(denials[0].reason, DenialReason::AdminAccessDenied);
        assert_eq!(denials[0].presented_kind, Some(PrincipalKind::SuperAdmin));
        assert_eq!(denials[0].presented_principal_id, Some(admin.admin_id.into_uuid()));
        assert_eq!(denials[0].operation, "GET /test");
        assert_eq!(denials[0].source_ip.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_admin_cookie_rejected_even_on_optional_auth() {
        let (services, _) = services();
        let (_, raw) = admin(&services, "pete", AdminRole::Admin, "10.0.0.1").await;

        let creds = PresentedCredentials {
            admin_cookie: Some(raw),
            client: client("10.0.0.1"),
            operation: "POST /api/checkout".into(),
            ..Default::default()
        };
        let decision = services.guard.optional_buyer(&creds).await.unwrap();
        assert_eq!(rejected(decision), DenialReason::AdminAccessDenied);
    }

    #[tokio::test]
    async fn test_buyer_token_rejected_on_admin_operation() {
        let (services, repo) = services();
        let (buyer, raw) = buyer(&services, "quinn@example.com", "quinn").await;

        let decision = services
            .guard
            .require_admin(&bearer(&raw, "203.0.113.5"), AdminRole::Admin)
            .await
            .unwrap();
        assert_eq!(rejected(decision), DenialReason::BuyerAccessDenied);

        let denials = repo.denials().await;
        assert_eq!(denials[0].presented_kind, Some(PrincipalKind::Buyer));
        assert_eq!(denials[0].presented_principal_id, Some(buyer.buyer_id.into_uuid()));
    }

    #[tokio::test]
    async fn test_plain_admin_rejected_on_super_admin_operation() {
        let (services, _) = services();
        let (_, raw) = admin(&services, "rosa", AdminRole::Admin, "10.0.0.1").await;

        let decision = services
            .guard
            .require_admin(&bearer(&raw, "10.0.0.1"), AdminRole::SuperAdmin)
            .await
            .unwrap();
        assert_eq!(rejected(decision), DenialReason::InsufficientRole);

        let decision = services
            .guard
            .require_admin(&bearer(&raw, "10.0.0.1"), AdminRole::Admin)
            .await
            .unwrap();
        assert!(matches!(
            decision,
            GuardDecision::Authenticated(Principal::Admin(_))
        ));
    }

    #[tokio::test]
    async fn test_optional_auth_missing_or_invalid_is_anonymous() {
        let (services, repo) = services();

        let none = services
            .guard
            .optional_buyer(&PresentedCredentials::default())
            .await
            .unwrap();
        assert!(matches!(none, GuardDecision::Anonymous));

        let bogus = services
            .guard
            .optional_buyer(&bearer("not-a-real-token", "203.0.113.5"))
            .await
            .unwrap();
        assert!(matches!(bogus, GuardDecision::Anonymous));
        assert!(repo.denials().await.is_empty());
    }

    #[tokio::test]
    async fn test_buyer_resolves_to_buyer_principal() {
        let (services, _) = services();
        let (buyer, raw) = buyer(&services, "sam@example.com", "sam").await;

        let decision = services
            .guard
            .require_buyer(&bearer(&raw, "203.0.113.5"))
            .await
            .unwrap();
        match decision {
            GuardDecision::Authenticated(Principal::Buyer(p)) => {
                assert_eq!(p.buyer_id, buyer.buyer_id);
                assert_eq!(p.user_name, "sam");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_deactivated_admin_rejected_on_next_request() {
        let (services, repo) = services();
        let (admin, raw) = admin(&services, "tina", AdminRole::Admin, "10.0.0.1").await;
        repo.set_admin_active(&admin.admin_id, false).await;

        let decision = services
            .guard
            .require_admin(&bearer(&raw, "10.0.0.1"), AdminRole::Admin)
            .await
            .unwrap();
        assert_eq!(rejected(decision), DenialReason::AccountDisabled);
        assert_eq!(repo.session_counts().await.1, 0);
    }

    #[tokio::test]
    async fn test_demoted_super_admin_loses_access() {
        let (services, _) = services();
        let (chief, _) = admin(&services, "uma", AdminRole::SuperAdmin, "10.0.0.1").await;
        let (target, raw) = admin(&services, "victor", AdminRole::SuperAdmin, "10.0.0.9").await;

        let actor = crate::domain::value_object::AdminPrincipal {
            admin_id: chief.admin_id,
            user_name: "uma".into(),
            email: chief.email.clone(),
            role: AdminRole::SuperAdmin,
            session_expires_at: chrono::Utc::now(),
        };
        services
            .admin_accounts()
            .change_role(&actor, &target.admin_id, AdminRole::Admin)
            .await
            .unwrap();

        // Role change revokes the target's sessions
        let decision = services
            .guard
            .require_admin(&bearer(&raw, "10.0.0.9"), AdminRole::Admin)
            .await
            .unwrap();
        assert_eq!(rejected(decision), DenialReason::InvalidSession);
    }
}

#[cfg(test)]
mod router_tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::support::*;
    use crate::domain::value_object::AdminRole;
    use crate::{admin_router, auth_router};

    fn app(services: &crate::AuthServices<crate::MemoryAuthRepository>) -> Router {
        Router::new()
            .nest("/api/auth", auth_router(services.clone()))
            .nest("/api/admin", admin_router(services.clone()))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.5")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_register_then_session_status() {
        let (services, _) = services();
        let app = app(&services);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/auth/register",
                json!({ "email": "wren@example.com", "username": "wren", "password": PASSWORD }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("buyer_session="));
        assert!(cookie.contains("HttpOnly"));
        let token = json_body(response).await["sessionToken"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(
                Request::get("/api/auth/session")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["authenticated"], true);
        assert_eq!(body["userName"], "wren");
    }

    #[tokio::test]
    async fn test_duplicate_register_is_409() {
        let (services, _) = services();
        buyer(&services, "xena@example.com", "xena").await;

        let response = app(&services)
            .oneshot(post_json(
                "/api/auth/register",
                json!({ "email": "xena@example.com", "username": "xena2", "password": PASSWORD }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_bad_login_is_401_problem_document() {
        let (services, _) = services();
        let response = app(&services)
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "email": "nobody@example.com", "password": PASSWORD }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["status"], 401);
    }

    #[tokio::test]
    async fn test_logout_always_ok() {
        let (services, _) = services();
        let response = app(&services)
            .oneshot(post_json("/api/auth/logout", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::SET_COOKIE));
    }

    #[tokio::test]
    async fn test_buyer_token_on_admin_route_is_403_and_audited() {
        let (services, repo) = services();
        let (_, token) = buyer(&services, "yuri@example.com", "yuri").await;

        let response = app(&services)
            .oneshot(
                Request::get("/api/admin/me")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert_eq!(body["detail"], "Access denied");

        let denials = repo.denials().await;
        assert_eq!(denials.len(), 1);
        assert_eq!(denials[0].operation, "GET /api/admin/me");
    }

    #[tokio::test]
    async fn test_admin_login_sets_scoped_cookie_and_me_works() {
        let (services, _) = services();
        services
            .credentials
            .create_admin("zoe", "zoe@staff.example", PASSWORD.into(), AdminRole::Admin)
            .await
            .unwrap();
        let app = app(&services);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/admin/auth/login",
                json!({ "identifier": "zoe", "password": PASSWORD }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(cookie.starts_with("admin_session="));
        assert!(cookie.contains("Path=/api/admin"));
        assert!(cookie.contains("SameSite=Strict"));
        let token = json_body(response).await["sessionToken"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .clone()
            .oneshot(
                Request::get("/api/admin/me")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header("x-forwarded-for", "203.0.113.5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["role"], "admin");

        // Plain admin cannot reach the super-admin audit view
        let response = app
            .oneshot(
                Request::get("/api/admin/audit/denials")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header("x-forwarded-for", "203.0.113.5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_self_edit_cannot_touch_role() {
        let (services, _) = services();
        let (abel, token) = admin(&services, "abel", AdminRole::Admin, "203.0.113.5").await;

        let response = app(&services)
            .oneshot(
                Request::patch("/api/admin/me")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-forwarded-for", "203.0.113.5")
                    .body(Body::from(
                        json!({ "email": "abel@new.example", "role": "super_admin" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());

        let stored = services.admin_accounts().get(&abel.admin_id).await.unwrap();
        assert_eq!(stored.role, AdminRole::Admin);
        assert_eq!(stored.email.as_str(), "abel@staff.example");
    }

    #[tokio::test]
    async fn test_super_admin_can_read_audit_log() {
        let (services, _) = services();
        let (_, buyer_token) = buyer(&services, "bea@example.com", "bea").await;
        let (_, token) = admin(&services, "cato", AdminRole::SuperAdmin, "203.0.113.5").await;
        let app = app(&services);

        // One denial to read back
        app.clone()
            .oneshot(
                Request::get("/api/admin/me")
                    .header(header::AUTHORIZATION, format!("Bearer {buyer_token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let response = app
            .oneshot(
                Request::get("/api/admin/audit/denials?limit=10")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header("x-forwarded-for", "203.0.113.5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body[0]["reason"], "buyer_access_denied");
        assert_eq!(body[0]["presentedPrincipalKind"], "buyer");
    }
}
