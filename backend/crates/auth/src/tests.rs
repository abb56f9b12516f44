//! Integration tests for the auth crate
//!
//! Handlers are driven through the router with `tower::ServiceExt::oneshot`
//! against the in-memory store and a scripted provider broker.

#[cfg(test)]
mod support {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, Response};
    use kernel::id::UserId;
    use serde_json::Value;
    use tokio::sync::Barrier;

    use crate::application::config::AuthConfig;
    use crate::application::oauth::{Brokers, OAuthBroker, ProviderTokens};
    use crate::domain::entity::canonical_profile::CanonicalProfile;
    use crate::domain::entity::user::User;
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::{email::Email, gender::Gender, provider::Provider};
    use crate::error::{AuthError, AuthResult};
    use crate::infra::MemoryUserRepository;
    use crate::presentation::router::auth_router_generic;

    /// Broker returning canned results; counts revocations
    #[derive(Clone)]
    pub struct FakeBroker {
        pub provider: Provider,
        pub provider_user_id: String,
        pub email: String,
        pub deny: bool,
        pub revoke_fails: bool,
        pub revocations: Arc<AtomicUsize>,
    }

    impl FakeBroker {
        pub fn new(provider: Provider, provider_user_id: &str, email: &str) -> Self {
            Self {
                provider,
                provider_user_id: provider_user_id.to_string(),
                email: email.to_string(),
                deny: false,
                revoke_fails: false,
                revocations: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn revoked(&self) -> usize {
            self.revocations.load(Ordering::SeqCst)
        }

        fn tokens(&self) -> ProviderTokens {
            ProviderTokens {
                access_token: "provider-access".to_string(),
                refresh_token: Some("provider-refresh".to_string()),
                expires_in: Some(21_599),
                refresh_token_expires_in: Some(5_183_999),
            }
        }
    }

    impl OAuthBroker for FakeBroker {
        fn provider(&self) -> Provider {
            self.provider
        }

        fn authorize_url(&self, state: &str) -> AuthResult<String> {
            Ok(format!("https://provider.test/authorize?state={state}"))
        }

        async fn exchange_code(&self, _code: &str, _state: &str) -> AuthResult<ProviderTokens> {
            if self.deny {
                return Err(AuthError::ProviderDenied);
            }
            Ok(self.tokens())
        }

        async fn fetch_profile(&self, _access_token: &str) -> AuthResult<CanonicalProfile> {
            Ok(CanonicalProfile {
                provider: self.provider,
                provider_user_id: self.provider_user_id.clone(),
                email: Email::new(&self.email)?,
                name: "Provider User".to_string(),
                gender: Gender::Unknown,
            })
        }

        /// Access token only, as when the provider does not rotate
        async fn refresh(&self, _refresh_token: &str) -> AuthResult<ProviderTokens> {
            Ok(ProviderTokens {
                refresh_token: None,
                refresh_token_expires_in: None,
                ..self.tokens()
            })
        }

        async fn logout(&self, _access_token: &str) -> AuthResult<()> {
            Ok(())
        }

        async fn revoke(&self, _access_token: &str) -> AuthResult<()> {
            if self.revoke_fails {
                return Err(AuthError::Provider("unlink rejected".to_string()));
            }
            self.revocations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Holds every `find_by_email` caller until `parties` lookups have
    /// completed, so concurrent callers all observe the pre-insert state
    pub struct LookupBarrierRepository {
        pub inner: MemoryUserRepository,
        barrier: Barrier,
    }

    impl LookupBarrierRepository {
        pub fn new(inner: MemoryUserRepository, parties: usize) -> Self {
            Self {
                inner,
                barrier: Barrier::new(parties),
            }
        }
    }

    impl UserRepository for LookupBarrierRepository {
        async fn create(&self, user: &User) -> AuthResult<()> {
            self.inner.create(user).await
        }

        async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
            self.inner.find_by_id(user_id).await
        }

        async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
            let found = self.inner.find_by_email(email).await;
            self.barrier.wait().await;
            found
        }

        async fn update(&self, user: &User) -> AuthResult<()> {
            self.inner.update(user).await
        }

        async fn delete(&self, user_id: &UserId) -> AuthResult<bool> {
            self.inner.delete(user_id).await
        }
    }

    pub fn brokers(kakao: FakeBroker) -> Brokers<FakeBroker> {
        Brokers {
            kakao,
            naver: FakeBroker::new(Provider::Naver, "naver-1", "naver@example.com"),
        }
    }

    pub fn app(repo: MemoryUserRepository, config: AuthConfig, brokers: Brokers<FakeBroker>) -> Router {
        Router::new().nest("/api", auth_router_generic(repo, config, brokers))
    }

    pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> axum::http::request::Builder {
        Request::builder().method("GET").uri(uri)
    }

    pub async fn body_json(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
        response
            .headers()
            .get_all("set-cookie")
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }
}

#[cfg(test)]
mod local_flow_tests {
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use super::support::*;
    use crate::application::config::AuthConfig;
    use crate::domain::value_object::{email::Email, provider::Provider};
    use crate::infra::MemoryUserRepository;

    fn sign_up_body() -> serde_json::Value {
        json!({
            "email": "alice@example.com",
            "password": "hunter22",
            "checkPw": "hunter22",
            "name": "Alice",
            "gender": "female",
            "age": 29,
        })
    }

    #[tokio::test]
    async fn test_sign_up_verify_login_profile_exit() {
        let repo = MemoryUserRepository::new();
        let app = app(
            repo.clone(),
            AuthConfig::development(),
            brokers(FakeBroker::new(Provider::Kakao, "1", "k@example.com")),
        );

        // Sign up
        let res = app
            .clone()
            .oneshot(json_request("POST", "/api/users/sign-up", sign_up_body()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = body_json(res).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "job_seeker");
        assert_eq!(body["data"]["isEmailValid"], false);
        let user_id = body["data"]["userId"].as_str().unwrap().to_string();

        // Unverified login
        let login = json!({ "email": "alice@example.com", "password": "hunter22" });
        let res = app
            .clone()
            .oneshot(json_request("POST", "/api/users/login", login.clone()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(res).await["kind"], "EMAIL_NOT_VERIFIED");

        // Verify
        let res = app
            .clone()
            .oneshot(
                get("/api/users/validation?email=alice@example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        // Login
        let res = app
            .clone()
            .oneshot(json_request("POST", "/api/users/login", login.clone()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let cookies = set_cookies(&res);
        assert!(cookies.iter().any(|c| c.starts_with("authorization=Bearer%20")));
        assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));
        let body = body_json(res).await;
        let access = body["data"]["accessToken"].as_str().unwrap().to_string();

        // Profile read
        let res = app
            .clone()
            .oneshot(
                get("/api/me")
                    .header("authorization", format!("Bearer {access}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["data"]["email"], "alice@example.com");

        // Profile update
        let res = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/api/me/{user_id}"),
                json!({ "password": "hunter22", "name": "Alice Kim", "technology": "rust" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["data"]["name"], "Alice Kim");
        assert_eq!(body["data"]["technology"], "rust");

        // Withdraw
        let res = app
            .clone()
            .oneshot(json_request("POST", "/api/users/exit", login.clone()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(set_cookies(&res).iter().any(|c| c.contains("Max-Age=0")));
        assert!(repo.is_empty().await);

        // Gone
        let res = app
            .clone()
            .oneshot(json_request("POST", "/api/users/login", login))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(res).await["kind"], "INVALID_CREDENTIALS");

        let res = app
            .oneshot(
                get("/api/me")
                    .header("authorization", format!("Bearer {access}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let email = Email::new("alice@example.com").unwrap();
        assert_eq!(repo.count_by_email(&email).await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_is_conflict() {
        let app = app(
            MemoryUserRepository::new(),
            AuthConfig::development(),
            brokers(FakeBroker::new(Provider::Kakao, "1", "k@example.com")),
        );

        let res = app
            .clone()
            .oneshot(json_request("POST", "/api/users/sign-up", sign_up_body()))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let mut body = sign_up_body();
        body["email"] = json!("  ALICE@example.com ");
        let res = app
            .oneshot(json_request("POST", "/api/users/sign-up", body))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let body = body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "ALREADY_REGISTERED_EMAIL");
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let app = app(
            MemoryUserRepository::new(),
            AuthConfig::development(),
            brokers(FakeBroker::new(Provider::Kakao, "1", "k@example.com")),
        );

        let mut body = sign_up_body();
        body["checkPw"] = json!("different");
        let res = app
            .clone()
            .oneshot(json_request("POST", "/api/users/sign-up", body))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["kind"], "VALIDATION_ERROR");

        let res = app
            .oneshot(json_request(
                "POST",
                "/api/users/sign-up",
                json!({ "email": "bob@example.com" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_input_uses_error_envelope() {
        let app = app(
            MemoryUserRepository::new(),
            AuthConfig::development(),
            brokers(FakeBroker::new(Provider::Kakao, "1", "k@example.com")),
        );

        // Missing field
        let res = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/users/login",
                json!({ "email": "a@a.com" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "VALIDATION_ERROR");

        // Not JSON at all
        let res = app
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/api/users/sign-up")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["kind"], "VALIDATION_ERROR");

        // Missing query parameter
        let res = app
            .oneshot(get("/api/users/validation").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_verify_twice_and_unknown_email() {
        let app = app(
            MemoryUserRepository::new(),
            AuthConfig::development(),
            brokers(FakeBroker::new(Provider::Kakao, "1", "k@example.com")),
        );
        app.clone()
            .oneshot(json_request("POST", "/api/users/sign-up", sign_up_body()))
            .await
            .unwrap();

        let verify = || {
            get("/api/users/validation?email=alice@example.com")
                .body(Body::empty())
                .unwrap()
        };
        assert_eq!(app.clone().oneshot(verify()).await.unwrap().status(), StatusCode::CREATED);
        assert_eq!(app.clone().oneshot(verify()).await.unwrap().status(), StatusCode::CONFLICT);

        let res = app
            .oneshot(
                get("/api/users/validation?email=nobody@example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_refresh_from_cookie_and_deleted_user() {
        let repo = MemoryUserRepository::new();
        let app = app(
            repo.clone(),
            AuthConfig::development(),
            brokers(FakeBroker::new(Provider::Kakao, "1", "k@example.com")),
        );
        app.clone()
            .oneshot(json_request("POST", "/api/users/sign-up", sign_up_body()))
            .await
            .unwrap();
        app.clone()
            .oneshot(
                get("/api/users/validation?email=alice@example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let login = json!({ "email": "alice@example.com", "password": "hunter22" });
        let res = app
            .clone()
            .oneshot(json_request("POST", "/api/users/login", login.clone()))
            .await
            .unwrap();
        let refresh = body_json(res).await["data"]["refreshToken"]
            .as_str()
            .unwrap()
            .to_string();

        let res = app
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/api/token")
                    .header("cookie", format!("refreshToken={refresh}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        // Not a token at all
        let res = app
            .clone()
            .oneshot(json_request("POST", "/api/token", json!({ "refreshToken": "garbage" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        app.clone()
            .oneshot(json_request("POST", "/api/users/exit", login))
            .await
            .unwrap();
        assert!(repo.is_empty().await);

        let res = app
            .oneshot(json_request("POST", "/api/token", json!({ "refreshToken": refresh })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_exit_wrong_password_keeps_user() {
        let repo = MemoryUserRepository::new();
        let app = app(
            repo.clone(),
            AuthConfig::development(),
            brokers(FakeBroker::new(Provider::Kakao, "1", "k@example.com")),
        );
        app.clone()
            .oneshot(json_request("POST", "/api/users/sign-up", sign_up_body()))
            .await
            .unwrap();

        let res = app
            .oneshot(json_request(
                "POST",
                "/api/users/exit",
                json!({ "email": "alice@example.com", "password": "wrong-password" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(repo.len().await, 1);
    }
}

#[cfg(test)]
mod auth_gate_tests {
    use axum::body::Body;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::support::*;
    use crate::application::config::AuthConfig;
    use crate::application::token_service::TokenService;
    use crate::domain::value_object::provider::Provider;
    use crate::infra::MemoryUserRepository;
    use kernel::id::UserId;

    async fn status_for(auth: Option<&str>) -> (StatusCode, serde_json::Value) {
        let config = AuthConfig::development();
        let app = app(
            MemoryUserRepository::new(),
            config,
            brokers(FakeBroker::new(Provider::Kakao, "1", "k@example.com")),
        );
        let mut req = get("/api/me");
        if let Some(auth) = auth {
            req = req.header("authorization", auth);
        }
        let res = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = res.status();
        (status, body_json(res).await)
    }

    #[tokio::test]
    async fn test_missing_and_malformed() {
        let (status, body) = status_for(None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, body) = status_for(Some("Bearer not-a-jwt")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "MALFORMED_TOKEN");

        let (status, _) = status_for(Some("Token abc")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_foreign_secret_is_rejected() {
        let other = TokenService::new(&AuthConfig::development());
        let token = other.issue_access_token(&UserId::new()).unwrap();

        let (status, body) = status_for(Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "MALFORMED_TOKEN");
    }

    #[tokio::test]
    async fn test_valid_token_for_unknown_user() {
        let config = AuthConfig::development();
        let tokens = TokenService::new(&config);
        let token = tokens.issue_access_token(&UserId::new()).unwrap();
        let app = app(
            MemoryUserRepository::new(),
            config,
            brokers(FakeBroker::new(Provider::Kakao, "1", "k@example.com")),
        );

        let res = app
            .oneshot(
                get("/api/me")
                    .header("cookie", format!("authorization=Bearer%20{token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(res).await["kind"], "UNAUTHORIZED");
    }
}

#[cfg(test)]
mod oauth_tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use tower::ServiceExt;

    use super::support::*;
    use crate::application::config::AuthConfig;
    use crate::application::token_service::TokenService;
    use crate::application::OAuthSignInUseCase;
    use crate::domain::entity::user::{User, UserProfile};
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::{
        email::Email, gender::Gender, provider::Provider, user_password::{RawPassword, UserPassword},
    };
    use crate::error::AuthError;
    use crate::infra::MemoryUserRepository;

    fn callback(query: &str, state_cookie: Option<&str>) -> axum::http::Request<Body> {
        let mut req = get(&format!("/api/kakao/sign-in?{query}"));
        if let Some(state) = state_cookie {
            req = req.header("cookie", format!("oauthState={state}"));
        }
        req.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_begin_sets_state_cookie_and_redirects() {
        let app = app(
            MemoryUserRepository::new(),
            AuthConfig::development(),
            brokers(FakeBroker::new(Provider::Kakao, "42", "kim@example.com")),
        );

        let res = app
            .oneshot(get("/api/kakao/sign-up").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(res.status().is_redirection());

        let cookie = set_cookies(&res)
            .into_iter()
            .find(|c| c.starts_with("oauthState="))
            .unwrap();
        let state = cookie
            .trim_start_matches("oauthState=")
            .split(';')
            .next()
            .unwrap()
            .to_string();
        let location = res.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.ends_with(&format!("state={state}")));
    }

    #[tokio::test]
    async fn test_first_time_then_returning() {
        let repo = MemoryUserRepository::new();
        let app = app(
            repo.clone(),
            AuthConfig::development(),
            brokers(FakeBroker::new(Provider::Kakao, "42", "kim@example.com")),
        );

        let res = app
            .clone()
            .oneshot(callback("code=abc&state=s1", Some("s1")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let cookies = set_cookies(&res);
        assert!(cookies.iter().any(|c| c.starts_with("kakaoAccessToken=provider-access")));
        assert!(cookies.iter().any(|c| c.starts_with("kakaoRefreshToken=provider-refresh")));
        assert!(cookies.iter().any(|c| c.starts_with("authorization=Bearer%20")));
        let body = body_json(res).await;
        assert_eq!(body["data"]["created"], true);
        assert_eq!(body["data"]["user"]["kakaoLinked"], true);
        assert_eq!(body["data"]["user"]["isEmailValid"], true);

        let res = app
            .oneshot(callback("code=def&state=s2", Some("s2")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["data"]["created"], false);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_state_mismatch_is_rejected() {
        let repo = MemoryUserRepository::new();
        let app = app(
            repo.clone(),
            AuthConfig::development(),
            brokers(FakeBroker::new(Provider::Kakao, "42", "kim@example.com")),
        );

        let res = app
            .clone()
            .oneshot(callback("code=abc&state=s1", Some("other")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app.oneshot(callback("code=abc&state=s1", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_denied_consent_redirects_to_start() {
        let mut broker = FakeBroker::new(Provider::Kakao, "42", "kim@example.com");
        broker.deny = true;
        let repo = MemoryUserRepository::new();
        let app = app(repo.clone(), AuthConfig::development(), brokers(broker));

        let res = app
            .clone()
            .oneshot(callback("error=access_denied&state=s1", Some("s1")))
            .await
            .unwrap();
        assert!(res.status().is_redirection());
        assert_eq!(res.headers()[header::LOCATION], "sign-up");

        let res = app
            .oneshot(callback("code=abc&state=s1", Some("s1")))
            .await
            .unwrap();
        assert!(res.status().is_redirection());
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_email_held_by_local_account_is_conflict() {
        let repo = MemoryUserRepository::new();
        let raw = RawPassword::new("hunter22".to_string()).unwrap();
        let local = User::new_local(
            Email::new("kim@example.com").unwrap(),
            UserPassword::from_raw(&raw, None).unwrap(),
            UserProfile::new("Kim", Gender::Male),
        );
        repo.create(&local).await.unwrap();

        let app = app(
            repo.clone(),
            AuthConfig::development(),
            brokers(FakeBroker::new(Provider::Kakao, "42", "kim@example.com")),
        );
        let res = app
            .oneshot(callback("code=abc&state=s1", Some("s1")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(res).await["kind"], "ALREADY_REGISTERED_EMAIL");

        let stored = repo.find_by_id(&local.user_id).await.unwrap().unwrap();
        assert_eq!(stored.kakao_id, None);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_time_creates_one_row() {
        let store = MemoryUserRepository::new();
        // Both sign-ins see no existing user before either inserts
        let repo = Arc::new(LookupBarrierRepository::new(store.clone(), 2));
        let tokens = Arc::new(TokenService::new(&AuthConfig::development()));
        let broker = FakeBroker::new(Provider::Naver, "n-7", "lee@example.com");
        let use_case = OAuthSignInUseCase::new(repo, tokens);

        let (a, b) = tokio::join!(
            use_case.execute(&broker, "code-a", "state"),
            use_case.execute(&broker, "code-b", "state"),
        );

        let created = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(created, 1);
        assert!(
            [a, b]
                .into_iter()
                .any(|r| matches!(r, Err(AuthError::AlreadyRegisteredEmail)))
        );
        let email = Email::new("lee@example.com").unwrap();
        assert_eq!(store.count_by_email(&email).await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_provider_token_and_logout() {
        let app = app(
            MemoryUserRepository::new(),
            AuthConfig::development(),
            brokers(FakeBroker::new(Provider::Kakao, "42", "kim@example.com")),
        );

        let res = app
            .clone()
            .oneshot(get("/api/kakao/token").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app
            .clone()
            .oneshot(
                get("/api/kakao/token")
                    .header("cookie", "kakaoRefreshToken=old")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let cookies = set_cookies(&res);
        assert!(cookies.iter().any(|c| c.starts_with("kakaoAccessToken=provider-access")));
        // Unrotated refresh token keeps its existing cookie and lifetime
        assert!(!cookies.iter().any(|c| c.starts_with("kakaoRefreshToken=")));

        let res = app
            .oneshot(
                get("/api/kakao/logout")
                    .header("cookie", "kakaoAccessToken=tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(set_cookies(&res).len(), 7);
    }
}

#[cfg(test)]
mod withdrawal_tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::support::*;
    use crate::application::WithdrawalCoordinator;
    use crate::application::config::AuthConfig;
    use crate::application::oauth::OAuthBroker;
    use crate::application::token_service::TokenService;
    use crate::domain::entity::user::User;
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::provider::Provider;
    use crate::error::AuthError;
    use crate::infra::MemoryUserRepository;

    async fn federated_user(repo: &MemoryUserRepository, broker: &FakeBroker) -> User {
        let profile = broker.fetch_profile("any").await.unwrap();
        let user = User::new_federated(&profile);
        repo.create(&user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn test_failed_revoke_keeps_user() {
        let repo = MemoryUserRepository::new();
        let mut broker = FakeBroker::new(Provider::Kakao, "42", "kim@example.com");
        broker.revoke_fails = true;
        let user = federated_user(&repo, &broker).await;

        let coordinator = WithdrawalCoordinator::new(
            Arc::new(repo.clone()),
            Arc::new(AuthConfig::development()),
        );
        let result = coordinator.withdraw_federated(&user, &broker, "tok").await;

        assert!(matches!(result, Err(AuthError::Provider(_))));
        assert!(repo.find_by_id(&user.user_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_mismatched_provider_identity() {
        let repo = MemoryUserRepository::new();
        let broker = FakeBroker::new(Provider::Kakao, "42", "kim@example.com");
        let user = federated_user(&repo, &broker).await;

        let impostor = FakeBroker::new(Provider::Kakao, "99", "kim@example.com");
        let coordinator = WithdrawalCoordinator::new(
            Arc::new(repo.clone()),
            Arc::new(AuthConfig::development()),
        );
        let result = coordinator.withdraw_federated(&user, &impostor, "tok").await;

        assert!(matches!(result, Err(AuthError::ProviderMismatch)));
        assert_eq!(impostor.revoked(), 0);
        assert_eq!(repo.len().await, 1);

        // Not linked to Naver at all
        let naver = FakeBroker::new(Provider::Naver, "42", "kim@example.com");
        let result = coordinator.withdraw_federated(&user, &naver, "tok").await;
        assert!(matches!(result, Err(AuthError::ProviderMismatch)));
    }

    #[tokio::test]
    async fn test_provider_withdrawal_route() {
        let repo = MemoryUserRepository::new();
        let config = AuthConfig::development();
        let tokens = TokenService::new(&config);
        let broker = FakeBroker::new(Provider::Kakao, "42", "kim@example.com");
        let user = federated_user(&repo, &broker).await;
        let access = tokens.issue_access_token(&user.user_id).unwrap();

        let app = app(repo.clone(), config, brokers(broker.clone()));

        // Bearer required
        let res = app
            .clone()
            .oneshot(
                get("/api/kakao/withdrawal")
                    .header("cookie", "kakaoAccessToken=tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app
            .clone()
            .oneshot(
                get("/api/kakao/withdrawal")
                    .header("authorization", format!("Bearer {access}"))
                    .header("cookie", "kakaoAccessToken=tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(broker.revoked(), 1);
        assert!(repo.is_empty().await);

        // Outstanding tokens no longer resolve
        let res = app
            .oneshot(
                get("/api/me")
                    .header("authorization", format!("Bearer {access}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_exit_with_provider_cookie_takes_federated_path() {
        let repo = MemoryUserRepository::new();
        let config = AuthConfig::development();
        let tokens = TokenService::new(&config);
        let mut broker = FakeBroker::new(Provider::Kakao, "42", "kim@example.com");
        broker.revoke_fails = true;
        let user = federated_user(&repo, &broker).await;
        let access = tokens.issue_access_token(&user.user_id).unwrap();

        let app = app(repo.clone(), config, brokers(broker));
        let res = app
            .oneshot(
                get("/api/users/exit")
                    .header(
                        "cookie",
                        format!("authorization=Bearer%20{access}; kakaoAccessToken=tok"),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(repo.len().await, 1);
    }
}

#[cfg(test)]
mod concurrency_tests {
    use std::sync::Arc;

    use crate::application::config::AuthConfig;
    use crate::application::{SignUpInput, SignUpUseCase};
    use crate::domain::value_object::email::Email;
    use crate::error::AuthError;
    use crate::infra::MemoryUserRepository;

    fn input() -> SignUpInput {
        SignUpInput {
            email: Some("race@example.com".to_string()),
            password: Some("hunter22".to_string()),
            check_pw: Some("hunter22".to_string()),
            name: Some("Racer".to_string()),
            gender: Some("unknown".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_concurrent_sign_up_same_email() {
        let repo = Arc::new(MemoryUserRepository::new());
        let use_case = SignUpUseCase::new(repo.clone(), Arc::new(AuthConfig::development()));

        let (a, b) = tokio::join!(use_case.execute(input()), use_case.execute(input()));

        assert_eq!([&a, &b].iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            [a, b]
                .into_iter()
                .any(|r| matches!(r, Err(AuthError::AlreadyRegisteredEmail)))
        );
        let email = Email::new("race@example.com").unwrap();
        assert_eq!(repo.count_by_email(&email).await, 1);
    }
}
