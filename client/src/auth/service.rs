//! Core logic of the sign-in flow.

use crate::auth::models::*;
use crate::auth::token;
use crate::errors::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::notice::Notice;
use crate::push::PushTokenState;
use crate::routes::Route;
use crate::session::Session;
use tracing::{error, info, warn};
use validator::Validate;

const LOGIN_PATH: &str = "/admin/login";
const VERIFY_2FA_PATH: &str = "/admin/verify-2fa";

const LOGIN_FALLBACK: &str = "Login failed";
const VERIFY_FALLBACK: &str = "OTP verification failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    Authenticating,
    AwaitingSecondFactor,
    Verifying,
}

/// Result of a login or verification attempt, ready to show the user.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// Blocked locally; nothing was sent.
    Rejected { notice: Notice },
    /// The server wants a one-time code before issuing a token.
    SecondFactorRequired { notice: Notice },
    SignedIn {
        session: Session,
        notice: Notice,
        route: Route,
    },
    Failed { notice: Notice },
}

impl AuthOutcome {
    pub fn notice(&self) -> &Notice {
        match self {
            AuthOutcome::Rejected { notice }
            | AuthOutcome::SecondFactorRequired { notice }
            | AuthOutcome::SignedIn { notice, .. }
            | AuthOutcome::Failed { notice } => notice,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthOutcome::SignedIn { .. })
    }
}

/// Drives login, second-factor verification and logout.
///
/// Operations take `&mut self`, so a controller has at most one login or
/// verification in flight.
pub struct AuthController {
    api: ApiClient,
    state: AuthState,
    temp_token: Option<String>,
}

impl AuthController {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: AuthState::Idle,
            temp_token: None,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn loading(&self) -> bool {
        matches!(self.state, AuthState::Authenticating | AuthState::Verifying)
    }

    pub fn require_2fa(&self) -> bool {
        self.state == AuthState::AwaitingSecondFactor
    }

    /// Submits credentials.
    ///
    /// Empty fields or a push token that is not ready block the submission
    /// before any request is made.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
        push_token: &PushTokenState,
    ) -> AuthOutcome {
        let Some(token) = push_token.token() else {
            let reason = push_token
                .blocking_reason()
                .unwrap_or("Push notifications are not ready");
            return AuthOutcome::Rejected {
                notice: Notice::error(reason),
            };
        };

        let request = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
            push_token: token.to_string(),
        };

        if let Err(errors) = request.validate() {
            let error = ClientError::from(errors);
            return AuthOutcome::Rejected {
                notice: Notice::error(error.user_message(LOGIN_FALLBACK)),
            };
        }

        // A fresh login abandons any pending second factor
        self.temp_token = None;
        self.state = AuthState::Authenticating;

        let outcome = match self.api.post::<_, LoginResponse>(LOGIN_PATH, &request).await {
            Ok(response) => self.handle_login_response(response).await,
            Err(e) => {
                warn!(username = %request.username, "Login request failed: {}", e);
                AuthOutcome::Failed {
                    notice: Notice::error(e.user_message(LOGIN_FALLBACK)),
                }
            }
        };

        if !matches!(outcome, AuthOutcome::SecondFactorRequired { .. }) {
            self.state = AuthState::Idle;
        }

        outcome
    }

    async fn handle_login_response(&mut self, response: LoginResponse) -> AuthOutcome {
        let data = response.data.unwrap_or_default();

        if data.require_2fa {
            let Some(temp_token) = data.temp_token.filter(|t| !t.is_empty()) else {
                error!("Server requested a second factor without a temporary token");
                return AuthOutcome::Failed {
                    notice: Notice::error(non_empty_or(response.message, LOGIN_FALLBACK)),
                };
            };

            info!("Second factor required");
            self.temp_token = Some(temp_token);
            self.state = AuthState::AwaitingSecondFactor;
            return AuthOutcome::SecondFactorRequired {
                notice: Notice::info(non_empty_or(
                    response.message,
                    "Enter the verification code",
                )),
            };
        }

        self.complete_sign_in(data, response.message, LOGIN_FALLBACK)
            .await
    }

    /// Submits the one-time code for the pending second factor.
    ///
    /// The temporary token is consumed whatever the server answers.
    pub async fn verify_2fa(&mut self, code: &str) -> AuthOutcome {
        let Some(temp_token) = self.temp_token.clone() else {
            return AuthOutcome::Rejected {
                notice: Notice::error("No verification in progress. Sign in again."),
            };
        };

        let request = Verify2faRequest {
            token: temp_token,
            otp: code.trim().to_string(),
        };

        if let Err(errors) = request.validate() {
            let error = ClientError::from(errors);
            return AuthOutcome::Rejected {
                notice: Notice::error(error.user_message(VERIFY_FALLBACK)),
            };
        }

        self.state = AuthState::Verifying;

        let outcome = match self
            .api
            .post::<_, LoginResponse>(VERIFY_2FA_PATH, &request)
            .await
        {
            Ok(response) => {
                let data = response.data.unwrap_or_default();
                self.complete_sign_in(data, response.message, VERIFY_FALLBACK)
                    .await
            }
            Err(e) => {
                warn!("Verification request failed: {}", e);
                AuthOutcome::Failed {
                    notice: Notice::error(e.user_message(VERIFY_FALLBACK)),
                }
            }
        };

        self.temp_token = None;
        self.state = AuthState::Idle;
        outcome
    }

    /// Persists the issued token, or reports why there is none.
    async fn complete_sign_in(
        &mut self,
        data: LoginData,
        message: String,
        fallback: &str,
    ) -> AuthOutcome {
        let Some(issued) = data.token.filter(|t| !t.is_empty()) else {
            return AuthOutcome::Failed {
                notice: Notice::error(non_empty_or(message, fallback)),
            };
        };

        let session = Session::new(issued, data.user);

        if let Err(e) = self.persist(&session).await {
            error!("Failed to persist session: {}", e);
            if let Err(e) = self.api.session().clear().await {
                warn!("Failed to roll back partial session: {}", e);
            }
            return AuthOutcome::Failed {
                notice: Notice::error(e.user_message(fallback)),
            };
        }

        info!(
            role = %session.role,
            expires_in_days = token::expiry_in_days(&session.token),
            "Signed in"
        );

        AuthOutcome::SignedIn {
            session,
            notice: Notice::success(non_empty_or(message, "Signed in")),
            route: Route::LiveMonitoring,
        }
    }

    async fn persist(&self, session: &Session) -> ClientResult<()> {
        self.api.session().save(session).await
    }

    /// Clears the stored session and returns to the login screen.
    ///
    /// Storage failures are logged and otherwise ignored.
    pub async fn logout(&mut self) -> Route {
        if let Err(e) = self.api.session().clear().await {
            warn!("Ignoring storage failure during logout: {}", e);
        }

        self.temp_token = None;
        self.state = AuthState::Idle;
        info!("Signed out");
        Route::Login
    }

    pub async fn current_session(&self) -> ClientResult<Option<Session>> {
        self.api.session().load().await
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::http::tests::client_for;
    use crate::notice::NoticeKind;
    use crate::session::SessionStore;
    use crate::storage::{EncryptedStore, KeyValueStore, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ready() -> PushTokenState {
        PushTokenState::Ready("ExponentPushToken[abc]".to_string())
    }

    fn user_json() -> serde_json::Value {
        json!({
            "id": 7,
            "username": "operator",
            "email": "operator@example.com",
            "role": "admin",
            "is_active": true,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-06-01T00:00:00Z"
        })
    }

    async fn mount_login(server: &MockServer, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_missing_fields_never_reach_network() {
        let server = MockServer::start().await;
        mount_login(&server, 200, json!({})).await;
        let mut auth = AuthController::new(client_for(&server.uri()));

        for (username, password) in [("", "secret"), ("operator", ""), ("", ""), ("   ", "x")] {
            let outcome = auth.login(username, password, &ready()).await;
            assert!(matches!(outcome, AuthOutcome::Rejected { .. }), "{username:?}/{password:?}");
        }

        let outcome = auth.login("operator", "secret", &PushTokenState::Unchecked).await;
        assert!(matches!(outcome, AuthOutcome::Rejected { .. }));
        let outcome = auth.login("operator", "secret", &PushTokenState::Denied).await;
        assert!(matches!(outcome, AuthOutcome::Rejected { .. }));

        assert!(server.received_requests().await.unwrap().is_empty());
        assert_eq!(auth.state(), AuthState::Idle);
    }

    #[tokio::test]
    async fn test_second_factor_does_not_persist_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_json(json!({
                "username": "operator",
                "password": "secret",
                "pushToken": "ExponentPushToken[abc]"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "OTP sent to your email",
                "data": {"require2FA": true, "tempToken": "temp-123"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut auth = AuthController::new(client_for(&server.uri()));
        let outcome = auth.login("operator", "secret", &ready()).await;

        assert_eq!(
            outcome,
            AuthOutcome::SecondFactorRequired {
                notice: Notice::info("OTP sent to your email")
            }
        );
        assert_eq!(auth.state(), AuthState::AwaitingSecondFactor);
        assert!(auth.require_2fa());
        assert!(!auth.loading());
        assert!(auth.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let server = MockServer::start().await;
        mount_login(
            &server,
            200,
            json!({
                "success": true,
                "message": "Login successful",
                "data": {"token": "final-token", "user": user_json()}
            }),
        )
        .await;

        let mut auth = AuthController::new(client_for(&server.uri()));
        let outcome = auth.login("operator", "secret", &ready()).await;

        let AuthOutcome::SignedIn { session, notice, route } = outcome.clone() else {
            panic!("expected sign in, got {:?}", outcome);
        };
        assert_eq!(route, Route::LiveMonitoring);
        assert_eq!(notice, Notice::success("Login successful"));
        assert_eq!(session.role, "admin");

        let stored = auth.current_session().await.unwrap().unwrap();
        assert_eq!(stored.token, "final-token");
        assert_eq!(stored.profile.unwrap().username, "operator");
        assert_eq!(auth.state(), AuthState::Idle);
    }

    #[tokio::test]
    async fn test_login_failure_surfaces_server_message() {
        let server = MockServer::start().await;
        mount_login(
            &server,
            400,
            json!({"success": false, "message": "Invalid username or password"}),
        )
        .await;

        let mut auth = AuthController::new(client_for(&server.uri()));
        let outcome = auth.login("operator", "wrong", &ready()).await;

        assert_eq!(
            outcome,
            AuthOutcome::Failed {
                notice: Notice::error("Invalid username or password")
            }
        );
        assert_eq!(auth.state(), AuthState::Idle);
    }

    #[tokio::test]
    async fn test_login_transport_failure_uses_fallback() {
        let mut auth = AuthController::new(client_for("http://127.0.0.1:9"));
        let outcome = auth.login("operator", "secret", &ready()).await;

        assert_eq!(outcome.notice().message, LOGIN_FALLBACK);
        assert_eq!(outcome.notice().kind, NoticeKind::Error);
        assert_eq!(auth.state(), AuthState::Idle);
    }

    #[tokio::test]
    async fn test_full_second_factor_flow() {
        let server = MockServer::start().await;
        mount_login(
            &server,
            200,
            json!({"message": "OTP sent", "data": {"require2FA": true, "tempToken": "temp-123"}}),
        )
        .await;
        Mock::given(method("POST"))
            .and(path(VERIFY_2FA_PATH))
            .and(body_json(json!({"token": "temp-123", "otp": "424242"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Verified",
                "data": {"token": "final-token", "user": user_json()}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut auth = AuthController::new(client_for(&server.uri()));
        auth.login("operator", "secret", &ready()).await;
        let outcome = auth.verify_2fa(" 424242 ").await;

        assert!(outcome.is_signed_in());
        assert_eq!(auth.state(), AuthState::Idle);
        assert!(!auth.require_2fa());
        assert_eq!(
            auth.current_session().await.unwrap().unwrap().token,
            "final-token"
        );
    }

    #[tokio::test]
    async fn test_verify_failure_discards_temp_token() {
        let server = MockServer::start().await;
        mount_login(
            &server,
            200,
            json!({"message": "OTP sent", "data": {"require2FA": true, "tempToken": "temp-123"}}),
        )
        .await;
        Mock::given(method("POST"))
            .and(path(VERIFY_2FA_PATH))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid OTP"})),
            )
            .mount(&server)
            .await;

        let mut auth = AuthController::new(client_for(&server.uri()));
        auth.login("operator", "secret", &ready()).await;

        // An empty code is blocked without consuming the temporary token
        let outcome = auth.verify_2fa("").await;
        assert!(matches!(outcome, AuthOutcome::Rejected { .. }));
        assert!(auth.require_2fa());

        let outcome = auth.verify_2fa("000000").await;
        assert_eq!(
            outcome,
            AuthOutcome::Failed {
                notice: Notice::error("Invalid OTP")
            }
        );
        assert_eq!(auth.state(), AuthState::Idle);

        let outcome = auth.verify_2fa("000000").await;
        assert!(matches!(outcome, AuthOutcome::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_verify_never_reenters_second_factor() {
        let server = MockServer::start().await;
        mount_login(
            &server,
            200,
            json!({"data": {"require2FA": true, "tempToken": "temp-123"}}),
        )
        .await;
        Mock::given(method("POST"))
            .and(path(VERIFY_2FA_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "",
                "data": {"require2FA": true, "tempToken": "temp-456"}
            })))
            .mount(&server)
            .await;

        let mut auth = AuthController::new(client_for(&server.uri()));
        auth.login("operator", "secret", &ready()).await;
        let outcome = auth.verify_2fa("123456").await;

        assert_eq!(outcome.notice().message, VERIFY_FALLBACK);
        assert!(!auth.require_2fa());
    }

    fn controller_with_stores(
        api_url: &str,
        secure: Arc<dyn KeyValueStore>,
        local: Arc<dyn KeyValueStore>,
    ) -> AuthController {
        let config = Config::in_memory(api_url, "k");
        let session = SessionStore::new(secure, local);
        AuthController::new(ApiClient::new(&config, session).unwrap())
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_no_session() {
        let server = MockServer::start().await;
        mount_login(
            &server,
            200,
            json!({"data": {"token": "final", "user": user_json()}}),
        )
        .await;

        let local = Arc::new(MemoryStore::new());
        local.set_failing(true);
        let mut auth =
            controller_with_stores(&server.uri(), Arc::new(MemoryStore::new()), local.clone());

        let outcome = auth.login("operator", "secret", &ready()).await;
        assert!(matches!(outcome, AuthOutcome::Failed { .. }));

        assert!(auth.current_session().await.unwrap().is_none());
        assert!(auth.api.session().token().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_undecryptable_token_does_not_block_login() {
        let server = MockServer::start().await;
        mount_login(
            &server,
            200,
            json!({
                "message": "Login successful",
                "data": {"token": "final", "user": user_json()}
            }),
        )
        .await;

        let secure = Arc::new(EncryptedStore::new(MemoryStore::new(), "k").unwrap());
        secure.inner().set("token", "garbage-not-ciphertext").await.unwrap();
        let mut auth =
            controller_with_stores(&server.uri(), secure.clone(), Arc::new(MemoryStore::new()));

        let outcome = auth.login("operator", "secret", &ready()).await;
        assert!(outcome.is_signed_in(), "{:?}", outcome);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
        assert_eq!(
            auth.current_session().await.unwrap().unwrap().token,
            "final"
        );
    }

    #[tokio::test]
    async fn test_sparse_user_still_signs_in() {
        let server = MockServer::start().await;
        mount_login(
            &server,
            200,
            json!({
                "message": "Login successful",
                "data": {
                    "token": "final",
                    "user": {
                        "id": 7,
                        "username": "operator",
                        "email": "o@example.com",
                        "role": "admin"
                    }
                }
            }),
        )
        .await;

        let mut auth = AuthController::new(client_for(&server.uri()));
        let outcome = auth.login("operator", "secret", &ready()).await;

        let AuthOutcome::SignedIn { session, .. } = outcome.clone() else {
            panic!("expected sign in, got {:?}", outcome);
        };
        assert_eq!(session.role, "admin");
        let profile = session.profile.unwrap();
        assert!(profile.created_at.is_none());
    }

    #[tokio::test]
    async fn test_logout_always_succeeds() {
        let secure = Arc::new(MemoryStore::new());
        let local = Arc::new(MemoryStore::new());
        let session = SessionStore::new(secure.clone(), local.clone());
        session.save(&Session::new("abc", None)).await.unwrap();

        let config = Config::in_memory("http://127.0.0.1:9", "k");
        let mut auth = AuthController::new(ApiClient::new(&config, session).unwrap());

        assert_eq!(auth.logout().await, Route::Login);
        assert!(auth.current_session().await.unwrap().is_none());

        // Already cleared, and now the store is failing too
        secure.set_failing(true);
        assert_eq!(auth.logout().await, Route::Login);
    }
}
