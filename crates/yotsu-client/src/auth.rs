use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::{debug, info, warn};

use yotsu_api::Backend;
use yotsu_db::TokenVault;
use yotsu_types::UserId;
use yotsu_types::api::{
    Claims, LoginRequest, RefreshRequest, RegisterRequest, TokenResponse, TotpVerifyRequest,
};

use crate::{ChatClient, ClientError, ClientResult, sync_failure};

/// Read the `user_id` claim of an access token. Signatures are the backend's
/// concern; the client holds no key and only wants to know who it is.
pub fn user_id_from_token(token: &str) -> Option<UserId> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims.user_id)
        .ok()
}

impl<B: Backend, V: TokenVault> ChatClient<B, V> {
    /// Log in with email and password. When the account has 2FA enabled the
    /// session waits for [`verify_2fa`](Self::verify_2fa); otherwise it is
    /// authenticated right away. A failed login leaves the session untouched.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<()> {
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp = self.backend.login(&req).await.map_err(|e| {
            warn!("Login failed for {}: {}", email, e);
            ClientError::from_auth(e)
        })?;

        if resp.access_token.is_some() {
            return self.accept_tokens(resp);
        }
        if let Some(temp_token) = resp.temp_token {
            info!("Login for {} requires a one-time code", email);
            self.write(|store| store.session_mut().require_two_factor(temp_token));
            return Ok(());
        }
        Err(ClientError::Authentication(
            "login response carried no token".into(),
        ))
    }

    /// Register a new account. The returned `otpauth://` URI is for enrolling
    /// an authenticator; registration completes with [`verify_2fa`](Self::verify_2fa).
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> ClientResult<String> {
        let req = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            display_name: display_name.to_string(),
        };
        let resp = self.backend.register(&req).await.map_err(|e| {
            warn!("Registration failed for {}: {}", email, e);
            ClientError::from_auth(e)
        })?;

        info!("Registered {}, awaiting 2FA enrolment", email);
        self.write(|store| store.session_mut().require_two_factor(resp.temp_token));
        Ok(resp.totp_uri)
    }

    /// `Ok(false)` when the address is already taken.
    pub async fn check_email(&self, email: &str) -> ClientResult<bool> {
        self.backend
            .check_email(email)
            .await
            .map_err(|e| sync_failure("check_email", e))
    }

    /// Exchange the pending temporary token and a one-time code for a full
    /// token pair.
    pub async fn verify_2fa(&self, code: &str) -> ClientResult<()> {
        let temp_token = self
            .read(|store| store.session().temp_token().map(str::to_owned))
            .ok_or(ClientError::NotAuthenticated)?;

        let req = TotpVerifyRequest {
            totp_code: code.to_string(),
        };
        let resp = self
            .backend
            .verify_2fa(&temp_token, &req)
            .await
            .map_err(|e| {
                warn!("2FA verification failed: {}", e);
                ClientError::from_auth(e)
            })?;

        if resp.access_token.is_none() {
            return Err(ClientError::Authentication(
                "verification response carried no access token".into(),
            ));
        }
        self.accept_tokens(resp)
    }

    /// Trade the persisted refresh token for a new access token. Any failure
    /// ends the session: the store is reset and the vault emptied.
    pub async fn refresh_tokens(&self) -> ClientResult<()> {
        let refresh_token = match self.vault.load_refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                info!("No refresh token stored, ending session");
                return Err(self.expire_session());
            }
            Err(e) => {
                warn!("Failed to read refresh token: {}", e);
                return Err(self.expire_session());
            }
        };

        let resp = match self.backend.refresh(&RefreshRequest { refresh_token }).await {
            Ok(resp) if resp.access_token.is_some() => resp,
            Ok(_) => {
                warn!("Refresh response carried no access token");
                return Err(self.expire_session());
            }
            Err(e) => {
                warn!("Token refresh rejected: {}", e);
                return Err(self.expire_session());
            }
        };

        self.accept_tokens(resp)?;
        debug!("Access token refreshed");
        Ok(())
    }

    /// Resume a previous session from the vault. Returns whether the client is
    /// now authenticated.
    pub async fn restore_session(&self) -> ClientResult<bool> {
        if self.vault.load_refresh_token()?.is_none() {
            return Ok(false);
        }
        match self.refresh_tokens().await {
            Ok(()) => Ok(true),
            Err(ClientError::SessionExpired) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Ask the backend whether the current access token is still good. A valid
    /// answer also settles the session's user id.
    pub async fn verify_token(&self) -> ClientResult<bool> {
        let token = self.access_token()?;
        match self.backend.verify_token(&token).await {
            Ok(resp) => {
                if resp.valid {
                    self.write(|store| store.session_mut().set_user_id(resp.user_id));
                }
                Ok(resp.valid)
            }
            Err(e) if e.is_auth_rejection() => Ok(false),
            Err(e) => Err(sync_failure("verify_token", e)),
        }
    }

    /// Clear the session and every cached entity, and forget the refresh
    /// token. Safe to call when already logged out.
    pub fn logout(&self) -> ClientResult<()> {
        let was_authenticated = self.write(|store| {
            let was = store.session().is_authenticated();
            store.reset();
            was
        });
        self.vault.clear_refresh_token()?;
        if was_authenticated {
            info!("Logged out");
        }
        Ok(())
    }

    /// Override the in-memory access token, e.g. after an out-of-band refresh.
    /// `None` drops authentication without touching the vault.
    pub fn set_access_token(&self, token: Option<String>) {
        self.write(|store| store.session_mut().set_access_token(token));
    }

    fn accept_tokens(&self, resp: TokenResponse) -> ClientResult<()> {
        let Some(access_token) = resp.access_token else {
            return Err(ClientError::NotAuthenticated);
        };
        if let Some(refresh_token) = &resp.refresh_token {
            self.vault.store_refresh_token(refresh_token)?;
        }

        let user_id = resp.user_id.or_else(|| user_id_from_token(&access_token));
        self.write(|store| store.session_mut().authenticate(access_token, user_id));

        let user_id = self.read(|store| store.current_user());
        info!(?user_id, "Session authenticated");
        Ok(())
    }

    fn expire_session(&self) -> ClientError {
        if let Err(e) = self.logout() {
            warn!("Failed to clear session after refresh failure: {}", e);
        }
        ClientError::SessionExpired
    }
}
