use yotsu_types::UserId;

/// Authentication state of the running client. Exactly one exists per client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    access_token: Option<String>,
    is_authenticated: bool,
    user_id: Option<UserId>,
    temp_token: Option<String>,
    is_2fa_required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    AwaitingTwoFactor,
    Authenticated,
}

impl Session {
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn temp_token(&self) -> Option<&str> {
        self.temp_token.as_deref()
    }

    pub fn is_2fa_required(&self) -> bool {
        self.is_2fa_required
    }

    pub fn state(&self) -> SessionState {
        if self.is_authenticated {
            SessionState::Authenticated
        } else if self.is_2fa_required {
            SessionState::AwaitingTwoFactor
        } else {
            SessionState::Unauthenticated
        }
    }

    /// Enter the authenticated state with a full access token. Clears any
    /// pending 2FA step. A missing `user_id` keeps the one already known.
    pub fn authenticate(&mut self, access_token: String, user_id: Option<UserId>) {
        self.access_token = Some(access_token);
        self.is_authenticated = true;
        if user_id.is_some() {
            self.user_id = user_id;
        }
        self.temp_token = None;
        self.is_2fa_required = false;
    }

    /// Park the session until a one-time code is supplied.
    pub fn require_two_factor(&mut self, temp_token: String) {
        self.access_token = None;
        self.is_authenticated = false;
        self.temp_token = Some(temp_token);
        self.is_2fa_required = true;
    }

    /// Direct override of the in-memory token. Authentication follows token presence.
    pub fn set_access_token(&mut self, token: Option<String>) {
        self.is_authenticated = token.is_some();
        self.access_token = token;
    }

    pub fn set_user_id(&mut self, user_id: UserId) {
        self.user_id = Some(user_id);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
