//! Identity of the current user and the sign-in / sign-out workflows.

use thiserror::Error;

use crate::domain::identity::{is_plausible_email, Identity};

use super::{
    contracts::{AuthService, MessageStore},
    feed_subscriber::FeedSubscriber,
};

pub const MIN_PASSWORD_CHARS: usize = 6;

const SESSION_SIGNED_IN: &str = "SESSION_SIGNED_IN";
const SESSION_SIGNED_OUT: &str = "SESSION_SIGNED_OUT";
const SESSION_AUTH_FAILED: &str = "SESSION_AUTH_FAILED";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("password must be at least {min_chars} characters")]
    WeakPassword { min_chars: usize },
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("email or password is incorrect")]
    InvalidCredentials,
    #[error("no user is signed in")]
    NoActiveSession,
    #[error("auth service unavailable: {0}")]
    Transport(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "AUTH_INVALID_EMAIL",
            Self::WeakPassword { .. } => "AUTH_WEAK_PASSWORD",
            Self::EmailTaken => "AUTH_EMAIL_TAKEN",
            Self::InvalidCredentials => "AUTH_INVALID_CREDENTIALS",
            Self::NoActiveSession => "AUTH_NO_ACTIVE_SESSION",
            Self::Transport(_) => "AUTH_TRANSPORT",
        }
    }
}

/// Gates sending and authorship attribution on the signed-in identity.
///
/// Failed operations are never retried here; the user repeats the action.
#[derive(Debug)]
pub struct SessionGate<A: AuthService> {
    auth: A,
}

impl<A: AuthService> SessionGate<A> {
    pub fn new(auth: A) -> Self {
        Self { auth }
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.auth.current_user()
    }

    pub fn register(&mut self, email: &str, password: &str) -> Result<Identity, AuthError> {
        validate_credentials(email, password)?;
        let result = self.auth.create_user(email, password);
        log_auth_result("register", &result);
        result
    }

    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<Identity, AuthError> {
        if !is_plausible_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        let result = self.auth.sign_in(email, password);
        log_auth_result("sign_in", &result);
        result
    }

    /// Signs out and, only on success, cancels the feed subscription.
    pub fn sign_out<S: MessageStore>(
        &mut self,
        subscriber: &mut FeedSubscriber<S>,
    ) -> Result<(), AuthError> {
        if let Err(error) = self.auth.sign_out() {
            tracing::warn!(code = error.code(), error = %error, "sign-out failed");
            return Err(error);
        }

        subscriber.cancel();
        tracing::info!(code = SESSION_SIGNED_OUT, "signed out");
        Ok(())
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    if !is_plausible_email(email) {
        return Err(AuthError::InvalidEmail);
    }

    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AuthError::WeakPassword {
            min_chars: MIN_PASSWORD_CHARS,
        });
    }

    Ok(())
}

fn log_auth_result(action: &'static str, result: &Result<Identity, AuthError>) {
    match result {
        Ok(identity) => {
            tracing::info!(code = SESSION_SIGNED_IN, action, identity = %identity, "authenticated")
        }
        Err(error) => tracing::warn!(
            code = SESSION_AUTH_FAILED,
            action,
            reason = error.code(),
            "authentication failed"
        ),
    }
}
