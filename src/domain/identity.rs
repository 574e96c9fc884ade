use std::fmt;

/// Identity of an authenticated user (their email address).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `sender` names this identity. Exact string comparison.
    pub fn is_sender(&self, sender: &str) -> bool {
        self.0 == sender
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Loose shape check: non-empty local part and domain around a single `@`.
pub fn is_plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_match_is_exact() {
        let identity = Identity::new("a@x.com");

        assert!(identity.is_sender("a@x.com"));
        assert!(!identity.is_sender("A@x.com"));
        assert!(!identity.is_sender("a@x.com "));
    }

    #[test]
    fn email_shape_check() {
        assert!(is_plausible_email("a@x.com"));
        assert!(!is_plausible_email("a.x.com"));
        assert!(!is_plausible_email("@x.com"));
        assert!(!is_plausible_email("a@"));
        assert!(!is_plausible_email("a@b@c"));
        assert!(!is_plausible_email("a b@x.com"));
    }
}
