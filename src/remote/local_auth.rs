//! Credential service backed by an accounts file next to the journals.
//!
//! Passwords are kept only as salted SHA-256 digests. The signed-in user is
//! held in memory for the lifetime of the process.

use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    domain::identity::Identity,
    usecases::{contracts::AuthService, session_gate::AuthError},
};

const ACCOUNTS_FILE_NAME: &str = "accounts.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct AccountsFile {
    accounts: Vec<Account>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    email: String,
    salt: String,
    digest: String,
}

#[derive(Debug)]
pub struct LocalAuthService {
    accounts_path: PathBuf,
    current: Option<Identity>,
}

impl LocalAuthService {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            accounts_path: data_dir.join(ACCOUNTS_FILE_NAME),
            current: None,
        }
    }

    fn open_locked(&self) -> Result<File, AuthError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.accounts_path)
            .map_err(transport)?;
        FileExt::lock_exclusive(&file).map_err(transport)?;
        Ok(file)
    }
}

impl AuthService for LocalAuthService {
    fn current_user(&self) -> Option<Identity> {
        self.current.clone()
    }

    fn sign_out(&mut self) -> Result<(), AuthError> {
        self.current
            .take()
            .map(|_| ())
            .ok_or(AuthError::NoActiveSession)
    }

    fn create_user(&mut self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let mut file = self.open_locked()?;
        let mut accounts = read_accounts(&mut file)?;

        if accounts
            .accounts
            .iter()
            .any(|account| account.email.eq_ignore_ascii_case(email))
        {
            return Err(AuthError::EmailTaken);
        }

        let salt = Uuid::new_v4().simple().to_string();
        accounts.accounts.push(Account {
            email: email.to_owned(),
            digest: password_digest(&salt, password),
            salt,
        });
        write_accounts(&mut file, &accounts)?;
        FileExt::unlock(&file).map_err(transport)?;

        let identity = Identity::new(email);
        self.current = Some(identity.clone());
        Ok(identity)
    }

    fn sign_in(&mut self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let mut file = self.open_locked()?;
        let accounts = read_accounts(&mut file)?;
        FileExt::unlock(&file).map_err(transport)?;

        let account = accounts
            .accounts
            .iter()
            .find(|account| account.email.eq_ignore_ascii_case(email))
            .ok_or(AuthError::InvalidCredentials)?;

        if password_digest(&account.salt, password) != account.digest {
            return Err(AuthError::InvalidCredentials);
        }

        let identity = Identity::new(account.email.clone());
        self.current = Some(identity.clone());
        Ok(identity)
    }
}

fn read_accounts(file: &mut File) -> Result<AccountsFile, AuthError> {
    let mut raw = String::new();
    file.read_to_string(&mut raw).map_err(transport)?;

    if raw.trim().is_empty() {
        return Ok(AccountsFile::default());
    }

    serde_json::from_str(&raw)
        .map_err(|error| AuthError::Transport(format!("accounts file is corrupt: {error}")))
}

fn write_accounts(file: &mut File, accounts: &AccountsFile) -> Result<(), AuthError> {
    let raw = serde_json::to_vec_pretty(accounts)
        .map_err(|error| AuthError::Transport(error.to_string()))?;

    // Truncate only after the new contents are written; a failed write must
    // not leave an empty accounts file behind.
    file.seek(SeekFrom::Start(0)).map_err(transport)?;
    file.write_all(&raw).map_err(transport)?;
    file.flush().map_err(transport)?;
    file.set_len(raw.len() as u64).map_err(transport)?;
    file.sync_all().map_err(transport)
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

fn transport(error: std::io::Error) -> AuthError {
    AuthError::Transport(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_sign_in_with_same_password() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut service = LocalAuthService::new(dir.path());

        let created = service
            .create_user("a@x.com", "secret1")
            .expect("create should succeed");
        assert_eq!(service.current_user(), Some(created.clone()));

        service.sign_out().expect("sign out");
        let signed_in = service
            .sign_in("a@x.com", "secret1")
            .expect("sign in should succeed");

        assert_eq!(signed_in, created);
    }

    #[test]
    fn rejects_duplicate_email() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut service = LocalAuthService::new(dir.path());
        service.create_user("a@x.com", "secret1").expect("create");

        assert_eq!(
            service.create_user("A@x.com", "other12"),
            Err(AuthError::EmailTaken)
        );
    }

    #[test]
    fn wrong_password_and_unknown_email_are_indistinguishable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut service = LocalAuthService::new(dir.path());
        service.create_user("a@x.com", "secret1").expect("create");
        service.sign_out().expect("sign out");

        assert_eq!(
            service.sign_in("a@x.com", "wrong!!"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            service.sign_in("b@x.com", "secret1"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(service.current_user(), None);
    }

    #[test]
    fn sign_out_without_session_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut service = LocalAuthService::new(dir.path());

        assert_eq!(service.sign_out(), Err(AuthError::NoActiveSession));
    }

    #[test]
    fn accounts_file_never_contains_plain_password() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut service = LocalAuthService::new(dir.path());
        service
            .create_user("a@x.com", "hunter22")
            .expect("create");

        let raw = std::fs::read_to_string(dir.path().join(ACCOUNTS_FILE_NAME)).expect("read");

        assert!(raw.contains("a@x.com"));
        assert!(!raw.contains("hunter22"));
    }

    #[test]
    fn accounts_are_shared_between_service_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        LocalAuthService::new(dir.path())
            .create_user("a@x.com", "secret1")
            .expect("create");

        let mut other = LocalAuthService::new(dir.path());

        assert!(other.sign_in("a@x.com", "secret1").is_ok());
    }

    #[test]
    fn rewrite_replaces_longer_contents_without_leftover_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(ACCOUNTS_FILE_NAME);
        let stale = "x".repeat(4096);
        std::fs::write(&path, &stale).expect("seed accounts file");

        let accounts = AccountsFile {
            accounts: vec![Account {
                email: "a@x.com".to_owned(),
                salt: "salt".to_owned(),
                digest: password_digest("salt", "secret1"),
            }],
        };
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .expect("open accounts file");

        write_accounts(&mut file, &accounts).expect("rewrite should succeed");

        let raw = std::fs::read_to_string(&path).expect("read back");
        let parsed: AccountsFile = serde_json::from_str(&raw).expect("rewritten file parses");
        assert_eq!(parsed.accounts.len(), 1);
        assert_eq!(parsed.accounts[0].email, "a@x.com");
        assert!(!raw.contains("xxxxxxxx"));
    }
}
