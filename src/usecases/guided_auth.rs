//! Line-oriented sign-in / registration run before the TUI starts.

use std::io;

use crate::domain::identity::Identity;

use super::{
    contracts::AuthService,
    session_gate::{AuthError, SessionGate},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Ask the user whether to sign in or register.
    Choose,
    Register,
}

pub trait AuthTerminal {
    fn print_line(&mut self, line: &str) -> io::Result<()>;
    fn prompt_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
    fn prompt_secret(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

pub struct StdTerminal;

impl AuthTerminal for StdTerminal {
    fn print_line(&mut self, line: &str) -> io::Result<()> {
        println!("{line}");
        Ok(())
    }

    fn prompt_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        use std::io::Write;

        print!("{prompt}");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim().to_owned()))
    }

    fn prompt_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match rpassword::prompt_password(prompt) {
            Ok(password) => Ok(Some(password)),
            Err(source) if source.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(source) => Err(source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuidedAuthOutcome {
    Authenticated(Identity),
    ExitWithGuidance,
}

pub fn run_guided_auth<A: AuthService>(
    terminal: &mut dyn AuthTerminal,
    gate: &mut SessionGate<A>,
    mode: AuthMode,
    retry_policy: &RetryPolicy,
) -> io::Result<GuidedAuthOutcome> {
    let register = match mode {
        AuthMode::Register => true,
        AuthMode::Choose => match choose_register(terminal)? {
            Some(register) => register,
            None => return Ok(GuidedAuthOutcome::ExitWithGuidance),
        },
    };

    for attempt in 1..=retry_policy.attempts {
        let attempts_left = retry_policy.attempts - attempt;

        let (email, password) = match collect_credentials(terminal, register)? {
            Credentials::Entered { email, password } => (email, password),
            Credentials::Mismatch => {
                terminal.print_line(&format!(
                    "Passwords do not match. Attempts left: {attempts_left}"
                ))?;
                continue;
            }
            Credentials::Cancelled => return Ok(GuidedAuthOutcome::ExitWithGuidance),
        };

        let result = if register {
            gate.register(&email, &password)
        } else {
            gate.sign_in(&email, &password)
        };

        match result {
            Ok(identity) => {
                terminal.print_line(&format!("Signed in as {identity}."))?;
                return Ok(GuidedAuthOutcome::Authenticated(identity));
            }
            Err(error) => report_auth_error(terminal, &error, attempts_left)?,
        }
    }

    terminal.print_line("Too many failed attempts. Run flashchat again to retry.")?;
    Ok(GuidedAuthOutcome::ExitWithGuidance)
}

fn choose_register(terminal: &mut dyn AuthTerminal) -> io::Result<Option<bool>> {
    loop {
        let Some(answer) = terminal.prompt_line("[s]ign in or [r]egister? ")? else {
            terminal.print_line("Input cancelled (EOF). Run flashchat again to retry.")?;
            return Ok(None);
        };

        match answer.to_ascii_lowercase().as_str() {
            "s" | "sign in" | "" => return Ok(Some(false)),
            "r" | "register" => return Ok(Some(true)),
            _ => terminal.print_line("Please answer 's' or 'r'.")?,
        }
    }
}

enum Credentials {
    Entered { email: String, password: String },
    Mismatch,
    Cancelled,
}

fn collect_credentials(
    terminal: &mut dyn AuthTerminal,
    register: bool,
) -> io::Result<Credentials> {
    let Some(email) = terminal.prompt_line("Email: ")? else {
        return cancelled(terminal);
    };

    let Some(password) = terminal.prompt_secret("Password: ")? else {
        return cancelled(terminal);
    };

    if register {
        let Some(confirm) = terminal.prompt_secret("Repeat password: ")? else {
            return cancelled(terminal);
        };

        if confirm != password {
            return Ok(Credentials::Mismatch);
        }
    }

    Ok(Credentials::Entered { email, password })
}

fn cancelled(terminal: &mut dyn AuthTerminal) -> io::Result<Credentials> {
    terminal.print_line("Input cancelled (EOF). Run flashchat again to retry.")?;
    Ok(Credentials::Cancelled)
}

fn report_auth_error(
    terminal: &mut dyn AuthTerminal,
    error: &AuthError,
    attempts_left: usize,
) -> io::Result<()> {
    terminal.print_line(&format!(
        "{}: {error}. Attempts left: {attempts_left}",
        error.code()
    ))
}
