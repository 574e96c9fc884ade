use anyhow::Result;

use crate::{
    cli::{Cli, Command},
    domain, infra, remote, ui,
    usecases::{
        self, bootstrap,
        guided_auth::{run_guided_auth, AuthMode, GuidedAuthOutcome, RetryPolicy, StdTerminal},
    },
};

const SHELL_BOOTSTRAP_FAILED: &str = "SHELL_BOOTSTRAP_FAILED";

pub fn run(cli: Cli) -> Result<()> {
    let mode = match cli.command_or_default() {
        Command::Run => AuthMode::Choose,
        Command::Register => AuthMode::Register,
    };

    let context = bootstrap::bootstrap(cli.config.as_deref())?;
    tracing::debug!(
        ui = ui::module_name(),
        domain = domain::module_name(),
        remote = remote::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );

    let mut gate = context.session_gate();
    let outcome = run_guided_auth(&mut StdTerminal, &mut gate, mode, &RetryPolicy::default())?;

    let GuidedAuthOutcome::Authenticated(identity) = outcome else {
        tracing::info!("guided authentication ended without a session");
        return Ok(());
    };

    tracing::info!(identity = %identity, "authenticated, starting shell");

    let mut shell = match bootstrap::compose_shell(&context, gate) {
        Ok(shell) => shell,
        Err(error) => {
            report_shell_bootstrap_failure(&error);
            return Err(error);
        }
    };

    ui::shell::start(
        &context,
        shell.event_source.as_mut(),
        shell.orchestrator.as_mut(),
    )
}

fn report_shell_bootstrap_failure(error: &anyhow::Error) {
    tracing::error!(
        code = SHELL_BOOTSTRAP_FAILED,
        error = ?error,
        "chat shell failed to start after authentication"
    );

    for line in shell_fallback_lines(SHELL_BOOTSTRAP_FAILED) {
        eprintln!("{line}");
    }
}

fn shell_fallback_lines(error_code: &str) -> [String; 2] {
    [
        format!("{error_code}: the chat shell failed to start."),
        "Your account is saved. Run flashchat again and sign in.".to_owned(),
    ]
}
