//! Command dispatch: bridges CLI args -> api/core calls -> output formatting.

pub mod account;
pub mod config_cmd;
pub mod control;
pub mod devices;
pub mod util;
pub mod watch;

use petlibro_api::ApiClient;
use petlibro_core::ReconcilerConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a cloud-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    api: &ApiClient,
    reconciler: ReconcilerConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if matches!(cmd, Command::Login) {
        return account::login(api, global).await;
    }

    account::ensure_login(api).await?;

    match cmd {
        Command::Devices(args) => devices::list(api, &args, global).await,
        Command::Status { serial } => devices::status(api, &serial, global).await,
        Command::Stats { serial } => devices::stats(api, &serial, global).await,
        Command::Feed { serial, portions } => control::feed(api, &serial, portions, global).await,
        Command::Light { serial, state } => control::light(api, &serial, state, global).await,
        Command::Sound { serial, state } => control::sound(api, &serial, state, global).await,
        Command::Watch(args) => watch::handle(api, &args, reconciler, global).await,
        // Handled before dispatch
        Command::Login | Command::Logout | Command::Config(_) | Command::Completions(_) => {
            unreachable!()
        }
    }
}
