use crate::cli::{
    actions::{create_admin, server, Action},
    telemetry,
};
use anyhow::Result;

/// Execute the provided action, then flush any exported spans.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    let result = match action {
        Action::Server(args) => server::execute(args).await,
        Action::CreateAdmin(args) => create_admin::execute(args).await,
    };
    telemetry::shutdown_tracer();
    result
}
