use anyhow::Result;
use clap::{Parser, Subcommand};
use mentora_core::api::auth::Credentials;
use mentora_core::http::{ApiClient, Method, ScriptedTransport};
use mentora_core::router::decide;
use mentora_core::storage::FileStore;
use mentora_core::{telemetry, SessionStore};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "xtask", version, about = "Automation helpers for Mentora")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a lightweight smoke test that exercises the Mentora client core.
    Smoke,
}

fn main() -> Result<()> {
    telemetry::init_tracing(EnvFilter::new("info"))?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Smoke => smoke_test(),
    }
}

fn smoke_test() -> Result<()> {
    let runtime = Runtime::new()?;
    let temp_dir = TempDir::new()?;
    let storage = Arc::new(FileStore::open(temp_dir.path().join("storage.json")));

    let transport = Arc::new(ScriptedTransport::new());
    transport.respond(
        Method::POST,
        "auth/login",
        json!({"token": "smoke-token", "user": {"id": 1, "role": "teacher", "username": "smoke"}}),
    );
    let client = ApiClient::with_transport(transport, "http://smoke/api/v1");
    let session = SessionStore::initialize(client, storage.clone());

    let outcome = runtime.block_on(session.login(&Credentials::new("smoke", "smoke")));
    anyhow::ensure!(outcome.success, "smoke login failed: {:?}", outcome.message);

    let decision = decide("/login", &session.snapshot());
    info!(?decision, "guard decision for /login while signed in");

    // A reload over the same storage must see the same session.
    let reloaded = SessionStore::initialize(
        ApiClient::with_transport(Arc::new(ScriptedTransport::new()), "http://smoke/api/v1"),
        storage,
    );
    anyhow::ensure!(reloaded.is_authenticated(), "session did not survive reload");
    info!(token = %reloaded.token(), "smoke session round-tripped");

    Ok(())
}
