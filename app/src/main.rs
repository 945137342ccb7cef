use clap::{Parser, Subcommand};
use mentora::config::{load_settings, save_settings, CliSettings};
use mentora_core::api::{auth, chat, course};
use mentora_core::{
    router, telemetry, ApiClient, ClientConfig, FileStore, NavigationDecision, Role, SessionStore,
    StreamEvent,
};
use std::io::Write;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "Mentora", version, about = "Command-line client for the Mentora learning platform")]
struct Cli {
    /// Backend base URL; remembered for later invocations.
    #[arg(long)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session.
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Clear the persisted session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Create an account (you still need to log in afterwards).
    Register {
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    /// List available courses.
    Courses,
    /// Fetch learning suggestions from the tutor.
    Advice,
    /// Ask the tutor and stream the reply.
    Chat { message: String },
    /// Show where the navigation guard would send you.
    Route { path: String },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing(EnvFilter::from_default_env())?;

    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = load_settings().await.unwrap_or_else(|err| {
        tracing::warn!(%err, "could not load CLI settings");
        CliSettings::default()
    });
    if let Some(base_url) = &cli.base_url {
        Url::parse(base_url)
            .map_err(|err| anyhow::anyhow!("invalid --base-url {base_url}: {err}"))?;
        settings.base_url = Some(base_url.trim_end_matches('/').to_string());
        save_settings(&settings).await?;
    }

    let mut config = ClientConfig::from_environment()
        .map_err(|err| anyhow::anyhow!(err.user_message()))?;
    if let Some(base_url) = &settings.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(timeout) = settings.timeout_secs {
        config.timeout_secs = timeout;
    }

    let api = ApiClient::new(&config)?;
    let storage = Arc::new(FileStore::user_default());
    let session = SessionStore::initialize(api, storage);

    match cli.command {
        Command::Login { username, password } => {
            let outcome = session
                .login(&auth::Credentials::new(username, password))
                .await;
            if outcome.success {
                let user = session.user();
                let name = user
                    .as_ref()
                    .and_then(|user| user.username.as_deref())
                    .unwrap_or("you");
                println!("Signed in as {name}.");
            } else {
                println!("{}", outcome.message.as_deref().unwrap_or("login failed"));
            }
        }
        Command::Logout => {
            session.logout();
            println!("Signed out.");
        }
        Command::Whoami => match session.user() {
            Some(user) => {
                let name = user.username.as_deref().unwrap_or("(no username)");
                println!("{name} (id {}, role {:?})", user.id, user.role);
            }
            None => println!("Not signed in."),
        },
        Command::Register {
            username,
            password,
            email,
            role,
        } => {
            let role = role.as_deref().map(parse_role).transpose()?;
            let request = auth::RegisterRequest {
                username,
                password,
                email,
                role,
            };
            let outcome = session.register(&request).await;
            let message = outcome.message.as_deref().unwrap_or(if outcome.success {
                "Account created; log in to continue."
            } else {
                "registration failed"
            });
            println!("{message}");
        }
        Command::Courses => {
            let courses = course::list_courses(session.api()).await?;
            if courses.is_empty() {
                println!("No courses yet.");
            }
            for course in courses {
                match course.description {
                    Some(description) => println!("{:>4}  {} — {description}", course.id, course.title),
                    None => println!("{:>4}  {}", course.id, course.title),
                }
            }
        }
        Command::Advice => {
            let advice = chat::learning_advice(session.api()).await?;
            println!("{}", advice.content);
            for suggestion in advice.suggestions {
                println!("  - {suggestion}");
            }
        }
        Command::Chat { message } => {
            let mut stream = chat::stream_reply(session.api(), &message)?;
            let mut stdout = std::io::stdout();
            while let Some(event) = stream.recv().await {
                match event {
                    StreamEvent::Chunk(delta) => {
                        stdout.write_all(delta.as_bytes())?;
                        stdout.flush()?;
                    }
                    StreamEvent::Done(_) => {
                        stdout.write_all(b"\n")?;
                        break;
                    }
                    StreamEvent::Error(message) => {
                        eprintln!("\nstream error: {message}");
                        break;
                    }
                }
            }
        }
        Command::Route { path } => match router::decide(&path, &session.snapshot()) {
            NavigationDecision::Allow => println!("{path}"),
            NavigationDecision::Redirect(target) => println!("{path} -> {target}"),
        },
    }

    Ok(())
}

fn parse_role(raw: &str) -> anyhow::Result<Role> {
    match raw.to_ascii_lowercase().as_str() {
        "student" => Ok(Role::Student),
        "teacher" => Ok(Role::Teacher),
        "admin" => Ok(Role::Admin),
        other => anyhow::bail!("unknown role {other}; expected student, teacher, or admin"),
    }
}
