//! examgate - a command line client for the exam portal.
//!
//! Signs in to the portal, keeps the session between runs, and shows the
//! countdown to the exam start.

mod cli;

use std::future::Future;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::ArgMatches;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use examgate_core::api::{ApiClient, ApiError};
use examgate_core::auth::{SessionStore, DEFAULT_ROLE};
use examgate_core::config::Config;
use examgate_core::countdown::{
    CountdownEngine, CountdownRefresher, ExamCountdownProvider, RefreshOutcome, RefreshTrigger,
    RemainingTimeProvider, UserStatsProvider,
};
use examgate_core::models::{CountdownSnapshot, LoginRequest, RegisterRequest, VerifyRequest};

// ============================================================================
// Constants
// ============================================================================

/// How often the live countdown line is redrawn
const RENDER_INTERVAL: Duration = Duration::from_secs(1);

/// Shown when the server rejects the credential, either a stored session
/// or a fresh login attempt
const NOT_SIGNED_IN_MESSAGE: &str =
    "Not signed in: the session expired or the credentials were rejected. Run `examgate login` to sign in.";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Everything a command needs: configuration and a client bound to the
/// restored session.
struct App {
    config: Config,
    client: ApiClient,
}

impl App {
    fn build() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        let storage = config.open_storage()?;
        let session = SessionStore::load(storage).into_shared();

        // Stands in for the login screen: tell the user how to sign in again.
        let redirect = Arc::new(|| eprintln!("\n{}", NOT_SIGNED_IN_MESSAGE));
        let client = ApiClient::new(&config.api_base_url(), session, redirect)?;

        Ok(Self { config, client })
    }
}

/// Attach the user-facing message to an API error.
fn api_failure(error: ApiError) -> anyhow::Error {
    let message = error.user_message();
    anyhow::Error::new(error).context(message)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let matches = cli::new().get_matches();
    let mut app = App::build()?;
    info!(api = %app.config.api_base_url(), "examgate starting");

    match matches.subcommand() {
        Some(("login", sub)) => login(&mut app, sub).await,
        Some(("logout", _)) => logout(&app).await,
        Some(("register", sub)) => register(&app, sub).await,
        Some(("verify", sub)) => verify(&app, sub).await,
        Some(("status", _)) => status(&app).await,
        Some(("countdown", sub)) => countdown(&app, sub).await,
        Some(("watch", sub)) => watch_command(&app, sub).await,
        _ => Err(anyhow!("Unknown command, see --help")),
    }
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn required_arg(matches: &ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| anyhow!("Missing --{}", name))
}

async fn login(app: &mut App, matches: &ArgMatches) -> Result<()> {
    let phone_number = match matches.get_one::<String>("phone") {
        Some(phone) => phone.clone(),
        None => match app.config.last_phone_number.clone() {
            Some(last) => last,
            None => prompt("Phone number: ")?,
        },
    };
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    let remember = !matches.get_flag("no-remember");

    let request = LoginRequest {
        phone_number: phone_number.clone(),
        password,
    };
    let found = app.client.login(&request, remember).await.map_err(api_failure)?;

    app.config.last_phone_number = Some(phone_number);
    app.config.save().context("Failed to save configuration")?;

    match found {
        Some(credentials) => {
            let role = credentials.role.as_deref().unwrap_or(DEFAULT_ROLE);
            println!("Signed in as {}.", role);
            if !remember {
                println!("The session will not be kept after this run.");
            }
        }
        None => println!("Login accepted, but the server returned no session token."),
    }
    Ok(())
}

async fn logout(app: &App) -> Result<()> {
    app.client.logout().await;
    println!("Signed out.");
    Ok(())
}

async fn register(app: &App, matches: &ArgMatches) -> Result<()> {
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    let confirm = rpassword::prompt_password("Repeat password: ").context("Failed to read password")?;
    if password != confirm {
        return Err(anyhow!("Passwords do not match"));
    }

    let phone_number = required_arg(matches, "phone")?;
    let request = RegisterRequest {
        firstname: required_arg(matches, "firstname")?,
        lastname: required_arg(matches, "lastname")?,
        class_name: required_arg(matches, "class")?,
        language: required_arg(matches, "language")?,
        phone_number: phone_number.clone(),
        password,
    };
    app.client.register(&request).await.map_err(api_failure)?;

    println!("Registration submitted. Confirm it with:");
    println!("  examgate verify --phone {} --code <SMS code>", phone_number);
    Ok(())
}

async fn verify(app: &App, matches: &ArgMatches) -> Result<()> {
    let request = VerifyRequest {
        phone_number: required_arg(matches, "phone")?,
        sms_code: required_arg(matches, "code")?,
    };
    app.client.verify(&request).await.map_err(api_failure)?;
    println!("Phone number verified. You can now run `examgate login`.");
    Ok(())
}

async fn status(app: &App) -> Result<()> {
    let session = app.client.session().read().await;
    println!("API:      {}", app.config.api_base_url());
    if session.is_authenticated() {
        println!("Session:  signed in");
        println!("Role:     {}", session.role().unwrap_or("no role"));
    } else {
        println!("Session:  signed out");
    }
    Ok(())
}

async fn countdown(app: &App, matches: &ArgMatches) -> Result<()> {
    let snapshot = if matches.get_flag("stats") {
        app.client.fetch_user_stats().await
    } else {
        app.client.fetch_countdown(app.config.exam_id).await
    }
    .map_err(api_failure)?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let mut engine = CountdownEngine::manual();
    engine.deliver(snapshot);
    println!("{}  {}", engine.breakdown(), engine.status_text());
    Ok(())
}

async fn watch_command(app: &App, matches: &ArgMatches) -> Result<()> {
    let interval = app
        .config
        .refresh_interval_or(matches.get_one::<u64>("interval").copied());

    if matches.get_flag("stats") {
        watch(UserStatsProvider::new(app.client.clone()), interval).await
    } else {
        let provider = ExamCountdownProvider::new(app.client.clone(), app.config.exam_id);
        watch(provider, interval).await
    }
}

/// Live countdown until Ctrl+C.
async fn watch<P>(provider: P, interval: Duration) -> Result<()>
where
    P: RemainingTimeProvider + 'static,
{
    watch_until(provider, interval, tokio::signal::ctrl_c(), draw).await?;
    println!();
    Ok(())
}

/// A fetch result handed back from its task.
type Fetched = (RefreshTrigger, Result<CountdownSnapshot, ApiError>);

/// Drive the countdown until `shutdown` resolves. Fetches run on their own
/// task, so a slow or retrying request never holds up `render`.
async fn watch_until<P, S, R>(
    provider: P,
    interval: Duration,
    shutdown: S,
    mut render: R,
) -> Result<CountdownEngine>
where
    P: RemainingTimeProvider + 'static,
    S: Future,
    R: FnMut(&CountdownEngine) -> Result<()>,
{
    let mut engine = CountdownEngine::new();
    let mut refresher = CountdownRefresher::new(Arc::new(provider));
    let (tx, mut rx) = mpsc::channel::<Fetched>(1);

    spawn_fetch(&refresher, RefreshTrigger::Mount, tx.clone());
    let mut in_flight = true;

    let mut refresh = time::interval_at(Instant::now() + interval, interval);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut redraw = time::interval(RENDER_INTERVAL);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = refresh.tick(), if !in_flight => {
                spawn_fetch(&refresher, refresher.next_trigger(), tx.clone());
                in_flight = true;
            }
            Some((trigger, result)) = rx.recv() => {
                in_flight = false;
                report(refresher.record(&mut engine, trigger, result));
            }
            _ = redraw.tick() => render(&engine)?,
        }
    }

    engine.dispose();
    Ok(engine)
}

fn spawn_fetch<P>(
    refresher: &CountdownRefresher<Arc<P>>,
    trigger: RefreshTrigger,
    tx: mpsc::Sender<Fetched>,
) where
    P: RemainingTimeProvider + 'static,
{
    let provider = Arc::clone(refresher.provider());
    tokio::spawn(async move {
        let result = provider.fetch_snapshot().await;
        // The receiver is gone once watching stopped
        let _ = tx.send((trigger, result)).await;
    });
}

fn report(outcome: RefreshOutcome) {
    if let RefreshOutcome::Failed(e) = outcome {
        if !e.is_unauthorized() {
            eprintln!("\n{}", e.user_message());
        }
    }
}

fn draw(engine: &CountdownEngine) -> Result<()> {
    let synced = engine
        .synced_at()
        .map(|at| format!("synced {}s ago", (Utc::now() - at).num_seconds().max(0)))
        .unwrap_or_else(|| "not synced".to_string());

    let mut stdout = io::stdout();
    write!(
        stdout,
        "\r{}  {}  ({})\x1b[K",
        engine.breakdown(),
        engine.status_text(),
        synced
    )?;
    stdout.flush()?;
    Ok(())
}
