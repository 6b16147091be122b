use std::io::{self, BufRead, Write as _};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use visionchat::app::AppState;
use visionchat::config::{ClientConfig, ConfigError};
use visionchat::net::types::{ApiError, Detection};
use visionchat::services::auth::{self, AuthError};
use visionchat::services::conversation::{self, AskOutcome};
use visionchat::services::detection::UploadOutcome;
use visionchat::services::intake;
use visionchat::state::analysis::{AnnotatedImageError, AskRejection, DETECTION_FAILED_NOTICE, ImageFile};
use visionchat::state::chat::Role;
use visionchat::state::results::{SortKey, bbox_sort_key};
use visionchat::state::session::{View, initials};

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("not logged in; run `visionchat login <email>` first")]
    NotLoggedIn,
    #[error("unknown sort key `{0}`; expected class_name, confidence or bbox")]
    UnknownSortKey(String),
    #[error("{}", DETECTION_FAILED_NOTICE)]
    DetectionFailed,
    #[error("failed to read {path}: {source}")]
    ReadImage { path: PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    WriteImage { path: PathBuf, source: io::Error },
    #[error("annotated image unavailable: {0}")]
    Annotated(#[from] AnnotatedImageError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "visionchat", about = "Object detection and image chat from the terminal")]
struct Cli {
    /// Overrides `VISION_API_URL`.
    #[arg(long)]
    api_url: Option<String>,

    /// Overrides `VISION_TOKEN_PATH`.
    #[arg(long)]
    token_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and log in.
    Signup(SignupArgs),
    /// Log in and remember the session.
    Login(LoginArgs),
    /// Forget the stored session.
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// Detect objects in an image and optionally ask about them.
    Analyze(AnalyzeArgs),
    /// Detect objects, then ask questions interactively.
    Chat {
        image: PathBuf,
    },
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(env = "VISION_EMAIL")]
    email: String,

    #[arg(long, env = "VISION_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct SignupArgs {
    #[command(flatten)]
    login: LoginArgs,

    /// Defaults to the password.
    #[arg(long)]
    confirm: Option<String>,

    #[arg(long, default_value = "")]
    full_name: String,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    image: PathBuf,

    #[arg(long)]
    sort: Option<String>,

    #[arg(long, default_value_t = false, requires = "sort")]
    desc: bool,

    #[arg(long)]
    annotated_out: Option<PathBuf>,

    /// Repeatable; asked in order after detection.
    #[arg(long)]
    ask: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config.set_api_url(url);
    }
    if let Some(path) = cli.token_path {
        config.token_path = path;
    }
    tracing::debug!(api_url = %config.api_url, "client configured");
    let state = AppState::from_config(&config)?;

    match cli.command {
        Command::Signup(args) => run_signup(&state, args).await,
        Command::Login(args) => run_login(&state, args).await,
        Command::Logout => {
            auth::logout(&state);
            println!("logged out");
            Ok(())
        }
        Command::Whoami => run_whoami(&state).await,
        Command::Analyze(args) => run_analyze(&state, args).await,
        Command::Chat { image } => run_chat(&state, &image).await,
    }
}

// =============================================================================
// ACCOUNT
// =============================================================================

async fn run_signup(state: &AppState, args: SignupArgs) -> Result<(), CliError> {
    let confirm = args.confirm.as_deref().unwrap_or(&args.login.password);
    auth::signup(state, &args.login.email, &args.login.password, confirm, &args.full_name).await?;
    print_identity(state);
    Ok(())
}

async fn run_login(state: &AppState, args: LoginArgs) -> Result<(), CliError> {
    auth::login(state, &args.email, &args.password).await?;
    print_identity(state);
    Ok(())
}

async fn run_whoami(state: &AppState) -> Result<(), CliError> {
    require_session(state).await?;
    print_identity(state);
    Ok(())
}

async fn require_session(state: &AppState) -> Result<(), CliError> {
    match auth::init_session(state).await.view() {
        View::Dashboard => Ok(()),
        View::Loading | View::Unauthenticated => Err(CliError::NotLoggedIn),
    }
}

fn print_identity(state: &AppState) {
    if let Some(user) = state.session().identity {
        let name = user.display_name();
        println!("[{}] {name} <{}>", initials(name), user.email);
    }
}

// =============================================================================
// ANALYSIS
// =============================================================================

async fn upload(state: &AppState, path: &Path) -> Result<(), CliError> {
    let file = ImageFile::from_path(path).map_err(|source| CliError::ReadImage { path: path.to_owned(), source })?;
    match intake::select_file(state, file).await {
        UploadOutcome::Detected { image_id, detections } => {
            tracing::info!(image_id, detections, "image analysed");
            Ok(())
        }
        UploadOutcome::Unauthenticated => Err(CliError::NotLoggedIn),
        UploadOutcome::Failed | UploadOutcome::Stale | UploadOutcome::Ignored => Err(CliError::DetectionFailed),
    }
}

async fn run_analyze(state: &AppState, args: AnalyzeArgs) -> Result<(), CliError> {
    require_session(state).await?;
    upload(state, &args.image).await?;

    if let Some(raw) = &args.sort {
        let key = SortKey::parse(raw).ok_or_else(|| CliError::UnknownSortKey(raw.clone()))?;
        state.select_sort(key);
        if args.desc {
            state.select_sort(key);
        }
    }
    print!("{}", render_table(&state.sorted_detections()));

    if let Some(out) = &args.annotated_out {
        write_annotated(state, out)?;
    }

    for question in &args.ask {
        println!("> {question}");
        print_answer(state, conversation::ask(state, question).await);
    }
    Ok(())
}

fn write_annotated(state: &AppState, out: &Path) -> Result<(), CliError> {
    let Some(image) = state.workspace().analysis().and_then(|a| a.annotated_image.clone()) else {
        return Ok(());
    };
    let bytes = image.decode()?;
    std::fs::write(out, bytes).map_err(|source| CliError::WriteImage { path: out.to_owned(), source })?;
    println!("annotated {} written to {}", image.mime().unwrap_or("image"), out.display());
    Ok(())
}

// =============================================================================
// CHAT
// =============================================================================

async fn run_chat(state: &AppState, image: &Path) -> Result<(), CliError> {
    require_session(state).await?;
    upload(state, image).await?;
    print!("{}", render_table(&state.sorted_detections()));
    println!("ask a question, or :sort KEY, :remove, :quit");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        match line.split_once(' ').unwrap_or((line, "")) {
            (":quit" | ":q", _) => break,
            (":remove", _) => {
                intake::remove_image(state);
                println!("image removed");
                break;
            }
            (":sort", raw) => match SortKey::parse(raw.trim()) {
                Some(key) => {
                    let spec = state.select_sort(key);
                    tracing::debug!(?spec, "sort selected");
                    print!("{}", render_table(&state.sorted_detections()));
                }
                None => eprintln!("{}", CliError::UnknownSortKey(raw.trim().to_owned())),
            },
            _ => {
                state.set_draft(line);
                print_answer(state, conversation::ask_draft(state).await);
            }
        }
    }
    Ok(())
}

fn print_answer(state: &AppState, outcome: AskOutcome) {
    match outcome {
        AskOutcome::Answered | AskOutcome::FellBack => {
            let ws = state.workspace();
            if let Some(reply) = ws.thread().messages().last().filter(|m| m.role == Role::Assistant) {
                println!("{}", reply.content);
            }
        }
        AskOutcome::Rejected(rejection) => {
            if let Some(reason) = rejection_message(rejection) {
                eprintln!("{reason}");
            }
        }
        AskOutcome::Unauthenticated => eprintln!("{}", CliError::NotLoggedIn),
        AskOutcome::Stale => {}
    }
}

fn rejection_message(rejection: AskRejection) -> Option<&'static str> {
    match rejection {
        AskRejection::EmptyQuestion => None,
        AskRejection::NoImage => Some("upload an image first"),
        AskRejection::NoDetections => Some("no objects were detected; upload another image to chat"),
        AskRejection::Busy => Some("still waiting for the previous answer"),
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

/// Plain-text detection table. An empty result gets a one-line message.
fn render_table(rows: &[Detection]) -> String {
    if rows.is_empty() {
        return "no objects detected\n".to_owned();
    }
    let width = rows.iter().map(|d| d.class_name.len()).max().unwrap_or(0).max("class".len());
    let mut out = format!("{:>3}  {:<width$}  {:>10}  bbox\n", "#", "class", "confidence");
    for (i, d) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}  {:<width$}  {:>9.1}%  {}\n",
            i + 1,
            d.class_name,
            d.confidence * 100.0,
            bbox_sort_key(&d.bbox)
        ));
    }
    out
}
