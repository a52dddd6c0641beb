//! `internadmin`: terminal admin console for the internship pipeline.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::ProgressBar;
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use internadmin::api::AdminApi;
use internadmin::config::{self, Settings};
use internadmin::models::{CandidateSnapshot, FileSlot, InternshipKind};
use internadmin::prompt::{ConsolePrompt, Prompt};
use internadmin::viewer::{DoneSignal, PreviewContent, PreviewSession};
use internadmin::workflow::{ActionOutcome, OfferLetterWorkflow, StatusController};

#[derive(Parser)]
#[command(name = "internadmin", version, about = "Admin console for the internship application pipeline")]
struct Cli {
    /// Backend base URL (overrides configuration).
    #[arg(long, env = "INTERNADMIN_BASE_URL", global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Track {
    Free,
    Paid,
}

impl From<Track> for InternshipKind {
    fn from(track: Track) -> Self {
        match track {
            Track::Free => InternshipKind::Free,
            Track::Paid => InternshipKind::Paid,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List applications for a track.
    List {
        #[arg(long, value_enum, default_value = "free")]
        kind: Track,
    },
    /// Accept a pending application.
    Accept {
        id: i64,
        #[arg(long, value_enum, default_value = "free")]
        kind: Track,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Reject a pending application (deletes the applicant's stored data).
    Reject {
        id: i64,
        #[arg(long, value_enum, default_value = "free")]
        kind: Track,
        /// Rejection reason; must match one of the server-supplied options.
        #[arg(long)]
        reason: Option<String>,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Edit profile fields.
    Edit {
        id: i64,
        #[arg(long, value_enum, default_value = "free")]
        kind: Track,
        /// Field assignment, repeatable: --set phone_number=9998887776
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        set: Vec<String>,
    },
    /// Preview an uploaded document.
    View {
        id: i64,
        /// One of: resume, id_proof, project, payment.
        #[arg(value_parser = parse_slot)]
        slot: FileSlot,
        #[arg(long, value_enum, default_value = "free")]
        kind: Track,
        /// Open the preview with the system viewer.
        #[arg(long)]
        open: bool,
    },
    /// Generate, review, and confirm an offer letter.
    Offer {
        id: i64,
        #[arg(long, value_enum, default_value = "paid")]
        kind: Track,
        #[arg(long, default_value = "3 months")]
        duration: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

fn parse_slot(s: &str) -> Result<FileSlot, String> {
    FileSlot::from_str(s)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("internadmin=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = config::load_settings().await;
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url.trim_end_matches('/').to_string();
    }
    settings
        .ensure_directories()
        .context("creating download directory")?;
    let api = AdminApi::new(&settings)?;

    match cli.command {
        Command::List { kind } => cmd_list(api, kind.into()).await,
        Command::Accept { id, kind, yes } => cmd_accept(api, kind.into(), id, yes).await,
        Command::Reject {
            id,
            kind,
            reason,
            yes,
        } => cmd_reject(api, kind.into(), id, reason, yes).await,
        Command::Edit { id, kind, set } => cmd_edit(api, kind.into(), id, &set).await,
        Command::View {
            id,
            slot,
            kind,
            open,
        } => cmd_view(api, kind.into(), id, slot, open).await,
        Command::Offer {
            id,
            kind,
            duration,
            yes,
        } => cmd_offer(api, &settings, kind.into(), id, duration, yes).await,
    }
}

async fn cmd_list(api: AdminApi, kind: InternshipKind) -> anyhow::Result<()> {
    let mut controller = StatusController::new(api, ConsolePrompt::new(), kind);
    controller.refresh().await?;

    let term = Term::stdout();
    let records = controller.records();
    if records.is_empty() {
        term.write_line(&format!("No {kind} applications yet"))?;
        return Ok(());
    }

    term.write_line(&format!(
        "{} {} application(s)",
        style(records.len()).bold(),
        kind
    ))?;
    for record in records {
        let files: Vec<&str> = [
            FileSlot::Resume,
            FileSlot::IdProof,
            FileSlot::Project,
            FileSlot::Payment,
        ]
        .iter()
        .filter(|slot| record.file_reference(**slot).present())
        .map(|slot| slot.as_str())
        .collect();

        term.write_line(&format!(
            "  #{:<5} {:<24} {:<12} {:<9} files: {}",
            record.id,
            record.name.as_deref().unwrap_or("-"),
            record.usn.as_deref().unwrap_or("-"),
            record.status.as_str(),
            if files.is_empty() {
                "none".to_string()
            } else {
                files.join(", ")
            },
        ))?;
    }
    if let Some(at) = controller.refreshed_at() {
        term.write_line(&format!("  as of {}", at.format("%Y-%m-%d %H:%M:%S UTC")))?;
    }
    Ok(())
}

async fn cmd_accept(
    api: AdminApi,
    kind: InternshipKind,
    id: i64,
    yes: bool,
) -> anyhow::Result<()> {
    let prompt = ConsolePrompt::new().assume_yes(yes);
    let mut controller = StatusController::new(api, prompt, kind);
    controller.refresh().await?;
    match controller.accept(id).await? {
        ActionOutcome::Cancelled => {
            eprintln!("Cancelled; nothing sent.");
        }
        // success and warning messages were already surfaced by the controller
        ActionOutcome::Done(_) | ActionOutcome::Warned(_) => {}
    }
    Ok(())
}

async fn cmd_reject(
    api: AdminApi,
    kind: InternshipKind,
    id: i64,
    reason: Option<String>,
    yes: bool,
) -> anyhow::Result<()> {
    let prompt = ConsolePrompt::new().assume_yes(yes).with_preset_choice(reason);
    let mut controller = StatusController::new(api, prompt, kind);
    controller.refresh().await?;
    if matches!(controller.reject(id).await?, ActionOutcome::Cancelled) {
        eprintln!("Cancelled; nothing sent.");
    }
    Ok(())
}

async fn cmd_edit(
    api: AdminApi,
    kind: InternshipKind,
    id: i64,
    pairs: &[String],
) -> anyhow::Result<()> {
    let mut changes = Map::new();
    for pair in pairs {
        let (field, value) = pair
            .split_once('=')
            .with_context(|| format!("'{pair}' is not FIELD=VALUE"))?;
        changes.insert(
            field.trim().to_string(),
            Value::String(value.trim().to_string()),
        );
    }

    let mut controller = StatusController::new(api, ConsolePrompt::new(), kind);
    controller.refresh().await?;
    if matches!(controller.edit(id, changes).await?, ActionOutcome::Cancelled) {
        eprintln!("No editable fields given; nothing sent.");
    }
    Ok(())
}

async fn cmd_view(
    api: AdminApi,
    kind: InternshipKind,
    id: i64,
    slot: FileSlot,
    open: bool,
) -> anyhow::Result<()> {
    let mut controller = StatusController::new(api, ConsolePrompt::new(), kind);
    controller.refresh().await?;
    let mut session = controller.view(id, slot).await?;

    let term = Term::stdout();
    term.write_line(&format!(
        "{} ({})",
        style(session.title()).bold(),
        session.kind()
    ))?;
    if let Some(name) = session.file_name() {
        term.write_line(&format!("  file: {name}"))?;
    }

    match session.content().clone() {
        PreviewContent::PdfEmbed { url } => {
            term.write_line(&format!("  preview (pdf): {url}"))?;
            launch_and_settle(&mut session, open).await;
        }
        PreviewContent::Image { url } => {
            term.write_line(&format!("  preview (image): {url}"))?;
            launch_and_settle(&mut session, open).await;
        }
        PreviewContent::OfficeFrame { viewer_url } => {
            term.write_line(&format!("  preview (office viewer): {viewer_url}"))?;
            // no load signal from the third-party viewer
            if let Some(timeout) = session.pending_reveal_timeout() {
                tokio::time::sleep(timeout).await;
                session.signal(DoneSignal::TimedOut);
            }
        }
        PreviewContent::DownloadOnly => {
            term.write_line("  preview unavailable for this file type; use the download link")?;
        }
    }

    if let Some(download) = session.download_control() {
        term.write_line(&format!("  download: {download}"))?;
    }

    if open && session.display_path().is_some() {
        term.write_str("Press Enter to close the preview... ")?;
        let _ = term.read_line();
    }
    session.close()?;
    Ok(())
}

/// Hand the preview to the system viewer when requested, then deliver the
/// done-signal: spawn success counts as loaded, spawn failure as errored.
async fn launch_and_settle(session: &mut PreviewSession, open: bool) {
    if open {
        let target = session
            .display_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| match session.content() {
                PreviewContent::PdfEmbed { url } | PreviewContent::Image { url } => url.clone(),
                _ => session.download_url().to_string(),
            });
        match which::which("xdg-open") {
            Ok(opener) => match std::process::Command::new(opener).arg(&target).spawn() {
                Ok(_) => session.signal(DoneSignal::Loaded),
                Err(err) => {
                    eprintln!("could not launch viewer: {err}");
                    session.signal(DoneSignal::Errored);
                }
            },
            Err(_) => {
                eprintln!("no system viewer found (xdg-open); showing paths only");
                session.signal(DoneSignal::Errored);
            }
        }
    } else {
        session.signal(DoneSignal::Loaded);
    }
}

async fn cmd_offer(
    api: AdminApi,
    settings: &Settings,
    kind: InternshipKind,
    id: i64,
    duration: String,
    yes: bool,
) -> anyhow::Result<()> {
    let profile = api.get_profile(id, kind).await?;
    let candidate = snapshot_from_profile(&profile, &duration)?;

    let prompt = ConsolePrompt::new().assume_yes(yes);
    let mut workflow = OfferLetterWorkflow::new(api);

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Generating offer letter preview...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    let generated = workflow.generate(candidate).await;
    spinner.finish_and_clear();

    let reference = match generated {
        Ok(draft) => {
            let path = settings.download_dir.join(format!("{}.pdf", draft.file_stem()));
            std::fs::write(&path, &draft.pdf)
                .with_context(|| format!("writing preview to {}", path.display()))?;
            println!(
                "Preview ready: {} (reference {})",
                path.display(),
                style(&draft.reference_number).bold()
            );
            draft.reference_number.clone()
        }
        Err(err) => {
            // inline, and the generating indicator is already gone
            prompt.error(&err.to_string());
            std::process::exit(1);
        }
    };

    let confirmed = prompt
        .confirm("Send the offer email and transfer this candidate to selected?")
        .await?;
    if !confirmed {
        workflow.cancel();
        println!("Draft {reference} discarded; no email sent, no transfer made.");
        return Ok(());
    }

    let outcome = workflow.confirm().await?;
    println!("{}", outcome.summary());
    Ok(())
}

fn snapshot_from_profile(
    profile: &Map<String, Value>,
    duration: &str,
) -> anyhow::Result<CandidateSnapshot> {
    let field = |names: &[&str]| -> Option<String> {
        names
            .iter()
            .find_map(|n| profile.get(*n).and_then(Value::as_str))
            .map(str::to_string)
    };

    let require = |label: &str, value: Option<String>| -> anyhow::Result<String> {
        value.with_context(|| format!("profile is missing '{label}', needed for the offer letter"))
    };

    Ok(CandidateSnapshot {
        name: require("name", field(&["name", "full_name"]))?,
        usn: require("usn", field(&["usn", "roll", "rollno"]))?,
        email: require("email", field(&["email", "applicant_email"]))?,
        college: require("college", field(&["college", "institution"]))?,
        role: require("domain", field(&["domain"]))?,
        mode: field(&["mode_of_interview", "mode"]).unwrap_or_else(|| "Online".to_string()),
        duration: duration.to_string(),
    })
}
