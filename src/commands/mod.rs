//! Command drivers: glue between the CLI, the batch engine and rendering.

pub mod alias;
pub mod jobs;
pub mod mailbox;
pub mod transport;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};

use crate::batch::{self, Outcome, Submission};
use crate::cli::{BatchArgs, CliArgs, Command};
use crate::client::MailcowClient;
use crate::config::{MailcowConfig, Profile, Settings, load_config};
use crate::error::MailcowError;
use crate::gateway::{self, Gateway};
use crate::input;
use crate::render::{self, OutputFormat};
use crate::report::{self, Summary};
use crate::resource::{ModeDefaults, NormalizedRequest, ResourceKind};
use crate::validate;

pub struct Context {
    pub gateway: Box<dyn Gateway>,
    pub config: MailcowConfig,
    pub profile: Profile,
}

pub async fn dispatch(args: CliArgs) -> Result<(), MailcowError> {
    let config = load_config(args.config.as_deref())?;
    let profile = config.profile(args.profile.as_deref())?;
    let settings = Settings::resolve(args.api_url.as_deref(), args.api_key.as_deref(), &profile)?;
    let client = MailcowClient::new(&settings.api_url, &settings.api_key)?;
    let ctx = Context {
        gateway: Box::new(client),
        config,
        profile,
    };

    match args.command {
        Command::Jobs(cmd) => jobs::run(&ctx, cmd).await,
        Command::Mailbox(cmd) => mailbox::run(&ctx, cmd).await,
        Command::Alias(cmd) => alias::run(&ctx, cmd).await,
        Command::Transport(cmd) => transport::run(&ctx, cmd).await,
    }
}

fn title(kind: ResourceKind) -> String {
    let label = kind.to_string();
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => label,
    }
}

/// How one kind presents its rows in a preview listing.
pub struct Preview {
    pub noun: &'static str,
    pub headers: &'static [&'static str],
    pub row: fn(&NormalizedRequest) -> Vec<String>,
    pub max_col: usize,
}

fn progress_bar(len: usize) -> Result<ProgressBar, MailcowError> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .map_err(|e| MailcowError::Other(e.to_string()))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn print_outcome(outcome: &Outcome, preview: bool, describe: fn(&NormalizedRequest) -> String) {
    match outcome {
        Outcome::Accepted { request, .. } if preview => {
            println!("[PREVIEW] {}", describe(request))
        }
        Outcome::Accepted { request, .. } => println!("Created: {}", describe(request)),
        Outcome::Rejected { row_number, reason } => {
            eprintln!("Row {row_number}: Skipping - {reason}")
        }
        Outcome::Failed {
            identifier,
            error_message,
            ..
        } => eprintln!("Error for {identifier}: {error_message}"),
    }
}

/// Runs a CSV batch and prints the per-row lines plus the closing report.
///
/// With a [`Preview`] table, previewed rows are collected and printed as
/// one listing; without one each previewed row gets its own line.
pub async fn run_csv_batch(
    ctx: &Context,
    kind: ResourceKind,
    batch_args: &BatchArgs,
    defaults: &ModeDefaults,
    describe: fn(&NormalizedRequest) -> String,
    preview_table: Option<&Preview>,
) -> Result<Summary, MailcowError> {
    let Some(path) = &batch_args.file else {
        return Err(MailcowError::usage("Batch mode requires -f/--file"));
    };
    let rows = input::read_csv(path)?;
    let preview = batch_args.preview;
    let per_row_preview = preview && preview_table.is_none();

    let counted = rows
        .iter()
        .filter(|row| !validate::is_skipped(kind, row.row_number, &row.cells))
        .count();
    let pb = progress_bar(counted)?;
    pb.set_message(format!("Adding {kind} rows"));
    let result = batch::run_batch(
        ctx.gateway.as_ref(),
        kind,
        &rows,
        preview,
        defaults,
        |outcome| {
            pb.inc(1);
            if outcome.is_accepted() && preview && !per_row_preview {
                return;
            }
            pb.suspend(|| print_outcome(outcome, preview, describe));
        },
    )
    .await;
    pb.finish_and_clear();

    let summary = report::summarize(&result);

    if let (true, Some(view)) = (preview, preview_table) {
        if !summary.accepted.is_empty() {
            let rows: Vec<Vec<String>> = summary
                .accepted
                .iter()
                .map(|entry| (view.row)(&entry.request))
                .collect();
            print!(
                "{}",
                render::render(batch_args.output, view.headers, &rows, view.max_col)?
            );
            if batch_args.output == OutputFormat::Table {
                println!("\nTotal: {} {} to create", summary.accepted_count, view.noun);
            }
            return Ok(summary);
        }
    }

    println!(
        "\nCompleted: {} created, {} errors",
        summary.accepted_count, summary.rejected_count
    );
    Ok(summary)
}

/// Prints the created accounts and their passwords once, after the batch.
/// They are not kept anywhere else.
pub fn print_credentials(summary: &Summary, output: OutputFormat) -> Result<(), MailcowError> {
    let credentials = summary.accounts();
    if credentials.is_empty() {
        return Ok(());
    }
    let rows: Vec<Vec<String>> = credentials
        .into_iter()
        .map(|c| vec![c.identifier, c.password, c.name])
        .collect();
    if output != OutputFormat::Json {
        println!("\n--- Generated credentials ---");
    }
    print!(
        "{}",
        render::render(output, &["Email", "Password", "Name"], &rows, CREDENTIALS_MAX_COL)?
    );
    Ok(())
}

const CREDENTIALS_MAX_COL: usize = 32;

/// Single-record add. Transport failures propagate; API refusals are
/// reported and the command still succeeds.
pub async fn run_single_add(
    ctx: &Context,
    kind: ResourceKind,
    cells: Vec<String>,
    preview: bool,
    defaults: &ModeDefaults,
) -> Result<Submission, MailcowError> {
    batch::run_single(ctx.gateway.as_ref(), kind, &cells, preview, defaults).await
}

/// Keys whose values are never echoed back.
fn is_secret(key: &str) -> bool {
    key.starts_with("password")
}

pub async fn apply_update(
    ctx: &Context,
    kind: ResourceKind,
    id: &str,
    attrs: Map<String, Value>,
) -> Result<(), MailcowError> {
    if attrs.is_empty() {
        return Err(MailcowError::usage(
            "No updates specified. Use --help to see available options.",
        ));
    }
    let result = gateway::update(ctx.gateway.as_ref(), kind, id, &attrs).await?;
    if result.success {
        println!("Success: {} {id} updated", title(kind));
        for (key, value) in &attrs {
            if key == "password2" {
                continue;
            }
            let shown = match value {
                _ if is_secret(key) => "********".to_string(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            println!("  {key}: {shown}");
        }
    } else {
        eprintln!("Failed to update {kind} {id}: {}", result.message);
    }
    Ok(())
}

/// How one kind presents its API listing.
pub struct ListView {
    pub empty: &'static str,
    pub noun: &'static str,
    pub max_col: usize,
    pub table_headers: &'static [&'static str],
    pub table_row: fn(&Value) -> Vec<String>,
    pub csv_headers: &'static [&'static str],
    pub csv_row: fn(&Value) -> Vec<String>,
}

pub fn show_listing(output: OutputFormat, items: &[Value], view: &ListView) -> Result<(), MailcowError> {
    if items.is_empty() {
        println!("{}", view.empty);
        return Ok(());
    }
    match output {
        OutputFormat::Json => println!("{}", render::pretty_json(items)?),
        OutputFormat::Csv => {
            let rows: Vec<_> = items.iter().map(view.csv_row).collect();
            print!("{}", render::csv_rows(view.csv_headers, &rows)?);
        }
        OutputFormat::Table => {
            let rows: Vec<_> = items.iter().map(view.table_row).collect();
            print!("{}", render::table(view.table_headers, &rows, view.max_col));
            println!("\nTotal: {} {}", items.len(), view.noun);
        }
    }
    Ok(())
}

/// Inserts `"1"`/`"0"` for a `--x/--no-x` pair when either was given.
pub fn set_toggle(attrs: &mut Map<String, Value>, key: &str, on: bool, off: bool) {
    if let Some(value) = crate::cli::toggle(on, off) {
        attrs.insert(key.to_string(), Value::from(crate::cli::flag(value)));
    }
}

pub fn set_opt(attrs: &mut Map<String, Value>, key: &str, value: Option<String>) {
    if let Some(value) = value {
        attrs.insert(key.to_string(), Value::String(value));
    }
}
