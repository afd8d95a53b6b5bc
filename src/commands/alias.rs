use serde_json::{Map, Value};

use super::mailbox::in_domain;
use super::{
    Context, ListView, Preview, apply_update, run_csv_batch, run_single_add, set_opt, set_toggle,
    show_listing,
};
use crate::batch::Submission;
use crate::cli::{AliasAdd, AliasCommand, AliasUpdate, flag, toggle};
use crate::error::MailcowError;
use crate::gateway;
use crate::render::{OutputFormat, active_mark, field, trunc};
use crate::resource::{ModeDefaults, NormalizedRequest, ResourceKind};

const KIND: ResourceKind = ResourceKind::Alias;
const GOTO_PREVIEW_CHARS: usize = 50;

fn table_row(alias: &Value) -> Vec<String> {
    vec![
        trunc(&field(alias, "id"), 6),
        field(alias, "address"),
        field(alias, "goto"),
        active_mark(alias).to_string(),
    ]
}

fn csv_row(alias: &Value) -> Vec<String> {
    vec![
        field(alias, "id"),
        field(alias, "address"),
        field(alias, "goto"),
        match field(alias, "active") {
            a if a.is_empty() => "0".to_string(),
            a => a,
        },
    ]
}

static LIST_VIEW: ListView = ListView {
    empty: "No aliases found.",
    noun: "alias(es)",
    max_col: 35,
    table_headers: &["ID", "Address", "Goto", "Active"],
    table_row,
    csv_headers: &["id", "address", "goto", "active"],
    csv_row,
};

/// Long destination lists are cut to keep one line per alias.
fn describe(request: &NormalizedRequest) -> String {
    let goto = request.get("goto");
    let mut shown: String = goto.chars().take(GOTO_PREVIEW_CHARS).collect();
    if goto.chars().count() > GOTO_PREVIEW_CHARS {
        shown.push_str("...");
    }
    format!("{} -> {shown}", request.get("address"))
}

fn preview_row(request: &NormalizedRequest) -> Vec<String> {
    vec![
        request.get("address").to_string(),
        request.get("goto").to_string(),
    ]
}

static PREVIEW: Preview = Preview {
    noun: "alias(es)",
    headers: &["Address", "Goto"],
    row: preview_row,
    max_col: 40,
};

fn add_defaults(args: &AliasAdd) -> ModeDefaults {
    let mut defaults = ModeDefaults::for_kind(KIND);
    defaults
        .set_opt("active", toggle(args.active, args.no_active).map(flag))
        .set_opt("sogo_visible", toggle(args.sogo_visible, args.no_sogo_visible).map(flag));
    defaults
}

async fn add(ctx: &Context, args: AliasAdd) -> Result<(), MailcowError> {
    let defaults = add_defaults(&args);

    if args.batch.file.is_some() {
        run_csv_batch(ctx, KIND, &args.batch, &defaults, describe, Some(&PREVIEW)).await?;
        return Ok(());
    }

    let cells = vec![
        args.address.clone().unwrap_or_default(),
        args.goto.clone().unwrap_or_default(),
    ];
    match run_single_add(ctx, KIND, cells, args.batch.preview, &defaults).await? {
        Submission::Accepted { request, .. } => {
            if args.batch.preview {
                println!("[PREVIEW] Would create alias:");
            } else {
                println!("Success: Alias created");
            }
            println!("  Address: {}", request.get("address"));
            println!("  Goto: {}", request.get("goto"));
            if args.batch.preview {
                println!("  Active: {}", request.get("active"));
            }
        }
        Submission::Failed {
            identifier,
            error_message,
            ..
        } => eprintln!("Failed to create alias {identifier}: {error_message}"),
    }
    Ok(())
}

pub fn update_attrs(args: &AliasUpdate) -> Map<String, Value> {
    let mut attrs = Map::new();
    set_opt(&mut attrs, "address", args.address.clone());
    set_opt(&mut attrs, "goto", args.goto.clone());
    set_toggle(&mut attrs, "active", args.active, args.no_active);
    set_toggle(&mut attrs, "sogo_visible", args.sogo_visible, args.no_sogo_visible);
    attrs
}

async fn get(ctx: &Context, output: OutputFormat, domain: Option<String>) -> Result<(), MailcowError> {
    let aliases = gateway::list(ctx.gateway.as_ref(), KIND, false).await?;
    if aliases.is_empty() {
        println!("{}", LIST_VIEW.empty);
        return Ok(());
    }
    let aliases = in_domain(aliases, domain.as_deref());
    if let (true, Some(domain)) = (aliases.is_empty(), &domain) {
        println!("No aliases found for domain: {domain}");
        return Ok(());
    }
    show_listing(output, &aliases, &LIST_VIEW)
}

pub async fn run(ctx: &Context, cmd: AliasCommand) -> Result<(), MailcowError> {
    match cmd {
        AliasCommand::Get { output, domain } => get(ctx, output, domain).await,
        AliasCommand::Add(args) => add(ctx, args).await,
        AliasCommand::Update(args) => {
            let attrs = update_attrs(&args);
            apply_update(ctx, KIND, &args.alias_id, attrs).await
        }
    }
}
