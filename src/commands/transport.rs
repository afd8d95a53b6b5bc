use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use serde_json::{Map, Value};

use super::{
    Context, ListView, Preview, apply_update, run_csv_batch, run_single_add, set_opt, set_toggle,
    show_listing,
};
use crate::batch::Submission;
use crate::cli::{TransportAdd, TransportCommand, TransportUpdate, flag, toggle};
use crate::error::MailcowError;
use crate::gateway;
use crate::render::{active_mark, field, trunc};
use crate::resource::{ModeDefaults, NormalizedRequest, ResourceKind};

const KIND: ResourceKind = ResourceKind::Transport;

fn or_dash(s: &str) -> String {
    if s.is_empty() { "-".to_string() } else { s.to_string() }
}

fn table_row(transport: &Value) -> Vec<String> {
    vec![
        trunc(&field(transport, "id"), 6),
        field(transport, "destination"),
        field(transport, "nexthop"),
        or_dash(&field(transport, "username")),
        active_mark(transport).to_string(),
    ]
}

fn csv_row(transport: &Value) -> Vec<String> {
    vec![
        field(transport, "id"),
        field(transport, "destination"),
        field(transport, "nexthop"),
        field(transport, "username"),
        match field(transport, "active") {
            a if a.is_empty() => "0".to_string(),
            a => a,
        },
    ]
}

static LIST_VIEW: ListView = ListView {
    empty: "No transport maps found.",
    noun: "transport map(s)",
    max_col: 30,
    table_headers: &["ID", "Destination", "Nexthop", "Username", "Active"],
    table_row,
    csv_headers: &["id", "destination", "nexthop", "username", "active"],
    csv_row,
};

fn describe(request: &NormalizedRequest) -> String {
    format!("{} -> {}", request.get("destination"), request.get("nexthop"))
}

fn preview_row(request: &NormalizedRequest) -> Vec<String> {
    vec![
        request.get("destination").to_string(),
        request.get("nexthop").to_string(),
        or_dash(request.get("username")),
    ]
}

static PREVIEW: Preview = Preview {
    noun: "transport map(s)",
    headers: &["Destination", "Nexthop", "Username"],
    row: preview_row,
    max_col: 35,
};

async fn add(ctx: &Context, args: TransportAdd) -> Result<(), MailcowError> {
    let mut defaults = ModeDefaults::for_kind(KIND);
    defaults.set_opt("active", toggle(args.active, args.no_active).map(flag));

    if args.batch.file.is_some() {
        run_csv_batch(ctx, KIND, &args.batch, &defaults, describe, Some(&PREVIEW)).await?;
        return Ok(());
    }

    let cells = vec![
        args.destination.clone().unwrap_or_default(),
        args.nexthop.clone().unwrap_or_default(),
        args.username.clone(),
        args.password.clone(),
    ];
    match run_single_add(ctx, KIND, cells, args.batch.preview, &defaults).await? {
        Submission::Accepted { request, .. } => {
            if args.batch.preview {
                println!("[PREVIEW] Would create transport map:");
            } else {
                println!("Success: Transport map created");
            }
            println!("  Destination: {}", request.get("destination"));
            println!("  Nexthop: {}", request.get("nexthop"));
            let username = request.get("username");
            if !username.is_empty() {
                println!("  Username: {username}");
            }
            if args.batch.preview {
                println!("  Active: {}", request.get("active"));
            }
        }
        Submission::Failed { error_message, .. } => {
            eprintln!("Failed to create transport map: {error_message}")
        }
    }
    Ok(())
}

pub fn update_attrs(args: &TransportUpdate) -> Map<String, Value> {
    let mut attrs = Map::new();
    set_opt(&mut attrs, "destination", args.destination.clone());
    set_opt(&mut attrs, "nexthop", args.nexthop.clone());
    set_opt(&mut attrs, "username", args.username.clone());
    set_opt(&mut attrs, "password", args.password.clone());
    set_toggle(&mut attrs, "active", args.active, args.no_active);
    attrs
}

fn confirm_delete(ids: &[String]) -> bool {
    println!(
        "About to delete {} transport map(s): {}",
        ids.len(),
        ids.join(", ")
    );
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Continue?")
        .default(false)
        .interact()
        .unwrap_or(false)
}

async fn delete(ctx: &Context, ids: Vec<String>, force: bool) -> Result<(), MailcowError> {
    if ids.is_empty() {
        return Err(MailcowError::usage("At least one transport ID is required"));
    }
    if !force && !confirm_delete(&ids) {
        println!("Aborted.");
        return Ok(());
    }

    let result = gateway::delete(ctx.gateway.as_ref(), KIND, &ids).await?;
    if result.success {
        println!("Success: Deleted {} transport map(s)", ids.len());
    } else {
        eprintln!("Failed to delete transport map(s): {}", result.message);
    }
    Ok(())
}

pub async fn run(ctx: &Context, cmd: TransportCommand) -> Result<(), MailcowError> {
    match cmd {
        TransportCommand::Get { output } => {
            let transports = gateway::list(ctx.gateway.as_ref(), KIND, false).await?;
            show_listing(output, &transports, &LIST_VIEW)
        }
        TransportCommand::Add(args) => add(ctx, args).await,
        TransportCommand::Update(args) => {
            let attrs = update_attrs(&args);
            apply_update(ctx, KIND, &args.transport_id, attrs).await
        }
        TransportCommand::Delete { ids, force } => delete(ctx, ids, force).await,
    }
}
