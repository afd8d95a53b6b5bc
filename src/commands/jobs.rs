use serde_json::{Map, Value};

use super::{Context, ListView, apply_update, run_csv_batch, run_single_add, set_opt, set_toggle, show_listing};
use crate::batch::Submission;
use crate::cli::{JobsAdd, JobsCommand, JobsUpdate, flag, toggle};
use crate::error::MailcowError;
use crate::gateway;
use crate::render::{active_mark, field, trunc};
use crate::resource::{ModeDefaults, NormalizedRequest, ResourceKind};

const KIND: ResourceKind = ResourceKind::SyncJob;

fn table_row(job: &Value) -> Vec<String> {
    let username = match field(job, "username") {
        u if u.is_empty() => field(job, "user2"),
        u => u,
    };
    vec![
        trunc(&field(job, "id"), 6),
        username,
        field(job, "user1"),
        field(job, "host1"),
        active_mark(job).to_string(),
    ]
}

fn csv_row(job: &Value) -> Vec<String> {
    let username = match field(job, "username") {
        u if u.is_empty() => field(job, "user2"),
        u => u,
    };
    let active = match field(job, "active") {
        a if a.is_empty() => "0".to_string(),
        a => a,
    };
    vec![
        field(job, "id"),
        username,
        field(job, "user1"),
        field(job, "host1"),
        active,
    ]
}

static LIST_VIEW: ListView = ListView {
    empty: "No sync jobs found.",
    noun: "sync job(s)",
    max_col: 24,
    table_headers: &["ID", "Username (dest)", "User1 (src)", "Host1 (src)", "Active"],
    table_row,
    csv_headers: &["id", "username", "user1", "host1", "active"],
    csv_row,
};

fn describe(request: &NormalizedRequest) -> String {
    format!("{} -> {}", request.get("user1"), request.get("username"))
}

/// `--dry` goes in front of whatever custom parameters were given.
pub fn with_dry(params: &str, dry: bool) -> String {
    if dry {
        format!("--dry {params}").trim().to_string()
    } else {
        params.to_string()
    }
}

pub fn without_dry(params: &str) -> String {
    params.replace("--dry", "").trim().to_string()
}

/// Built-in imapsync tuning, then `[sync_defaults]` from the config, then
/// whatever was passed on the command line.
fn add_defaults(ctx: &Context, args: &JobsAdd) -> Result<ModeDefaults, MailcowError> {
    let host1 = args
        .host1
        .clone()
        .or_else(|| ctx.profile.src_host.clone())
        .ok_or_else(|| MailcowError::usage("Missing option '--host1' (env: MAILCOW_SRC_HOST)"))?;

    let mut defaults = ModeDefaults::for_kind(KIND);
    defaults.merge(ctx.config.sync_overrides());
    defaults
        .set("host1", host1)
        .set_opt("port1", args.port1.clone())
        .set_opt("enc1", args.enc1.map(|e| e.as_str()))
        .set_opt("mins_interval", args.mins_interval.clone())
        .set_opt("exclude", args.exclude.clone());

    for (key, on, off) in [
        ("delete2duplicates", args.delete2duplicates, args.no_delete2duplicates),
        ("automap", args.automap, args.no_automap),
        ("subscribeall", args.subscribeall, args.no_subscribeall),
        ("active", args.active, args.no_active),
    ] {
        defaults.set_opt(key, toggle(on, off).map(flag));
    }

    let base = defaults.get("custom_params").unwrap_or_default().to_string();
    let params = if args.custom_params.is_empty() {
        base
    } else {
        args.custom_params.clone()
    };
    defaults.set("custom_params", with_dry(&params, args.dry));
    Ok(defaults)
}

async fn add(ctx: &Context, args: JobsAdd) -> Result<(), MailcowError> {
    let defaults = add_defaults(ctx, &args)?;

    if args.batch.file.is_some() {
        run_csv_batch(ctx, KIND, &args.batch, &defaults, describe, None).await?;
        return Ok(());
    }

    let cells = [&args.user1, &args.password1, &args.username]
        .into_iter()
        .map(|v| v.clone().unwrap_or_default())
        .collect();
    let outcome = run_single_add(ctx, KIND, cells, args.batch.preview, &defaults).await?;

    match outcome {
        Submission::Accepted { request, .. } => {
            let source = format!(
                "{}@{}:{} ({})",
                request.get("user1"),
                request.get("host1"),
                request.get("port1"),
                request.get("enc1")
            );
            if args.batch.preview {
                println!("[PREVIEW] Would create sync job:");
                println!("  Source: {source}");
                println!("  Destination: {}", request.get("username"));
                println!(
                    "  Options: interval={}min, active={}, automap={}",
                    request.get("mins_interval"),
                    request.get("active"),
                    request.get("automap")
                );
                let params = request.get("custom_params");
                if !params.is_empty() {
                    println!("  Custom params: {params}");
                }
            } else {
                println!("Success: Sync job created for {}", request.get("username"));
                println!("  Source: {source}");
            }
        }
        Submission::Failed {
            identifier,
            error_message,
            ..
        } => eprintln!("Failed to create sync job for {identifier}: {error_message}"),
    }
    Ok(())
}

pub fn update_attrs(args: &JobsUpdate) -> Map<String, Value> {
    let mut attrs = Map::new();
    set_opt(&mut attrs, "host1", args.host1.clone());
    set_opt(&mut attrs, "port1", args.port1.clone());
    set_opt(&mut attrs, "enc1", args.enc1.map(|e| e.as_str().to_string()));
    set_opt(&mut attrs, "user1", args.user1.clone());
    set_opt(&mut attrs, "password1", args.password1.clone());
    set_opt(&mut attrs, "mins_interval", args.mins_interval.clone());
    set_opt(&mut attrs, "exclude", args.exclude.clone());
    set_toggle(&mut attrs, "delete2duplicates", args.delete2duplicates, args.no_delete2duplicates);
    set_toggle(&mut attrs, "automap", args.automap, args.no_automap);
    set_toggle(&mut attrs, "subscribeall", args.subscribeall, args.no_subscribeall);
    set_toggle(&mut attrs, "active", args.active, args.no_active);

    let mut params = args.custom_params.clone();
    if args.dry {
        params = Some(with_dry(params.as_deref().unwrap_or_default(), true));
    }
    if args.no_dry {
        params = params.map(|p| without_dry(&p));
    }
    set_opt(&mut attrs, "custom_params", params);
    attrs
}

pub async fn run(ctx: &Context, cmd: JobsCommand) -> Result<(), MailcowError> {
    match cmd {
        JobsCommand::Get {
            output,
            include_log,
        } => {
            let jobs = gateway::list(ctx.gateway.as_ref(), KIND, include_log).await?;
            show_listing(output, &jobs, &LIST_VIEW)
        }
        JobsCommand::Add(args) => add(ctx, args).await,
        JobsCommand::Update(args) => {
            let attrs = update_attrs(&args);
            apply_update(ctx, KIND, &args.job_id, attrs).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{CliArgs, Command};
    use clap::Parser;
    use serde_json::json;

    fn parse_update(extra: &[&str]) -> JobsUpdate {
        let mut argv = vec!["mailcow-cli", "jobs", "update", "5"];
        argv.extend_from_slice(extra);
        match CliArgs::try_parse_from(argv).unwrap().command {
            Command::Jobs(JobsCommand::Update(update)) => update,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn dry_flags_edit_custom_params() {
        assert_eq!(with_dry("--nofoldersizes", true), "--dry --nofoldersizes");
        assert_eq!(with_dry("", true), "--dry");
        assert_eq!(with_dry("--x", false), "--x");
        assert_eq!(without_dry("--dry --nofoldersizes"), "--nofoldersizes");
    }

    #[test]
    fn update_collects_only_given_fields() {
        let attrs = update_attrs(&parse_update(&["--no-active", "--mins-interval", "60"]));
        assert_eq!(
            Value::Object(attrs),
            json!({"active": "0", "mins_interval": "60"})
        );
    }

    #[test]
    fn update_with_dry_sets_custom_params() {
        let attrs = update_attrs(&parse_update(&["--dry"]));
        assert_eq!(attrs["custom_params"], "--dry");

        let attrs = update_attrs(&parse_update(&["--no-dry", "--custom-params=--dry --x"]));
        assert_eq!(attrs["custom_params"], "--x");
    }

    #[test]
    fn empty_update_has_no_attrs() {
        assert!(update_attrs(&parse_update(&[])).is_empty());
    }

    #[test]
    fn listing_rows_fall_back_to_user2() {
        let job = json!({"id": 12, "user2": "dest@example.com", "user1": "src@old.com", "host1": "imap.old.com", "active": 1});
        assert_eq!(
            table_row(&job),
            ["12", "dest@example.com", "src@old.com", "imap.old.com", "✓"]
        );
        assert_eq!(csv_row(&json!({"id": 3}))[4], "0");
    }
}
