use serde_json::{Map, Value};

use super::{
    Context, ListView, Preview, apply_update, print_credentials, run_csv_batch, run_single_add,
    set_opt, set_toggle, show_listing,
};
use crate::batch::Submission;
use crate::cli::{MailboxAdd, MailboxCommand, MailboxUpdate, flag, toggle};
use crate::error::MailcowError;
use crate::gateway;
use crate::render::{OutputFormat, active_mark, field, trunc};
use crate::resource::{ModeDefaults, NormalizedRequest, ResourceKind};

const KIND: ResourceKind = ResourceKind::Mailbox;
const MIB: u64 = 1024 * 1024;

fn bytes(item: &Value, key: &str) -> u64 {
    match item.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

/// `used/total` in MB, or `unlimited` when the mailbox has no quota.
fn quota_label(mailbox: &Value) -> String {
    let total = bytes(mailbox, "quota");
    if total == 0 {
        return "unlimited".to_string();
    }
    format!("{}/{}", bytes(mailbox, "quota_used") / MIB, total / MIB)
}

fn table_row(mailbox: &Value) -> Vec<String> {
    vec![
        field(mailbox, "username"),
        field(mailbox, "name"),
        field(mailbox, "domain"),
        trunc(&quota_label(mailbox), 12),
        active_mark(mailbox).to_string(),
    ]
}

fn csv_row(mailbox: &Value) -> Vec<String> {
    vec![
        field(mailbox, "username"),
        field(mailbox, "name"),
        field(mailbox, "domain"),
        bytes(mailbox, "quota_used").to_string(),
        bytes(mailbox, "quota").to_string(),
        match field(mailbox, "active") {
            a if a.is_empty() => "0".to_string(),
            a => a,
        },
    ]
}

static LIST_VIEW: ListView = ListView {
    empty: "No mailboxes found.",
    noun: "mailbox(es)",
    max_col: 28,
    table_headers: &["Username", "Name", "Domain", "Quota (MB)", "Active"],
    table_row,
    csv_headers: &["username", "name", "domain", "quota_used", "quota_total", "active"],
    csv_row,
};

fn describe(request: &NormalizedRequest) -> String {
    request.identifier()
}

fn preview_row(request: &NormalizedRequest) -> Vec<String> {
    vec![
        request.identifier(),
        request.get("password").to_string(),
        request.get("name").to_string(),
    ]
}

static PREVIEW: Preview = Preview {
    noun: "mailbox(es)",
    headers: &["Email", "Password", "Name"],
    row: preview_row,
    max_col: 32,
};

fn add_defaults(ctx: &Context, args: &MailboxAdd) -> Result<ModeDefaults, MailcowError> {
    let domain = args
        .domain
        .clone()
        .or_else(|| ctx.profile.domain.clone())
        .ok_or_else(|| MailcowError::usage("Missing option '-d' / '--domain' (env: MAILCOW_DOMAIN)"))?;

    let mut defaults = ModeDefaults::for_kind(KIND);
    defaults.set("domain", domain).set("quota", args.quota.clone());
    for (key, on, off) in [
        ("active", args.active, args.no_active),
        ("force_pw_update", args.force_pw_update, args.no_force_pw_update),
        ("tls_enforce_in", args.tls_enforce_in, args.no_tls_enforce_in),
        ("tls_enforce_out", args.tls_enforce_out, args.no_tls_enforce_out),
    ] {
        defaults.set_opt(key, toggle(on, off).map(flag));
    }
    defaults.generate_password = args.gen_password;
    defaults.password_length = args.password_length;
    Ok(defaults)
}

async fn add(ctx: &Context, args: MailboxAdd) -> Result<(), MailcowError> {
    let defaults = add_defaults(ctx, &args)?;

    if args.batch.file.is_some() {
        let summary =
            run_csv_batch(ctx, KIND, &args.batch, &defaults, describe, Some(&PREVIEW)).await?;
        if !args.batch.preview && args.gen_password {
            print_credentials(&summary, args.batch.output)?;
        }
        return Ok(());
    }

    let cells = vec![
        args.local_part.clone().unwrap_or_default(),
        args.name.clone(),
        args.password.clone().unwrap_or_default(),
    ];
    let outcome = run_single_add(ctx, KIND, cells, args.batch.preview, &defaults).await?;

    match outcome {
        Submission::Accepted {
            identifier,
            request,
            derived,
            ..
        } => {
            if args.batch.preview {
                println!("[PREVIEW] Would create mailbox:");
                println!("  Email: {identifier}");
                println!("  Name: {}", request.get("name"));
                println!("  Quota: {} MB", request.get("quota"));
                println!("  Active: {}", request.get("active"));
            } else {
                println!("Success: Mailbox created");
                println!("  Email: {identifier}");
                println!("  Name: {}", request.get("name"));
                if let Some(password) = derived.generated_password {
                    println!("  Password: {password}");
                }
            }
        }
        Submission::Failed {
            identifier,
            error_message,
            ..
        } => eprintln!("Failed to create mailbox {identifier}: {error_message}"),
    }
    Ok(())
}

/// A new password is sent twice, as the API expects a confirmation.
pub fn update_attrs(args: &MailboxUpdate) -> Map<String, Value> {
    let mut attrs = Map::new();
    set_opt(&mut attrs, "name", args.name.clone());
    if let Some(password) = &args.password {
        set_opt(&mut attrs, "password", Some(password.clone()));
        set_opt(&mut attrs, "password2", Some(password.clone()));
    }
    set_opt(&mut attrs, "quota", args.quota.clone());
    set_toggle(&mut attrs, "active", args.active, args.no_active);
    set_toggle(&mut attrs, "force_pw_update", args.force_pw_update, args.no_force_pw_update);
    set_toggle(&mut attrs, "tls_enforce_in", args.tls_enforce_in, args.no_tls_enforce_in);
    set_toggle(&mut attrs, "tls_enforce_out", args.tls_enforce_out, args.no_tls_enforce_out);
    attrs
}

pub fn in_domain(items: Vec<Value>, domain: Option<&str>) -> Vec<Value> {
    match domain {
        Some(domain) => items
            .into_iter()
            .filter(|item| field(item, "domain") == domain)
            .collect(),
        None => items,
    }
}

async fn get(ctx: &Context, output: OutputFormat, domain: Option<String>) -> Result<(), MailcowError> {
    let mailboxes = gateway::list(ctx.gateway.as_ref(), KIND, false).await?;
    if mailboxes.is_empty() {
        println!("{}", LIST_VIEW.empty);
        return Ok(());
    }
    let mailboxes = in_domain(mailboxes, domain.as_deref());
    if let (true, Some(domain)) = (mailboxes.is_empty(), &domain) {
        println!("No mailboxes found for domain: {domain}");
        return Ok(());
    }
    show_listing(output, &mailboxes, &LIST_VIEW)
}

pub async fn run(ctx: &Context, cmd: MailboxCommand) -> Result<(), MailcowError> {
    match cmd {
        MailboxCommand::Get { output, domain } => get(ctx, output, domain).await,
        MailboxCommand::Add(args) => add(ctx, args).await,
        MailboxCommand::Update(args) => {
            let attrs = update_attrs(&args);
            apply_update(ctx, KIND, &args.username, attrs).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{CliArgs, Command};
    use clap::Parser;
    use serde_json::json;

    #[test]
    fn quota_is_shown_in_megabytes() {
        let mailbox = json!({"quota": 1073741824u64, "quota_used": 5242880});
        assert_eq!(quota_label(&mailbox), "5/1024");
        assert_eq!(quota_label(&json!({"quota": 0})), "unlimited");
        assert_eq!(quota_label(&json!({})), "unlimited");
    }

    #[test]
    fn password_update_sends_confirmation() {
        let args = CliArgs::try_parse_from([
            "mailcow-cli", "mailbox", "update", "john@example.com", "--password", "n3w!Pass",
        ])
        .unwrap();
        let Command::Mailbox(MailboxCommand::Update(update)) = args.command else {
            panic!("expected mailbox update");
        };
        let attrs = update_attrs(&update);
        assert_eq!(attrs["password"], "n3w!Pass");
        assert_eq!(attrs["password2"], "n3w!Pass");
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn domain_filter() {
        let items = vec![
            json!({"username": "a@one.ro", "domain": "one.ro"}),
            json!({"username": "b@two.ro", "domain": "two.ro"}),
        ];
        assert_eq!(in_domain(items.clone(), Some("two.ro")).len(), 1);
        assert_eq!(in_domain(items, None).len(), 2);
    }

    #[test]
    fn preview_rows_show_email_password_and_name() {
        let request = NormalizedRequest {
            kind: KIND,
            fields: [
                ("local_part", "ion.popescu"),
                ("domain", "example.ro"),
                ("password", "pw"),
                ("name", "Ion Popescu"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        };
        assert_eq!(
            preview_row(&request),
            ["ion.popescu@example.ro", "pw", "Ion Popescu"]
        );
    }
}
