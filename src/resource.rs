//! Resource kinds handled by the CLI and the per-kind tables that drive
//! row validation: column layout, header keywords, rejection messages and
//! default values.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    SyncJob,
    Mailbox,
    Alias,
    Transport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List { include_log: bool },
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn is_read(self) -> bool {
        matches!(self, Operation::List { .. })
    }
}

/// How a positional column is filled when the input leaves it blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Blank is a rejection.
    Required,
    /// Blank falls back to the mode defaults, then to the empty string.
    Optional,
    /// Blank is replaced by a display name built from another column.
    DisplayName { from: &'static str },
    /// Blank is replaced by a generated password when generation is on.
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub fill: Fill,
}

const fn required(name: &'static str) -> Column {
    Column {
        name,
        fill: Fill::Required,
    }
}

const fn optional(name: &'static str) -> Column {
    Column {
        name,
        fill: Fill::Optional,
    }
}

#[derive(Debug)]
pub struct ResourceSpec {
    pub kind: ResourceKind,
    pub columns: &'static [Column],
    pub min_columns: usize,
    pub header_keywords: &'static [&'static str],
    pub short_row_reason: &'static str,
    pub blank_field_reason: &'static str,
    /// Shown instead of a row rejection when the record came from flags.
    pub single_usage: &'static str,
}

static SYNC_JOB: ResourceSpec = ResourceSpec {
    kind: ResourceKind::SyncJob,
    columns: &[required("user1"), required("password1"), required("username")],
    min_columns: 3,
    header_keywords: &["user1", "source", "src_user", "email"],
    short_row_reason: "need 3 columns (user1,password1,username)",
    blank_field_reason: "empty required field",
    single_usage: "Single mode requires --user1, --password1, and --username (or use -f for batch)",
};

static MAILBOX: ResourceSpec = ResourceSpec {
    kind: ResourceKind::Mailbox,
    columns: &[
        required("local_part"),
        Column {
            name: "name",
            fill: Fill::DisplayName { from: "local_part" },
        },
        Column {
            name: "password",
            fill: Fill::Password,
        },
    ],
    min_columns: 1,
    header_keywords: &["local_part", "localpart", "email", "username", "user"],
    short_row_reason: "empty row",
    blank_field_reason: "empty local_part",
    single_usage: "Single mode requires --local-part (or use -f for batch)",
};

static ALIAS: ResourceSpec = ResourceSpec {
    kind: ResourceKind::Alias,
    columns: &[required("address"), required("goto")],
    min_columns: 2,
    header_keywords: &["address", "alias", "source", "from"],
    short_row_reason: "need 2 columns (address,goto)",
    blank_field_reason: "empty address or goto",
    single_usage: "Single mode requires --address and --goto (or use -f for batch)",
};

static TRANSPORT: ResourceSpec = ResourceSpec {
    kind: ResourceKind::Transport,
    columns: &[
        required("destination"),
        required("nexthop"),
        optional("username"),
        optional("password"),
    ],
    min_columns: 2,
    header_keywords: &["destination", "dest", "domain"],
    short_row_reason: "need at least 2 columns (destination,nexthop)",
    blank_field_reason: "empty destination or nexthop",
    single_usage: "Single mode requires --destination and --nexthop (or use -f for batch)",
};

/// imapsync tuning applied to every new sync job unless overridden.
pub const SYNC_DEFAULTS: &[(&str, &str)] = &[
    ("port1", "993"),
    ("enc1", "SSL"),
    ("mins_interval", "20"),
    ("timeout1", "600"),
    ("timeout2", "600"),
    ("maxage", "0"),
    ("maxbytespersecond", "0"),
    ("exclude", "(?i)spam|(?i)junk"),
    ("delete1", "0"),
    ("delete2", "0"),
    ("delete2duplicates", "1"),
    ("automap", "1"),
    ("skipcrossduplicates", "0"),
    ("subscribeall", "1"),
    ("active", "1"),
];

const MAILBOX_DEFAULTS: &[(&str, &str)] = &[
    ("quota", "0"),
    ("active", "1"),
    ("force_pw_update", "0"),
    ("tls_enforce_in", "1"),
    ("tls_enforce_out", "1"),
];

const ALIAS_DEFAULTS: &[(&str, &str)] = &[("active", "1"), ("sogo_visible", "1")];

const TRANSPORT_DEFAULTS: &[(&str, &str)] =
    &[("username", ""), ("password", ""), ("active", "1")];

pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

impl ResourceKind {
    pub fn spec(self) -> &'static ResourceSpec {
        match self {
            ResourceKind::SyncJob => &SYNC_JOB,
            ResourceKind::Mailbox => &MAILBOX,
            ResourceKind::Alias => &ALIAS,
            ResourceKind::Transport => &TRANSPORT,
        }
    }

    /// Path below `/api/v1/`, or `None` when the API has no such operation.
    pub fn endpoint(self, op: Operation) -> Option<&'static str> {
        use ResourceKind::*;
        let path = match (self, op) {
            (SyncJob, Operation::List { include_log: true }) => "get/syncjobs/all",
            (SyncJob, Operation::List { include_log: false }) => "get/syncjobs/all/no_log",
            (SyncJob, Operation::Create) => "add/syncjob",
            (SyncJob, Operation::Update) => "edit/syncjob",
            (Mailbox, Operation::List { .. }) => "get/mailbox/all",
            (Mailbox, Operation::Create) => "add/mailbox",
            (Mailbox, Operation::Update) => "edit/mailbox",
            (Alias, Operation::List { .. }) => "get/alias/all",
            (Alias, Operation::Create) => "add/alias",
            (Alias, Operation::Update) => "edit/alias",
            (Transport, Operation::List { .. }) => "get/transport/all",
            (Transport, Operation::Create) => "add/transport",
            (Transport, Operation::Update) => "edit/transport",
            (Transport, Operation::Delete) => "delete/transport",
            _ => return None,
        };
        Some(path)
    }

    fn base_defaults(self) -> &'static [(&'static str, &'static str)] {
        match self {
            ResourceKind::SyncJob => SYNC_DEFAULTS,
            ResourceKind::Mailbox => MAILBOX_DEFAULTS,
            ResourceKind::Alias => ALIAS_DEFAULTS,
            ResourceKind::Transport => TRANSPORT_DEFAULTS,
        }
    }

    /// The field used to name a row in reports.
    pub fn identifier(self, fields: &BTreeMap<String, String>) -> String {
        let get = |k: &str| fields.get(k).map(String::as_str).unwrap_or_default();
        match self {
            ResourceKind::SyncJob => get("username").to_string(),
            ResourceKind::Mailbox => format!("{}@{}", get("local_part"), get("domain")),
            ResourceKind::Alias => get("address").to_string(),
            ResourceKind::Transport => get("destination").to_string(),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResourceKind::SyncJob => "sync job",
            ResourceKind::Mailbox => "mailbox",
            ResourceKind::Alias => "alias",
            ResourceKind::Transport => "transport map",
        };
        f.write_str(label)
    }
}

/// Values that fill optional fields of every record in one invocation.
#[derive(Debug, Clone, Default)]
pub struct ModeDefaults {
    pub fields: BTreeMap<String, String>,
    pub generate_password: bool,
    pub password_length: usize,
}

impl ModeDefaults {
    pub fn for_kind(kind: ResourceKind) -> Self {
        Self {
            fields: kind
                .base_defaults()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            generate_password: false,
            password_length: DEFAULT_PASSWORD_LENGTH,
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Sets `key` only when a value was supplied.
    pub fn set_opt(&mut self, key: &str, value: Option<impl Into<String>>) -> &mut Self {
        if let Some(v) = value {
            self.set(key, v);
        }
        self
    }

    pub fn merge<I, K, V>(&mut self, overrides: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in overrides {
            self.fields.insert(k.into(), v.into());
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// A fully populated request body, ready to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRequest {
    pub kind: ResourceKind,
    pub fields: BTreeMap<String, String>,
}

impl NormalizedRequest {
    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or_default()
    }

    pub fn identifier(&self) -> String {
        self.kind.identifier(&self.fields)
    }

    pub fn to_payload(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_create_and_list_endpoints() {
        for kind in [
            ResourceKind::SyncJob,
            ResourceKind::Mailbox,
            ResourceKind::Alias,
            ResourceKind::Transport,
        ] {
            assert!(kind.endpoint(Operation::Create).is_some());
            assert!(kind.endpoint(Operation::List { include_log: false }).is_some());
            assert_eq!(kind.spec().kind, kind);
            assert!(kind.spec().min_columns <= kind.spec().columns.len());
        }
    }

    #[test]
    fn only_transports_can_be_deleted() {
        assert_eq!(
            ResourceKind::Transport.endpoint(Operation::Delete),
            Some("delete/transport")
        );
        assert_eq!(ResourceKind::Mailbox.endpoint(Operation::Delete), None);
    }

    #[test]
    fn sync_job_log_listing_uses_full_endpoint() {
        assert_eq!(
            ResourceKind::SyncJob.endpoint(Operation::List { include_log: true }),
            Some("get/syncjobs/all")
        );
    }

    #[test]
    fn sync_defaults_can_be_overridden() {
        let mut defaults = ModeDefaults::for_kind(ResourceKind::SyncJob);
        assert_eq!(defaults.get("mins_interval"), Some("20"));
        defaults
            .merge([("mins_interval", "60")])
            .set_opt("port1", Some("143"))
            .set_opt("enc1", None::<String>);
        assert_eq!(defaults.get("mins_interval"), Some("60"));
        assert_eq!(defaults.get("port1"), Some("143"));
        assert_eq!(defaults.get("enc1"), Some("SSL"));
    }

    #[test]
    fn mailbox_identifier_is_the_full_address() {
        let fields = BTreeMap::from([
            ("local_part".to_string(), "john".to_string()),
            ("domain".to_string(), "example.com".to_string()),
        ]);
        assert_eq!(
            ResourceKind::Mailbox.identifier(&fields),
            "john@example.com"
        );
    }
}
