//! Generic row validation driven by [`ResourceSpec`](crate::resource::ResourceSpec).

use std::collections::BTreeMap;

use crate::resource::{Column, Fill, ModeDefaults, ResourceKind};

const NO_PASSWORD_REASON: &str = "no password (use --gen-password)";
const NO_PASSWORD_USAGE: &str = "Single mode requires --password or --gen-password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    ShortRow,
    BlankRequired,
    NoPassword,
}

impl Rejection {
    pub fn reason(self, kind: ResourceKind) -> &'static str {
        match self {
            Rejection::ShortRow => kind.spec().short_row_reason,
            Rejection::BlankRequired => kind.spec().blank_field_reason,
            Rejection::NoPassword => NO_PASSWORD_REASON,
        }
    }

    /// Message used when the record came from command-line flags.
    pub fn usage(self, kind: ResourceKind) -> &'static str {
        match self {
            Rejection::ShortRow | Rejection::BlankRequired => kind.spec().single_usage,
            Rejection::NoPassword => NO_PASSWORD_USAGE,
        }
    }
}

/// A record that passed validation but may still have columns to derive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub kind: ResourceKind,
    pub row_number: usize,
    pub fields: BTreeMap<String, String>,
    pub pending: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Blank or header row; produces no outcome.
    Skip,
    Rejected(Rejection),
    Valid(Draft),
}

fn is_blank(cells: &[String]) -> bool {
    cells.iter().all(|c| c.trim().is_empty())
}

fn is_header(kind: ResourceKind, cells: &[String]) -> bool {
    let first = cells.first().map(|c| c.to_lowercase()).unwrap_or_default();
    kind.spec()
        .header_keywords
        .iter()
        .any(|keyword| *keyword == first)
}

/// Blank rows, and a header on row 1, produce no outcome.
pub fn is_skipped(kind: ResourceKind, row_number: usize, cells: &[String]) -> bool {
    is_blank(cells) || (row_number == 1 && is_header(kind, cells))
}

/// Validates one CSV row. Row numbers are 1-based; only row 1 can be a
/// header.
pub fn validate_row(
    kind: ResourceKind,
    row_number: usize,
    cells: &[String],
    defaults: &ModeDefaults,
) -> Validation {
    if is_skipped(kind, row_number, cells) {
        return Validation::Skip;
    }
    match validate_record(kind, row_number, cells, defaults) {
        Ok(draft) => Validation::Valid(draft),
        Err(rejection) => Validation::Rejected(rejection),
    }
}

/// Validates a record without blank/header sniffing.
pub fn validate_record(
    kind: ResourceKind,
    row_number: usize,
    cells: &[String],
    defaults: &ModeDefaults,
) -> Result<Draft, Rejection> {
    let spec = kind.spec();
    if cells.len() < spec.min_columns {
        return Err(Rejection::ShortRow);
    }

    let mut fields = defaults.fields.clone();
    let mut pending = Vec::new();

    for (i, column) in spec.columns.iter().enumerate() {
        let value = cells.get(i).map(|c| c.trim()).unwrap_or_default();
        if !value.is_empty() {
            fields.insert(column.name.to_string(), value.to_string());
            continue;
        }
        match column.fill {
            Fill::Required => return Err(Rejection::BlankRequired),
            Fill::Optional => {
                fields.entry(column.name.to_string()).or_default();
            }
            Fill::Password if !defaults.generate_password => {
                return Err(Rejection::NoPassword);
            }
            Fill::Password | Fill::DisplayName { .. } => pending.push(*column),
        }
    }

    Ok(Draft {
        kind,
        row_number,
        fields,
        pending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(row: &[&str]) -> Vec<String> {
        row.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn skipped_rows_match_validation() {
        let defaults = ModeDefaults::for_kind(ResourceKind::Transport);
        let rows = [
            (1, cells(&["destination", "nexthop"])),
            (2, cells(&["destination", "nexthop"])),
            (3, cells(&["", " "])),
            (4, cells(&["example.org", "[relay]:25"])),
            (5, cells(&["example.net"])),
        ];
        let skipped: Vec<_> = rows
            .iter()
            .filter(|(n, c)| is_skipped(ResourceKind::Transport, *n, c))
            .map(|(n, _)| *n)
            .collect();
        assert_eq!(skipped, [1, 3]);
        for (n, c) in &rows {
            assert_eq!(
                is_skipped(ResourceKind::Transport, *n, c),
                validate_row(ResourceKind::Transport, *n, c, &defaults) == Validation::Skip
            );
        }
    }

    fn draft(v: Validation) -> Draft {
        match v {
            Validation::Valid(d) => d,
            other => panic!("expected valid row, got {other:?}"),
        }
    }

    #[test]
    fn blank_rows_are_skipped() {
        let defaults = ModeDefaults::for_kind(ResourceKind::Alias);
        assert_eq!(
            validate_row(ResourceKind::Alias, 3, &cells(&[" ", ""]), &defaults),
            Validation::Skip
        );
        assert_eq!(
            validate_row(ResourceKind::Alias, 3, &[], &defaults),
            Validation::Skip
        );
    }

    #[test]
    fn header_only_skipped_on_first_row() {
        let defaults = ModeDefaults::for_kind(ResourceKind::SyncJob);
        let header = cells(&["User1", "password1", "username"]);
        assert_eq!(
            validate_row(ResourceKind::SyncJob, 1, &header, &defaults),
            Validation::Skip
        );
        assert!(matches!(
            validate_row(ResourceKind::SyncJob, 2, &header, &defaults),
            Validation::Valid(_)
        ));
    }

    #[test]
    fn every_header_keyword_is_recognised() {
        let table: [(ResourceKind, &[&str]); 4] = [
            (ResourceKind::SyncJob, &["user1", "source", "src_user", "email"]),
            (
                ResourceKind::Mailbox,
                &["local_part", "localpart", "email", "username", "user"],
            ),
            (ResourceKind::Alias, &["address", "alias", "source", "from"]),
            (ResourceKind::Transport, &["destination", "dest", "domain"]),
        ];
        for (kind, keywords) in table {
            let defaults = ModeDefaults::for_kind(kind);
            for keyword in keywords {
                let upper = keyword.to_uppercase();
                for first in [*keyword, upper.as_str()] {
                    let row = cells(&[first, "second", "third", "fourth"]);
                    assert_eq!(
                        validate_row(kind, 1, &row, &defaults),
                        Validation::Skip,
                        "{kind}: {first}"
                    );
                }
            }
            let data = cells(&["alice", "second", "third", "fourth"]);
            assert!(
                matches!(validate_row(kind, 1, &data, &defaults), Validation::Valid(_)),
                "{kind}: plain first row"
            );
        }
    }

    #[test]
    fn padded_keyword_is_data() {
        let defaults = ModeDefaults::for_kind(ResourceKind::SyncJob);
        let row = cells(&[" user1", "password1", "username"]);
        assert!(matches!(
            validate_row(ResourceKind::SyncJob, 1, &row, &defaults),
            Validation::Valid(_)
        ));
    }

    #[test]
    fn short_rows_are_rejected() {
        let defaults = ModeDefaults::for_kind(ResourceKind::SyncJob);
        let v = validate_row(ResourceKind::SyncJob, 2, &cells(&["a@old.com", "pw"]), &defaults);
        assert_eq!(v, Validation::Rejected(Rejection::ShortRow));
        assert_eq!(
            Rejection::ShortRow.reason(ResourceKind::SyncJob),
            "need 3 columns (user1,password1,username)"
        );
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let defaults = ModeDefaults::for_kind(ResourceKind::Alias);
        let v = validate_row(ResourceKind::Alias, 2, &cells(&["alias@example.com", " "]), &defaults);
        assert_eq!(v, Validation::Rejected(Rejection::BlankRequired));
    }

    #[test]
    fn fields_are_trimmed_and_defaults_applied() {
        let mut defaults = ModeDefaults::for_kind(ResourceKind::SyncJob);
        defaults.set("host1", "imap.old.com");
        let d = draft(validate_row(
            ResourceKind::SyncJob,
            2,
            &cells(&[" src@old.com ", "pw ", " dst@new.com"]),
            &defaults,
        ));
        assert_eq!(d.fields["user1"], "src@old.com");
        assert_eq!(d.fields["password1"], "pw");
        assert_eq!(d.fields["username"], "dst@new.com");
        assert_eq!(d.fields["host1"], "imap.old.com");
        assert_eq!(d.fields["exclude"], "(?i)spam|(?i)junk");
        assert!(d.pending.is_empty());
    }

    #[test]
    fn mailbox_without_password_needs_generation() {
        let mut defaults = ModeDefaults::for_kind(ResourceKind::Mailbox);
        let row = cells(&["john.doe"]);
        assert_eq!(
            validate_row(ResourceKind::Mailbox, 2, &row, &defaults),
            Validation::Rejected(Rejection::NoPassword)
        );

        defaults.generate_password = true;
        let d = draft(validate_row(ResourceKind::Mailbox, 2, &row, &defaults));
        let pending: Vec<_> = d.pending.iter().map(|c| c.name).collect();
        assert_eq!(pending, ["name", "password"]);
    }

    #[test]
    fn transport_credentials_may_be_blank() {
        let defaults = ModeDefaults::for_kind(ResourceKind::Transport);
        let d = draft(validate_row(
            ResourceKind::Transport,
            1,
            &cells(&["example.org", "[relay.example.net]:587"]),
            &defaults,
        ));
        assert_eq!(d.fields["username"], "");
        assert_eq!(d.fields["password"], "");
        assert_eq!(d.fields["active"], "1");
    }

    #[test]
    fn single_records_skip_header_sniffing() {
        let defaults = ModeDefaults::for_kind(ResourceKind::Alias);
        let d = validate_record(
            ResourceKind::Alias,
            1,
            &cells(&["from", "user@example.com"]),
            &defaults,
        )
        .unwrap();
        assert_eq!(d.fields["address"], "from");
    }
}
