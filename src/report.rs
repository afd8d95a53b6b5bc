use crate::batch::{BatchResult, Outcome};
use crate::resource::NormalizedRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedEntry {
    pub row_number: usize,
    pub identifier: String,
    pub request: NormalizedRequest,
    pub generated_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub row_number: usize,
    /// `None` for rows rejected before an identifier could be trusted.
    pub identifier: Option<String>,
    pub reason: String,
}

impl ErrorEntry {
    pub fn describe(&self) -> String {
        match &self.identifier {
            Some(id) => format!("Error for {id}: {}", self.reason),
            None => format!("Row {}: Skipping - {}", self.row_number, self.reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub identifier: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub accepted_count: usize,
    pub rejected_count: usize,
    pub accepted: Vec<AcceptedEntry>,
    pub errors: Vec<ErrorEntry>,
}

impl Summary {
    /// Every created account with the password it was created with,
    /// whether that came from the input or was generated. Nothing keeps
    /// these once the summary is dropped.
    pub fn accounts(&self) -> Vec<Credential> {
        self.accepted
            .iter()
            .map(|entry| Credential {
                identifier: entry.identifier.clone(),
                password: entry.request.get("password").to_string(),
                name: entry.request.get("name").to_string(),
            })
            .collect()
    }

    pub fn total(&self) -> usize {
        self.accepted_count + self.rejected_count
    }
}

pub fn summarize(result: &BatchResult) -> Summary {
    let mut summary = Summary::default();
    for outcome in &result.outcomes {
        match outcome {
            Outcome::Accepted {
                row_number,
                identifier,
                request,
                derived,
            } => summary.accepted.push(AcceptedEntry {
                row_number: *row_number,
                identifier: identifier.clone(),
                request: request.clone(),
                generated_password: derived.generated_password.clone(),
            }),
            Outcome::Rejected { row_number, reason } => summary.errors.push(ErrorEntry {
                row_number: *row_number,
                identifier: None,
                reason: reason.clone(),
            }),
            Outcome::Failed {
                row_number,
                identifier,
                error_message,
            } => summary.errors.push(ErrorEntry {
                row_number: *row_number,
                identifier: Some(identifier.clone()),
                reason: error_message.clone(),
            }),
        }
    }
    summary.accepted_count = summary.accepted.len();
    summary.rejected_count = summary.errors.len();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::DerivedFields;
    use crate::resource::ResourceKind;
    use std::collections::BTreeMap;

    fn mailbox(local_part: &str, name: &str) -> NormalizedRequest {
        NormalizedRequest {
            kind: ResourceKind::Mailbox,
            fields: BTreeMap::from([
                ("local_part".to_string(), local_part.to_string()),
                ("domain".to_string(), "example.com".to_string()),
                ("name".to_string(), name.to_string()),
            ]),
        }
    }

    #[test]
    fn counts_cover_every_outcome() {
        let result = BatchResult {
            kind: ResourceKind::Mailbox,
            preview: false,
            outcomes: vec![
                Outcome::Accepted {
                    row_number: 1,
                    identifier: "ana@example.com".into(),
                    request: {
                        let mut request = mailbox("ana", "Ana");
                        request
                            .fields
                            .insert("password".into(), "Xy7!abcdEFGH1234".into());
                        request
                    },
                    derived: DerivedFields {
                        generated_password: Some("Xy7!abcdEFGH1234".into()),
                        display_name: Some("Ana".into()),
                    },
                },
                Outcome::Rejected {
                    row_number: 2,
                    reason: "empty local_part".into(),
                },
                Outcome::Failed {
                    row_number: 3,
                    identifier: "bob@example.com".into(),
                    error_message: "object_exists bob@example.com".into(),
                },
                Outcome::Accepted {
                    row_number: 4,
                    identifier: "carol@example.com".into(),
                    request: {
                        let mut request = mailbox("carol", "Carol C");
                        request
                            .fields
                            .insert("password".into(), "Csv#Pass99".into());
                        request
                    },
                    derived: DerivedFields::default(),
                },
            ],
        };

        let summary = summarize(&result);
        assert_eq!(summary.accepted_count, 2);
        assert_eq!(summary.rejected_count, 2);
        assert_eq!(summary.total(), result.outcomes.len());

        let accounts = summary.accounts();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].identifier, "ana@example.com");
        assert_eq!(accounts[0].password, "Xy7!abcdEFGH1234");
        assert_eq!(accounts[0].name, "Ana");
        assert_eq!(summary.accepted[0].generated_password.as_deref(), Some("Xy7!abcdEFGH1234"));
        // Passwords taken from the input are listed too.
        assert_eq!(accounts[1].identifier, "carol@example.com");
        assert_eq!(accounts[1].password, "Csv#Pass99");
        assert_eq!(accounts[1].name, "Carol C");
        assert_eq!(summary.accepted[1].generated_password, None);

        let lines: Vec<_> = summary.errors.iter().map(ErrorEntry::describe).collect();
        assert_eq!(
            lines,
            [
                "Row 2: Skipping - empty local_part",
                "Error for bob@example.com: object_exists bob@example.com"
            ]
        );
    }
}
