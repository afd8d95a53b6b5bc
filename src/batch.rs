//! Drives input records through validation, derivation and the gateway,
//! one record at a time, producing one [`Outcome`] per non-skipped record.

use tracing::{debug, info, warn};

use crate::error::MailcowError;
use crate::gateway::Gateway;
use crate::generate::{self, DerivedFields};
use crate::input::InputRecord;
use crate::resource::{ModeDefaults, NormalizedRequest, Operation, ResourceKind};
use crate::validate::{self, Draft, Validation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted {
        row_number: usize,
        identifier: String,
        request: NormalizedRequest,
        derived: DerivedFields,
    },
    Rejected {
        row_number: usize,
        reason: String,
    },
    Failed {
        row_number: usize,
        identifier: String,
        error_message: String,
    },
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted { .. })
    }

    pub fn row_number(&self) -> usize {
        match self {
            Outcome::Accepted { row_number, .. }
            | Outcome::Rejected { row_number, .. }
            | Outcome::Failed { row_number, .. } => *row_number,
        }
    }
}

/// What happens to a record once it has passed validation: the API
/// accepted it (or preview stood in for the API), or the API refused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Accepted {
        identifier: String,
        request: NormalizedRequest,
        derived: DerivedFields,
    },
    Failed {
        identifier: String,
        error_message: String,
    },
}

impl Submission {
    fn at_row(self, row_number: usize) -> Outcome {
        match self {
            Submission::Accepted {
                identifier,
                request,
                derived,
            } => Outcome::Accepted {
                row_number,
                identifier,
                request,
                derived,
            },
            Submission::Failed {
                identifier,
                error_message,
            } => Outcome::Failed {
                row_number,
                identifier,
                error_message,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub kind: ResourceKind,
    pub preview: bool,
    pub outcomes: Vec<Outcome>,
}

impl BatchResult {
    pub fn accepted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_accepted()).count()
    }

    /// Local rejections and API/transport failures together.
    pub fn rejected_count(&self) -> usize {
        self.outcomes.len() - self.accepted_count()
    }
}

/// Fills derived fields. The RNG is not held across an await point.
fn prepare(draft: Draft, defaults: &ModeDefaults) -> (NormalizedRequest, DerivedFields) {
    generate::derive(draft, defaults, &mut rand::thread_rng())
}

/// Sends one request, or stands in for the API in preview. Only a
/// transport failure is an error here.
async fn submit<G: Gateway + ?Sized>(
    gateway: &G,
    request: NormalizedRequest,
    derived: DerivedFields,
    preview: bool,
) -> Result<Submission, MailcowError> {
    let identifier = request.identifier();
    if preview {
        return Ok(Submission::Accepted {
            identifier,
            request,
            derived,
        });
    }
    let response = gateway
        .execute(Operation::Create, request.kind, request.to_payload())
        .await?;
    let interpretation = response.interpret();
    if interpretation.success {
        Ok(Submission::Accepted {
            identifier,
            request,
            derived,
        })
    } else {
        Ok(Submission::Failed {
            identifier,
            error_message: interpretation.message,
        })
    }
}

fn log_outcome(kind: ResourceKind, outcome: &Outcome) {
    match outcome {
        Outcome::Accepted { row_number, identifier, .. } => {
            info!(%kind, row = row_number, %identifier, "accepted")
        }
        Outcome::Rejected { row_number, reason } => {
            warn!(%kind, row = row_number, %reason, "rejected")
        }
        Outcome::Failed {
            row_number,
            identifier,
            error_message,
        } => warn!(%kind, row = row_number, %identifier, error = %error_message, "failed"),
    }
}

/// Processes `rows` in order. Nothing a single row does stops the batch;
/// `observe` sees every outcome as soon as it is produced.
pub async fn run_batch<G, F>(
    gateway: &G,
    kind: ResourceKind,
    rows: &[InputRecord],
    preview: bool,
    defaults: &ModeDefaults,
    mut observe: F,
) -> BatchResult
where
    G: Gateway + ?Sized,
    F: FnMut(&Outcome),
{
    let mut outcomes = Vec::with_capacity(rows.len());

    for row in rows {
        let row_number = row.row_number;
        let draft = match validate::validate_row(kind, row_number, &row.cells, defaults) {
            Validation::Skip => {
                debug!(%kind, row = row_number, "skipping blank or header row");
                continue;
            }
            Validation::Rejected(rejection) => {
                let outcome = Outcome::Rejected {
                    row_number,
                    reason: rejection.reason(kind).to_string(),
                };
                log_outcome(kind, &outcome);
                observe(&outcome);
                outcomes.push(outcome);
                continue;
            }
            Validation::Valid(draft) => draft,
        };

        let (request, derived) = prepare(draft, defaults);
        let identifier = request.identifier();
        let outcome = submit(gateway, request, derived, preview)
            .await
            .unwrap_or_else(|err| Submission::Failed {
                identifier,
                error_message: err.to_string(),
            })
            .at_row(row_number);
        log_outcome(kind, &outcome);
        observe(&outcome);
        outcomes.push(outcome);
    }

    BatchResult {
        kind,
        preview,
        outcomes,
    }
}

/// A batch of exactly one record built from flags. Validation problems
/// are usage errors and transport failures abort; an API refusal is
/// returned as [`Submission::Failed`].
pub async fn run_single<G: Gateway + ?Sized>(
    gateway: &G,
    kind: ResourceKind,
    cells: &[String],
    preview: bool,
    defaults: &ModeDefaults,
) -> Result<Submission, MailcowError> {
    let draft = validate::validate_record(kind, 1, cells, defaults)
        .map_err(|rejection| MailcowError::usage(rejection.usage(kind)))?;
    let (request, derived) = prepare(draft, defaults);

    let submission = submit(gateway, request, derived, preview).await?;
    match &submission {
        Submission::Accepted { identifier, .. } => info!(%kind, %identifier, "accepted"),
        Submission::Failed {
            identifier,
            error_message,
        } => warn!(%kind, %identifier, error = %error_message, "failed"),
    }
    Ok(submission)
}
