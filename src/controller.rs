// src/controller.rs

use crate::download::FileSink;
use crate::filename;
use crate::form::{Choice, Field, FormRules, FormState, InvoicePayload, ValidationErrors};
use crate::webhook::Webhook;
use std::fmt;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

const GENERIC_FAILURE: &str = "An unexpected error occurred";

/// Where the last submission stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Loading,
    Success { file_name: String, path: PathBuf },
    Error(String),
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionStatus::Idle => write!(f, "Ready"),
            SubmissionStatus::Loading => write!(f, "Generating invoice..."),
            SubmissionStatus::Success { file_name, path } => {
                write!(f, "Invoice downloaded: {file_name} ({})", path.display())
            }
            SubmissionStatus::Error(message) => write!(f, "Submission failed: {message}"),
        }
    }
}

/// Custom selector values that went out with a successful submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEntries {
    pub company: Option<String>,
    pub item: Option<String>,
}

/// Owns the form, its errors and the submission status, and drives one
/// webhook round trip per submit. Every status transition is published to
/// [`InvoiceFormController::subscribe`] receivers.
pub struct InvoiceFormController<W, S> {
    form: FormState,
    status: SubmissionStatus,
    status_tx: watch::Sender<SubmissionStatus>,
    last_new_entries: NewEntries,
    webhook: W,
    sink: S,
}

impl<W: Webhook, S: FileSink> InvoiceFormController<W, S> {
    pub fn new(rules: FormRules, webhook: W, sink: S) -> Self {
        Self {
            form: FormState::new(rules),
            status: SubmissionStatus::Idle,
            status_tx: watch::Sender::new(SubmissionStatus::Idle),
            last_new_entries: NewEntries::default(),
            webhook,
            sink,
        }
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn errors(&self) -> &ValidationErrors {
        self.form.errors()
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    /// Follow status changes while a submit is in flight.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionStatus> {
        self.status_tx.subscribe()
    }

    fn set_status(&mut self, status: SubmissionStatus) {
        debug!(status = %status, "Submission status changed");
        self.status_tx.send_replace(status.clone());
        self.status = status;
    }

    /// Custom company/item text from the most recent successful submit.
    pub fn last_new_entries(&self) -> &NewEntries {
        &self.last_new_entries
    }

    pub fn set_field(&mut self, field: Field, value: &str) -> bool {
        self.form.set(field, value)
    }

    /// Validate, then post the invoice and save the returned file.
    /// Returns false without any network traffic when validation fails.
    pub async fn submit(&mut self) -> bool {
        if !self.form.validate() {
            warn!(
                errors = self.form.errors().len(),
                "Submission blocked by validation errors"
            );
            return false;
        }

        let Some(payload) = self.form.fields().resolve() else {
            // validate() already rejects unresolved selectors
            self.set_status(SubmissionStatus::Error(GENERIC_FAILURE.to_string()));
            return false;
        };
        let new_entries = NewEntries {
            company: custom_value(self.form.fields().company.resolve()),
            item: custom_value(self.form.fields().item.resolve()),
        };

        self.set_status(SubmissionStatus::Loading);

        let outcome = self.round_trip(&payload).await;
        let status = match outcome {
            Ok((file_name, path)) => {
                info!(file_name = %file_name, "Invoice generated");
                self.form.reset();
                self.last_new_entries = new_entries;
                SubmissionStatus::Success { file_name, path }
            }
            Err(message) => {
                error!(error = %message, "Invoice submission failed");
                SubmissionStatus::Error(message)
            }
        };
        self.set_status(status);
        true
    }

    async fn round_trip(&self, payload: &InvoicePayload) -> Result<(String, PathBuf), String> {
        let response = self
            .webhook
            .post_invoice(payload)
            .await
            .map_err(|e| non_empty_or_generic(e.message))?;

        if !response.is_success() {
            return Err(format!("Server responded with status: {}", response.status));
        }

        let file_name = filename::derive_file_name(
            response.content_disposition.as_deref(),
            &payload.company_name,
            &payload.bill_number,
        );
        let path = self
            .sink
            .save(&file_name, &response.body)
            .map_err(|e| e.to_string())?;
        Ok((file_name, path))
    }

    /// Put the status back to `Idle`.
    pub fn dismiss(&mut self) {
        self.set_status(SubmissionStatus::Idle);
    }
}

fn custom_value(choice: Option<Choice>) -> Option<String> {
    match choice {
        Some(Choice::Custom(v)) => Some(v),
        _ => None,
    }
}

fn non_empty_or_generic(message: String) -> String {
    if message.trim().is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        message
    }
}
