//! Submission tracking.
//!
//! A submitted transaction is not a state change. Every request stays
//! pending until the ledger reports it confirmed or failed, and a claim
//! counts only once confirmed. At most one claim per record may ever be
//! confirmed.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use super::{TransactionRequest, TransactionSubmitter, TxStatus};
use crate::types::ValidationError;

// ---------------------------------------------------------------------------
// Submission state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Pending,
    Confirmed,
    Failed(String),
}

impl SubmissionState {
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub tx_id: String,
    pub request: TransactionRequest,
    pub state: SubmissionState,
    pub submitted_at: DateTime<Utc>,
}

/// Outcome of one status sweep over pending submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub confirmed: Vec<String>,
    pub failed: Vec<String>,
    pub still_pending: usize,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SubmissionTracker {
    submissions: HashMap<String, Submission>,
    /// Records with a confirmed claim.
    claimed: HashSet<String>,
}

impl SubmissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand a request to the submitter and track it as pending.
    ///
    /// A claim is refused locally if the same record already has a pending
    /// or confirmed claim.
    pub async fn submit<S>(&mut self, submitter: &S, request: TransactionRequest) -> Result<String>
    where
        S: TransactionSubmitter + ?Sized,
    {
        if let Some(record_id) = request.claimed_record() {
            if self.has_open_claim(record_id) {
                return Err(ValidationError::DuplicateClaim(record_id.to_string()).into());
            }
        }

        let tx_id = submitter
            .submit(&request)
            .await
            .with_context(|| format!("Failed to submit {request}"))?;

        info!(tx_id = %tx_id, request = %request, "Transaction submitted; pending confirmation");
        self.record_pending(tx_id.clone(), request);
        Ok(tx_id)
    }

    /// Track a transaction submitted elsewhere.
    pub fn record_pending(&mut self, tx_id: String, request: TransactionRequest) {
        self.submissions.insert(
            tx_id.clone(),
            Submission {
                tx_id,
                request,
                state: SubmissionState::Pending,
                submitted_at: Utc::now(),
            },
        );
    }

    /// Apply a status reported by the ledger.
    ///
    /// Final states are sticky. A second confirmed claim on a record that
    /// already has one is recorded as failed and reported as a duplicate.
    pub fn apply_status(
        &mut self,
        tx_id: &str,
        status: TxStatus,
    ) -> Result<SubmissionState, ValidationError> {
        let submission = self
            .submissions
            .get_mut(tx_id)
            .ok_or_else(|| ValidationError::InvalidArgument {
                field: "tx_id",
                reason: format!("{tx_id} is not tracked"),
            })?;

        if submission.state.is_final() {
            debug!(tx_id, state = ?submission.state, "Ignoring status for settled transaction");
            return Ok(submission.state.clone());
        }

        match status {
            TxStatus::Pending | TxStatus::NotFound => {}
            TxStatus::Failed(reason) => {
                warn!(tx_id, reason = %reason, "Transaction failed");
                submission.state = SubmissionState::Failed(reason);
            }
            TxStatus::Confirmed => {
                if let Some(record_id) = submission.request.claimed_record() {
                    if !self.claimed.insert(record_id.to_string()) {
                        let record_id = record_id.to_string();
                        submission.state = SubmissionState::Failed("duplicate claim".into());
                        warn!(tx_id, record_id = %record_id, "Second claim confirmed for record");
                        return Err(ValidationError::DuplicateClaim(record_id));
                    }
                }
                info!(tx_id, "Transaction confirmed");
                submission.state = SubmissionState::Confirmed;
            }
        }
        Ok(submission.state.clone())
    }

    /// Poll the submitter for every pending transaction.
    ///
    /// A status lookup that errors leaves the transaction pending.
    pub async fn refresh<S>(&mut self, submitter: &S) -> RefreshReport
    where
        S: TransactionSubmitter + ?Sized,
    {
        let mut report = RefreshReport::default();
        let pending: Vec<String> = self.pending().map(|s| s.tx_id.clone()).collect();

        for tx_id in pending {
            let status = match submitter.status(&tx_id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(tx_id = %tx_id, error = %e, "Status lookup failed");
                    report.still_pending += 1;
                    continue;
                }
            };
            match self.apply_status(&tx_id, status) {
                Ok(SubmissionState::Confirmed) => report.confirmed.push(tx_id),
                Ok(SubmissionState::Failed(_)) | Err(_) => report.failed.push(tx_id),
                Ok(SubmissionState::Pending) => report.still_pending += 1,
            }
        }

        debug!(
            confirmed = report.confirmed.len(),
            failed = report.failed.len(),
            pending = report.still_pending,
            "Submission refresh complete"
        );
        report
    }

    /// Drop every confirmed or failed submission, returning how many were
    /// removed. Confirmed claims stay recorded, so a pruned record still
    /// cannot be claimed twice.
    pub fn prune_settled(&mut self) -> usize {
        let before = self.submissions.len();
        self.submissions.retain(|_, s| !s.state.is_final());
        let pruned = before - self.submissions.len();
        if pruned > 0 {
            debug!(pruned, remaining = self.submissions.len(), "Pruned settled submissions");
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }

    pub fn get(&self, tx_id: &str) -> Option<&Submission> {
        self.submissions.get(tx_id)
    }

    pub fn pending(&self) -> impl Iterator<Item = &Submission> {
        self.submissions
            .values()
            .filter(|s| s.state == SubmissionState::Pending)
    }

    /// Whether a record's winnings have been claimed. Only a confirmed
    /// claim counts.
    pub fn is_claimed(&self, record_id: &str) -> bool {
        self.claimed.contains(record_id)
    }

    fn has_open_claim(&self, record_id: &str) -> bool {
        self.is_claimed(record_id)
            || self
                .pending()
                .any(|s| s.request.claimed_record() == Some(record_id))
    }
}
