//! Special outbound approval workflow
//!
//! Requests start out `pending` and are decided exactly once, either
//! approved or rejected. Every step is written to the approval log.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::storage::{
    ApprovalAction, ApprovalLog, ApprovalStatus, InventoryStore, RecordFilter,
    SpecialOutboundRecord, StorageError,
};
use crate::variance::Thresholds;

/// Errors from the approval workflow
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Only pending records can be approved or rejected
    #[error("Special outbound {id} is already {status}")]
    AlreadyDecided { id: u32, status: ApprovalStatus },

    #[error("Variance report {0} has no suggested correction")]
    NoSuggestion(u32),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// A new special outbound request
#[derive(Debug, Clone, Deserialize)]
pub struct OutboundRequest {
    pub product_id: u32,
    pub outbound_date: NaiveDate,
    pub quantity: f64,
    pub reason: String,
    pub requested_by: String,
}

pub struct ApprovalWorkflow {
    store: Arc<dyn InventoryStore>,
    thresholds: Thresholds,
}

impl ApprovalWorkflow {
    pub fn new(store: Arc<dyn InventoryStore>, thresholds: Thresholds) -> Self {
        Self { store, thresholds }
    }

    /// Record a pending request and its `submitted` log entry
    pub async fn submit(&self, request: OutboundRequest) -> WorkflowResult<SpecialOutboundRecord> {
        if !request.quantity.is_finite() || request.quantity <= 0.0 {
            return Err(WorkflowError::Validation(format!(
                "quantity must be greater than zero (got {})",
                request.quantity
            )));
        }
        let reason = required(&request.reason, "reason")?;
        let requested_by = required(&request.requested_by, "requested_by")?;

        self.store.get_product(request.product_id).await?;

        let record = self
            .store
            .insert_special_outbound(SpecialOutboundRecord::new(
                request.product_id,
                request.outbound_date,
                request.quantity,
                reason,
                requested_by.clone(),
            ))
            .await?;

        self.log(record.id, ApprovalAction::Submitted, requested_by, None)
            .await?;

        tracing::info!(
            outbound_id = record.id,
            product_id = record.product_id,
            quantity = record.quantity,
            "Special outbound submitted"
        );
        Ok(record)
    }

    pub async fn approve(
        &self,
        id: u32,
        approver: &str,
        comment: Option<String>,
    ) -> WorkflowResult<SpecialOutboundRecord> {
        let approver = required(approver, "approver")?;
        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        self.decide(id, ApprovalStatus::Approved, approver, comment)
            .await
    }

    /// Reject a pending request. A reason is mandatory.
    pub async fn reject(
        &self,
        id: u32,
        approver: &str,
        reason: &str,
    ) -> WorkflowResult<SpecialOutboundRecord> {
        let approver = required(approver, "approver")?;
        let reason = required(reason, "reason")?;
        self.decide(id, ApprovalStatus::Rejected, approver, Some(reason))
            .await
    }

    async fn decide(
        &self,
        id: u32,
        status: ApprovalStatus,
        approver: String,
        note: Option<String>,
    ) -> WorkflowResult<SpecialOutboundRecord> {
        let mut record = self.store.get_special_outbound(id).await?;
        if record.status != ApprovalStatus::Pending {
            return Err(WorkflowError::AlreadyDecided {
                id,
                status: record.status,
            });
        }

        record.status = status;
        record.decided_by = Some(approver.clone());
        record.decision_note = note.clone();
        record.decided_at = Some(Utc::now());
        let record = self.store.update_special_outbound(record).await?;

        let action = match status {
            ApprovalStatus::Rejected => ApprovalAction::Rejected,
            _ => ApprovalAction::Approved,
        };
        self.log(id, action, approver.clone(), note).await?;

        tracing::info!(
            outbound_id = id,
            status = %status,
            approver = %approver,
            "Special outbound decided"
        );
        Ok(record)
    }

    /// Turn the suggested correction of a variance report into a pending request
    pub async fn suggest_from_variance(
        &self,
        report_id: u32,
        requested_by: &str,
    ) -> WorkflowResult<SpecialOutboundRecord> {
        let report = self.store.get_variance_report(report_id).await?;
        let assessment = crate::variance::assess(&report.inputs, &self.thresholds);
        let correction = assessment
            .suggested_correction
            .ok_or(WorkflowError::NoSuggestion(report_id))?;

        self.submit(OutboundRequest {
            product_id: report.product_id,
            outbound_date: report.report_date,
            quantity: correction.quantity,
            reason: correction.reason,
            requested_by: requested_by.to_string(),
        })
        .await
    }

    pub async fn get(&self, id: u32) -> WorkflowResult<SpecialOutboundRecord> {
        Ok(self.store.get_special_outbound(id).await?)
    }

    pub async fn list(
        &self,
        filter: RecordFilter,
        status: Option<ApprovalStatus>,
    ) -> WorkflowResult<Vec<SpecialOutboundRecord>> {
        Ok(self.store.list_special_outbound(filter, status).await?)
    }

    /// Approval log entries for a request, oldest first
    pub async fn history(&self, id: u32) -> WorkflowResult<Vec<ApprovalLog>> {
        self.store.get_special_outbound(id).await?;
        let mut logs = self.store.list_approval_logs(id).await?;
        logs.sort_by_key(|l| (l.created_at, l.id));
        Ok(logs)
    }

    async fn log(
        &self,
        outbound_id: u32,
        action: ApprovalAction,
        actor: String,
        comment: Option<String>,
    ) -> WorkflowResult<ApprovalLog> {
        Ok(self
            .store
            .insert_approval_log(ApprovalLog::new(outbound_id, action, actor, comment))
            .await?)
    }
}

fn required(value: &str, field: &str) -> WorkflowResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(WorkflowError::Validation(format!("{} is required", field)))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, Product, VarianceReport};
    use crate::variance::VarianceInputs;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    async fn setup() -> (Arc<dyn InventoryStore>, ApprovalWorkflow, u32) {
        let store: Arc<dyn InventoryStore> = Arc::new(MemoryStore::new());
        let product = store
            .insert_product(Product::new("SP1", "Tea", "box"))
            .await
            .unwrap();
        let workflow = ApprovalWorkflow::new(Arc::clone(&store), Thresholds::default());
        (store, workflow, product.id)
    }

    fn request(product_id: u32) -> OutboundRequest {
        OutboundRequest {
            product_id,
            outbound_date: date(),
            quantity: 4.0,
            reason: "Damaged in transit".to_string(),
            requested_by: "Lan".to_string(),
        }
    }

    #[tokio::test]
    async fn test_submit_creates_pending_with_log() {
        let (_store, workflow, product_id) = setup().await;

        let record = workflow.submit(request(product_id)).await.unwrap();
        assert_eq!(record.status, ApprovalStatus::Pending);

        let history = workflow.history(record.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, ApprovalAction::Submitted);
        assert_eq!(history[0].actor, "Lan");
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let (_store, workflow, product_id) = setup().await;

        let mut zero = request(product_id);
        zero.quantity = 0.0;
        assert!(matches!(
            workflow.submit(zero).await,
            Err(WorkflowError::Validation(_))
        ));

        let mut no_reason = request(product_id);
        no_reason.reason = "   ".to_string();
        assert!(matches!(
            workflow.submit(no_reason).await,
            Err(WorkflowError::Validation(_))
        ));

        assert!(matches!(
            workflow.submit(request(404)).await,
            Err(WorkflowError::Storage(StorageError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_approve() {
        let (_store, workflow, product_id) = setup().await;
        let record = workflow.submit(request(product_id)).await.unwrap();

        let approved = workflow
            .approve(record.id, "Minh", Some("ok".to_string()))
            .await
            .unwrap();
        assert_eq!(approved.status, ApprovalStatus::Approved);
        assert_eq!(approved.decided_by.as_deref(), Some("Minh"));
        assert!(approved.decided_at.is_some());

        let history = workflow.history(record.id).await.unwrap();
        let actions: Vec<_> = history.iter().map(|l| l.action).collect();
        assert_eq!(actions, vec![ApprovalAction::Submitted, ApprovalAction::Approved]);
    }

    #[tokio::test]
    async fn test_reject_requires_reason() {
        let (_store, workflow, product_id) = setup().await;
        let record = workflow.submit(request(product_id)).await.unwrap();

        assert!(matches!(
            workflow.reject(record.id, "Minh", "").await,
            Err(WorkflowError::Validation(_))
        ));

        let rejected = workflow
            .reject(record.id, "Minh", "Not damaged")
            .await
            .unwrap();
        assert_eq!(rejected.status, ApprovalStatus::Rejected);
        assert_eq!(rejected.decision_note.as_deref(), Some("Not damaged"));
    }

    #[tokio::test]
    async fn test_decided_records_are_final() {
        let (_store, workflow, product_id) = setup().await;
        let record = workflow.submit(request(product_id)).await.unwrap();
        workflow.approve(record.id, "Minh", None).await.unwrap();

        let err = workflow.reject(record.id, "Minh", "changed mind").await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::AlreadyDecided {
                status: ApprovalStatus::Approved,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_approver_required() {
        let (_store, workflow, product_id) = setup().await;
        let record = workflow.submit(request(product_id)).await.unwrap();

        assert!(matches!(
            workflow.approve(record.id, " ", None).await,
            Err(WorkflowError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_suggest_from_variance() {
        let (store, workflow, product_id) = setup().await;

        let shortage = store
            .save_variance_report(VarianceReport::new(
                product_id,
                date(),
                VarianceInputs {
                    beginning_inventory: 100.0,
                    actual_inventory: 80.0,
                    ..Default::default()
                },
            ))
            .await
            .unwrap();

        let record = workflow
            .suggest_from_variance(shortage.id, "Lan")
            .await
            .unwrap();
        assert_eq!(record.quantity, 20.0);
        assert_eq!(record.status, ApprovalStatus::Pending);
        assert_eq!(record.outbound_date, date());
    }

    #[tokio::test]
    async fn test_suggest_without_correction() {
        let (store, workflow, product_id) = setup().await;

        let balanced = store
            .save_variance_report(VarianceReport::new(
                product_id,
                date(),
                VarianceInputs {
                    beginning_inventory: 100.0,
                    actual_inventory: 100.0,
                    ..Default::default()
                },
            ))
            .await
            .unwrap();

        let err = workflow
            .suggest_from_variance(balanced.id, "Lan")
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NoSuggestion(_)));
    }
}
