//! Vocabulary edge reconciliation.
//!
//! Card-to-value and card-to-capability links are stored as two
//! independent boolean maps with no transaction covering them, so a
//! crash between the two writes leaves a one-sided edge. This pass
//! walks both sides of both link types and re-adds whichever half is
//! missing. Repair is add-only: a present half is taken as intent, so
//! an interrupted `remove` is completed by a later explicit remove,
//! never by the reconciler guessing.

use accord_domain::{CapabilityId, CardId, ValueId};

use crate::infrastructure::persistence::Repositories;
use crate::infrastructure::ports::RepoError;
use crate::infrastructure::store::{collections, Path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedEdge {
    /// Path of the node whose map was missing the entry.
    pub node: String,
    pub field: String,
    pub target: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub cards_scanned: usize,
    pub values_scanned: usize,
    pub capabilities_scanned: usize,
    pub repaired: Vec<RepairedEdge>,
}

pub struct EdgeReconciler {
    repos: Repositories,
}

impl EdgeReconciler {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Scan all vocabulary edges and repair asymmetric ones. Returns
    /// what was scanned and every half-edge that was re-added.
    pub async fn reconcile_vocabulary(&self) -> Result<ReconcileReport, RepoError> {
        let mut report = ReconcileReport::default();

        for card in self.repos.cards.get_all().await? {
            report.cards_scanned += 1;
            self.repair_from_card(&card.id, &mut report).await?;
        }
        for value in self.repos.vocab.get_all_values().await? {
            report.values_scanned += 1;
            self.repair_from_value(&value.id, &mut report).await?;
        }
        for cap in self.repos.vocab.get_all_capabilities().await? {
            report.capabilities_scanned += 1;
            self.repair_from_capability(&cap.id, &mut report).await?;
        }

        if report.repaired.is_empty() {
            tracing::debug!(cards = report.cards_scanned, "vocabulary edges consistent");
        } else {
            tracing::info!(
                repaired = report.repaired.len(),
                cards = report.cards_scanned,
                "repaired asymmetric vocabulary edges"
            );
        }
        Ok(report)
    }

    /// Card side present, vocabulary side missing.
    async fn repair_from_card(
        &self,
        card: &CardId,
        report: &mut ReconcileReport,
    ) -> Result<(), RepoError> {
        for value in self.repos.cards.value_ids(card).await? {
            let value_path = Path::entity(collections::VALUES, &value);
            if !self.repos.edges.has_edge(&value_path, "cards_ref", card.as_str()).await? {
                self.repos
                    .edges
                    .add_edge(&value_path, "cards_ref", card.as_str())
                    .await?;
                record(report, &value_path, "cards_ref", card.as_str());
            }
        }
        for cap in self.repos.cards.capability_ids(card).await? {
            let cap_path = Path::entity(collections::CAPABILITIES, &cap);
            if !self.repos.edges.has_edge(&cap_path, "cards_ref", card.as_str()).await? {
                self.repos
                    .edges
                    .add_edge(&cap_path, "cards_ref", card.as_str())
                    .await?;
                record(report, &cap_path, "cards_ref", card.as_str());
            }
        }
        Ok(())
    }

    /// Value side present, card side missing.
    async fn repair_from_value(
        &self,
        value: &ValueId,
        report: &mut ReconcileReport,
    ) -> Result<(), RepoError> {
        for card in self.repos.vocab.value_card_ids(value).await? {
            let card_path = Path::entity(collections::CARDS, &card);
            if !self.repos.edges.has_edge(&card_path, "values_ref", value.as_str()).await? {
                self.repos
                    .edges
                    .add_edge(&card_path, "values_ref", value.as_str())
                    .await?;
                record(report, &card_path, "values_ref", value.as_str());
            }
        }
        Ok(())
    }

    async fn repair_from_capability(
        &self,
        cap: &CapabilityId,
        report: &mut ReconcileReport,
    ) -> Result<(), RepoError> {
        for card in self.repos.vocab.capability_card_ids(cap).await? {
            let card_path = Path::entity(collections::CARDS, &card);
            if !self.repos.edges.has_edge(&card_path, "caps_ref", cap.as_str()).await? {
                self.repos
                    .edges
                    .add_edge(&card_path, "caps_ref", cap.as_str())
                    .await?;
                record(report, &card_path, "caps_ref", cap.as_str());
            }
        }
        Ok(())
    }
}

fn record(report: &mut ReconcileReport, node: &Path, field: &str, target: &str) {
    tracing::warn!(node = node.as_str(), field, target, "re-added missing edge half");
    report.repaired.push(RepairedEdge {
        node: node.as_str().to_string(),
        field: field.to_string(),
        target: target.to_string(),
    });
}
