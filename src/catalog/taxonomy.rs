use crate::catalog::ids::id_candidates;
use crate::catalog::{CatalogError, CategoryKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A node in the major/middle/minor hierarchy.
///
/// `path` lists ancestor ids including self (`[majorId]`,
/// `[majorId, middleId]`, ...). It is redundant with `parent_id` but kept
/// explicit so containment queries need no tree traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub path: Vec<String>,
}

/// Category nodes keyed by their caller-assigned id. Nodes are created and
/// deleted, never updated in place.
#[derive(Debug, Clone, Default)]
pub struct CategoryStore {
    nodes: Arc<RwLock<BTreeMap<String, CategoryNode>>>,
}

impl CategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, mut node: CategoryNode) -> Result<CategoryNode, CatalogError> {
        if node.id.is_empty() {
            return Err(CatalogError::Validation("id is required".into()));
        }
        if node.name.is_empty() {
            return Err(CatalogError::Validation("name is required".into()));
        }
        if node.path.is_empty() {
            node.path = vec![node.id.clone()];
        }

        let mut nodes = self.nodes.write().await;
        if nodes.contains_key(&node.id) {
            return Err(CatalogError::AlreadyExists(node.id));
        }
        nodes.insert(node.id.clone(), node.clone());
        Ok(node)
    }

    pub async fn list_by_kind(&self, kind: CategoryKind) -> Vec<CategoryNode> {
        let nodes = self.nodes.read().await;
        let mut out: Vec<CategoryNode> =
            nodes.values().filter(|n| n.kind == kind).cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Nodes of `kind` whose path contains `ancestor`, name-ascending.
    pub async fn list_by_ancestor(&self, kind: CategoryKind, ancestor: &str) -> Vec<CategoryNode> {
        self.list_by_ancestors(kind, &[ancestor.to_string()]).await
    }

    /// Nodes of `kind` whose path contains every requested ancestor id.
    /// Containment conjunction, not an ordered prefix match.
    pub async fn list_by_ancestors(
        &self,
        kind: CategoryKind,
        ancestors: &[String],
    ) -> Vec<CategoryNode> {
        let nodes = self.nodes.read().await;
        let mut out: Vec<CategoryNode> = nodes
            .values()
            .filter(|n| n.kind == kind && ancestors.iter().all(|a| n.path.contains(a)))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Delete by id, trying the decoded form first and the literal input
    /// second. Returns the number of nodes deleted (always 1 on success).
    pub async fn delete_by_id(&self, id_param: &str) -> Result<u64, CatalogError> {
        let mut nodes = self.nodes.write().await;
        for candidate in id_candidates(id_param) {
            if nodes.remove(&candidate).is_some() {
                return Ok(1);
            }
        }
        Err(CatalogError::NotFound(id_param.to_string()))
    }
}
