use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

pub mod ids;
pub mod metadata;
pub mod taxonomy;
pub mod uploads;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
}

/// Level of a node in the three-level category hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Major,
    Middle,
    Minor,
}

impl FromStr for CategoryKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(CategoryKind::Major),
            "middle" => Ok(CategoryKind::Middle),
            "minor" => Ok(CategoryKind::Minor),
            other => Err(CatalogError::Validation(format!(
                "unknown category kind: {other}"
            ))),
        }
    }
}
