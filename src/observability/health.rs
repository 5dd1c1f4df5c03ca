/// Health check implementations for the storage and signing components
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::handler::BaseHandler;
use crate::storage::sas::Permission;
use crate::storage::BlobStore;

/// Overall health status
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub checks: Vec<HealthCheck>,
}

/// Individual health check result
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    pub message: Option<String>,
    pub duration_ms: f64,
}

/// Check blob store health
pub async fn check_storage_health(storage: &Arc<dyn BlobStore>) -> HealthCheck {
    let start = std::time::Instant::now();

    match storage.list_containers().await {
        Ok(_) => HealthCheck {
            name: "storage".to_string(),
            status: "healthy".to_string(),
            message: None,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        },
        Err(e) => HealthCheck {
            name: "storage".to_string(),
            status: "unhealthy".to_string(),
            message: Some(format!("Storage check failed: {}", e)),
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        },
    }
}

/// Check the URL signer by producing a grant for a probe key. Signing is
/// pure computation; an empty signature means the key material is unusable.
pub fn check_signer_health(handler: &BaseHandler) -> HealthCheck {
    let start = std::time::Instant::now();
    let now = chrono::Utc::now();
    let grant = handler.signer.grant(
        &handler.video_container,
        "__health_check__",
        &[Permission::Read],
        now,
        now + chrono::Duration::minutes(1),
    );

    if grant.signature.is_empty() {
        HealthCheck {
            name: "signer".to_string(),
            status: "unhealthy".to_string(),
            message: Some("Signer produced an empty signature".to_string()),
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        }
    } else {
        HealthCheck {
            name: "signer".to_string(),
            status: "healthy".to_string(),
            message: None,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        }
    }
}

/// Get overall health status by checking all components
pub async fn get_health_status(handler: &BaseHandler) -> HealthStatus {
    let checks = vec![
        check_storage_health(&handler.storage).await,
        check_signer_health(handler),
    ];

    let all_healthy = checks.iter().all(|c| c.status == "healthy");

    HealthStatus {
        status: if all_healthy {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
        checks,
    }
}
