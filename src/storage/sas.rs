//! Shared-key credentials and SAS-style URL signing.
//!
//! The signing key is derived once at startup from a connection string of
//! the form `AccountName=..;AccountKey=..;..` and reused read-only for the
//! process lifetime. Signing is a pure function of its inputs plus the
//! account key, so identical inputs always produce identical signatures.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Version token stamped into every grant (`sv` query field).
const SIGNED_VERSION: &str = "2024-05-04";

/// How far in the past `valid_from` is pushed to tolerate clock skew
/// between signer and verifier.
pub const CLOCK_SKEW_TOLERANCE_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("connection string is missing {0}")]
    MissingField(&'static str),
    #[error("AccountKey is not valid base64")]
    InvalidKey,
}

/// Account name plus decoded signing key, parsed from a
/// semicolon-delimited connection string.
#[derive(Clone)]
pub struct SharedKeyCredential {
    pub account: String,
    key: Vec<u8>,
    blob_endpoint: Option<String>,
}

impl std::fmt::Debug for SharedKeyCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log the key material.
        f.debug_struct("SharedKeyCredential")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl SharedKeyCredential {
    pub fn from_connection_string(conn: &str) -> Result<Self, CredentialError> {
        let mut fields: HashMap<&str, &str> = HashMap::new();
        for part in conn.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            // Split at the first '=': AccountKey values carry base64 padding.
            if let Some((k, v)) = part.split_once('=') {
                fields.insert(k, v);
            }
        }

        let account = fields
            .get("AccountName")
            .filter(|v| !v.is_empty())
            .ok_or(CredentialError::MissingField("AccountName"))?
            .to_string();
        let raw_key = fields
            .get("AccountKey")
            .filter(|v| !v.is_empty())
            .ok_or(CredentialError::MissingField("AccountKey"))?;
        let key = STANDARD
            .decode(raw_key)
            .map_err(|_| CredentialError::InvalidKey)?;

        Ok(Self {
            account,
            key,
            blob_endpoint: fields.get("BlobEndpoint").map(|v| v.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Permission {
    Read,
}

impl Permission {
    fn token(self) -> char {
        match self {
            Permission::Read => 'r',
        }
    }
}

fn render_permissions(perms: &[Permission]) -> String {
    let mut sorted: Vec<Permission> = perms.to_vec();
    sorted.sort();
    sorted.dedup();
    sorted.iter().map(|p| p.token()).collect()
}

fn format_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Time-bounded, permission-scoped access to one object. Derived on every
/// request, never persisted.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub container: String,
    pub key: String,
    pub permissions: Vec<Permission>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub signature: String,
}

impl AccessGrant {
    /// Query string carrying the signing parameters and signature.
    pub fn query_string(&self) -> String {
        format!(
            "sv={}&sr=b&sp={}&st={}&se={}&sig={}",
            SIGNED_VERSION,
            render_permissions(&self.permissions),
            urlencoding::encode(&format_time(self.valid_from)),
            urlencoding::encode(&format_time(self.valid_until)),
            urlencoding::encode(&self.signature),
        )
    }
}

/// Signs object URLs with the account key. Constructed once at startup and
/// shared read-only across request handlers.
#[derive(Debug, Clone)]
pub struct UrlSigner {
    cred: SharedKeyCredential,
    endpoint: String,
}

impl UrlSigner {
    pub fn new(cred: SharedKeyCredential) -> Self {
        let endpoint = cred
            .blob_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}.blob.core.windows.net", cred.account));
        let endpoint = endpoint.trim_end_matches('/').to_string();
        Self { cred, endpoint }
    }

    /// Unsigned base URL of an object. This is the full URL for objects in
    /// public-read containers.
    pub fn base_url(&self, container: &str, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            container,
            urlencoding::encode(key)
        )
    }

    /// Produce a grant for the given window. Deterministic: identical
    /// inputs and account key yield a byte-identical signature.
    pub fn grant(
        &self,
        container: &str,
        key: &str,
        permissions: &[Permission],
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
    ) -> AccessGrant {
        let string_to_sign = format!(
            "{}\n{}\n{}\n/{}/{}/{}\n{}",
            render_permissions(permissions),
            format_time(valid_from),
            format_time(valid_until),
            self.cred.account,
            container,
            key,
            SIGNED_VERSION,
        );

        let mut mac = HmacSha256::new_from_slice(&self.cred.key)
            .expect("hmac accepts keys of any length");
        mac.update(string_to_sign.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        AccessGrant {
            container: container.to_string(),
            key: key.to_string(),
            permissions: permissions.to_vec(),
            valid_from,
            valid_until,
            signature,
        }
    }

    pub fn signed_url(&self, grant: &AccessGrant) -> String {
        format!(
            "{}?{}",
            self.base_url(&grant.container, &grant.key),
            grant.query_string()
        )
    }

    /// Read-only URL valid for `ttl` from now, with `valid_from` pushed
    /// back by the clock-skew tolerance.
    pub fn read_url(&self, container: &str, key: &str, ttl: Duration) -> String {
        let now = Utc::now();
        let grant = self.grant(
            container,
            key,
            &[Permission::Read],
            now - Duration::seconds(CLOCK_SKEW_TOLERANCE_SECS),
            now + ttl,
        );
        self.signed_url(&grant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const CONN: &str =
        "DefaultEndpointsProtocol=https;AccountName=devacct;AccountKey=a2V5LW1hdGVyaWFsLWhlcmU=;EndpointSuffix=core.windows.net";

    fn signer() -> UrlSigner {
        UrlSigner::new(SharedKeyCredential::from_connection_string(CONN).unwrap())
    }

    #[test]
    fn parses_account_and_key() {
        let cred = SharedKeyCredential::from_connection_string(CONN).unwrap();
        assert_eq!(cred.account, "devacct");
        assert_eq!(cred.key, b"key-material-here");
    }

    #[test]
    fn missing_account_name_fails() {
        let err = SharedKeyCredential::from_connection_string("AccountKey=a2V5").unwrap_err();
        assert!(matches!(err, CredentialError::MissingField("AccountName")));
    }

    #[test]
    fn missing_account_key_fails() {
        let err =
            SharedKeyCredential::from_connection_string("AccountName=devacct").unwrap_err();
        assert!(matches!(err, CredentialError::MissingField("AccountKey")));
    }

    #[test]
    fn garbage_key_fails() {
        let err = SharedKeyCredential::from_connection_string(
            "AccountName=devacct;AccountKey=!!not-base64!!",
        )
        .unwrap_err();
        assert!(matches!(err, CredentialError::InvalidKey));
    }

    #[test]
    fn signing_is_deterministic() {
        let s = signer();
        let from = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2025, 1, 15, 13, 0, 0).unwrap();

        let a = s.grant("videos", "clip.mp4", &[Permission::Read], from, until);
        let b = s.grant("videos", "clip.mp4", &[Permission::Read], from, until);
        assert_eq!(a.signature, b.signature);
        assert_eq!(s.signed_url(&a), s.signed_url(&b));
    }

    #[test]
    fn signature_covers_the_key() {
        let s = signer();
        let from = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2025, 1, 15, 13, 0, 0).unwrap();

        let a = s.grant("videos", "clip.mp4", &[Permission::Read], from, until);
        let b = s.grant("videos", "other.mp4", &[Permission::Read], from, until);
        assert_ne!(a.signature, b.signature);
    }

    #[test]
    fn query_string_carries_all_parameters() {
        let s = signer();
        let from = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2025, 1, 15, 13, 0, 0).unwrap();
        let url = s.signed_url(&s.grant("videos", "clip.mp4", &[Permission::Read], from, until));

        assert!(url.starts_with("https://devacct.blob.core.windows.net/videos/clip.mp4?"));
        assert!(url.contains("sp=r"));
        assert!(url.contains("sv=2024-05-04"));
        assert!(url.contains("st=2025-01-15T12%3A00%3A00Z"));
        assert!(url.contains("se=2025-01-15T13%3A00%3A00Z"));
        assert!(url.contains("sig="));
    }

    #[test]
    fn blob_endpoint_override_is_honored() {
        let cred = SharedKeyCredential::from_connection_string(
            "AccountName=devacct;AccountKey=a2V5;BlobEndpoint=http://127.0.0.1:10000/devacct",
        )
        .unwrap();
        let s = UrlSigner::new(cred);
        assert_eq!(
            s.base_url("videos", "clip.mp4"),
            "http://127.0.0.1:10000/devacct/videos/clip.mp4"
        );
    }

    #[test]
    fn read_url_is_signed() {
        let url = signer().read_url("videos", "clip.mp4", Duration::minutes(10));
        assert!(url.contains("sp=r"));
        assert!(url.contains("sig="));
    }
}
