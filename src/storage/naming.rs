use crate::storage::StorageError;
use chrono::Utc;
use uuid::Uuid;

/// Turn a client-supplied filename into a storage-safe name.
///
/// Leading path separators are stripped, remaining separator runs become a
/// single underscore, and whitespace runs become underscores. Fails when
/// nothing usable is left.
pub fn sanitize(original: &str) -> Result<String, StorageError> {
    let stripped = original.trim_start_matches(['/', '\\']);

    let mut flat = String::with_capacity(stripped.len());
    let mut in_separator = false;
    for c in stripped.chars() {
        if c == '/' || c == '\\' {
            if !in_separator {
                flat.push('_');
            }
            in_separator = true;
        } else {
            in_separator = false;
            flat.push(c);
        }
    }

    let mut safe = String::with_capacity(flat.len());
    let mut in_whitespace = false;
    for c in flat.trim().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                safe.push('_');
            }
            in_whitespace = true;
        } else {
            in_whitespace = false;
            safe.push(c);
        }
    }

    if safe.is_empty() {
        return Err(StorageError::InvalidName(original.to_string()));
    }
    Ok(safe)
}

/// Sanitized name with a collision-resistant prefix.
///
/// The random token carries uniqueness; the millisecond timestamp is only
/// there so keys sort roughly by upload time when listed.
pub fn unique_object_key(original: &str) -> Result<String, StorageError> {
    let safe = sanitize(original)?;
    let token = Uuid::new_v4().simple().to_string();
    Ok(format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        &token[..8],
        safe
    ))
}
