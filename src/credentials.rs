//! Credential extraction from the child's trailing payload.
//!
//! The child tool is contracted to emit exactly one JSON object as the
//! last thing it writes, with no trailing newline, so the payload lands
//! in the reader's unterminated tail rather than being drained as a
//! completed line.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{AuthError, Result};

/// Environment variable names recognized as credential fields. Anything
/// else in the payload is dropped, which keeps newer aws-vault versions
/// from leaking unexpected variables into the record.
pub const AWS_ENV_VARS: &[&str] = &[
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "AWS_SECURITY_TOKEN",
    "AWS_REGION",
    "AWS_DEFAULT_REGION",
    "AWS_VAULT",
    "AWS_SESSION_EXPIRATION",
    "AWS_CREDENTIAL_EXPIRATION",
];

/// Filtered credential mapping produced after a successful run.
///
/// Immutable once constructed; downstream shapes (`crate::convert`) are
/// projections of this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialRecord(BTreeMap<String, String>);

impl CredentialRecord {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl FromIterator<(String, String)> for CredentialRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(fields: I) -> Self {
        Self(filter_fields(fields.into_iter().collect()))
    }
}

/// Parse the trailing buffer as the credential payload.
///
/// `diagnostics` is the accumulated diagnostic text; it travels in the
/// error so a parse failure can be diagnosed without the live stream.
pub fn extract(remainder: &[u8], diagnostics: &str) -> Result<CredentialRecord> {
    let parsed: BTreeMap<String, String> =
        serde_json::from_slice(remainder).map_err(|source| AuthError::PayloadParse {
            diagnostics: diagnostics.to_string(),
            remainder: String::from_utf8_lossy(remainder).into_owned(),
            source,
        })?;
    Ok(CredentialRecord(filter_fields(parsed)))
}

/// Project a parsed payload down to the recognized field names.
///
/// Pure: applying it to its own output is a no-op.
pub fn filter_fields(fields: BTreeMap<String, String>) -> BTreeMap<String, String> {
    fields
        .into_iter()
        .filter(|(name, _)| AWS_ENV_VARS.contains(&name.as_str()))
        .collect()
}
