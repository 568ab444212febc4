//! Downstream credential shapes.
//!
//! Pure projections of a [`CredentialRecord`]; the driver itself never
//! calls these. The format string is validated up front so an unknown
//! shape is rejected before any child process is spawned.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

use crate::credentials::{CredentialRecord, AWS_ENV_VARS};
use crate::error::{AuthError, Result};

/// Requested shape of the authentication result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// The raw filtered record, field names as aws-vault exported them.
    #[default]
    Vault,
    /// SDK client parameters (access key, secret, session token, region).
    Boto,
    /// Object-storage filesystem parameters (key, secret, token).
    S3fs,
    /// Environment-variable mapping restricted to the allow-list.
    Environ,
}

impl FromStr for OutputFormat {
    type Err = AuthError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "" | "vault" => Ok(OutputFormat::Vault),
            "boto" | "boto3" => Ok(OutputFormat::Boto),
            "s3fs" => Ok(OutputFormat::S3fs),
            "env" | "environ" => Ok(OutputFormat::Environ),
            other => Err(AuthError::UnknownFormat(other.to_string())),
        }
    }
}

/// Parameters for an SDK client constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotoAuth {
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub aws_session_token: String,
    pub region_name: String,
}

/// Parameters for a filesystem-over-object-storage client. No region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct S3fsAuth {
    pub key: String,
    pub secret: String,
    pub token: String,
}

fn required(record: &CredentialRecord, field: &'static str) -> Result<String> {
    record
        .get(field)
        .map(str::to_string)
        .ok_or(AuthError::MissingField { field })
}

pub fn to_boto_auth(record: &CredentialRecord) -> Result<BotoAuth> {
    Ok(BotoAuth {
        aws_access_key_id: required(record, "AWS_ACCESS_KEY_ID")?,
        aws_secret_access_key: required(record, "AWS_SECRET_ACCESS_KEY")?,
        aws_session_token: required(record, "AWS_SESSION_TOKEN")?,
        region_name: required(record, "AWS_REGION")?,
    })
}

pub fn to_s3fs_auth(record: &CredentialRecord) -> Result<S3fsAuth> {
    Ok(S3fsAuth {
        key: required(record, "AWS_ACCESS_KEY_ID")?,
        secret: required(record, "AWS_SECRET_ACCESS_KEY")?,
        token: required(record, "AWS_SESSION_TOKEN")?,
    })
}

/// Restrict the record to variables safe to export into an environment.
/// The record is already allow-list filtered, so this is a plain copy by
/// recognized name.
pub fn to_environ_auth(record: &CredentialRecord) -> BTreeMap<String, String> {
    AWS_ENV_VARS
        .iter()
        .filter_map(|&name| record.get(name).map(|value| (name.to_string(), value.to_string())))
        .collect()
}

/// Authentication result in the caller-requested shape.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Auth {
    Vault(CredentialRecord),
    Boto(BotoAuth),
    S3fs(S3fsAuth),
    Environ(BTreeMap<String, String>),
}

impl Auth {
    pub fn from_record(record: CredentialRecord, format: OutputFormat) -> Result<Self> {
        Ok(match format {
            OutputFormat::Vault => Auth::Vault(record),
            OutputFormat::Boto => Auth::Boto(to_boto_auth(&record)?),
            OutputFormat::S3fs => Auth::S3fs(to_s3fs_auth(&record)?),
            OutputFormat::Environ => Auth::Environ(to_environ_auth(&record)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CredentialRecord {
        [
            ("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "s3cr3t"),
            ("AWS_SESSION_TOKEN", "tok"),
            ("AWS_REGION", "us-east-1"),
            ("AWS_VAULT", "work"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn boto_shape_pulls_the_four_sdk_fields() {
        let boto = to_boto_auth(&record()).unwrap();
        assert_eq!(boto.aws_access_key_id, "AKIAEXAMPLE");
        assert_eq!(boto.region_name, "us-east-1");
    }

    #[test]
    fn s3fs_shape_has_no_region() {
        let s3fs = to_s3fs_auth(&record()).unwrap();
        assert_eq!(s3fs.key, "AKIAEXAMPLE");
        assert_eq!(s3fs.token, "tok");
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let partial: CredentialRecord = [("AWS_ACCESS_KEY_ID".to_string(), "AKIA".to_string())]
            .into_iter()
            .collect();
        let err = to_boto_auth(&partial).unwrap_err();
        match err {
            AuthError::MissingField { field } => assert_eq!(field, "AWS_SECRET_ACCESS_KEY"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn environ_shape_keeps_only_recognized_names() {
        let environ = to_environ_auth(&record());
        assert_eq!(environ.len(), 5);
        assert!(environ.contains_key("AWS_VAULT"));
    }

    #[test]
    fn format_strings_parse_with_aliases() {
        assert_eq!("boto3".parse::<OutputFormat>().unwrap(), OutputFormat::Boto);
        assert_eq!("environ".parse::<OutputFormat>().unwrap(), OutputFormat::Environ);
        assert_eq!("".parse::<OutputFormat>().unwrap(), OutputFormat::Vault);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = "yaml".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, AuthError::UnknownFormat(name) if name == "yaml"));
    }
}
