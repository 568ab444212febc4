//! Shared test utilities.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tempfile::TempDir;

/// Write an executable shell script standing in for aws-vault.
///
/// The scripts ignore their arguments, so the driver's full `exec ... --`
/// argument vector is accepted unchanged.
pub fn fake_child(body: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("fake-aws-vault");
    fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write script");
    let mut permissions = fs::metadata(&path).expect("stat script").permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).expect("chmod script");
    (dir, path)
}
