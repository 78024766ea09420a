use crate::core::error::{ProviderError, ProviderResult};
use crate::models::user::{User, VALID_PERMISSIONS};
use std::path::Path;

const MAX_ID: i64 = 65535;

/// Field rules enforced before a user is inserted or updated.
///
/// Any violation aborts the write, so a stored record always satisfies them.
pub fn validate_user(user: &User) -> ProviderResult<()> {
    if user.username.is_empty() {
        return Err(invalid("username is mandatory"));
    }

    if user.home_dir.is_empty() {
        return Err(invalid("home_dir is mandatory"));
    }

    if !Path::new(&user.home_dir).is_absolute() {
        return Err(invalid(format!(
            "home_dir must be an absolute path, actual value: {}",
            user.home_dir
        )));
    }

    if user.password.is_empty() && user.public_key.is_empty() {
        return Err(invalid("please set a password or at least a public key"));
    }

    if !user.public_key.is_empty() {
        parse_authorized_key(&user.public_key)
            .map_err(|e| invalid(format!("could not parse public key: {e}")))?;
    }

    validate_permissions(&user.permissions)?;

    for (name, value) in [("uid", user.uid), ("gid", user.gid)] {
        if !(0..=MAX_ID).contains(&value) {
            return Err(invalid(format!("{name} must be between 0 and {MAX_ID}")));
        }
    }

    for (name, value) in [
        ("max_sessions", user.max_sessions),
        ("quota_size", user.quota_size),
        ("quota_files", user.quota_files),
        ("upload_bandwidth", user.upload_bandwidth),
        ("download_bandwidth", user.download_bandwidth),
    ] {
        if value < 0 {
            return Err(invalid(format!("{name} must not be negative")));
        }
    }

    Ok(())
}

fn validate_permissions(permissions: &[String]) -> ProviderResult<()> {
    if permissions.is_empty() {
        return Err(invalid("please grant some permissions to this user"));
    }

    if let Some(unknown) = permissions
        .iter()
        .find(|p| !VALID_PERMISSIONS.contains(&p.as_str()))
    {
        return Err(invalid(format!("invalid permission: {unknown}")));
    }

    Ok(())
}

/// Parse an authorized-key line, options prefix allowed.
pub fn parse_authorized_key(text: &str) -> Result<ssh_key::PublicKey, ssh_key::Error> {
    let entry: ssh_key::authorized_keys::Entry = text.trim().parse()?;
    Ok(entry.public_key().clone())
}

fn invalid(message: impl Into<String>) -> ProviderError {
    ProviderError::Validation(message.into())
}
