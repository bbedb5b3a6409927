//! Storage account endpoints.
//!
//! The account name is interpolated into a host name, so it is validated before any URL is
//! built.

use crate::error::{BlobStorageError, Result};
use url::Url;

/// Public Azure endpoint template. `{account}` is replaced with the storage account name.
pub const DEFAULT_ENDPOINT_TEMPLATE: &str = "https://{account}.blob.core.windows.net";

const ACCOUNT_PLACEHOLDER: &str = "{account}";

/// Stand-in account used to check a template before any real account is known.
const TEMPLATE_CHECK_ACCOUNT: &str = "account";

/// Azure storage account names: 3-24 characters, lowercase letters and digits only.
#[must_use]
pub fn is_valid_account_name(name: &str) -> bool {
    (3..=24).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// Resolve the service endpoint for `account` from an endpoint template.
///
/// Templates may put the placeholder in the host (`https://{account}.blob.core.windows.net`) or
/// in the path, as local emulators do (`http://127.0.0.1:10000/{account}`).
///
/// # Errors
///
/// Returns an error if the account name is invalid, the template has no placeholder, or the
/// result is not an `http(s)` URL.
pub fn service_endpoint(template: &str, account: &str) -> Result<Url> {
    if !is_valid_account_name(account) {
        return Err(BlobStorageError::InvalidEndpoint(format!(
            "invalid storage account name '{account}'"
        )));
    }
    if !template.contains(ACCOUNT_PLACEHOLDER) {
        return Err(BlobStorageError::InvalidEndpoint(format!(
            "endpoint template must contain {ACCOUNT_PLACEHOLDER}"
        )));
    }

    let raw = template.replace(ACCOUNT_PLACEHOLDER, account);
    let url = Url::parse(&raw)
        .map_err(|e| BlobStorageError::InvalidEndpoint(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(BlobStorageError::InvalidEndpoint(format!(
            "unsupported scheme '{other}'"
        ))),
    }
}

/// Check an endpoint template on its own: placeholder present, and an `http(s)` URL once the
/// placeholder is filled in. After this passes, [`service_endpoint`] can only fail on the
/// account name.
///
/// # Errors
///
/// Returns an error if the template has no placeholder or does not produce an `http(s)` URL.
pub fn validate_endpoint_template(template: &str) -> Result<()> {
    service_endpoint(template, TEMPLATE_CHECK_ACCOUNT).map(|_| ())
}

/// Drop the query string and any userinfo from a URL before it is logged.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    u.set_query(None);
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.to_string()
}

/// Render a `reqwest` error without the query part of its URL.
#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}
