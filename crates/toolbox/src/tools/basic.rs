//! Stateless tools: no I/O, no failure modes beyond argument checking.

use crate::config::HostInfo;
use crate::context::ToolContext;
use crate::error::{ToolError, ToolResult};
use chrono::{DateTime, Utc};
use rmcp::model::JsonObject;
use serde_json::Value;

/// Fetch a required string argument.
pub(crate) fn required_string<'a>(args: &'a JsonObject, key: &str) -> Result<&'a str, ToolError> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ToolError::InvalidArguments(format!(
            "'{key}' must be a string"
        ))),
        None => Err(ToolError::InvalidArguments(format!("'{key}' is required"))),
    }
}

#[must_use]
pub fn echo_text(message: &str) -> String {
    format!("hello {message}")
}

/// Length is counted in characters, not bytes.
#[must_use]
pub fn content_length_text(message: &str) -> String {
    format!(
        "Your message is {} characters long.",
        message.chars().count()
    )
}

#[must_use]
pub fn version_text(host: &HostInfo, now: DateTime<Utc>) -> String {
    format!(
        "MCP (anonymous) Version: {} Server: {} Date: {} UTC",
        host.version,
        host.identity(),
        now.format("%Y-%m-%d %H:%M:%S")
    )
}

#[must_use]
pub fn cart_text(item: &str, host: &HostInfo) -> String {
    format!(
        "Item '{item}' added to the shopping cart ({}).",
        host.identity()
    )
}

pub fn echo(_ctx: &ToolContext<'_>, args: &JsonObject) -> ToolResult {
    required_string(args, "message").map(echo_text)
}

pub fn content_length(_ctx: &ToolContext<'_>, args: &JsonObject) -> ToolResult {
    required_string(args, "message").map(content_length_text)
}

pub fn get_version(ctx: &ToolContext<'_>, _args: &JsonObject) -> ToolResult {
    Ok(version_text(&ctx.services.host, Utc::now()))
}

pub fn add_to_cart(ctx: &ToolContext<'_>, args: &JsonObject) -> ToolResult {
    let item = required_string(args, "item")?;
    Ok(cart_text(item, &ctx.services.host))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::services;
    use chrono::TimeZone as _;
    use serde_json::json;

    fn args(v: serde_json::Value) -> JsonObject {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn echo_prefixes_hello() {
        for m in ["", "world", "  spaced  ", "ünïcødé", "hello"] {
            assert_eq!(echo_text(m), format!("hello {m}"));
        }
    }

    #[test]
    fn content_length_counts_characters() {
        assert_eq!(content_length_text(""), "Your message is 0 characters long.");
        assert_eq!(content_length_text("abc"), "Your message is 3 characters long.");
        assert_eq!(content_length_text("héllo"), "Your message is 5 characters long.");
    }

    #[test]
    fn version_text_has_version_host_and_utc_timestamp() {
        let host = HostInfo::new(Some("box-1".to_string()), "1.2.3");
        let now = Utc
            .with_ymd_and_hms(2025, 1, 2, 3, 4, 5)
            .single()
            .expect("valid timestamp");
        assert_eq!(
            version_text(&host, now),
            "MCP (anonymous) Version: 1.2.3 Server: box-1 Date: 2025-01-02 03:04:05 UTC"
        );
    }

    #[test]
    fn cart_text_falls_back_to_unknown_host() {
        let host = HostInfo::new(None, "0");
        assert_eq!(
            cart_text("apple", &host),
            "Item 'apple' added to the shopping cart (Unknown)."
        );
    }

    #[test]
    fn handlers_validate_arguments() {
        let services = services();
        let ctx = ToolContext::new(&services, None);

        assert_eq!(
            echo(&ctx, &args(json!({ "message": "there" }))),
            Ok("hello there".to_string())
        );
        assert_eq!(
            echo(&ctx, &args(json!({}))),
            Err(ToolError::InvalidArguments("'message' is required".to_string()))
        );
        assert_eq!(
            add_to_cart(&ctx, &args(json!({ "item": 3 }))),
            Err(ToolError::InvalidArguments("'item' must be a string".to_string()))
        );
        assert!(
            get_version(&ctx, &JsonObject::new())
                .expect("version")
                .starts_with("MCP (anonymous) Version: ")
        );
    }
}
