/// Crate-wide error type, re-exported at the root.
///
/// `JsValue` errors coming back from the browser APIs are not `Send` and
/// carry no useful type information, so they are formatted into context
/// messages at the boundary where they occur.
pub type Error = anyhow::Error;

/// Alias used by all fallible functions in this crate.
pub type Result<T> = anyhow::Result<T>;
