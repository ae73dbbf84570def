//! Format versioning constants for serialized graphs.
//!
//! Every JSON document written by this crate carries `schemaVersion`.
//! Documents without the field are accepted as legacy.

use crate::error::{IrError, IrResult};

/// Current schema version for IR, visual and story graph JSON.
/// Increment MINOR for compatible changes, MAJOR for breaking changes.
pub const GRAPH_SCHEMA_VERSION: &str = "1.0";

/// Rejects documents written by an incompatible major version.
pub(crate) fn check_schema_version(found: Option<&str>) -> IrResult<()> {
    let Some(found) = found else {
        return Ok(());
    };
    let major = |version: &str| version.split('.').next().unwrap_or_default().to_string();
    if major(found) != major(GRAPH_SCHEMA_VERSION) {
        return Err(IrError::parse_message(format!(
            "schema version mismatch: expected {GRAPH_SCHEMA_VERSION}, found {found}"
        )));
    }
    Ok(())
}
