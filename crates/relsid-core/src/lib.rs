//! relsid-core
//!
//! Core primitives for relsid:
//! - `Lsid` structured-identifier model (parse, canonical form, escaping)
//! - Relativization strategies for turning absolute LSIDs into portable
//!   export templates
//! - A per-export uniquifying registry that guarantees collision-free
//!   relativized identifiers
//! - A `${Token}` template resolver for re-binding those templates on import
//!
//! The crate is purely in-memory: no filesystem, network, or database I/O.
//! A `RelativizedLsids` registry is scoped to one export operation and is
//! not meant to be shared across threads; the strategy values themselves are
//! stateless and freely copyable.

pub mod errors;
pub mod lsid;
pub mod relativize;
pub mod template;

pub use crate::errors::{RelsidError, RelsidResult};

/// Placeholder tokens emitted by the relativization strategies and consumed
/// by the template resolver.
///
/// These literals are part of the archive format contract and must remain
/// stable across versions.
pub mod tokens {
    /// Row id of the folder being exported or imported.
    pub const CONTAINER_ID: &str = "${ContainerId}";
    /// Row id of the well-known shared folder, bound independently of
    /// [`CONTAINER_ID`] so cross-folder references survive import.
    pub const SHARED_CONTAINER_ID: &str = "${SharedContainerId}";
    /// Unique id of the import job consuming the archive.
    pub const XAR_JOB_ID: &str = "${XarJobId}";
    /// Unique id of the archive file itself.
    pub const XAR_FILE_ID: &str = "${XarFileId}";
    /// Base LSID of the run being materialized on import.
    pub const RUN_LSID_BASE: &str = "${RunLSIDBase}";
    /// Base LSID for folder-scoped objects on import. Archive writers emit
    /// this token directly; the relativization strategies never produce it.
    pub const FOLDER_LSID_BASE: &str = "${FolderLSIDBase}";
    /// Whole-identifier substitution for file-backed data objects. The
    /// importer derives the real identifier from the data file path, so this
    /// token is deliberately exempt from uniquification.
    pub const AUTO_FILE_LSID: &str = "${AutoFileLSID}";

    /// Disambiguating suffix stem appended by the uniquifying registry.
    pub const EXPORT_SUFFIX: &str = "Export";

    /// Placeholder name without the `${...}` wrapper.
    pub fn name(token: &str) -> &str {
        token
            .strip_prefix("${")
            .and_then(|t| t.strip_suffix('}'))
            .unwrap_or(token)
    }
}

/// Convenience re-exports.
pub mod prelude {
    pub use crate::lsid::Lsid;
    pub use crate::relativize::{ExportObject, ExportScope, LsidRelativizer, RelativizedLsids};
    pub use crate::template::{
        resolve_template, ExportContext, SubstitutionProvider, Substitutions,
    };
    pub use crate::{RelsidError, RelsidResult};
}
