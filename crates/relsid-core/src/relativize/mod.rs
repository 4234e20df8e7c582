//! Relativization strategies.
//!
//! A strategy maps a parsed [`Lsid`] to a relative template string that still
//! contains unresolved placeholder tokens (see [`crate::tokens`]). The
//! mutable bookkeeping (memoization, uniquification, ordinal counters) lives
//! in [`RelativizedLsids`]; the strategies themselves are stateless `Copy`
//! values.
//!
//! Each strategy has two entry points:
//! - identifier-level, for bare LSID strings
//! - object-level, for exported objects that carry more than their LSID
//!   (currently only data objects, which know their file URL and data class)
//!
//! `FolderRelative`'s object-level entry delegates to `PartialFolderRelative`
//! for data objects without a file URL or with a data-class association: the
//! auto-file substitution only makes sense for a file-backed, class-less data
//! object. This cross-strategy call is deliberate.

mod patterns;
pub mod registry;

pub use registry::{ExportScope, RelativizedLsids};

use crate::errors::{RelsidError, RelsidResult};
use crate::lsid::Lsid;
use crate::tokens;

/// An exported object, as seen by the object-level entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExportObject {
    /// A data object. File URL and data class drive the auto-file decision.
    Data {
        lsid: String,
        file_url: Option<String>,
        data_class: Option<String>,
    },
    /// Any other experiment object (run, material, protocol, ...).
    Generic { lsid: String },
}

impl ExportObject {
    pub fn lsid(&self) -> &str {
        match self {
            ExportObject::Data { lsid, .. } | ExportObject::Generic { lsid } => lsid,
        }
    }
}

/// The closed set of relativization strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LsidRelativizer {
    /// Leave identifiers untouched.
    Absolute,
    /// Fully folder-relative templates, including per-export ordinals and
    /// the auto-file substitution for file-backed data.
    FolderRelative,
    /// Folder-relative templates that keep concrete object identity where
    /// the original suffix already carries folder scoping.
    PartialFolderRelative,
}

impl LsidRelativizer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::FolderRelative => "folder-relative",
            Self::PartialFolderRelative => "partial-folder-relative",
        }
    }

    /// Object-level entry point.
    pub(crate) fn relativize_object(
        &self,
        object: &ExportObject,
        lsids: &mut RelativizedLsids,
    ) -> RelsidResult<String> {
        match self {
            Self::Absolute => Ok(object.lsid().to_string()),
            Self::FolderRelative => {
                if let ExportObject::Data {
                    file_url,
                    data_class,
                    ..
                } = object
                {
                    if file_url.is_none() || data_class.is_some() {
                        return Self::PartialFolderRelative.relativize_object(object, lsids);
                    }
                    return Ok(tokens::AUTO_FILE_LSID.to_string());
                }
                let lsid = Lsid::parse(object.lsid())?;
                Ok(self.relativize_lsid(&lsid, lsids, false))
            }
            Self::PartialFolderRelative => {
                let lsid = Lsid::parse(object.lsid())?;
                Ok(self.relativize_lsid(&lsid, lsids, false))
            }
        }
    }

    /// Identifier-level entry point. Total: every input maps to some string,
    /// falling back to the canonical original.
    pub(crate) fn relativize_lsid(
        &self,
        lsid: &Lsid,
        lsids: &mut RelativizedLsids,
        use_xar_job_id: bool,
    ) -> String {
        match self {
            Self::Absolute => lsid.to_string(),
            Self::FolderRelative => folder_relative(lsid, lsids, use_xar_job_id),
            Self::PartialFolderRelative => partial_folder_relative(lsid, lsids, use_xar_job_id),
        }
    }
}

impl std::str::FromStr for LsidRelativizer {
    type Err = RelsidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absolute" => Ok(Self::Absolute),
            "folder-relative" => Ok(Self::FolderRelative),
            "partial-folder-relative" => Ok(Self::PartialFolderRelative),
            _ => Err(RelsidError::invalid_argument(format!(
                "unknown relativization strategy: {s}"
            ))),
        }
    }
}

/// `Folder-<token>` fragment for the container encoded in the suffix. The
/// shared-container token is substituted when the suffix's row id matches the
/// export scope's shared container.
fn folder_fragment(suffix: Option<&str>, scope: ExportScope) -> String {
    let row_id = suffix.and_then(patterns::folder_row_id);
    let token = match (row_id, scope.shared_container_row_id) {
        (Some(row), Some(shared)) if row == shared => tokens::SHARED_CONTAINER_ID,
        _ => tokens::CONTAINER_ID,
    };
    format!("Folder-{token}")
}

fn experiment_run(lsid: &Lsid, lsids: &mut RelativizedLsids, folder: &str) -> String {
    let prefix = format!(
        "urn:lsid:{}:ExperimentRun.{folder}.{}",
        lsid.authority(),
        tokens::XAR_FILE_ID
    );
    lsids.uniquify(&prefix, lsid.object_id(), lsid.version())
}

fn protocol_application(lsid: &Lsid, lsids: &mut RelativizedLsids) -> String {
    lsids.uniquify(tokens::RUN_LSID_BASE, lsid.object_id(), lsid.version())
}

/// Replace the leading `Folder-<digits>` of a suffix with the folder token,
/// keeping the remainder of the suffix.
fn rewrite_folder_suffix(
    lsid: &Lsid,
    lsids: &mut RelativizedLsids,
    folder: &str,
    rest: &str,
) -> String {
    let prefix = format!(
        "urn:lsid:{}:{}.{folder}{rest}",
        lsid.authority(),
        lsid.namespace_prefix()
    );
    lsids.uniquify(&prefix, lsid.object_id(), lsid.version())
}

fn folder_relative(lsid: &Lsid, lsids: &mut RelativizedLsids, use_xar_job_id: bool) -> String {
    let scope = lsids.scope();
    let authority = lsid.authority();
    let suffix = lsid.namespace_suffix();
    let folder = folder_fragment(suffix, scope);

    match lsid.namespace_prefix() {
        "ExperimentRun" => experiment_run(lsid, lsids, &folder),
        "ProtocolApplication" => protocol_application(lsid, lsids),
        prefix @ ("Sample" | "Material") => {
            if lsid.object_id() == "sfx" {
                // Legacy placeholder ids: the suffix remainder is taken from
                // the first dot onward, and is empty when no dot is present.
                let remainder = suffix
                    .and_then(|s| s.find('.').map(|i| &s[i..]))
                    .unwrap_or("");
                let template = format!(
                    "urn:lsid:{authority}:{prefix}.{folder}.{}{remainder}",
                    tokens::XAR_JOB_ID
                );
                lsids.uniquify(&template, lsid.object_id(), lsid.version())
            } else {
                let ordinal = if prefix == "Sample" {
                    lsids.next_sample_ordinal()
                } else {
                    lsids.next_material_ordinal()
                };
                let template = format!(
                    "urn:lsid:{authority}:{prefix}.{folder}.{}{ordinal}",
                    tokens::XAR_JOB_ID
                );
                lsids.uniquify(&template, lsid.object_id(), lsid.version())
            }
        }
        // At the identifier level every data id takes the auto-file path; the
        // object-level entry filters out class-typed and URL-less data first.
        // Deliberately non-unique: the importer disambiguates per file.
        "Data" => tokens::AUTO_FILE_LSID.to_string(),
        prefix => {
            if let Some(sfx) = suffix {
                if patterns::is_folder_or_xar_suffix(sfx) {
                    let force_job_id =
                        use_xar_job_id || prefix == "SampleSet" || prefix == "DataClass";
                    let job = if force_job_id {
                        format!(".{}", tokens::XAR_JOB_ID)
                    } else {
                        String::new()
                    };
                    let template = format!("urn:lsid:{authority}:{prefix}.{folder}{job}");
                    return lsids.uniquify(&template, lsid.object_id(), lsid.version());
                }
                if use_xar_job_id {
                    if let Some(uuid) = patterns::folder_uuid(sfx) {
                        let template = format!(
                            "urn:lsid:{authority}:{prefix}.{folder}.{uuid}.{}",
                            tokens::XAR_JOB_ID
                        );
                        return lsids.uniquify(&template, lsid.object_id(), lsid.version());
                    }
                }
            }
            lsid.to_string()
        }
    }
}

fn partial_folder_relative(
    lsid: &Lsid,
    lsids: &mut RelativizedLsids,
    use_xar_job_id: bool,
) -> String {
    let scope = lsids.scope();
    let authority = lsid.authority();
    let suffix = lsid.namespace_suffix();
    let folder = folder_fragment(suffix, scope);

    match lsid.namespace_prefix() {
        "ExperimentRun" => experiment_run(lsid, lsids, &folder),
        "ProtocolApplication" => protocol_application(lsid, lsids),
        // Samples always take the ordinal template; only materials and data
        // reuse folder scoping already present in the suffix.
        "Sample" => {
            let ordinal = lsids.next_sample_ordinal();
            let template = format!(
                "urn:lsid:{authority}:Sample.{folder}.{}-{ordinal}",
                tokens::XAR_JOB_ID
            );
            lsids.uniquify(&template, lsid.object_id(), lsid.version())
        }
        prefix @ ("Material" | "Data") => {
            if let Some(rest) = suffix.and_then(patterns::strip_leading_folder) {
                rewrite_folder_suffix(lsid, lsids, &folder, rest)
            } else {
                let ordinal = if prefix == "Material" {
                    lsids.next_material_ordinal()
                } else {
                    lsids.next_data_ordinal()
                };
                let template = format!(
                    "urn:lsid:{authority}:{prefix}.{folder}.{}-{ordinal}",
                    tokens::XAR_JOB_ID
                );
                lsids.uniquify(&template, lsid.object_id(), lsid.version())
            }
        }
        prefix => {
            if let Some(rest) = suffix.and_then(patterns::strip_leading_folder) {
                rewrite_folder_suffix(lsid, lsids, &folder, rest)
            } else {
                let job = if use_xar_job_id {
                    format!(".{}", tokens::XAR_JOB_ID)
                } else {
                    String::new()
                };
                let template = format!("urn:lsid:{authority}:{prefix}.{folder}{job}");
                lsids.uniquify(&template, lsid.object_id(), lsid.version())
            }
        }
    }
}
