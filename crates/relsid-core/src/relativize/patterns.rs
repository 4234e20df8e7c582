//! Fixed namespace-suffix patterns recognized by the relativization rules.

use once_cell::sync::Lazy;
use regex::Regex;

/// `Folder-<digits>` or `Folder-<digits>.Xar-<digits>`, the whole suffix.
static FOLDER_OR_XAR_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Folder-\d+(\.Xar-\d+)?$").expect("folder suffix pattern")
});

/// `Folder-<digits>.<uuid>` with the fixed 8-4-4-4-12 hex uuid shape.
static FOLDER_UUID_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^Folder-\d+\.([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})$",
    )
    .expect("folder uuid pattern")
});

/// Leading `Folder-<digits>` portion of a suffix.
static LEADING_FOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Folder-(\d+)").expect("leading folder pattern"));

/// True when the suffix is exactly `Folder-<digits>` or
/// `Folder-<digits>.Xar-<digits>`.
pub(crate) fn is_folder_or_xar_suffix(suffix: &str) -> bool {
    FOLDER_OR_XAR_SUFFIX.is_match(suffix)
}

/// The uuid portion of a `Folder-<digits>.<uuid>` suffix.
pub(crate) fn folder_uuid(suffix: &str) -> Option<&str> {
    FOLDER_UUID_SUFFIX
        .captures(suffix)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// The folder row id encoded in a suffix starting with `Folder-<digits>`.
pub(crate) fn folder_row_id(suffix: &str) -> Option<i64> {
    LEADING_FOLDER
        .captures(suffix)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// The remainder of a suffix after its leading `Folder-<digits>` portion.
/// `None` when the suffix does not start with `Folder-<digits>`.
pub(crate) fn strip_leading_folder(suffix: &str) -> Option<&str> {
    LEADING_FOLDER
        .find(suffix)
        .map(|m| &suffix[m.end()..])
}
