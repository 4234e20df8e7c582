//! The uniquifying registry.
//!
//! A [`RelativizedLsids`] instance is created once per export with a chosen
//! strategy, accumulates original -> relativized assignments for the
//! duration of that export, and is discarded afterwards. It is not designed
//! for concurrent access; create one registry per export.
//!
//! Invariants:
//! - every original identifier maps to exactly one relativized string for
//!   the registry's lifetime (repeat calls return the cached result)
//! - no two distinct originals receive the same relativized string, except
//!   for the auto-file substitution, which bypasses uniquification entirely
//! - the per-base-key `Export` counter persists across calls, so a long run
//!   of collisions on one template prefix stays amortized O(1) per call

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::errors::RelsidResult;
use crate::lsid::{self, Lsid};
use crate::relativize::{ExportObject, LsidRelativizer};
use crate::tokens;

/// Export-wide container facts the strategies need.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExportScope {
    /// Row id of the well-known shared container. Suffixes carrying this row
    /// id relativize to the shared-container token instead of the generic
    /// container token.
    pub shared_container_row_id: Option<i64>,
}

/// Per-export registry of relativized identifiers.
pub struct RelativizedLsids {
    relativizer: LsidRelativizer,
    scope: ExportScope,
    /// Canonical original string -> relativized string.
    assigned: HashMap<String, String>,
    /// Every relativized string handed out so far.
    issued: HashSet<String>,
    /// Unversioned base key -> next `Export` index to try.
    next_suffix: HashMap<String, u64>,
    next_sample: u64,
    next_material: u64,
    next_data: u64,
}

impl RelativizedLsids {
    pub fn new(relativizer: LsidRelativizer) -> Self {
        Self::with_scope(relativizer, ExportScope::default())
    }

    pub fn with_scope(relativizer: LsidRelativizer, scope: ExportScope) -> Self {
        Self {
            relativizer,
            scope,
            assigned: HashMap::new(),
            issued: HashSet::new(),
            next_suffix: HashMap::new(),
            next_sample: 0,
            next_material: 0,
            next_data: 0,
        }
    }

    pub fn relativizer(&self) -> LsidRelativizer {
        self.relativizer
    }

    pub(crate) fn scope(&self) -> ExportScope {
        self.scope
    }

    /// Relativize an identifier string. Repeat calls with the same canonical
    /// original return the cached result without new uniquification work.
    pub fn relativize(&mut self, lsid: &str, use_xar_job_id: bool) -> RelsidResult<String> {
        let parsed = Lsid::parse(lsid)?;
        let key = parsed.to_string();
        if let Some(existing) = self.assigned.get(&key) {
            return Ok(existing.clone());
        }

        let relativizer = self.relativizer;
        let relative = relativizer.relativize_lsid(&parsed, self, use_xar_job_id);
        self.assigned.insert(key, relative.clone());
        Ok(relative)
    }

    /// `None` in, `None` out convenience over [`Self::relativize`].
    pub fn relativize_opt(
        &mut self,
        lsid: Option<&str>,
        use_xar_job_id: bool,
    ) -> RelsidResult<Option<String>> {
        match lsid {
            None => Ok(None),
            Some(s) => self.relativize(s, use_xar_job_id).map(Some),
        }
    }

    /// Object-level entry point; memoized on the object's canonical LSID.
    pub fn relativize_object(&mut self, object: &ExportObject) -> RelsidResult<String> {
        let key = Lsid::parse(object.lsid())?.to_string();
        if let Some(existing) = self.assigned.get(&key) {
            return Ok(existing.clone());
        }

        let relativizer = self.relativizer;
        let relative = relativizer.relativize_object(object, self)?;
        self.assigned.insert(key, relative.clone());
        Ok(relative)
    }

    /// Turn a template prefix plus object id/version into a relativized
    /// string that no earlier call has produced.
    ///
    /// The unversioned candidate is the base key; collisions append
    /// `:ExportN` (no version) or `-ExportN` (with version), starting the
    /// search at the persisted per-base-key counter rather than at 1.
    pub(crate) fn uniquify(
        &mut self,
        template_prefix: &str,
        object_id: &str,
        version: Option<&str>,
    ) -> String {
        // The canonical escape for `#` is collapsed back to the literal
        // character in relativized output.
        let object_id = lsid::encode_part(object_id).replace("%23", "#");

        let mut base = String::with_capacity(template_prefix.len() + object_id.len() + 12);
        base.push_str(template_prefix);
        base.push(':');
        base.push_str(&object_id);

        let separator = match version {
            Some(v) => {
                base.push(':');
                base.push_str(&lsid::encode_part(v));
                '-'
            }
            None => ':',
        };

        let mut attempt = self.next_suffix.get(&base).copied().unwrap_or(0);
        let accepted = loop {
            let candidate = if attempt == 0 {
                base.clone()
            } else {
                format!("{base}{separator}{}{attempt}", tokens::EXPORT_SUFFIX)
            };
            if !self.issued.contains(&candidate) {
                break candidate;
            }
            attempt += 1;
        };

        if attempt > 0 {
            debug!(base = %base, attempt, "relativized id collided, disambiguated");
        }

        // The next search for this base key begins after this suffix.
        self.next_suffix.insert(base, attempt + 1);
        self.issued.insert(accepted.clone());
        accepted
    }

    /// Per-export sample ordinal; first call returns 1.
    pub fn next_sample_ordinal(&mut self) -> u64 {
        self.next_sample += 1;
        self.next_sample
    }

    /// Per-export material ordinal; first call returns 1.
    pub fn next_material_ordinal(&mut self) -> u64 {
        self.next_material += 1;
        self.next_material
    }

    /// Per-export data ordinal; first call returns 1.
    pub fn next_data_ordinal(&mut self) -> u64 {
        self.next_data += 1;
        self.next_data
    }

    /// Number of assigned originals.
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// The relativized string already assigned to a canonical original.
    pub fn get(&self, canonical_original: &str) -> Option<&str> {
        self.assigned.get(canonical_original).map(String::as_str)
    }

    /// All assignments, sorted by original for deterministic iteration.
    pub fn assignments_sorted(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self
            .assigned
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        pairs.sort();
        pairs
    }
}
