//! `${Token}` template resolution.
//!
//! Relativized identifiers are templates: they still contain placeholder
//! tokens that get re-bound when an archive is imported. Resolution walks a
//! chain of [`SubstitutionProvider`]s repeatedly, because a substituted value
//! may itself contain further placeholders.
//!
//! Failure modes:
//! - a token no provider knows fails immediately
//!   ([`RelsidError::UnresolvedTemplate`])
//! - placeholders still present after [`MAX_SUBSTITUTION_PASSES`] passes
//!   indicate a replacement cycle ([`RelsidError::InfiniteReplacement`])
//!
//! Both are unrecoverable for that template and must propagate to the
//! caller.

use std::collections::BTreeMap;

use tracing::trace;

use crate::errors::{RelsidError, RelsidResult};
use crate::lsid::Lsid;
use crate::tokens;

/// Ceiling on substitution passes before a template is declared cyclic.
pub const MAX_SUBSTITUTION_PASSES: usize = 100;

/// A source of values for placeholder names (without the `${}` wrapper).
pub trait SubstitutionProvider {
    fn substitute(&self, name: &str) -> Option<String>;
}

/// A plain name -> value substitution table.
///
/// Backed by a `BTreeMap` so iteration order is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    values: BTreeMap<String, String>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl SubstitutionProvider for Substitutions {
    fn substitute(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Resolve every `${Token}` in a template against a provider chain. The
/// first provider that knows a token wins.
pub fn resolve_template(
    template: &str,
    providers: &[&dyn SubstitutionProvider],
) -> RelsidResult<String> {
    let mut current = template.to_string();
    for pass in 0..MAX_SUBSTITUTION_PASSES {
        if !current.contains("${") {
            return Ok(current);
        }
        trace!(pass, template = %current, "substitution pass");
        current = substitute_once(&current, providers)?;
    }
    Err(RelsidError::infinite_replacement(format!(
        "placeholders remain after {MAX_SUBSTITUTION_PASSES} passes: {template}"
    )))
}

/// One left-to-right substitution pass. Values pasted in during this pass
/// are not rescanned until the next pass.
fn substitute_once(input: &str, providers: &[&dyn SubstitutionProvider]) -> RelsidResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            RelsidError::invalid_argument(format!("unterminated placeholder in template: {input}"))
        })?;
        let name = &after[..end];
        let value = providers
            .iter()
            .find_map(|p| p.substitute(name))
            .ok_or_else(|| {
                RelsidError::unresolved_template(format!("no substitution for ${{{name}}}"))
            })?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Named substitutions for one export or import session.
///
/// Typed setters cover the well-known tokens; arbitrary extra substitutions
/// go through [`ExportContext::set`]. The auto-file token is bound by the
/// archive reader via an additional provider passed to
/// [`ExportContext::resolve_with`].
#[derive(Debug, Clone, Default)]
pub struct ExportContext {
    substitutions: Substitutions,
}

impl ExportContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_container_row_id(&mut self, row_id: i64) {
        self.set(tokens::name(tokens::CONTAINER_ID), row_id.to_string());
    }

    pub fn set_shared_container_row_id(&mut self, row_id: i64) {
        self.set(tokens::name(tokens::SHARED_CONTAINER_ID), row_id.to_string());
    }

    pub fn set_xar_job_id(&mut self, job_id: impl Into<String>) {
        self.set(tokens::name(tokens::XAR_JOB_ID), job_id);
    }

    pub fn set_xar_file_id(&mut self, file_id: impl Into<String>) {
        self.set(tokens::name(tokens::XAR_FILE_ID), file_id);
    }

    pub fn set_run_lsid_base(&mut self, base: impl Into<String>) {
        self.set(tokens::name(tokens::RUN_LSID_BASE), base);
    }

    pub fn set_folder_lsid_base(&mut self, base: impl Into<String>) {
        self.set(tokens::name(tokens::FOLDER_LSID_BASE), base);
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.substitutions.set(name, value);
    }

    pub fn substitutions(&self) -> &Substitutions {
        &self.substitutions
    }

    /// Resolve a template against this context alone.
    pub fn resolve(&self, template: &str) -> RelsidResult<String> {
        resolve_template(template, &[&self.substitutions])
    }

    /// Resolve with an extra provider consulted before this context.
    pub fn resolve_with(
        &self,
        template: &str,
        extra: &dyn SubstitutionProvider,
    ) -> RelsidResult<String> {
        resolve_template(template, &[extra, &self.substitutions])
    }

    /// Resolve a template and parse the result as an LSID.
    pub fn resolve_lsid(&self, template: &str) -> RelsidResult<Lsid> {
        Lsid::parse(&self.resolve(template)?)
    }
}

impl SubstitutionProvider for ExportContext {
    fn substitute(&self, name: &str) -> Option<String> {
        self.substitutions.substitute(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn resolves_simple_tokens() {
        let mut subs = Substitutions::new();
        subs.set("ContainerId", "4");
        let out = resolve_template("Protocol.Folder-${ContainerId}", &[&subs]).unwrap();
        assert_eq!(out, "Protocol.Folder-4");
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let out = resolve_template("urn:lsid:x:Protocol:p1", &[]).unwrap();
        assert_eq!(out, "urn:lsid:x:Protocol:p1");
    }

    #[test]
    fn substituted_values_may_contain_placeholders() {
        let mut subs = Substitutions::new();
        subs.set("RunLSIDBase", "urn:lsid:x:ProtocolApplication.Folder-${ContainerId}.Run-9");
        subs.set("ContainerId", "4");
        let out = resolve_template("${RunLSIDBase}:PA1", &[&subs]).unwrap();
        assert_eq!(out, "urn:lsid:x:ProtocolApplication.Folder-4.Run-9:PA1");
    }

    #[test]
    fn first_provider_in_chain_wins() {
        let mut first = Substitutions::new();
        first.set("XarJobId", "job-a");
        let mut second = Substitutions::new();
        second.set("XarJobId", "job-b");
        second.set("ContainerId", "4");
        let out =
            resolve_template("${XarJobId}.${ContainerId}", &[&first, &second]).unwrap();
        assert_eq!(out, "job-a.4");
    }

    #[test]
    fn unknown_token_fails_immediately() {
        let subs = Substitutions::new();
        let err = resolve_template("x-${Mystery}", &[&subs]).unwrap_err();
        assert_matches!(err, RelsidError::UnresolvedTemplate(_));
        assert!(err.to_string().contains("${Mystery}"));
    }

    #[test]
    fn replacement_cycle_hits_the_pass_ceiling() {
        let mut subs = Substitutions::new();
        subs.set("A", "${B}");
        subs.set("B", "${A}");
        let err = resolve_template("${A}", &[&subs]).unwrap_err();
        assert_matches!(err, RelsidError::InfiniteReplacement(_));
    }

    #[test]
    fn unterminated_placeholder_is_rejected() {
        let subs = Substitutions::new();
        let err = resolve_template("x-${Broken", &[&subs]).unwrap_err();
        assert_matches!(err, RelsidError::InvalidArgument(_));
    }

    #[test]
    fn export_context_binds_well_known_tokens() {
        let mut ctx = ExportContext::new();
        ctx.set_container_row_id(4);
        ctx.set_xar_file_id("Xar-12");
        let lsid = ctx
            .resolve_lsid("urn:lsid:example.org:ExperimentRun.Folder-${ContainerId}.${XarFileId}:Run22")
            .unwrap();
        assert_eq!(lsid.namespace(), "ExperimentRun.Folder-4.Xar-12");
        assert_eq!(lsid.object_id(), "Run22");
    }

    #[test]
    fn resolve_with_consults_extra_provider_first() {
        struct AutoFile;
        impl SubstitutionProvider for AutoFile {
            fn substitute(&self, name: &str) -> Option<String> {
                (name == "AutoFileLSID")
                    .then(|| "urn:lsid:x:Data.Folder-4:archive%2Fd1.tsv".to_string())
            }
        }

        let ctx = ExportContext::new();
        let out = ctx.resolve_with("${AutoFileLSID}", &AutoFile).unwrap();
        assert_eq!(out, "urn:lsid:x:Data.Folder-4:archive%2Fd1.tsv");
    }
}
