//! Structured-identifier model.
//!
//! An LSID is a URN-style identifier of the form
//! `urn:lsid:<authority>:<nsPrefix>[.<nsSuffix>]:<objectId>[:<version>]`.
//!
//! Rules:
//! - the `urn:lsid:` head is matched case-insensitively
//! - authority, namespace prefix, and object id are required and non-empty
//! - the namespace suffix is everything after the first `.` of the namespace
//! - object id and version are stored percent-decoded; the canonical string
//!   form re-encodes them (`%` -> `%25`, `:` -> `%3A`, `#` -> `%23`)
//! - a parsed value round-trips through its canonical string form

use std::fmt;
use std::str::FromStr;

use crate::errors::{RelsidError, RelsidResult};

const URN_HEAD: &str = "urn:lsid:";

/// An immutable, parsed LSID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Lsid {
    authority: String,
    namespace_prefix: String,
    namespace_suffix: Option<String>,
    object_id: String,
    version: Option<String>,
}

impl Lsid {
    /// Build an LSID from its required parts. The object id is taken in
    /// decoded form; escaping happens when rendering the canonical string.
    pub fn new(
        authority: impl Into<String>,
        namespace_prefix: impl Into<String>,
        object_id: impl Into<String>,
    ) -> RelsidResult<Self> {
        let authority = authority.into();
        let namespace_prefix = namespace_prefix.into();
        let object_id = object_id.into();

        if authority.is_empty() {
            return Err(RelsidError::invalid_argument("LSID authority must not be empty"));
        }
        if namespace_prefix.is_empty() {
            return Err(RelsidError::invalid_argument(
                "LSID namespace prefix must not be empty",
            ));
        }
        if object_id.is_empty() {
            return Err(RelsidError::invalid_argument("LSID object id must not be empty"));
        }

        Ok(Self {
            authority,
            namespace_prefix,
            namespace_suffix: None,
            object_id,
            version: None,
        })
    }

    pub fn with_namespace_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.namespace_suffix = Some(suffix.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Parse an LSID string.
    pub fn parse(input: &str) -> RelsidResult<Self> {
        let head = input.get(..URN_HEAD.len()).unwrap_or("");
        if !head.eq_ignore_ascii_case(URN_HEAD) {
            return Err(RelsidError::invalid_lsid(format!(
                "missing urn:lsid head: {input}"
            )));
        }

        let rest = &input[URN_HEAD.len()..];
        let mut parts = rest.splitn(4, ':');
        let authority = parts.next().unwrap_or("");
        let namespace = parts.next().unwrap_or("");
        let object_id = parts.next().unwrap_or("");
        let version = parts.next();

        if authority.is_empty() {
            return Err(RelsidError::invalid_lsid(format!("empty authority: {input}")));
        }
        if namespace.is_empty() {
            return Err(RelsidError::invalid_lsid(format!("empty namespace: {input}")));
        }
        if object_id.is_empty() {
            return Err(RelsidError::invalid_lsid(format!("missing object id: {input}")));
        }

        let (namespace_prefix, namespace_suffix) = match namespace.find('.') {
            Some(i) => (&namespace[..i], Some(namespace[i + 1..].to_string())),
            None => (namespace, None),
        };
        if namespace_prefix.is_empty() {
            return Err(RelsidError::invalid_lsid(format!(
                "empty namespace prefix: {input}"
            )));
        }

        let version = match version {
            None => None,
            Some("") => {
                return Err(RelsidError::invalid_lsid(format!("empty version: {input}")));
            }
            Some(v) if v.contains(':') => {
                return Err(RelsidError::invalid_lsid(format!(
                    "too many segments: {input}"
                )));
            }
            Some(v) => Some(decode_part(v)?),
        };

        Ok(Self {
            authority: authority.to_string(),
            namespace_prefix: namespace_prefix.to_string(),
            namespace_suffix,
            object_id: decode_part(object_id)?,
            version,
        })
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn namespace_prefix(&self) -> &str {
        &self.namespace_prefix
    }

    pub fn namespace_suffix(&self) -> Option<&str> {
        self.namespace_suffix.as_deref()
    }

    /// The full namespace, prefix and suffix joined by `.`.
    pub fn namespace(&self) -> String {
        match &self.namespace_suffix {
            Some(suffix) => format!("{}.{}", self.namespace_prefix, suffix),
            None => self.namespace_prefix.clone(),
        }
    }

    /// Decoded object id.
    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    /// Decoded version, if present.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl fmt::Display for Lsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{URN_HEAD}{}:{}", self.authority, self.namespace_prefix)?;
        if let Some(suffix) = &self.namespace_suffix {
            write!(f, ".{suffix}")?;
        }
        write!(f, ":{}", encode_part(&self.object_id))?;
        if let Some(version) = &self.version {
            write!(f, ":{}", encode_part(version))?;
        }
        Ok(())
    }
}

impl FromStr for Lsid {
    type Err = RelsidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Lsid::parse(s)
    }
}

impl TryFrom<String> for Lsid {
    type Error = RelsidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Lsid::parse(&value)
    }
}

impl From<Lsid> for String {
    fn from(lsid: Lsid) -> Self {
        lsid.to_string()
    }
}

/// Percent-encode the characters that would break the five-segment canonical
/// form: `%`, `:`, and `#`.
pub(crate) fn encode_part(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for c in part.chars() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            '#' => out.push_str("%23"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-decode a segment. Any `%XX` pair is accepted; a dangling or
/// non-hex escape is a parse error.
pub(crate) fn decode_part(part: &str) -> RelsidResult<String> {
    if !part.contains('%') {
        return Ok(part.to_string());
    }

    let bytes = part.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = part.get(i + 1..i + 3).ok_or_else(|| {
                RelsidError::invalid_lsid(format!("dangling percent escape in: {part}"))
            })?;
            let byte = u8::from_str_radix(hex, 16).map_err(|_| {
                RelsidError::invalid_lsid(format!("bad percent escape %{hex} in: {part}"))
            })?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out)
        .map_err(|_| RelsidError::invalid_lsid(format!("escapes decode to invalid UTF-8: {part}")))
}
