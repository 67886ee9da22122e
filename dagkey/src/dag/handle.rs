//! Step handles: identities of steps in an execution plan.
//!
//! A step is addressed in one of three lifecycle states:
//!
//! - [`StaticStepHandle`] - known at plan construction, exactly one instance
//! - [`UnresolvedStepHandle`] - downstream of a dynamic output, count unknown
//! - [`DynamicStepHandle`] - one instance, resolved against a mapping key
//!
//! All three share one key namespace (`to_key` / [`StepHandle::from_key`]):
//!
//! ```text
//! outer.leaf          static
//! outer.leaf[?]       unresolved
//! outer.leaf[item-3]  dynamic, mapping key "item-3"
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use super::error::{MalformedKeyReason, Result, StepKeyError};
use super::node_path::NodePath;

/// Mapping key slot used by the unresolved form (`path[?]`)
pub const PENDING_MAPPING_KEY: &str = "?";

const KEY_OPEN: char = '[';
const KEY_CLOSE: char = ']';

/// A step determined statically during plan construction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StaticStepHandle {
    node_path: NodePath,
}

/// Placeholder for the steps downstream of a dynamic output.
///
/// Never executed itself; each mapping key emitted upstream resolves it
/// into a [`DynamicStepHandle`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnresolvedStepHandle {
    node_path: NodePath,
}

/// A step produced by resolving an [`UnresolvedStepHandle`] once the
/// upstream dynamic output has completed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DynamicStepHandle {
    node_path: NodePath,
    mapping_key: String,
}

/// Any step handle, as decoded from a stored key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StepHandle {
    Static(StaticStepHandle),
    Unresolved(UnresolvedStepHandle),
    Dynamic(DynamicStepHandle),
}

impl StaticStepHandle {
    pub fn new(node_path: NodePath) -> Self {
        Self { node_path }
    }

    pub fn node_path(&self) -> &NodePath {
        &self.node_path
    }

    pub fn to_key(&self) -> String {
        self.node_path.to_string()
    }

    /// Decode a key that must name a static step
    pub fn from_key(key: &str) -> Result<Self> {
        StepHandle::from_key(key)?.try_into()
    }
}

impl UnresolvedStepHandle {
    pub fn new(node_path: NodePath) -> Self {
        Self { node_path }
    }

    pub fn node_path(&self) -> &NodePath {
        &self.node_path
    }

    pub fn to_key(&self) -> String {
        format!("{}{}{}{}", self.node_path, KEY_OPEN, PENDING_MAPPING_KEY, KEY_CLOSE)
    }

    /// Decode a key that must name an unresolved step
    pub fn from_key(key: &str) -> Result<Self> {
        StepHandle::from_key(key)?.try_into()
    }

    /// The step instance for one item of the upstream dynamic output.
    ///
    /// Calling this twice with the same key yields equal handles; the
    /// engine should still resolve each distinct key only once per run.
    pub fn resolve(&self, mapping_key: impl Into<String>) -> DynamicStepHandle {
        let mapping_key = mapping_key.into();
        if mapping_key.is_empty() || mapping_key == PENDING_MAPPING_KEY {
            tracing::warn!(
                step = %self.node_path,
                mapping_key = %mapping_key,
                "Resolving with a mapping key that will not decode as a dynamic step"
            );
        }
        DynamicStepHandle {
            node_path: self.node_path.clone(),
            mapping_key,
        }
    }

    /// Resolve once per distinct mapping key, keeping first-seen order
    pub fn resolve_all<I, S>(&self, mapping_keys: I) -> Vec<DynamicStepHandle>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut resolved = Vec::new();

        for mapping_key in mapping_keys {
            let mapping_key = mapping_key.into();
            if !seen.insert(mapping_key.clone()) {
                tracing::debug!(
                    step = %self.node_path,
                    mapping_key = %mapping_key,
                    "Skipping duplicate mapping key"
                );
                continue;
            }
            resolved.push(self.resolve(mapping_key));
        }

        resolved
    }
}

impl DynamicStepHandle {
    /// Build a resolved handle directly.
    ///
    /// Accepts any string, including empty ones. Prefer
    /// [`UnresolvedStepHandle::resolve`], or [`DynamicStepHandle::try_new`]
    /// when the key comes from outside the engine.
    pub fn new(node_path: NodePath, mapping_key: impl Into<String>) -> Self {
        Self {
            node_path,
            mapping_key: mapping_key.into(),
        }
    }

    /// Like [`DynamicStepHandle::new`], but rejects mapping keys whose
    /// encoded form would not decode back to this handle
    pub fn try_new(node_path: NodePath, mapping_key: impl Into<String>) -> Result<Self> {
        let mapping_key = mapping_key.into();
        if mapping_key.is_empty() {
            return Err(StepKeyError::invalid_argument(
                "mapping_key",
                "must not be empty",
            ));
        }
        if mapping_key == PENDING_MAPPING_KEY {
            return Err(StepKeyError::invalid_argument(
                "mapping_key",
                format!("'{}' is reserved for unresolved steps", PENDING_MAPPING_KEY),
            ));
        }
        Ok(Self::new(node_path, mapping_key))
    }

    pub fn node_path(&self) -> &NodePath {
        &self.node_path
    }

    pub fn mapping_key(&self) -> &str {
        &self.mapping_key
    }

    pub fn to_key(&self) -> String {
        format!("{}{}{}{}", self.node_path, KEY_OPEN, self.mapping_key, KEY_CLOSE)
    }

    /// Decode a key that must name a dynamic step
    pub fn from_key(key: &str) -> Result<Self> {
        StepHandle::from_key(key)?.try_into()
    }

    /// The placeholder this instance was resolved from
    pub fn unresolved_form(&self) -> UnresolvedStepHandle {
        UnresolvedStepHandle {
            node_path: self.node_path.clone(),
        }
    }
}

impl StepHandle {
    /// Decode any step key.
    ///
    /// The match order matters: `path[?]` is also a well-formed
    /// `path[<key>]`, so the pending marker is checked first.
    pub fn from_key(key: &str) -> Result<Self> {
        let suffix = key
            .split_once(KEY_OPEN)
            .map(|(prefix, rest)| (prefix, rest.strip_suffix(KEY_CLOSE)));

        let handle = match suffix {
            Some((prefix, Some(PENDING_MAPPING_KEY))) => {
                StepHandle::Unresolved(UnresolvedStepHandle::new(parse_prefix(key, prefix)?))
            }
            Some((prefix, Some(mapping_key))) => StepHandle::Dynamic(DynamicStepHandle::new(
                parse_prefix(key, prefix)?,
                mapping_key,
            )),
            Some((_, None)) => {
                return Err(StepKeyError::malformed(
                    key,
                    MalformedKeyReason::UnterminatedMappingKey,
                ))
            }
            None => StepHandle::Static(StaticStepHandle::new(parse_prefix(key, key)?)),
        };

        tracing::trace!(key, kind = handle.kind(), "Decoded step key");
        Ok(handle)
    }

    pub fn to_key(&self) -> String {
        match self {
            StepHandle::Static(h) => h.to_key(),
            StepHandle::Unresolved(h) => h.to_key(),
            StepHandle::Dynamic(h) => h.to_key(),
        }
    }

    pub fn node_path(&self) -> &NodePath {
        match self {
            StepHandle::Static(h) => h.node_path(),
            StepHandle::Unresolved(h) => h.node_path(),
            StepHandle::Dynamic(h) => h.node_path(),
        }
    }

    /// Mapping key of a dynamic step, `None` otherwise
    pub fn mapping_key(&self) -> Option<&str> {
        match self {
            StepHandle::Dynamic(h) => Some(h.mapping_key()),
            _ => None,
        }
    }

    /// Short lowercase name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            StepHandle::Static(_) => "static",
            StepHandle::Unresolved(_) => "unresolved",
            StepHandle::Dynamic(_) => "dynamic",
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, StepHandle::Static(_))
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, StepHandle::Unresolved(_))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, StepHandle::Dynamic(_))
    }
}

fn parse_prefix(key: &str, prefix: &str) -> Result<NodePath> {
    NodePath::parse(prefix).map_err(|e| StepKeyError::malformed(key, e))
}

fn wrong_kind(expected: &'static str, found: &StepHandle) -> StepKeyError {
    StepKeyError::invalid_argument(
        "step_handle",
        format!(
            "expected {} step, found {} step '{}'",
            expected,
            found.kind(),
            found.to_key()
        ),
    )
}

impl From<StaticStepHandle> for StepHandle {
    fn from(h: StaticStepHandle) -> Self {
        StepHandle::Static(h)
    }
}

impl From<UnresolvedStepHandle> for StepHandle {
    fn from(h: UnresolvedStepHandle) -> Self {
        StepHandle::Unresolved(h)
    }
}

impl From<DynamicStepHandle> for StepHandle {
    fn from(h: DynamicStepHandle) -> Self {
        StepHandle::Dynamic(h)
    }
}

impl TryFrom<StepHandle> for StaticStepHandle {
    type Error = StepKeyError;

    fn try_from(handle: StepHandle) -> Result<Self> {
        match handle {
            StepHandle::Static(h) => Ok(h),
            other => Err(wrong_kind("static", &other)),
        }
    }
}

impl TryFrom<StepHandle> for UnresolvedStepHandle {
    type Error = StepKeyError;

    fn try_from(handle: StepHandle) -> Result<Self> {
        match handle {
            StepHandle::Unresolved(h) => Ok(h),
            other => Err(wrong_kind("unresolved", &other)),
        }
    }
}

impl TryFrom<StepHandle> for DynamicStepHandle {
    type Error = StepKeyError;

    fn try_from(handle: StepHandle) -> Result<Self> {
        match handle {
            StepHandle::Dynamic(h) => Ok(h),
            other => Err(wrong_kind("dynamic", &other)),
        }
    }
}

macro_rules! impl_key_conversions {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.to_key())
                }
            }

            impl FromStr for $ty {
                type Err = StepKeyError;

                fn from_str(s: &str) -> Result<Self> {
                    <$ty>::from_key(s)
                }
            }

            impl TryFrom<String> for $ty {
                type Error = StepKeyError;

                fn try_from(s: String) -> Result<Self> {
                    <$ty>::from_key(&s)
                }
            }

            impl From<$ty> for String {
                fn from(h: $ty) -> Self {
                    h.to_key()
                }
            }
        )+
    };
}

impl_key_conversions!(StaticStepHandle, UnresolvedStepHandle, DynamicStepHandle, StepHandle);

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> NodePath {
        NodePath::parse(s).unwrap()
    }

    #[test]
    fn test_to_key() {
        assert_eq!(StaticStepHandle::new(path("a.b")).to_key(), "a.b");
        assert_eq!(UnresolvedStepHandle::new(path("a.b")).to_key(), "a.b[?]");
        assert_eq!(
            DynamicStepHandle::new(path("a.b"), "item-3").to_key(),
            "a.b[item-3]"
        );
    }

    #[test]
    fn test_from_key_variants() {
        assert_eq!(
            StepHandle::from_key("a.b").unwrap(),
            StepHandle::Static(StaticStepHandle::new(path("a.b")))
        );
        assert_eq!(
            StepHandle::from_key("a.b[?]").unwrap(),
            StepHandle::Unresolved(UnresolvedStepHandle::new(path("a.b")))
        );
        assert_eq!(
            StepHandle::from_key("a.b[item-3]").unwrap(),
            StepHandle::Dynamic(DynamicStepHandle::new(path("a.b"), "item-3"))
        );
    }

    #[test]
    fn test_pending_marker_wins_over_mapping_key() {
        let handle = StepHandle::from_key("a.b[?]").unwrap();
        assert!(handle.is_unresolved());
        assert_eq!(handle.mapping_key(), None);
    }

    #[test]
    fn test_mapping_key_with_brackets() {
        let handle = DynamicStepHandle::new(path("a"), "x[1]");
        assert_eq!(handle.to_key(), "a[x[1]]");
        assert_eq!(DynamicStepHandle::from_key("a[x[1]]").unwrap(), handle);

        let handle = DynamicStepHandle::new(path("a"), "x[?");
        assert_eq!(DynamicStepHandle::from_key(&handle.to_key()).unwrap(), handle);
    }

    #[test]
    fn test_empty_mapping_key_round_trips() {
        let handle = DynamicStepHandle::new(path("a"), "");
        assert_eq!(handle.to_key(), "a[]");
        assert_eq!(StepHandle::from_key("a[]").unwrap(), StepHandle::from(handle));
    }

    #[test]
    fn test_malformed_keys() {
        for key in ["", "[?]", "[x]", "a[x", "a[x]y", "a..b", "a]"] {
            let err = StepHandle::from_key(key).unwrap_err();
            assert!(err.is_malformed_key(), "{key:?} gave {err}");
        }
    }

    #[test]
    fn test_resolve_and_unresolved_form() {
        let unresolved = UnresolvedStepHandle::new(path("outer.fan"));
        let dynamic = unresolved.resolve("k1");
        assert_eq!(dynamic.node_path(), unresolved.node_path());
        assert_eq!(dynamic.mapping_key(), "k1");
        assert_eq!(dynamic.unresolved_form(), unresolved);
        assert_eq!(unresolved.resolve("k1"), dynamic);
    }

    #[test]
    fn test_resolve_all_skips_duplicates() {
        let unresolved = UnresolvedStepHandle::new(path("fan"));
        let resolved = unresolved.resolve_all(["b", "a", "b", "c", "a"]);
        let keys: Vec<_> = resolved.iter().map(|h| h.to_key()).collect();
        assert_eq!(keys, vec!["fan[b]", "fan[a]", "fan[c]"]);
    }

    #[test]
    fn test_try_new_policy() {
        assert!(DynamicStepHandle::try_new(path("a"), "k").is_ok());
        assert!(DynamicStepHandle::try_new(path("a"), "")
            .unwrap_err()
            .is_invalid_argument());
        assert!(DynamicStepHandle::try_new(path("a"), "?")
            .unwrap_err()
            .is_invalid_argument());
    }

    #[test]
    fn test_narrowing_wrong_kind() {
        let err = StaticStepHandle::from_key("a[?]").unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("expected static step, found unresolved step 'a[?]'"));

        assert!(UnresolvedStepHandle::from_key("a[k]").is_err());
        assert!(DynamicStepHandle::from_key("a").is_err());
        assert!(DynamicStepHandle::from_key("a[").unwrap_err().is_malformed_key());
    }

    #[test]
    fn test_accessors() {
        let handle: StepHandle = DynamicStepHandle::new(path("a.b"), "k").into();
        assert_eq!(handle.node_path(), &path("a.b"));
        assert_eq!(handle.mapping_key(), Some("k"));
        assert_eq!(handle.kind(), "dynamic");
        assert!(handle.is_dynamic());
        assert!(!handle.is_static());
        assert_eq!(handle.to_string(), "a.b[k]");
    }
}
