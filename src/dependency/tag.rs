//! Dependency tags and the merge rules applied to diamond dependencies.
//!
//! Tags classify a dependency along two axes: **necessity** (required,
//! recommended, or optional) and **temporality** (build-time-only or also
//! needed at runtime). Anything else - `test`, compiler markers, free-form
//! strings - rides along opaquely.
//!
//! When the expander collapses repeated entries for the same package, the
//! tag sets of all occurrences are merged with the precedence rules here:
//! the strictest necessity wins, any runtime occurrence promotes the merged
//! dependency to runtime, and other markers are unioned in first-seen order.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Dependency;

/// A symbolic marker attached to a dependency declaration.
///
/// Recognized markers get their own variant; everything else is preserved
/// verbatim in [`Tag::Other`]. The string form (used by serialization) is
/// the lowercase marker name, or the opaque string itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Tag {
    /// Only built when the dependent's build explicitly requests it.
    Optional,
    /// Built by default, but the dependent's build may opt out.
    Recommended,
    /// Needed at build time only, not at runtime.
    Build,
    /// Only needed to run the dependent's test suite.
    Test,
    /// Unrecognized marker, preserved as declared.
    Other(String),
}

impl Tag {
    /// String form of this tag as it appears in serialized dependencies.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Optional => "optional",
            Self::Recommended => "recommended",
            Self::Build => "build",
            Self::Test => "test",
            Self::Other(s) => s,
        }
    }

    /// Whether this tag expresses necessity (optional/recommended).
    ///
    /// A dependency with no necessity tag is required.
    pub fn is_necessity(&self) -> bool {
        matches!(self, Self::Optional | Self::Recommended)
    }

    /// Whether this tag expresses temporality (build-time-only).
    pub fn is_temporality(&self) -> bool {
        matches!(self, Self::Build)
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        match s.as_str() {
            "optional" => Self::Optional,
            "recommended" => Self::Recommended,
            "build" => Self::Build,
            "test" => Self::Test,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.as_str().to_string()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Merge the tag sets of several same-named dependencies into the canonical
/// merged set: necessity tags first, then the temporality tag, then other
/// markers.
///
/// `deps` must be non-empty; the expander only calls this on groups built
/// from at least one occurrence.
pub fn merge(deps: &[&Dependency]) -> Vec<Tag> {
    let mut tags = merge_necessity(deps);
    tags.extend(merge_temporality(deps));
    tags.extend(merge_other_tags(deps));
    tags
}

/// Strictest-necessity-wins merge.
///
/// Required (no marker) dominates recommended, which dominates optional.
pub fn merge_necessity(deps: &[&Dependency]) -> Vec<Tag> {
    if deps.iter().any(|dep| dep.is_required()) {
        Vec::new()
    } else if deps.iter().any(|dep| dep.is_recommended()) {
        vec![Tag::Recommended]
    } else {
        vec![Tag::Optional]
    }
}

/// Build-time-only iff every occurrence is build-time-only.
///
/// A single runtime occurrence promotes the merged dependency to runtime
/// (no marker).
pub fn merge_temporality(deps: &[&Dependency]) -> Vec<Tag> {
    if deps.iter().all(|dep| dep.is_build_only()) {
        vec![Tag::Build]
    } else {
        Vec::new()
    }
}

/// Stable first-seen union of all non-necessity, non-temporality markers,
/// with a single `test` marker appended if any occurrence carries one.
pub fn merge_other_tags(deps: &[&Dependency]) -> Vec<Tag> {
    let mut tags: Vec<Tag> = Vec::new();
    for dep in deps {
        for tag in dep.tags() {
            if tag.is_necessity() || tag.is_temporality() || *tag == Tag::Test {
                continue;
            }
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
    }
    if deps.iter().any(|dep| dep.is_test()) {
        tags.push(Tag::Test);
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(name: &str, tags: &[Tag]) -> Dependency {
        Dependency::new(name, tags.to_vec()).unwrap()
    }

    #[test]
    fn test_tag_string_round_trip() {
        for s in ["optional", "recommended", "build", "test", "cxx11"] {
            let tag = Tag::from(s);
            assert_eq!(tag.as_str(), s);
        }
        assert_eq!(Tag::from("cxx11"), Tag::Other("cxx11".to_string()));
    }

    #[test]
    fn test_merge_necessity_required_dominates() {
        let required = dep("x", &[]);
        let optional = dep("x", &[Tag::Optional]);
        assert_eq!(merge_necessity(&[&required, &optional]), Vec::<Tag>::new());
    }

    #[test]
    fn test_merge_necessity_recommended_dominates_optional() {
        let recommended = dep("x", &[Tag::Recommended]);
        let optional = dep("x", &[Tag::Optional]);
        assert_eq!(merge_necessity(&[&recommended, &optional]), vec![Tag::Recommended]);
    }

    #[test]
    fn test_merge_necessity_all_optional() {
        let a = dep("x", &[Tag::Optional]);
        let b = dep("x", &[Tag::Optional]);
        assert_eq!(merge_necessity(&[&a, &b]), vec![Tag::Optional]);
    }

    #[test]
    fn test_merge_temporality_runtime_promotes() {
        let build = dep("x", &[Tag::Build]);
        let runtime = dep("x", &[]);
        assert_eq!(merge_temporality(&[&build, &runtime]), Vec::<Tag>::new());
        assert_eq!(merge_temporality(&[&build, &build]), vec![Tag::Build]);
    }

    #[test]
    fn test_merge_other_tags_first_seen_union() {
        let a = dep("x", &[Tag::Other("cxx11".to_string()), Tag::Build]);
        let b = dep("x", &[Tag::Other("universal".to_string()), Tag::Other("cxx11".to_string())]);
        assert_eq!(
            merge_other_tags(&[&a, &b]),
            vec![Tag::Other("cxx11".to_string()), Tag::Other("universal".to_string())]
        );
    }

    #[test]
    fn test_merge_other_tags_synthesizes_test() {
        let a = dep("x", &[Tag::Test]);
        let b = dep("x", &[]);
        assert_eq!(merge_other_tags(&[&a, &b]), vec![Tag::Test]);
        // test is appended once even when several occurrences carry it
        assert_eq!(merge_other_tags(&[&a, &a]), vec![Tag::Test]);
    }

    #[test]
    fn test_merge_canonical_ordering() {
        let a = dep("x", &[Tag::Other("cxx11".to_string()), Tag::Recommended]);
        let b = dep("x", &[Tag::Build, Tag::Optional]);
        let merged = merge(&[&a, &b]);
        // necessity, then temporality, then other markers
        assert_eq!(merged, vec![Tag::Recommended, Tag::Other("cxx11".to_string())]);

        let c = dep("x", &[Tag::Build, Tag::Optional]);
        let merged = merge(&[&b, &c]);
        assert_eq!(merged, vec![Tag::Optional, Tag::Build]);
    }
}
