//! Heuristic classifiers as ordered rule tables.
//!
//! Each table is evaluated top to bottom and the first rule whose predicate
//! holds decides. [`Decision`] names that rule so a verdict can be traced.

pub mod directory;
pub mod executable;

pub use directory::DirectoryPolicy;
pub use executable::ExecutableClassifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Skip,
    Keep,
}

/// Outcome of running a rule table against one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub rule: &'static str,
    pub verdict: Verdict,
}

impl Decision {
    pub fn is_skip(&self) -> bool {
        self.verdict == Verdict::Skip
    }
}

pub(crate) struct Rule<C, F> {
    pub name: &'static str,
    pub verdict: Verdict,
    pub applies: fn(&C, &F) -> bool,
}

/// First matching rule wins; `fallback` decides when none match.
pub(crate) fn evaluate<C, F>(
    rules: &[Rule<C, F>],
    classifier: &C,
    facts: &F,
    fallback: Decision,
) -> Decision {
    rules
        .iter()
        .find(|rule| (rule.applies)(classifier, facts))
        .map(|rule| Decision {
            rule: rule.name,
            verdict: rule.verdict,
        })
        .unwrap_or(fallback)
}

/// Lowercased path text with `/` separators, independent of host platform.
pub(crate) fn normalize(path: &str) -> String {
    path.replace('\\', "/").trim_end_matches('/').to_lowercase()
}

/// Last component of a normalized path.
pub(crate) fn last_segment(normalized: &str) -> &str {
    normalized.rsplit('/').next().unwrap_or(normalized)
}

pub(crate) fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Like [`contains_any`], but a needle only counts where it starts or ends the
/// haystack or touches a non-alphanumeric separator.
pub(crate) fn contains_any_anchored(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| {
        haystack.match_indices(needle).any(|(start, _)| {
            let before = haystack[..start].chars().next_back();
            let after = haystack[start + needle.len()..].chars().next();
            before.map_or(true, is_separator) || after.map_or(true, is_separator)
        })
    })
}

fn is_separator(c: char) -> bool {
    !c.is_ascii_alphanumeric()
}
