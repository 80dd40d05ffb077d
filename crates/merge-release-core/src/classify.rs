use crate::types::Bump;

const BREAKING_MARKERS: [&str; 2] = ["BREAKING CHANGE", "!:"];
const FEATURE_PREFIX: &str = "feat";

/// Decide the bump level for a set of commit messages.
///
/// Matching is loose: a message is breaking when it contains
/// `BREAKING CHANGE` or `!:` anywhere, and a feature when it starts with
/// `feat` in any case. The highest level found wins; an empty set is a patch.
pub fn classify<S: AsRef<str>>(messages: &[S]) -> Bump {
    if messages.iter().any(|m| is_breaking(m.as_ref())) {
        Bump::Major
    } else if messages.iter().any(|m| is_feature(m.as_ref())) {
        Bump::Minor
    } else {
        Bump::Patch
    }
}

fn is_breaking(message: &str) -> bool {
    BREAKING_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

fn is_feature(message: &str) -> bool {
    message.to_lowercase().starts_with(FEATURE_PREFIX)
}
