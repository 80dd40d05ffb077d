use serde::Deserialize;

/// Semantic version bump types, ordered by impact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Bump {
    #[default]
    Patch,
    Minor,
    Major,
}

impl Bump {
    /// Convert bump to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
        }
    }
}

impl std::fmt::Display for Bump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commit as returned by a history query: subject line and remaining body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    pub subject: String,
    pub body: String,
}

impl CommitMessage {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Text handed to the classifier: `subject + "\n" + body`.
    pub fn full_text(&self) -> String {
        format!("{}\n{}", self.subject, self.body)
    }
}

/// A commit listed in the triggering CI event payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventCommit {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub body: Option<String>,
}

impl EventCommit {
    pub fn new(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            body: Some(body.into()),
        }
    }

    /// Text handed to the classifier; a missing body counts as empty.
    pub fn full_text(&self) -> String {
        format!("{}\n{}", self.message, self.body.as_deref().unwrap_or(""))
    }
}

/// Last published state of the package as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRelease {
    pub name: String,
    pub version: String,
    /// Commit the release was built from, when the registry recorded one.
    pub git_head: Option<String>,
}
