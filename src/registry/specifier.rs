//! Tree and block specifier parsing.
//!
//! - Tree: `<provider>/<owner>/<repo>[@<ref>]`, e.g. `github/acme/blocks@v2`
//! - Block, bare: `<category>/<name>`, resolved against the configured trees in order
//! - Block, qualified: `<provider>/<owner>/<repo>[@<ref>]/<category>/<name>`

use std::fmt;
use std::str::FromStr;

use crate::constants::DEFAULT_TREE_REF;
use crate::core::BlockpmError;

/// Identity of one source tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeSpec {
    /// Hosting provider name (`github`, `gitlab`, `local`, ...)
    pub provider: String,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Git ref, `main` when not given
    pub git_ref: String,
}

impl TreeSpec {
    /// `<provider>/<owner>/<repo>`, without the ref.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}/{}/{}", self.provider, self.owner, self.repo)
    }
}

impl fmt::Display for TreeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())?;
        if self.git_ref != DEFAULT_TREE_REF {
            write!(f, "@{}", self.git_ref)?;
        }
        Ok(())
    }
}

impl FromStr for TreeSpec {
    type Err = BlockpmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| BlockpmError::InvalidSpecifier {
            specifier: s.to_string(),
            reason: reason.to_string(),
        };

        let (path, git_ref) = match s.split_once('@') {
            Some((_, r)) if r.is_empty() => return Err(invalid("ref after '@' is empty")),
            Some((path, r)) => (path, r),
            None => (s, DEFAULT_TREE_REF),
        };

        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(invalid("expected <provider>/<owner>/<repo>[@<ref>]"));
        }

        Ok(Self {
            provider: parts[0].to_string(),
            owner: parts[1].to_string(),
            repo: parts[2].to_string(),
            git_ref: git_ref.to_string(),
        })
    }
}

/// A requested block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockSpecifier {
    /// `<category>/<name>`, looked up in every configured tree
    Bare {
        /// `<category>/<name>`
        id: String,
    },
    /// Pinned to one tree
    Qualified {
        /// Tree that must publish the block
        tree: TreeSpec,
        /// `<category>/<name>`
        id: String,
    },
}

impl BlockSpecifier {
    /// The `<category>/<name>` part of the specifier.
    #[must_use]
    pub fn block_id(&self) -> &str {
        match self {
            Self::Bare {
                id,
            }
            | Self::Qualified {
                id,
                ..
            } => id,
        }
    }
}

impl fmt::Display for BlockSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bare {
                id,
            } => write!(f, "{id}"),
            Self::Qualified {
                tree,
                id,
            } => write!(f, "{tree}/{id}"),
        }
    }
}

impl FromStr for BlockSpecifier {
    type Err = BlockpmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim_matches('/').split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(BlockpmError::InvalidSpecifier {
                specifier: s.to_string(),
                reason: "empty path segment".to_string(),
            });
        }

        match parts.len() {
            2 => Ok(Self::Bare {
                id: parts.join("/"),
            }),
            5 => Ok(Self::Qualified {
                tree: parts[..3].join("/").parse()?,
                id: parts[3..].join("/"),
            }),
            _ => Err(BlockpmError::InvalidSpecifier {
                specifier: s.to_string(),
                reason: "expected <category>/<name> or <provider>/<owner>/<repo>/<category>/<name>"
                    .to_string(),
            }),
        }
    }
}
