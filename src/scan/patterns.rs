// src/scan/patterns.rs

use std::fmt;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;

use crate::errors::PatternError;

/// Compiled include/exclude patterns, matched against item identities
/// (paths relative to the scan root, e.g. `"logs/app.log"`).
///
/// - `include` are regular expressions; an identity is included when any of
///   them finds a match anywhere in it. No include patterns means "match
///   everything".
/// - `exclude` are globs; an identity matching any of them is dropped even
///   when included.
#[derive(Clone, Default)]
pub struct PatternSet {
    include: Vec<Regex>,
    exclude: Option<GlobSet>,
    exclude_count: usize,
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let include: Vec<&str> = self.include.iter().map(Regex::as_str).collect();
        f.debug_struct("PatternSet")
            .field("include", &include)
            .field("exclude", &self.exclude_count)
            .finish()
    }
}

impl PatternSet {
    /// A pattern set that matches every identity.
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Compile raw pattern strings. Fails on the first invalid pattern.
    pub fn compile<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, PatternError> {
        let include = include
            .iter()
            .map(|pat| {
                let pat = pat.as_ref();
                Regex::new(pat).map_err(|source| PatternError::Regex {
                    pattern: pat.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude)?)
        };

        Ok(Self {
            include,
            exclude: exclude_set,
            exclude_count: exclude.len(),
        })
    }

    pub fn is_match_all(&self) -> bool {
        self.include.is_empty() && self.exclude.is_none()
    }

    /// Returns true if the item with this identity belongs in a snapshot.
    pub fn matches(&self, identity: &str) -> bool {
        let included =
            self.include.is_empty() || self.include.iter().any(|re| re.is_match(identity));
        if !included {
            return false;
        }
        match &self.exclude {
            Some(exclude) => !exclude.is_match(identity),
            None => true,
        }
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet, PatternError> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let pat = pat.as_ref();
        let glob = Glob::new(pat).map_err(|source| PatternError::Glob {
            pattern: pat.to_string(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| PatternError::Glob {
        pattern: patterns
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(", "),
        source,
    })
}
