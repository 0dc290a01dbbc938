//! Build configuration.

use std::path::{Path, PathBuf};

/// Where the fixture goes when no path is given.
pub const DEFAULT_OUTPUT: &str = "dist/sample.h5";

/// Options for one fixture build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureConfig {
    /// Output file; must not exist yet.
    pub output: PathBuf,
    /// Skip entries whose type this build cannot encode instead of failing.
    pub allow_platform_gaps: bool,
    /// Append the bitfield entries after the standard matrix.
    pub include_bitfield: bool,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            allow_platform_gaps: false,
            include_bitfield: false,
        }
    }
}

impl FixtureConfig {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn allow_platform_gaps(mut self, allow: bool) -> Self {
        self.allow_platform_gaps = allow;
        self
    }

    pub fn include_bitfield(mut self, include: bool) -> Self {
        self.include_bitfield = include;
        self
    }
}
