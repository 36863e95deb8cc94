//! Test-count extraction from test-runner output.
//!
//! Each framework gets an [`OutputParser`]. Parsers report
//! [`ParseOutcome::Unparseable`] instead of zeros when no summary is found,
//! so "no tests ran" and "could not read the output" stay distinguishable.

mod frameworks;

pub use frameworks::{JestParser, PlaywrightParser, PytestParser, VitestParser};

use crate::config::Framework;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCounts {
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl TestCounts {
    pub fn total(&self) -> u32 {
        self.passed + self.failed + self.skipped
    }
}

impl std::ops::AddAssign for TestCounts {
    fn add_assign(&mut self, other: Self) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    Counts(TestCounts),
    Unparseable,
}

impl ParseOutcome {
    pub fn counts(self) -> Option<TestCounts> {
        match self {
            ParseOutcome::Counts(c) => Some(c),
            ParseOutcome::Unparseable => None,
        }
    }
}

pub trait OutputParser: Send + Sync {
    /// Extract counts from combined stdout + stderr
    fn parse(&self, output: &str) -> ParseOutcome;
}

pub fn parser_for(framework: Framework) -> &'static dyn OutputParser {
    match framework {
        Framework::Pytest => &PytestParser,
        Framework::Jest => &JestParser,
        Framework::Vitest => &VitestParser,
        Framework::Playwright => &PlaywrightParser,
    }
}

/// Parse `raw` with the framework's parser, logging unparseable output
pub fn parse_counts(raw: &str, framework: Framework) -> ParseOutcome {
    let outcome = parser_for(framework).parse(&strip_ansi(raw));
    if outcome == ParseOutcome::Unparseable {
        tracing::warn!("Could not find a {} summary in test output", framework);
    }
    outcome
}

pub(crate) fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    ANSI.get_or_init(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("valid regex"))
        .replace_all(s, "")
}
