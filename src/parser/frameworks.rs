use super::{OutputParser, ParseOutcome, TestCounts};
use regex::Regex;
use std::sync::OnceLock;

/// `<number> <word>` pairs such as `3 passed` or `1 failed`
fn word_counts(line: &str) -> Vec<(u32, &str)> {
    static PAIR: OnceLock<Regex> = OnceLock::new();
    PAIR.get_or_init(|| Regex::new(r"(\d+) ([a-z]+)").expect("valid regex"))
        .captures_iter(line)
        .filter_map(|cap| {
            let n = cap.get(1)?.as_str().parse().ok()?;
            Some((n, cap.get(2)?.as_str()))
        })
        .collect()
}

fn last_line_matching<'a>(output: &'a str, re: &Regex) -> Option<&'a str> {
    output.lines().filter(|line| re.is_match(line)).last()
}

/// Fold a summary line into counts; `passed`/`failed`/`skipped` words map per framework
fn tally(line: &str, classify: impl Fn(&str) -> Option<Bucket>) -> TestCounts {
    let mut counts = TestCounts::default();
    for (n, word) in word_counts(line) {
        match classify(word) {
            Some(Bucket::Passed) => counts.passed += n,
            Some(Bucket::Failed) => counts.failed += n,
            Some(Bucket::Skipped) => counts.skipped += n,
            None => {}
        }
    }
    counts
}

enum Bucket {
    Passed,
    Failed,
    Skipped,
}

/// `==== 2 failed, 10 passed, 1 skipped in 0.52s ====` or, with `-q`, `3 passed in 0.1s`
pub struct PytestParser;

impl OutputParser for PytestParser {
    fn parse(&self, output: &str) -> ParseOutcome {
        static SUMMARY: OnceLock<Regex> = OnceLock::new();
        let summary = SUMMARY.get_or_init(|| {
            Regex::new(r"\b\d+ (passed|failed|skipped|errors?|xfailed|xpassed)\b|no tests ran")
                .expect("valid regex")
        });

        let Some(line) = last_line_matching(output, summary) else {
            return ParseOutcome::Unparseable;
        };

        ParseOutcome::Counts(tally(line, |word| match word {
            "passed" | "xpassed" => Some(Bucket::Passed),
            "failed" | "error" | "errors" => Some(Bucket::Failed),
            "skipped" | "xfailed" => Some(Bucket::Skipped),
            _ => None,
        }))
    }
}

/// `Tests:       1 failed, 2 skipped, 3 passed, 6 total`
pub struct JestParser;

impl OutputParser for JestParser {
    fn parse(&self, output: &str) -> ParseOutcome {
        static SUMMARY: OnceLock<Regex> = OnceLock::new();
        let summary = SUMMARY.get_or_init(|| Regex::new(r"^\s*Tests:\s+").expect("valid regex"));

        match last_line_matching(output, summary) {
            Some(line) => ParseOutcome::Counts(tally(line, |word| match word {
                "passed" => Some(Bucket::Passed),
                "failed" => Some(Bucket::Failed),
                "skipped" | "todo" => Some(Bucket::Skipped),
                _ => None,
            })),
            None => ParseOutcome::Unparseable,
        }
    }
}

/// `      Tests  1 failed | 3 passed | 1 skipped (5)`
pub struct VitestParser;

impl OutputParser for VitestParser {
    fn parse(&self, output: &str) -> ParseOutcome {
        static SUMMARY: OnceLock<Regex> = OnceLock::new();
        let summary =
            SUMMARY.get_or_init(|| Regex::new(r"^\s*Tests\s+\d+ [a-z]").expect("valid regex"));

        match last_line_matching(output, summary) {
            Some(line) => ParseOutcome::Counts(tally(line, |word| match word {
                "passed" => Some(Bucket::Passed),
                "failed" => Some(Bucket::Failed),
                "skipped" | "todo" => Some(Bucket::Skipped),
                _ => None,
            })),
            None => ParseOutcome::Unparseable,
        }
    }
}

/// One line per category: `  3 passed (2.1s)`, `  1 failed`, `  2 skipped`, `  1 flaky`
pub struct PlaywrightParser;

impl OutputParser for PlaywrightParser {
    fn parse(&self, output: &str) -> ParseOutcome {
        static CATEGORY: OnceLock<Regex> = OnceLock::new();
        let category = CATEGORY.get_or_init(|| {
            Regex::new(r"^\s*(\d+) (passed|failed|skipped|flaky|interrupted)\b")
                .expect("valid regex")
        });

        let mut counts = TestCounts::default();
        let mut found = false;
        for cap in output.lines().filter_map(|line| category.captures(line)) {
            let Ok(n) = cap[1].parse::<u32>() else {
                continue;
            };
            found = true;
            match &cap[2] {
                "passed" | "flaky" => counts.passed += n,
                "failed" | "interrupted" => counts.failed += n,
                _ => counts.skipped += n,
            }
        }

        if found {
            ParseOutcome::Counts(counts)
        } else {
            ParseOutcome::Unparseable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(passed: u32, failed: u32, skipped: u32) -> ParseOutcome {
        ParseOutcome::Counts(TestCounts {
            passed,
            failed,
            skipped,
        })
    }

    #[test]
    fn test_pytest_full_summary() {
        let out = "tests/test_api.py ..F.s\n\
                   ===== 1 failed, 3 passed, 1 skipped, 1 error in 0.52s =====\n";
        assert_eq!(PytestParser.parse(out), counts(3, 2, 1));
    }

    #[test]
    fn test_pytest_quiet_summary() {
        assert_eq!(PytestParser.parse("3 passed"), counts(3, 0, 0));
    }

    #[test]
    fn test_pytest_no_tests_ran() {
        assert_eq!(
            PytestParser.parse("===== no tests ran in 0.01s ====="),
            counts(0, 0, 0)
        );
    }

    #[test]
    fn test_pytest_uses_last_summary() {
        let out = "1 passed in 0.1s\nsecond session\n2 failed, 5 passed in 0.3s\n";
        assert_eq!(PytestParser.parse(out), counts(5, 2, 0));
    }

    #[test]
    fn test_jest_summary() {
        let out = "PASS src/a.test.ts\nFAIL src/b.test.ts\n\
                   Test Suites: 1 failed, 1 passed, 2 total\n\
                   Tests:       1 failed, 2 skipped, 1 todo, 3 passed, 7 total\n\
                   Snapshots:   0 total\n";
        assert_eq!(JestParser.parse(out), counts(3, 1, 3));
    }

    #[test]
    fn test_jest_ignores_suite_line() {
        assert_eq!(
            JestParser.parse("Test Suites: 2 passed, 2 total"),
            ParseOutcome::Unparseable
        );
    }

    #[test]
    fn test_vitest_summary() {
        let out = " Test Files  1 failed | 2 passed (3)\n      Tests  1 failed | 9 passed | 2 skipped (12)\n   Start at  10:00:00\n";
        assert_eq!(VitestParser.parse(out), counts(9, 1, 2));
    }

    #[test]
    fn test_playwright_summary() {
        let out = "Running 6 tests using 2 workers\n\n  1 failed\n    [chromium] login.spec.ts:3:1\n  1 flaky\n  3 passed (12.4s)\n  1 skipped\n";
        assert_eq!(PlaywrightParser.parse(out), counts(4, 1, 1));
    }
}
