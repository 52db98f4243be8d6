//! Report composition.
//!
//! Turns an [`ExecutionOutcome`] into the HTML text sent to Telegram.
//! Composition is pure: the same outcome and options always produce the
//! same string.

use std::fmt::Write as _;

use crate::config::ReportZone;
use crate::executor::ExecutionOutcome;

const FAILURE_HEADER: &str = "\u{274c} <b>Command failed</b>"; // ❌
const SUCCESS_HEADER: &str = "\u{2705} <b>Command completed successfully</b>"; // ✅
const OUTPUT_OPEN: &str = "\nOutput:\n<pre>";
const OUTPUT_CLOSE: &str = "</pre>";

/// Per-invocation report settings.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Shown under the command when non-empty.
    pub note: String,
    /// Attach non-blank output to success reports as well.
    pub always_include_output: bool,
    /// Zone for both timestamps.
    pub zone: ReportZone,
    /// Upper bound on the report length in characters. Only the output
    /// block is shortened to meet it.
    pub max_chars: Option<usize>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            note: String::new(),
            always_include_output: false,
            zone: ReportZone::default(),
            max_chars: None,
        }
    }
}

/// Escape `&`, `<` and `>` for Telegram HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Build the report for `outcome`.
pub fn compose(outcome: &ExecutionOutcome, options: &ReportOptions) -> String {
    let failed = !outcome.succeeded();
    let output = String::from_utf8_lossy(&outcome.output);
    let include_output = failed || (options.always_include_output && !output.trim().is_empty());

    let mut msg = String::new();
    let _ = writeln!(
        msg,
        "{}\nCommand: <pre>{}</pre>",
        if failed { FAILURE_HEADER } else { SUCCESS_HEADER },
        escape_html(&outcome.command_line)
    );
    if !options.note.is_empty() {
        let _ = writeln!(msg, "Note: <b>{}</b>", escape_html(&options.note));
    }
    let _ = write!(
        msg,
        "Start time: {}\nEnd time: {}\nDuration: {} sec.\nExit code: {}",
        options.zone.format(outcome.started_at),
        options.zone.format(outcome.finished_at),
        outcome.duration_secs(),
        outcome.exit_code
    );

    if include_output {
        let body = match options.max_chars {
            Some(limit) => {
                let frame = OUTPUT_OPEN.chars().count() + OUTPUT_CLOSE.chars().count();
                let budget = limit.saturating_sub(msg.chars().count() + frame);
                escape_tail(&output, budget)
            }
            None => escape_html(&output),
        };
        msg.push_str(OUTPUT_OPEN);
        msg.push_str(&body);
        msg.push_str(OUTPUT_CLOSE);
    }

    msg
}

fn escaped_width(c: char) -> usize {
    match c {
        '&' => 5,
        '<' | '>' => 4,
        _ => 1,
    }
}

fn truncation_marker(dropped_bytes: usize) -> String {
    format!("[... {dropped_bytes} bytes truncated ...]\n")
}

/// Escape `raw`, keeping only as much of its tail as fits in `budget`
/// escaped characters. Entities are never split.
fn escape_tail(raw: &str, budget: usize) -> String {
    let total: usize = raw.chars().map(escaped_width).sum();
    if total <= budget {
        return escape_html(raw);
    }

    // The marker for the whole input is at least as long as the final one.
    let mut room = budget.saturating_sub(truncation_marker(raw.len()).chars().count());
    let mut start = raw.len();
    for (idx, c) in raw.char_indices().rev() {
        let width = escaped_width(c);
        if width > room {
            break;
        }
        room -= width;
        start = idx;
    }

    let mut out = truncation_marker(start);
    out.push_str(&escape_html(&raw[start..]));
    out
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn outcome(command: &str, output: &str, exit_code: i32) -> ExecutionOutcome {
        let started_at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        ExecutionOutcome {
            command_line: command.to_string(),
            output: output.as_bytes().to_vec(),
            exit_code,
            started_at,
            finished_at: started_at + Duration::milliseconds(65_900),
        }
    }

    fn utc_options() -> ReportOptions {
        ReportOptions {
            zone: ReportZone::Named(chrono_tz::UTC),
            ..Default::default()
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("echo <a> & <b>"),
            "echo &lt;a&gt; &amp; &lt;b&gt;"
        );
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_failure_report_layout() {
        let options = ReportOptions {
            note: "nightly <backup>".to_string(),
            ..utc_options()
        };
        let report = compose(&outcome("make && ./run", "boom\n", 2), &options);

        assert_eq!(
            report,
            "\u{274c} <b>Command failed</b>\n\
             Command: <pre>make &amp;&amp; ./run</pre>\n\
             Note: <b>nightly &lt;backup&gt;</b>\n\
             Start time: 2024-03-01 10:00:00 UTC\n\
             End time: 2024-03-01 10:01:05 UTC\n\
             Duration: 65 sec.\n\
             Exit code: 2\n\
             Output:\n\
             <pre>boom\n</pre>"
        );
    }

    #[test]
    fn test_failure_always_has_output_block() {
        let report = compose(&outcome("false", "", 1), &utc_options());
        assert!(report.ends_with("Output:\n<pre></pre>"));
    }

    #[test]
    fn test_success_omits_output_unless_requested() {
        let ok = outcome("echo hi", "hi\n", 0);

        let report = compose(&ok, &utc_options());
        assert!(report.starts_with("\u{2705} <b>Command completed successfully</b>"));
        assert!(report.ends_with("Exit code: 0"));
        assert!(!report.contains("Output:"));
        assert!(!report.contains("Note:"));

        let always = ReportOptions {
            always_include_output: true,
            ..utc_options()
        };
        assert!(compose(&ok, &always).ends_with("Output:\n<pre>hi\n</pre>"));
    }

    #[test]
    fn test_success_skips_blank_output_even_when_always() {
        let options = ReportOptions {
            always_include_output: true,
            ..utc_options()
        };
        let report = compose(&outcome("true", " \n\t\n", 0), &options);
        assert!(!report.contains("Output:"));
    }

    #[test]
    fn test_command_escaped_once() {
        let report = compose(&outcome("echo <a> & <b>", "", 0), &utc_options());
        assert!(report.contains("echo &lt;a&gt; &amp; &lt;b&gt;"));
        assert!(!report.contains("&amp;lt;"));
    }

    #[test]
    fn test_negative_clock_skew_clamps_duration() {
        let mut skewed = outcome("true", "", 0);
        skewed.finished_at = skewed.started_at - Duration::seconds(3);
        assert!(compose(&skewed, &utc_options()).contains("Duration: 0 sec."));
    }

    #[test]
    fn test_no_limit_never_truncates() {
        let big = "x".repeat(10_000);
        let report = compose(&outcome("cat big", &big, 1), &utc_options());
        assert!(report.contains(&big));
    }

    #[test]
    fn test_limit_keeps_output_tail() {
        let mut output = "early line\n".repeat(500);
        output.push_str("fatal: <disk full>\n");
        let options = ReportOptions {
            max_chars: Some(1000),
            ..utc_options()
        };

        let report = compose(&outcome("backup", &output, 1), &options);
        assert!(report.chars().count() <= 1000);
        assert!(report.contains("bytes truncated ...]"));
        assert!(report.ends_with("fatal: &lt;disk full&gt;\n</pre>"));
        assert!(report.contains("Exit code: 1"));
    }

    #[test]
    fn test_limit_does_not_split_entities() {
        let output = "&".repeat(300);
        let options = ReportOptions {
            max_chars: Some(400),
            ..utc_options()
        };

        let report = compose(&outcome("amp", &output, 1), &options);
        let body = report
            .split("<pre>")
            .last()
            .and_then(|b| b.strip_suffix("</pre>"))
            .unwrap();
        let escaped = body.split_once(" ...]\n").map(|(_, rest)| rest).unwrap();
        assert!(!escaped.is_empty());
        assert_eq!(escaped.len() % 5, 0);
        assert!(escaped.chars().all(|c| "&amp;".contains(c)));
    }

    #[test]
    fn test_short_output_within_limit_untouched() {
        let options = ReportOptions {
            max_chars: Some(4096),
            ..utc_options()
        };
        let report = compose(&outcome("ls", "a\nb\n", 1), &options);
        assert!(report.ends_with("<pre>a\nb\n</pre>"));
        assert!(!report.contains("truncated"));
    }
}
