mod report;
mod summary;

pub use report::{format_task_line, render, write_report, TestReport};
pub use summary::{summarize, RunSummary};
