use std::collections::VecDeque;

/// Line buffer that keeps the most recent `max_bytes` of output.
///
/// Test runners print their summary last, so the tail is what the parser needs.
#[derive(Debug)]
pub struct OutputBuffer {
    lines: VecDeque<String>,
    bytes: usize,
    max_bytes: usize,
    truncated: bool,
}

impl OutputBuffer {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            bytes: 0,
            max_bytes,
            truncated: false,
        }
    }

    pub fn push_line(&mut self, line: &str) {
        let keep = self.max_bytes.saturating_sub(1);
        let line = if line.len() > keep {
            // Keep the end of an oversized line, on a char boundary
            let mut start = line.len() - keep;
            while !line.is_char_boundary(start) {
                start += 1;
            }
            self.truncated = true;
            &line[start..]
        } else {
            line
        };

        self.bytes += line.len() + 1;
        self.lines.push_back(line.to_string());

        while self.bytes > self.max_bytes {
            match self.lines.pop_front() {
                Some(dropped) => {
                    self.bytes -= dropped.len() + 1;
                    self.truncated = true;
                }
                None => break,
            }
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn into_string(self) -> String {
        let mut out = String::with_capacity(self.bytes);
        if self.truncated {
            out.push_str("[... output truncated ...]\n");
        }
        for line in self.lines {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}
