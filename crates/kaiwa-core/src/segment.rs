//! Typed message segmentation for rendering.
//!
//! Splits a message body into prose and fenced code blocks with a
//! forward-only scanner: one pass, no backtracking, restartable per
//! message. Segments borrow from the input, so scanning allocates nothing.
//!
//! A fence is a line beginning with three or more backticks; the opener's
//! trailing text is the language tag, and the block closes at the next line
//! consisting solely of at least as many backticks. An unterminated fence
//! consumes the remainder of the input as code.

/// One typed span of a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Prose outside any code fence.
    Text(&'a str),
    /// A fenced code block.
    Code {
        language: Option<&'a str>,
        body: &'a str,
    },
}

/// Lazy segment iterator over one message body.
///
/// Obtain via [`segments`]; construct a fresh one to rescan.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    rest: &'a str,
}

/// Scan `input` into a lazy sequence of typed segments.
pub fn segments(input: &str) -> Segments<'_> {
    Segments { rest: input }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        if self.rest.is_empty() {
            return None;
        }

        // Walk line by line looking for a fence opener.
        let mut offset = 0;
        while offset < self.rest.len() {
            let line_end = line_end(self.rest, offset);
            let line = &self.rest[offset..line_end];

            let Some(ticks) = opener_ticks(line) else {
                offset = line_end;
                continue;
            };

            if offset > 0 {
                // Emit the prose before the fence first; the fence line is
                // re-scanned on the next call.
                let text = &self.rest[..offset];
                self.rest = &self.rest[offset..];
                return Some(Segment::Text(text));
            }

            let language = opener_language(line, ticks);
            return Some(self.take_code_block(line_end, ticks, language));
        }

        // No fence anywhere: the remainder is prose.
        let text = self.rest;
        self.rest = "";
        Some(Segment::Text(text))
    }
}

impl<'a> Segments<'a> {
    /// Consume lines from `body_start` until a closing fence of at least
    /// `open_ticks` backticks, or the end of input.
    fn take_code_block(
        &mut self,
        body_start: usize,
        open_ticks: usize,
        language: Option<&'a str>,
    ) -> Segment<'a> {
        let mut pos = body_start;
        while pos < self.rest.len() {
            let end = line_end(self.rest, pos);
            if is_closer(&self.rest[pos..end], open_ticks) {
                let body = &self.rest[body_start..pos];
                self.rest = &self.rest[end..];
                return Segment::Code { language, body };
            }
            pos = end;
        }

        // Unterminated fence: the rest of the input is the body.
        let body = &self.rest[body_start..];
        self.rest = "";
        Segment::Code { language, body }
    }
}

/// End offset of the line starting at `start`, including its newline.
fn line_end(input: &str, start: usize) -> usize {
    input[start..]
        .find('\n')
        .map(|i| start + i + 1)
        .unwrap_or(input.len())
}

/// Backtick count if `line` opens a fence (3+ leading backticks).
fn opener_ticks(line: &str) -> Option<usize> {
    let ticks = line.bytes().take_while(|&b| b == b'`').count();
    (ticks >= 3).then_some(ticks)
}

/// Language tag after the opener's backticks, if any.
fn opener_language(line: &str, ticks: usize) -> Option<&str> {
    let tag = line[ticks..].trim();
    (!tag.is_empty()).then_some(tag)
}

/// Whether `line` closes a fence opened with `open_ticks` backticks:
/// nothing but a run of at least that many backticks.
fn is_closer(line: &str, open_ticks: usize) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= open_ticks && trimmed.bytes().all(|b| b == b'`')
}
