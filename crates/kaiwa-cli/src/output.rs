//! Terminal output: streaming sink and segment-aware rendering.
//!
//! While a response streams, fragments go straight to stdout. Completed
//! messages (the non-streaming path) are rendered through the segment
//! scanner: code fences get dim delimiters on a terminal, piped output is
//! passed through verbatim.

use kaiwa_core::api::sink::{ResponseEvent, ResponseSink};
use kaiwa_core::segment::{Segment, segments};
use std::io::{self, IsTerminal, Write};

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Streams response fragments to stdout as they arrive.
pub struct TerminalSink {
    wrote: bool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self { wrote: false }
    }
}

impl ResponseSink for TerminalSink {
    fn handle(&mut self, event: ResponseEvent<'_>) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        match event {
            ResponseEvent::StartResponse => {
                self.wrote = false;
            }
            ResponseEvent::TextChunk(chunk) => {
                stdout.write_all(chunk.as_bytes())?;
                stdout.flush()?;
                self.wrote = true;
            }
            ResponseEvent::Interrupted { marker } => {
                stdout.write_all(marker.as_bytes())?;
                writeln!(stdout)?;
                stdout.flush()?;
            }
            ResponseEvent::Finished => {
                if self.wrote {
                    writeln!(stdout)?;
                }
            }
        }
        Ok(())
    }
}

/// Render a completed message to stdout.
pub fn render_message(content: &str) -> io::Result<()> {
    let tty = io::stdout().is_terminal();
    let mut stdout = io::stdout().lock();
    if tty {
        write_segments(content, &mut stdout)?;
    } else {
        stdout.write_all(content.as_bytes())?;
    }
    if !content.ends_with('\n') {
        writeln!(stdout)?;
    }
    stdout.flush()
}

/// Write `content` through the segment scanner: prose verbatim, code
/// blocks wrapped in dim fence delimiters.
fn write_segments(content: &str, out: &mut impl Write) -> io::Result<()> {
    for segment in segments(content) {
        match segment {
            Segment::Text(text) => out.write_all(text.as_bytes())?,
            Segment::Code { language, body } => {
                writeln!(out, "{}--- {} ---{}", DIM, language.unwrap_or("code"), RESET)?;
                out.write_all(body.as_bytes())?;
                if !body.is_empty() && !body.ends_with('\n') {
                    writeln!(out)?;
                }
                writeln!(out, "{}---{}", DIM, RESET)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_to_string(content: &str) -> String {
        let mut buf = Vec::new();
        write_segments(content, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn prose_passes_through() {
        assert_eq!(render_to_string("just text\n"), "just text\n");
    }

    #[test]
    fn code_blocks_get_dim_delimiters() {
        let out = render_to_string("before\n```rust\nlet x = 1;\n```\nafter\n");
        assert!(out.contains("before\n"));
        assert!(out.contains("--- rust ---"));
        assert!(out.contains("let x = 1;\n"));
        assert!(out.contains("after\n"));
        assert!(out.contains(DIM));
    }

    #[test]
    fn unlabeled_code_block_says_code() {
        let out = render_to_string("```\nx\n```");
        assert!(out.contains("--- code ---"));
    }

    #[test]
    fn unterminated_block_body_gets_trailing_newline() {
        let out = render_to_string("```py\nprint(1)");
        assert!(out.contains("print(1)\n"));
    }
}
