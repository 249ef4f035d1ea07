use std::io::{self, BufRead, Write};

use crate::state::{PredictorSession, Response};

/// Shown before every read.
pub const PROMPT: &str = "Enter a plate number (or type 'exit'): ";

// ---------------------------------------------------------------------------
// Prompt loop
// ---------------------------------------------------------------------------

/// Drive `session` from `input` until it terminates, writing prompts and
/// responses to `out`.
pub fn run_prompt<R: BufRead, W: Write>(
    session: &mut PredictorSession<'_>,
    mut input: R,
    out: &mut W,
) -> io::Result<()> {
    let mut buf = Vec::new();

    while !session.is_terminated() {
        write!(out, "\n{PROMPT}")?;
        out.flush()?;

        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            writeln!(out)?;
            session.end_of_input();
            break;
        }
        // Bytes that are not UTF-8 become U+FFFD and fail prefix validation.
        let line = String::from_utf8_lossy(&buf);

        match session.handle_line(&line) {
            Response::Exit => {}
            response => writeln!(out, "{response}")?,
        }
    }

    log::info!("Prompt closed after {} predictions", session.predictions());
    out.flush()
}
