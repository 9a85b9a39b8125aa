//! Interactive startup prompt.
//!
//! Two branches and no retry: `w` picks camera 0, `v` asks for a video path,
//! anything else is rejected before any resource is touched.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::error::MonitorError;
use crate::ingest::SourceId;

const WEBCAM_INDEX: u32 = 0;

/// Print the mode menu and read the selection from `input`.
pub fn select_source<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<SourceId> {
    writeln!(output, "\n=== Crowd Monitor Demo ===")?;
    writeln!(output, "[W] Use Webcam")?;
    writeln!(output, "[V] Use Video File")?;
    let mode = ask(input, output, "Select mode (W/V): ")?.to_lowercase();

    match mode.as_str() {
        "w" => Ok(SourceId::Device(WEBCAM_INDEX)),
        "v" => {
            let path = ask(input, output, "Enter video path (e.g., videos/crowd.mp4): ")?;
            Ok(SourceId::Path(path))
        }
        _ => Err(MonitorError::InvalidMode(mode).into()),
    }
}

/// Run the prompt, then open the chosen source with `open`.
///
/// `open` is never called when the selection is invalid.
pub fn select_and_open<R, W, S, F>(input: &mut R, output: &mut W, open: F) -> Result<S>
where
    R: BufRead,
    W: Write,
    F: FnOnce(&SourceId) -> Result<S, MonitorError>,
{
    let id = select_source(input, output)?;
    Ok(open(&id)?)
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{question}")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("reading prompt input")?;
    Ok(line.trim().to_string())
}
