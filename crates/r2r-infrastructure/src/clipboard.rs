//! Clipboard access through the OSC 52 terminal escape sequence.
//!
//! The sequence asks the terminal emulator to set the system clipboard, which
//! also works over SSH. Terminals that do not support it ignore it silently.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine;
use r2r_core::clipboard::ClipboardWriter;
use r2r_core::error::{R2rError, Result};

/// Largest encoded payload most terminals accept.
pub const MAX_OSC52_PAYLOAD: usize = 100_000;

/// Writes OSC 52 sequences to a terminal stream.
pub struct Osc52Clipboard<W: Write + Send> {
    out: Mutex<W>,
}

impl Osc52Clipboard<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Encodes `text` as an OSC 52 "set clipboard" sequence.
pub fn osc52_sequence(text: &str) -> Result<String> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    if encoded.len() > MAX_OSC52_PAYLOAD {
        return Err(R2rError::clipboard(format!(
            "content too large for the terminal clipboard ({} bytes encoded)",
            encoded.len()
        )));
    }
    Ok(format!("\x1b]52;c;{}\x07", encoded))
}

#[async_trait]
impl<W: Write + Send> ClipboardWriter for Osc52Clipboard<W> {
    async fn write_text(&self, text: &str) -> Result<()> {
        let sequence = osc52_sequence(text)?;
        {
            let mut out = self
                .out
                .lock()
                .map_err(|_| R2rError::internal("clipboard stream lock poisoned"))?;
            out.write_all(sequence.as_bytes())
                .and_then(|_| out.flush())
                .map_err(|e| R2rError::clipboard(e.to_string()))?;
        }
        tracing::debug!(bytes = text.len(), "Copied to clipboard via OSC 52");
        Ok(())
    }
}
