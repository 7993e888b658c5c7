//! Text protocol spoken with the host over the serial link.
//!
//! The controller reports `"<inside>, <outside>\n"` with one decimal every
//! tick. The host sends a new set point as a decimal number ending in a
//! newline.

use log::{info, warn};

/// Longest line accepted from the host, anything longer is dropped.
pub const MAX_LINE_LEN: usize = 20;

pub fn format_report(inside_c: f32, outside_c: f32) -> String {
    format!("{:.1}, {:.1}\n", inside_c, outside_c)
}

/// Accumulates bytes from the host into set point commands.
#[derive(Default)]
pub struct SetPointReader {
    line: Vec<u8>,
    overflowed: bool,
}

impl SetPointReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed received bytes, returning the last valid set point completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Option<f32> {
        let mut set_point = None;

        for &byte in bytes {
            match byte {
                b'\n' | b'\0' => {
                    if let Some(value) = self.finish_line() {
                        set_point = Some(value);
                    }
                }
                _ if self.line.len() >= MAX_LINE_LEN => self.overflowed = true,
                _ => self.line.push(byte),
            }
        }

        set_point
    }

    fn finish_line(&mut self) -> Option<f32> {
        let overflowed = std::mem::take(&mut self.overflowed);
        let line = std::mem::take(&mut self.line);

        if line.is_empty() && !overflowed {
            return None;
        }

        if overflowed {
            warn!("Dropped overlong line from host");
            return None;
        }

        let parsed = std::str::from_utf8(&line)
            .ok()
            .map(|text| text.trim_start().trim_end_matches('\r'))
            .and_then(|text| text.parse::<f32>().ok())
            .filter(|value| value.is_finite());

        match parsed {
            Some(value) => {
                info!("Host set point {:.2}C", value);
                Some(value)
            }
            None => {
                warn!("Ignoring malformed set point {:?}", String::from_utf8_lossy(&line));
                None
            }
        }
    }
}
