//! ESC/POS command builder
//!
//! Provides a fluent API for building ESC/POS print data, plus the
//! translation from [`PrintCommand`] values to wire bytes.

use crate::command::{Align, Column, Font, PrintCommand, Style};
use crate::encoding::{convert_to_gb18030, pad_width, text_width};

/// ESC/POS command builder
///
/// Builds ESC/POS byte sequences for thermal printers.
/// All text is converted to GB18030 encoding by [`EscPosBuilder::build`].
pub struct EscPosBuilder {
    buf: Vec<u8>,
    width: usize,
}

impl EscPosBuilder {
    /// Create a new builder with the specified paper width in characters
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 48 characters
    pub fn new(width: usize) -> Self {
        let mut b = Self::bare(width);
        // Initialize printer (ESC @)
        b.buf.extend_from_slice(&[0x1B, 0x40]);
        b
    }

    /// Create a builder without the leading initialize sequence.
    ///
    /// Used for per-command rendering on an already-initialized
    /// connection.
    pub fn bare(width: usize) -> Self {
        Self {
            buf: Vec::with_capacity(256),
            width,
        }
    }

    /// Get the configured paper width
    pub fn width(&self) -> usize {
        self.width
    }

    // === Text Output ===

    /// Write raw text (will be GB18030 encoded)
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(b'\n');
        self
    }

    /// Write empty line
    pub fn newline(&mut self) -> &mut Self {
        self.buf.push(b'\n');
        self
    }

    /// Write multiple empty lines
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        // ESC d n - Print and feed n lines
        self.buf.extend_from_slice(&[0x1B, 0x64, lines]);
        self
    }

    // === Font / Alignment / Style ===

    /// Select character font
    pub fn font(&mut self, font: Font) -> &mut Self {
        // ESC M n
        let n = match font {
            Font::A => 0x00,
            Font::B => 0x01,
        };
        self.buf.extend_from_slice(&[0x1B, 0x4D, n]);
        self
    }

    /// Set horizontal alignment
    pub fn align(&mut self, align: Align) -> &mut Self {
        // ESC a n
        let n = match align {
            Align::Left => 0x00,
            Align::Center => 0x01,
            Align::Right => 0x02,
        };
        self.buf.extend_from_slice(&[0x1B, 0x61, n]);
        self
    }

    /// Enable bold text
    pub fn bold(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x01]);
        self
    }

    /// Disable bold text
    pub fn bold_off(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x00]);
        self
    }

    /// Set character scaling; 1 is normal, up to 8 in each axis
    pub fn size(&mut self, width: u8, height: u8) -> &mut Self {
        // GS ! n - high nibble width, low nibble height
        let w = width.clamp(1, 8) - 1;
        let h = height.clamp(1, 8) - 1;
        self.buf.extend_from_slice(&[0x1D, 0x21, (w << 4) | h]);
        self
    }

    /// Reset to normal size
    pub fn reset_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x00]);
        self
    }

    // === Separators ===

    /// Print a line of '=' characters
    pub fn sep_double(&mut self) -> &mut Self {
        self.line(&"=".repeat(self.width))
    }

    /// Print a line of '-' characters
    pub fn sep_single(&mut self) -> &mut Self {
        self.line(&"-".repeat(self.width))
    }

    // === Layout Helpers ===

    /// Print left and right text on the same line
    ///
    /// Left text is left-aligned, right text is right-aligned,
    /// with spaces filling the gap.
    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let lw = text_width(left);
        let rw = text_width(right);

        if lw + rw >= self.width {
            // Too long, just print with space
            self.text(left);
            self.text(" ");
            self.line(right);
        } else {
            let spaces = self.width - lw - rw;
            self.text(left);
            self.text(&" ".repeat(spaces));
            self.line(right);
        }
        self
    }

    /// Print columns distributed across the paper width by fraction
    pub fn table(&mut self, columns: &[Column]) -> &mut Self {
        for column in columns {
            let cell_width = (self.width as f32 * column.width).floor() as usize;
            let cell = match column.align {
                Align::Left => pad_width(&column.text, cell_width, false),
                Align::Right => pad_width(&column.text, cell_width, true),
                Align::Center => {
                    let tw = text_width(&column.text).min(cell_width);
                    let lead = (cell_width - tw) / 2;
                    let padded = format!("{}{}", " ".repeat(lead), column.text);
                    pad_width(&padded, cell_width, false)
                }
            };
            if column.bold {
                self.bold();
                self.text(&cell);
                self.bold_off();
            } else {
                self.text(&cell);
            }
        }
        self.newline();
        self
    }

    // === Paper Control ===

    /// Cut paper (full cut)
    pub fn cut(&mut self) -> &mut Self {
        // GS V 0 - Full cut
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x00]);
        self
    }

    // === Command Translation ===

    /// Append one [`PrintCommand`] as ESC/POS bytes
    pub fn push_command(&mut self, command: &PrintCommand) -> &mut Self {
        match command {
            PrintCommand::SetFont(font) => self.font(*font),
            PrintCommand::SetAlign(align) => self.align(*align),
            PrintCommand::SetStyle(Style::Bold) => self.bold(),
            PrintCommand::SetStyle(Style::Normal) => self.bold_off(),
            PrintCommand::SetSize { width, height } => self.size(*width, *height),
            PrintCommand::Text(s) => self.line(s),
            PrintCommand::Table(columns) => self.table(columns),
            PrintCommand::Cut => self.feed(3).cut(),
        }
    }

    // === Raw Commands ===

    /// Write raw bytes directly
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    // === Build ===

    /// Build the final byte buffer with GB18030 encoding
    ///
    /// This converts all UTF-8 text to GB18030 while preserving ESC/POS
    /// commands.
    pub fn build(self) -> Vec<u8> {
        convert_to_gb18030(&self.buf)
    }

    /// Build without encoding conversion (for debugging or ASCII-only content)
    pub fn build_raw(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new(32)
    }
}
