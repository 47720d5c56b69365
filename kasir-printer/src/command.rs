//! Print command model
//!
//! [`PrintCommand`] is the intermediate representation between receipt
//! rendering and the driver adapters: renderers emit a command sequence,
//! drivers translate each command into wire bytes. Keeping this a plain
//! data type lets the formatting layer stay free of any driver calling
//! convention.

/// Character font selection (ESC M).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    /// Standard 12x24 font
    A,
    /// Condensed 9x17 font
    B,
}

/// Horizontal alignment (ESC a).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Text emphasis (ESC E).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Normal,
    Bold,
}

/// One cell of a table line.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub text: String,
    pub align: Align,
    /// Fraction of the paper width this column occupies (0.0..=1.0).
    pub width: f32,
    pub bold: bool,
}

impl Column {
    pub fn new(text: impl Into<String>, align: Align, width: f32) -> Self {
        Self {
            text: text.into(),
            align,
            width,
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// A single printable directive.
///
/// Built fresh for every print job and discarded once the session
/// completes.
#[derive(Debug, Clone, PartialEq)]
pub enum PrintCommand {
    SetFont(Font),
    SetAlign(Align),
    SetStyle(Style),
    /// Character scaling; `1, 1` is normal, `2, 2` doubles both axes.
    SetSize { width: u8, height: u8 },
    /// One line of text, newline-terminated on the wire.
    Text(String),
    /// Columns laid out across the paper width.
    Table(Vec<Column>),
    /// Feed and full cut.
    Cut,
}

impl PrintCommand {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Plain-text rendering of a table row, for drivers that cannot
    /// execute the table primitive.
    pub fn table_fallback_line(columns: &[Column]) -> String {
        columns
            .iter()
            .map(|c| c.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
