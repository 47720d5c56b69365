//! Receipt renderer
//!
//! Renders a transaction snapshot into printer commands. Pure and
//! deterministic: no I/O, no failure paths. Missing settings fall back
//! to literal placeholders so a receipt is always printable.

use chrono_tz::Tz;
use kasir_printer::{Align, Column, Font, PrintCommand, Style, truncate_chars};

use super::types::{ReceiptSettings, TransactionSnapshot};

/// Item names longer than this are truncated with an ellipsis
const NAME_LIMIT: usize = 28;
/// Width of the "qty x unit price" column
const QTY_COL: usize = 20;
/// Width of the subtotal column
const AMOUNT_COL: usize = 12;

/// Receipt renderer for 58mm/80mm thermal paper
pub struct ReceiptRenderer {
    width: usize,
    timezone: Tz,
}

impl ReceiptRenderer {
    /// Create a renderer with the given paper width in characters
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 48 characters
    pub fn new(width: usize, timezone: Tz) -> Self {
        Self { width, timezone }
    }

    /// Render one receipt as an ordered command sequence ending in a cut
    pub fn render(
        &self,
        tx: &TransactionSnapshot,
        settings: &ReceiptSettings,
    ) -> Vec<PrintCommand> {
        let mut out = Vec::with_capacity(24 + tx.items.len() * 2);

        self.render_header(&mut out, settings);
        self.render_meta(&mut out, tx);
        self.render_items(&mut out, tx);
        self.render_totals(&mut out, tx);
        self.render_footer(&mut out, settings);

        out.push(PrintCommand::Cut);
        out
    }

    fn separator(&self) -> PrintCommand {
        PrintCommand::Text("-".repeat(self.width))
    }

    /// Store identity block: name at double size, then phone, address
    /// and the operator's custom header lines.
    fn render_header(&self, out: &mut Vec<PrintCommand>, settings: &ReceiptSettings) {
        out.push(PrintCommand::SetFont(Font::A));
        out.push(PrintCommand::SetAlign(Align::Center));
        out.push(PrintCommand::SetSize {
            width: 2,
            height: 2,
        });
        out.push(PrintCommand::SetStyle(Style::Normal));
        out.push(PrintCommand::text(&settings.store_name));
        out.push(PrintCommand::SetSize {
            width: 1,
            height: 1,
        });

        if !settings.store_phone.is_empty() {
            out.push(PrintCommand::text(format!("Tel: {}", settings.store_phone)));
        }
        if !settings.store_address.is_empty() {
            out.push(PrintCommand::text(&settings.store_address));
        }
        for line in non_blank_lines(&settings.receipt_header) {
            out.push(PrintCommand::Text(line));
        }
        out.push(self.separator());
    }

    fn render_meta(&self, out: &mut Vec<PrintCommand>, tx: &TransactionSnapshot) {
        out.push(PrintCommand::SetAlign(Align::Left));
        out.push(PrintCommand::Text(format_timestamp(
            tx.created_at,
            self.timezone,
        )));
        out.push(self.separator());
    }

    /// Item block: one name line, then "qty x unit" against the subtotal.
    fn render_items(&self, out: &mut Vec<PrintCommand>, tx: &TransactionSnapshot) {
        for item in &tx.items {
            out.push(PrintCommand::Text(truncate_name(item.display_name())));

            let qty_price = format!(
                "{} x {}",
                item.quantity,
                format_number(item.unit_price())
            );
            out.push(PrintCommand::Text(amount_line(
                &qty_price,
                &format_rupiah(item.subtotal),
            )));
        }
        out.push(self.separator());
    }

    fn render_totals(&self, out: &mut Vec<PrintCommand>, tx: &TransactionSnapshot) {
        for (label, amount, bold) in [
            ("TOTAL", tx.total, true),
            ("BAYAR", tx.paid, false),
            ("KEMBALIAN", tx.change, false),
        ] {
            let mut left = Column::new(label, Align::Left, 0.5);
            let mut right = Column::new(format_rupiah(amount), Align::Right, 0.5);
            if bold {
                left = left.bold();
                right = right.bold();
            }
            out.push(PrintCommand::Table(vec![left, right]));
        }
        out.push(PrintCommand::Text(String::new()));
    }

    /// Custom footer lines, or the polite default block.
    fn render_footer(&self, out: &mut Vec<PrintCommand>, settings: &ReceiptSettings) {
        out.push(PrintCommand::SetAlign(Align::Center));

        let lines = non_blank_lines(&settings.receipt_footer);
        if lines.is_empty() {
            out.push(PrintCommand::text("Terima kasih"));
            out.push(PrintCommand::text("Barang yang sudah dibeli"));
            out.push(PrintCommand::text("Tidak dapat dikembalikan"));
        } else {
            for line in lines {
                out.push(PrintCommand::Text(line));
            }
        }

        out.push(PrintCommand::text("Powered by KasirQu"));
        out.push(PrintCommand::text("github.com/kasirqu"));
    }
}

impl Default for ReceiptRenderer {
    fn default() -> Self {
        Self::new(32, chrono_tz::Asia::Jakarta)
    }
}

/// Split free text into trimmed, non-empty lines
fn non_blank_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Truncate an item name to the display limit, by codepoint
fn truncate_name(name: &str) -> String {
    if name.chars().count() > NAME_LIMIT {
        format!("{}…", truncate_chars(name, NAME_LIMIT))
    } else {
        name.to_string()
    }
}

/// Combine the qty/price column and the amount column into one line
fn amount_line(left: &str, right: &str) -> String {
    let left: String = left.chars().take(QTY_COL).collect();
    format!("{left:<QTY_COL$}{right:>AMOUNT_COL$}")
}

/// 15000 -> "15.000"
fn format_number(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// 45000 -> "Rp45.000"
fn format_rupiah(n: i64) -> String {
    format!("Rp{}", format_number(n))
}

/// Unix millis to "dd/mm/yy hh:mm" in the configured timezone
fn format_timestamp(ts: i64, tz: Tz) -> String {
    match chrono::DateTime::from_timestamp_millis(ts) {
        Some(dt) => dt.with_timezone(&tz).format("%d/%m/%y %H:%M").to_string(),
        None => "--/--/-- --:--".to_string(),
    }
}
