// Rendering of the results.

use std::io::{self, Write};

/// Draws a chart out of (label, value) pairs.
///
/// The rows arrive in the order they must be drawn in.
pub trait ChartRenderer {
    fn render(&self, title: &str, rows: &[(String, u64)], out: &mut dyn Write) -> io::Result<()>;
}

/// A horizontal bar chart drawn with text characters.
#[derive(Debug, Clone)]
pub struct TextChart {
    /// Width of the longest bar, in characters.
    pub width: usize,
    /// Cycled through, one per row.
    pub palette: Vec<char>,
}

impl Default for TextChart {
    fn default() -> Self {
        TextChart {
            width: 40,
            palette: vec!['█', '▓', '▒', '░', '#'],
        }
    }
}

impl TextChart {
    fn bar_len(&self, value: u64, max_value: u64) -> usize {
        if max_value == 0 {
            0
        } else {
            ((value as f64) * (self.width as f64) / (max_value as f64)).round() as usize
        }
    }
}

impl ChartRenderer for TextChart {
    fn render(&self, title: &str, rows: &[(String, u64)], out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}", title)?;
        writeln!(out, "{}", "=".repeat(title.chars().count()))?;
        if rows.is_empty() {
            writeln!(out, "(no data)")?;
            return Ok(());
        }
        let label_width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
        let max_value = rows.iter().map(|(_, v)| *v).max().unwrap_or(0);
        for (idx, (label, value)) in rows.iter().enumerate() {
            let glyph = if self.palette.is_empty() {
                '#'
            } else {
                self.palette[idx % self.palette.len()]
            };
            let bar: String = std::iter::repeat(glyph)
                .take(self.bar_len(*value, max_value))
                .collect();
            let padding = " ".repeat(label_width - label.chars().count());
            writeln!(out, "{}{} | {} {}", label, padding, bar, value)?;
        }
        Ok(())
    }
}
