//! Decorative square shown next to a new ticket number.
//!
//! Looks like a QR code but carries no payload: the cells are a fixed
//! function of the ticket number and nothing can decode them.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const GRID: usize = 25;
const MARKER: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketCode {
    ticket: String,
    cells: Vec<bool>,
}

impl TicketCode {
    pub fn for_ticket(ticket: &str) -> Self {
        let pattern: Vec<u32> = ticket
            .encode_utf16()
            .enumerate()
            .map(|(k, unit)| unit as u32 + k as u32)
            .collect();
        let n = pattern.len();

        let mut cells = vec![false; GRID * GRID];
        for y in 0..GRID {
            for x in 0..GRID {
                let dark = match marker_cell(x, y) {
                    Some(dark) => dark,
                    None if n == 0 => false,
                    None => (pattern[x % n] + pattern[y % n]) % 3 == 0,
                };
                cells[y * GRID + x] = dark;
            }
        }

        Self {
            ticket: ticket.to_string(),
            cells,
        }
    }

    pub fn ticket(&self) -> &str {
        &self.ticket
    }

    /// `x` is the column, `y` the row, both from the top-left corner.
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < GRID && y < GRID && self.cells[y * GRID + x]
    }

    /// Two grid rows per text line using half-block glyphs.
    pub fn render_lines(&self) -> Vec<String> {
        (0..GRID)
            .step_by(2)
            .map(|y| {
                (0..GRID)
                    .map(|x| match (self.is_dark(x, y), self.is_dark(x, y + 1)) {
                        (true, true) => '█',
                        (true, false) => '▀',
                        (false, true) => '▄',
                        (false, false) => ' ',
                    })
                    .collect()
            })
            .collect()
    }

    pub fn to_svg(&self, cell_px: usize) -> String {
        let size = GRID * cell_px;
        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{size}\" height=\"{size}\" viewBox=\"0 0 {size} {size}\">\n<rect width=\"{size}\" height=\"{size}\" fill=\"#FFFFFF\"/>\n"
        );
        for y in 0..GRID {
            for x in 0..GRID {
                if self.is_dark(x, y) {
                    let _ = writeln!(
                        svg,
                        "<rect x=\"{}\" y=\"{}\" width=\"{cell_px}\" height=\"{cell_px}\" fill=\"#000000\"/>",
                        x * cell_px,
                        y * cell_px
                    );
                }
            }
        }
        svg.push_str("</svg>\n");
        svg
    }

    /// Writes `ticket-<id>.svg` into `dir`.
    pub async fn save_svg(&self, dir: &Path) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("ticket-{}.svg", self.ticket));
        tokio::fs::write(&path, self.to_svg(12)).await?;
        Ok(path)
    }
}

/// Colour of a finder-marker cell, or `None` outside the three markers.
fn marker_cell(x: usize, y: usize) -> Option<bool> {
    let far = GRID - MARKER;
    let (mx, my) = match (x < MARKER, y < MARKER, x >= far, y >= far) {
        (true, true, _, _) => (x, y),
        (_, true, true, _) => (x - far, y),
        (true, _, _, true) => (x, y - far),
        _ => return None,
    };
    let ring = mx.min(my).min(MARKER - 1 - mx).min(MARKER - 1 - my);
    Some(ring != 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_ticket_same_pattern() {
        let a = TicketCode::for_ticket("TPM-20240115-0042");
        let b = TicketCode::for_ticket("TPM-20240115-0042");
        let c = TicketCode::for_ticket("TPM-20240115-0043");
        assert_eq!(a, b);
        assert_ne!(a.cells, c.cells);
    }

    #[test]
    fn markers_have_rings() {
        let code = TicketCode::for_ticket("TPM-20240115-0042");
        for (ox, oy) in [(0, 0), (18, 0), (0, 18)] {
            assert!(code.is_dark(ox, oy));
            assert!(code.is_dark(ox + 6, oy + 6));
            assert!(!code.is_dark(ox + 1, oy + 1));
            assert!(!code.is_dark(ox + 5, oy + 3));
            assert!(code.is_dark(ox + 3, oy + 3));
        }
    }

    #[test]
    fn data_cells_follow_char_codes() {
        let ticket = "TPM-20240115-0042";
        let code = TicketCode::for_ticket(ticket);
        let p: Vec<u32> = ticket.chars().enumerate().map(|(k, c)| c as u32 + k as u32).collect();
        let n = p.len();
        for (x, y) in [(10, 10), (12, 20), (24, 8), (8, 24)] {
            assert_eq!(code.is_dark(x, y), (p[x % n] + p[y % n]) % 3 == 0, "({x},{y})");
        }
    }

    #[test]
    fn text_and_svg_output() {
        let code = TicketCode::for_ticket("TPM-20240115-0042");
        let lines = code.render_lines();
        assert_eq!(lines.len(), 13);
        assert!(lines.iter().all(|l| l.chars().count() == GRID));
        assert!(lines[0].starts_with('█'));

        let svg = code.to_svg(4);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("width=\"100\""));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn empty_ticket_only_draws_markers() {
        let code = TicketCode::for_ticket("");
        assert!(code.is_dark(0, 0));
        assert!(!code.is_dark(12, 12));
    }
}
