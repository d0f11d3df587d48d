use std::io::{self, Write};

pub const DEFAULT_FILL: char = '█';
pub const DEFAULT_SCALE: f64 = 0.55;
/// Used when the terminal size can't be queried (piped output, CI).
pub const DEFAULT_COLUMNS: u16 = 80;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressLine {
    /// Number of fill characters.
    pub filled: usize,
    /// Total bar width in characters.
    pub width: usize,
    pub percent: f64,
}

/// Bar geometry for `received` out of `filesize` bytes. An empty file counts as complete.
pub fn progress_line(received: u64, filesize: u64, columns: u16, scale: f64) -> ProgressLine {
    let width = (f64::from(columns) * scale.clamp(0.0, 1.0)) as usize;

    let ratio = if filesize == 0 {
        1.0
    } else {
        received.min(filesize) as f64 / filesize as f64
    };

    ProgressLine {
        filled: ((width as f64) * ratio).round() as usize,
        width,
        percent: (ratio * 1000.0).round() / 10.0,
    }
}

pub fn render_progress_bar(received: u64, filesize: u64, columns: u16, ch: char, scale: f64) -> String {
    let line = progress_line(received, filesize, columns, scale);
    let bar: String = std::iter::repeat_n(ch, line.filled)
        .chain(std::iter::repeat_n(' ', line.width - line.filled))
        .collect();

    format!(" ↳ |{}| {:.1}%\r", bar, line.percent)
}

pub fn terminal_columns() -> u16 {
    console::Term::stdout()
        .size_checked()
        .map(|(_, cols)| cols)
        .filter(|cols| *cols > 0)
        .unwrap_or(DEFAULT_COLUMNS)
}

/// Redraws the progress bar in place on stdout.
pub fn display_progress_bar(received: u64, filesize: u64, ch: char, scale: f64) -> io::Result<()> {
    let line = render_progress_bar(received, filesize, terminal_columns(), ch, scale);
    let mut stdout = io::stdout().lock();
    stdout.write_all(line.as_bytes())?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_done() {
        let line = render_progress_bar(50, 100, 40, '#', 0.5);
        assert_eq!(line, format!(" ↳ |{}{}| 50.0%\r", "#".repeat(10), " ".repeat(10)));
    }

    #[test]
    fn default_fill_and_scale() {
        let line = render_progress_bar(100, 100, 80, DEFAULT_FILL, DEFAULT_SCALE);
        assert_eq!(line, format!(" ↳ |{}| 100.0%\r", "█".repeat(44)));
    }

    #[test]
    fn bar_width_never_changes() {
        let mut last = 0;
        for received in (0..=1000).step_by(37) {
            let line = progress_line(received, 1000, 120, DEFAULT_SCALE);
            assert_eq!(line.width, 66);
            assert!(line.filled >= last && line.filled <= line.width);
            assert!((0.0..=100.0).contains(&line.percent));
            last = line.filled;
        }
    }

    #[test]
    fn overshoot_and_empty_files_are_complete() {
        assert_eq!(progress_line(150, 100, 80, DEFAULT_SCALE).percent, 100.0);
        assert_eq!(progress_line(0, 0, 80, DEFAULT_SCALE).percent, 100.0);
        assert_eq!(progress_line(0, 100, 80, DEFAULT_SCALE).filled, 0);
    }
}
