use std::io::{IsTerminal, Write};

use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};

use crate::metrics::Stats;

/// Single-line live view of a run, redrawn in place on stderr.
pub(crate) struct ProgressLine {
    style: ProgressStyle,
    no_color: bool,
    enabled: bool,
    drawn: bool,
}

impl ProgressLine {
    /// Disabled automatically when stderr is not a terminal.
    pub(crate) fn new(requested: bool, no_color: bool) -> Self {
        Self {
            style: ProgressStyle::new(30),
            no_color,
            enabled: requested && std::io::stderr().is_terminal(),
            drawn: false,
        }
    }

    pub(crate) fn render(&mut self, stats: &Stats) -> Result<(), std::io::Error> {
        if !self.enabled {
            return Ok(());
        }
        let line = build_progress_line(&self.style, stats, self.no_color);
        let mut out = std::io::stderr();
        queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        for segment in line {
            if let Some(color) = segment.color {
                queue!(
                    out,
                    SetForegroundColor(color),
                    Print(&segment.text),
                    ResetColor
                )?;
            } else {
                queue!(out, Print(&segment.text))?;
            }
        }
        out.flush()?;
        self.drawn = true;
        Ok(())
    }

    pub(crate) fn finish(&mut self) -> Result<(), std::io::Error> {
        if !self.drawn {
            return Ok(());
        }
        self.drawn = false;
        let mut out = std::io::stderr();
        out.write_all(b"\n")?;
        out.flush()
    }
}

fn build_progress_line(style: &ProgressStyle, stats: &Stats, no_color: bool) -> Vec<ProgressSegment> {
    let size = style.size.max(1);
    let goal = u128::from(stats.total_requests.max(1));
    let current = u128::from(stats.completed).min(goal);
    let size_u128 = u128::from(u64::try_from(size).unwrap_or(u64::MAX));

    let scaled = current
        .saturating_mul(size_u128)
        .checked_div(goal)
        .unwrap_or(0);
    let complete_size = usize::try_from(scaled).unwrap_or(size).min(size);
    let incomplete_size = size.saturating_sub(complete_size);

    let percent_x100 = current
        .saturating_mul(10_000)
        .checked_div(goal)
        .unwrap_or(0);
    let percent_whole = percent_x100.checked_div(100).unwrap_or(0);
    let percent_frac = percent_x100.checked_rem(100).unwrap_or(0);
    let percent_text = format!(" {}.{:02}%", percent_whole, percent_frac);

    let elapsed_tenths = stats.elapsed_ms.checked_div(100).unwrap_or(0);
    let secs = elapsed_tenths.checked_div(10).unwrap_or(0);
    let tenths = elapsed_tenths.checked_rem(10).unwrap_or(0);
    let counts_text = format!(
        " | {}/{} req | {}.{}s | {} active",
        stats.completed, stats.total_requests, secs, tenths, stats.active_workers
    );
    let errors_text = format!(" | {} failed", stats.failed());

    let progress_bar = format!(
        "{}{}{}{}",
        style.begin,
        style.fill.repeat(complete_size),
        style.empty.repeat(incomplete_size),
        style.end
    );

    if no_color {
        vec![
            ProgressSegment::plain(progress_bar),
            ProgressSegment::plain(percent_text),
            ProgressSegment::plain(counts_text),
            ProgressSegment::plain(errors_text),
        ]
    } else {
        let error_color = if stats.failed() > 0 {
            Color::Red
        } else {
            Color::Green
        };
        vec![
            ProgressSegment::plain(progress_bar),
            ProgressSegment::colored(percent_text, Color::Cyan),
            ProgressSegment::colored(counts_text, Color::Yellow),
            ProgressSegment::colored(errors_text, error_color),
        ]
    }
}

struct ProgressStyle {
    size: usize,
    begin: String,
    end: String,
    fill: String,
    empty: String,
}

impl ProgressStyle {
    fn new(size: usize) -> Self {
        Self {
            size,
            begin: "[".to_owned(),
            end: "]".to_owned(),
            fill: "#".to_owned(),
            empty: "-".to_owned(),
        }
    }
}

struct ProgressSegment {
    text: String,
    color: Option<Color>,
}

impl ProgressSegment {
    const fn plain(text: String) -> Self {
        Self { text, color: None }
    }

    const fn colored(text: String, color: Color) -> Self {
        Self {
            text,
            color: Some(color),
        }
    }
}
