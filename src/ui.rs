use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, AppState};
use crate::round::RoundOutcome;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        match self.state {
            AppState::Ready => {
                let kind = self.kind();
                let mut lines = vec![
                    Line::from(Span::styled(kind.title(), bold_style)),
                    Line::from(""),
                    Line::from(Span::styled(kind.blurb(), italic_style)),
                    Line::from(""),
                ];
                if let Some(best) = self.best_score {
                    lines.push(Line::from(format!("Best score: {best}")));
                }
                lines.push(Line::from(Span::styled(
                    "(enter) start / (esc)ape",
                    dim_bold_style,
                )));

                let height = lines.len() as u16;
                let top = area.height.saturating_sub(height) / 2;
                let centered = Rect {
                    y: area.y + top,
                    height: height.min(area.height),
                    ..area
                };
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .render(centered, buf);
            }
            AppState::Playing => render_playing(self, area, buf),
            AppState::Results => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .horizontal_margin(HORIZONTAL_MARGIN)
                    .vertical_margin(VERTICAL_MARGIN)
                    .constraints([
                        Constraint::Min(1),
                        Constraint::Length(1), // score
                        Constraint::Length(1), // accuracy
                        Constraint::Length(1), // best
                        Constraint::Min(1),
                        Constraint::Length(1), // legend
                    ])
                    .split(area);

                let summary = self.summary.clone().unwrap_or_default();

                Paragraph::new(Span::styled(
                    format!("{}: {} points   level {}", self.kind().title(), summary.score, summary.level),
                    bold_style,
                ))
                .alignment(Alignment::Center)
                .render(chunks[1], buf);

                Paragraph::new(format!(
                    "{}/{} correct   {}% acc",
                    summary.correct_count, summary.total_count, summary.accuracy
                ))
                .alignment(Alignment::Center)
                .render(chunks[2], buf);

                if let Some(best) = self.best_score {
                    let best_line = if summary.score >= best && summary.score > 0 {
                        Span::styled(
                            "New best score!",
                            Style::default().fg(Color::Yellow).patch(bold_style),
                        )
                    } else {
                        Span::styled(
                            format!("Best score: {best}"),
                            Style::default().fg(Color::Cyan).patch(italic_style),
                        )
                    };
                    Paragraph::new(best_line)
                        .alignment(Alignment::Center)
                        .render(chunks[3], buf);
                }

                Paragraph::new(Span::styled("(r)etry / (esc)ape", italic_style))
                    .render(chunks[5], buf);
            }
        }
    }
}

fn render_playing(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let game = app.game();
    let prompt = game
        .prompt_text()
        .unwrap_or_else(|| "(answer from memory)".to_string());

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1) as usize;
    let prompt_lines: u16 = prompt
        .lines()
        .map(|line| line.width().div_ceil(max_chars_per_line).max(1) as u16)
        .sum::<u16>()
        .max(1);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(1)
        .constraints([
            Constraint::Length(1), // stats
            Constraint::Min(1),
            Constraint::Length(1), // round countdown
            Constraint::Length(prompt_lines),
            Constraint::Length(1),
            Constraint::Length(1), // input
            Constraint::Length(1), // feedback
            Constraint::Length(1), // notice
            Constraint::Min(1),
            Constraint::Length(1), // hint
        ])
        .split(area);

    let elapsed = app.stats.elapsed_secs;
    let total = game.duration().as_secs();
    Paragraph::new(Span::styled(
        format!(
            "Score {}   Level {}   {}   {}s left",
            app.stats.score,
            app.stats.level,
            app.stats.progress_label,
            total.saturating_sub(elapsed)
        ),
        bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    if let Some(remaining) = game.round_remaining() {
        Paragraph::new(Span::styled(
            format!("{:.1}", remaining.as_secs_f64()),
            dim_style.patch(bold_style),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    }

    Paragraph::new(prompt)
        .style(bold_style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .render(chunks[3], buf);

    Paragraph::new(Line::from(vec![
        Span::styled("> ", dim_style),
        Span::raw(app.input.as_str()),
        Span::styled("_", dim_style.add_modifier(Modifier::SLOW_BLINK)),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);

    if let Some(feedback) = &app.feedback {
        let color = match feedback.outcome {
            RoundOutcome::Correct => Color::Green,
            RoundOutcome::Incorrect => Color::Red,
            RoundOutcome::TimedOut => Color::Yellow,
            RoundOutcome::Pending => Color::Reset,
        };
        Paragraph::new(Span::styled(
            feedback.message(),
            Style::default().fg(color).patch(bold_style),
        ))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);
    }

    if let Some(notice) = &app.notice {
        Paragraph::new(Span::styled(
            notice.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[7], buf);
    }

    Paragraph::new(Span::styled(
        format!("{}   (esc) end session", game.answer_hint()),
        dim_style.add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[9], buf);
}
