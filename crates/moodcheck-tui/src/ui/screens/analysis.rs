use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use moodcheck_core::models::analysis::MAX_SCORE;
use moodcheck_core::models::AnalysisResult;

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let error_height = if app.analysis.error().is_some() { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),            // Text input
            Constraint::Length(1),            // Analyze button
            Constraint::Length(error_height), // Error
            Constraint::Min(0),               // Result
        ])
        .split(area);

    render_input(frame, app, chunks[0]);
    render_button(frame, app, chunks[1]);
    if let Some(error) = app.analysis.error() {
        render_error(frame, error, chunks[2]);
    }
    if let Some(result) = app.analysis.result() {
        render_result(frame, result, chunks[3]);
    }
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let focused = !app.analysis.is_loading();
    let block = Block::default()
        .title(Span::styled(" Text to analyze ", styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let content = if app.analysis.text.is_empty() && focused {
        Line::from(vec![
            Span::styled("▌", styles::list_item_style()),
            Span::styled("e.g. This product is amazing, I love it!", styles::muted_style()),
        ])
    } else {
        let cursor = if focused { "▌" } else { "" };
        Line::from(Span::styled(
            format!("{}{}", app.analysis.text, cursor),
            styles::list_item_style(),
        ))
    };

    let paragraph = Paragraph::new(content).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_button(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.analysis.is_loading() {
        Line::from(Span::styled("  Analyzing...", styles::muted_style()))
    } else {
        Line::from(vec![
            Span::raw("  ["),
            Span::styled(" Analyze sentiment ", styles::selected_style()),
            Span::raw("]"),
        ])
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_error(frame: &mut Frame, error: &str, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Error ", styles::error_style()))
        .borders(Borders::ALL)
        .border_style(styles::error_style());
    let paragraph = Paragraph::new(Span::styled(error.to_string(), styles::error_style()))
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_result(frame: &mut Frame, result: &AnalysisResult, area: Rect) {
    let polarity = result.polarity();

    let block = Block::default()
        .title(Span::styled(" Result ", styles::success_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Label
            Constraint::Length(1), // Score gauge
            Constraint::Length(1), // Scale legend
            Constraint::Min(0),    // Analyzed text
        ])
        .split(inner);

    let label = Line::from(vec![
        Span::styled(" Sentiment: ", styles::muted_style()),
        Span::styled(result.sentiment.to_uppercase(), styles::polarity_style(polarity)),
        Span::styled(format!("  ({})", polarity.display_name()), styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(label), chunks[0]);

    let gauge = Gauge::default()
        .gauge_style(ratatui::style::Style::default().fg(styles::polarity_color(polarity)))
        .ratio(result.score_ratio())
        .label(format!("{}/{}", result.score, MAX_SCORE));
    frame.render_widget(gauge, chunks[1]);

    let legend = Line::from(Span::styled(
        " 1-2 negative | 3 neutral | 4-5 positive",
        styles::muted_style(),
    ));
    frame.render_widget(Paragraph::new(legend), chunks[2]);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(" Analyzed text:", styles::highlight_style())),
        Line::from(Span::styled(format!(" \"{}\"", result.text), styles::list_item_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Requested by ", styles::muted_style()),
            Span::styled(result.user.clone(), styles::list_item_style()),
        ]),
    ];
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), chunks[3]);
}
