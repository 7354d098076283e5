use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use crate::app::{App, Sender};

const PANEL_WIDTH: u16 = 48;
const PANEL_HEIGHT: u16 = 24;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    if app.is_open {
        render_panel(app, frame, area);
    } else {
        render_launcher(app, frame, area);
    }
}

/// The closed widget: just the launcher bar, anchored bottom-right.
fn render_launcher(app: &App, frame: &mut Frame, area: Rect) {
    let palette = app.palette();
    let label = format!(" ● {} ", app.bot_name);
    let width = (label.chars().count() as u16).min(area.width);
    if width == 0 || area.height == 0 {
        return;
    }

    let bar = Rect {
        x: area.width.saturating_sub(width + 1),
        y: area.height.saturating_sub(2),
        width,
        height: 1,
    };

    let launcher = Paragraph::new(label).style(
        Style::default()
            .fg(palette.user_bubble_fg)
            .bg(palette.primary)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(launcher, bar);
}

/// The open widget: a chat panel anchored to the bottom-right corner.
fn render_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    let palette = app.palette();

    let width = PANEL_WIDTH.min(area.width);
    let height = PANEL_HEIGHT.min(area.height);
    let panel = Rect {
        x: area.width.saturating_sub(width),
        y: area.height.saturating_sub(height),
        width,
        height,
    };

    frame.render_widget(Clear, panel);
    let background = Block::default().style(Style::default().bg(palette.background));
    frame.render_widget(background, panel);

    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(panel);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let palette = app.palette();

    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", app.bot_name),
            Style::default().fg(palette.user_bubble_fg).bold(),
        ),
        Span::styled("● online", Style::default().fg(palette.user_bubble_fg)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(palette.primary));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let palette = app.palette();

    let inner = Rect {
        x: area.x + 1,
        y: area.y,
        width: area.width.saturating_sub(2),
        height: area.height,
    };

    // Record geometry for scroll-to-bottom calculations
    app.chat_height = inner.height;
    app.chat_width = inner.width;

    let mut lines: Vec<Line> = Vec::new();
    for index in 0..app.messages.len() {
        let message = &app.messages[index];
        let (label, label_style, bubble_style) = match message.sender {
            Sender::User => (
                "You",
                Style::default().fg(palette.text_muted).bold(),
                Style::default()
                    .fg(palette.user_bubble_fg)
                    .bg(palette.user_bubble_bg),
            ),
            Sender::Bot => (
                app.bot_name.as_str(),
                Style::default().fg(palette.primary).bold(),
                Style::default()
                    .fg(palette.bot_bubble_fg)
                    .bg(palette.bot_bubble_bg),
            ),
        };

        lines.push(Line::from(Span::styled(label.to_string(), label_style)));
        for text_line in app.display_text(index).lines() {
            lines.push(Line::from(Span::styled(text_line.to_string(), bubble_style)));
        }
        lines.push(Line::default());
    }

    if app.awaiting_reply {
        let dots = ".".repeat(app.spinner_frame() + 1);
        lines.push(Line::from(Span::styled(
            app.bot_name.clone(),
            Style::default().fg(palette.primary).bold(),
        )));
        lines.push(Line::from(Span::styled(
            format!("typing{dots}"),
            Style::default().fg(palette.text_muted).italic(),
        )));
    }

    let chat = Paragraph::new(lines)
        .style(Style::default().fg(palette.text).bg(palette.background))
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, inner);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let palette = app.palette();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .style(Style::default().bg(palette.surface));

    let content = if app.input.is_empty() {
        Span::styled("Type your message...", Style::default().fg(palette.text_muted))
    } else {
        Span::styled(app.input.as_str(), Style::default().fg(palette.text))
    };

    let input = Paragraph::new(Line::from(content)).block(block);
    frame.render_widget(input, area);

    // The input has focus whenever the panel is open
    let cursor_x = area.x + 1 + (app.input_cursor as u16).min(area.width.saturating_sub(3));
    frame.set_cursor_position((cursor_x, area.y + 1));
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let palette = app.palette();
    let key_style = Style::default().fg(palette.primary).bold();
    let label_style = Style::default().fg(palette.text_muted);

    let hints = Line::from(vec![
        Span::styled(" Enter ", key_style),
        Span::styled("send ", label_style),
        Span::styled(" ^T ", key_style),
        Span::styled("theme ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled("close ", label_style),
    ]);

    let footer = Paragraph::new(hints).style(Style::default().bg(palette.background));
    frame.render_widget(footer, area);
}
