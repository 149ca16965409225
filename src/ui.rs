use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph},
};
use typhoon_core::composer::PICKER_HINT;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use typhoon_core::MessageEntry;

use crate::app::{App, InputMode};
use crate::view::View;

const EMPTY_STATE_TEXT: &str = "Start the conversation by typing below";
const DISCLAIMER: &str = " AI can make mistakes. Please verify important information. ";
const LOADING_TEXT: &str = "Analyzing";
const BOT_NAME: &str = "◆ Typhoon";
const MAX_INPUT_ROWS: usize = 4;

/// Word-wrap `text` to `width` screen columns. Words longer than a line are
/// split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    if text.is_empty() {
        return out;
    }

    for raw in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0;

        for word in raw.split(' ') {
            let word_width = word.width();
            let needed = if current.is_empty() { word_width } else { current_width + 1 + word_width };

            if needed <= width {
                if !current.is_empty() {
                    current.push(' ');
                    current_width += 1;
                }
                current.push_str(word);
                current_width += word_width;
                continue;
            }

            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }

            // Combining marks have no width and stay with their base char
            current_width = 0;
            for c in word.chars() {
                let char_width = c.width().unwrap_or(0);
                if current_width > 0 && current_width + char_width > width {
                    out.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                current.push(c);
                current_width += char_width;
            }
        }

        out.push(current);
    }

    out
}

/// Split a line on `**` markers, bolding closed pairs. An unclosed marker
/// is kept as literal text.
fn markdown_spans(text: &str, base: Style) -> Vec<Span<'static>> {
    let parts: Vec<&str> = text.split("**").collect();
    let unclosed_last = parts.len() % 2 == 0;

    parts
        .iter()
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| {
            let inside = i % 2 == 1;
            if inside && unclosed_last && i == parts.len() - 1 {
                Span::styled(format!("**{}", part), base)
            } else if inside {
                Span::styled(part.to_string(), base.add_modifier(Modifier::BOLD))
            } else {
                Span::styled(part.to_string(), base)
            }
        })
        .collect()
}

fn visible_len(spans: &[Span]) -> usize {
    spans.iter().map(Span::width).sum()
}

/// The part of `line` between screen columns `skip` and `skip + take`.
fn column_slice(line: &str, skip: usize, take: usize) -> String {
    let mut col = 0;
    let mut kept = false;
    let mut out = String::new();
    for c in line.chars() {
        let char_width = c.width().unwrap_or(0);
        // Zero-width marks follow whatever happened to their base char
        if char_width > 0 {
            kept = col >= skip && col + char_width <= skip + take;
        }
        if kept {
            out.push(c);
        }
        col += char_width;
    }
    out
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let staged = app.session.composer().file().is_some();
    let input_rows = app
        .session
        .composer()
        .text()
        .split('\n')
        .count()
        .clamp(1, MAX_INPUT_ROWS) as u16;

    // Main layout: header, transcript, attachment preview, composer, footer
    let [header_area, chat_area, attachment_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(if staged { 1 } else { 0 }),
        Constraint::Length(input_rows + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, chat_area);
    if staged {
        render_attachment(app, frame, attachment_area);
    }
    render_composer(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.session.notification().is_open() {
        render_notification(app, frame, area);
    } else {
        app.notification_area = None;
    }

    // Render popups (in order of priority)
    if app.show_attach_prompt {
        render_attach_prompt(app, frame, area);
    } else if app.show_view_picker {
        render_view_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = if app.session.is_loading() {
        Span::styled(" sending ", Style::default().fg(Color::Yellow))
    } else {
        Span::raw("")
    };

    let title = Line::from(vec![
        Span::styled(" TYPHOON AI ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        status,
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = match app.view {
        View::Compact => Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
        View::Rich => Block::default().padding(Padding::horizontal(1)),
    };
    let inner = block.inner(area);

    // Store areas for mouse hit-testing and scroll calculations
    app.chat_area = Some(area);
    app.chat_height = inner.height;
    app.sync_auto_scroll();

    let entries = app.session.transcript().entries();
    let loading = app.session.is_loading();
    let width = inner.width as usize;

    let lines = if entries.is_empty() && !loading {
        match app.view {
            View::Compact => Vec::new(),
            View::Rich => empty_state_lines(inner.height),
        }
    } else {
        match app.view {
            View::Compact => compact_lines(entries, loading, app.animation_frame, width),
            View::Rich => rich_lines(entries, loading, app.animation_frame, width),
        }
    };

    let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    app.update_scroll_bounds(total);

    let chat = Paragraph::new(lines)
        .block(block)
        .scroll((app.transcript_scroll, 0));

    frame.render_widget(chat, area);
}

fn empty_state_lines(height: u16) -> Vec<Line<'static>> {
    let dim = Style::default().fg(Color::DarkGray);
    let mut lines: Vec<Line> = (0..height.saturating_sub(2) / 2).map(|_| Line::default()).collect();
    lines.push(Line::from(Span::styled("◆", dim.add_modifier(Modifier::BOLD))).centered());
    lines.push(Line::from(Span::styled(EMPTY_STATE_TEXT, dim)).centered());
    lines
}

/// Labelled transcript: "You:" / "AI:" followed by the text.
fn compact_lines(entries: &[MessageEntry], loading: bool, frame: u8, width: usize) -> Vec<Line<'static>> {
    let you = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let ai = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let note = Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC);

    let mut lines: Vec<Line> = Vec::new();

    for entry in entries {
        if entry.is_user() {
            lines.push(Line::from(Span::styled("You:", you)));
        } else {
            lines.push(Line::from(Span::styled("AI:", ai)));
        }

        if let Some(name) = entry.file_name() {
            for segment in wrap_text(&format!("Attached: {}", name), width) {
                lines.push(Line::from(Span::styled(segment, note)));
            }
        }

        for segment in wrap_text(entry.text(), width) {
            if entry.is_user() {
                lines.push(Line::from(segment));
            } else {
                lines.push(Line::from(markdown_spans(&segment, Style::default())));
            }
        }
        lines.push(Line::default());
    }

    if loading {
        lines.push(Line::from(Span::styled("AI:", ai)));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat(frame as usize + 1);
        lines.push(Line::from(Span::styled(format!("{}{}", LOADING_TEXT, dots), note)));
    }

    lines
}

/// Chat bubbles: user on the right, bot on the left.
fn rich_lines(entries: &[MessageEntry], loading: bool, frame: u8, width: usize) -> Vec<Line<'static>> {
    let user_style = Style::default().bg(Color::Blue).fg(Color::White);
    let bot_style = Style::default().bg(Color::Black).fg(Color::White);
    let name_style = Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD);

    // Bubbles take up to 70% of the width, minus one column of padding per side
    let text_width = (width * 7 / 10).clamp(1, width.max(1)).saturating_sub(2).max(1);

    let mut lines: Vec<Line> = Vec::new();

    for entry in entries {
        let style = if entry.is_user() { user_style } else { bot_style };

        let mut rows: Vec<Vec<Span<'static>>> = Vec::new();
        if let Some(name) = entry.file_name() {
            for segment in wrap_text(&format!("▤ {}", name), text_width) {
                rows.push(vec![Span::styled(segment, style.add_modifier(Modifier::ITALIC))]);
            }
        }
        for segment in wrap_text(entry.text(), text_width) {
            if entry.is_user() {
                rows.push(vec![Span::styled(segment, style)]);
            } else {
                rows.push(markdown_spans(&segment, style));
            }
        }

        let bubble_width = rows.iter().map(|r| visible_len(r)).max().unwrap_or(0);

        if !entry.is_user() {
            lines.push(Line::from(Span::styled(BOT_NAME, name_style)));
        }
        for row in rows {
            let pad = bubble_width - visible_len(&row);
            let mut spans = vec![Span::styled(" ", style)];
            spans.extend(row);
            spans.push(Span::styled(" ".repeat(pad + 1), style));

            let alignment = if entry.is_user() { Alignment::Right } else { Alignment::Left };
            lines.push(Line::from(spans).alignment(alignment));
        }
        lines.push(Line::default());
    }

    if loading {
        lines.push(Line::from(Span::styled(BOT_NAME, name_style)));
        let mut spans = vec![Span::styled(" ", bot_style)];
        for i in 0..3u8 {
            let dot_style = if i == frame {
                bot_style.fg(Color::Magenta).add_modifier(Modifier::BOLD)
            } else {
                bot_style.fg(Color::DarkGray)
            };
            spans.push(Span::styled("● ", dot_style));
        }
        lines.push(Line::from(spans));
    }

    lines
}

fn render_attachment(app: &App, frame: &mut Frame, area: Rect) {
    let Some(file) = app.session.composer().file() else {
        return;
    };

    let (label, hint) = match app.view {
        View::Compact => (" Attached file: ", " [x] remove "),
        View::Rich => (" ▤ Attached ", " Ctrl+X remove "),
    };

    let line = Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Cyan)),
        Span::styled(file.name.clone(), Style::default().fg(Color::White).bold()),
        Span::styled(format!(" ({}) ", file.media_type), Style::default().fg(Color::Gray)),
        Span::styled(hint, Style::default().fg(Color::Red)),
    ]);

    frame.render_widget(Paragraph::new(line).style(Style::default().bg(Color::DarkGray)), area);
}

/// Row and screen column of the cursor (a char index) within multi-line text.
fn cursor_position(text: &str, cursor: usize) -> (usize, usize) {
    let before: String = text.chars().take(cursor).collect();
    let row = before.matches('\n').count();
    let col = before.rsplit('\n').next().map(UnicodeWidthStr::width).unwrap_or(0);
    (row, col)
}

fn render_composer(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    // Send affordance: disabled while loading or with nothing to send
    let send_label = if app.session.is_loading() {
        let spinner = ["◐", "◓", "◑"][app.animation_frame as usize % 3];
        Span::styled(format!(" {} waiting ", spinner), Style::default().fg(Color::Yellow))
    } else if app.session.can_send() {
        Span::styled(" Enter ▶ send ", Style::default().fg(Color::Green).bold())
    } else {
        Span::styled(" ▶ send ", Style::default().fg(Color::DarkGray))
    };

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title_top(Line::from(" Message "))
        .title_top(Line::from(send_label).right_aligned());
    if app.view == View::Rich {
        block = block.title_bottom(
            Line::from(Span::styled(DISCLAIMER, Style::default().fg(Color::DarkGray))).centered(),
        );
    }

    let inner = block.inner(area);
    let width = inner.width as usize;
    let height = inner.height as usize;
    let text = app.session.composer().text();

    if text.is_empty() {
        let placeholder = match app.view {
            View::Compact => "Type a question...",
            View::Rich => "Type your message here...",
        };
        let input = Paragraph::new(Span::styled(placeholder, Style::default().fg(Color::DarkGray)))
            .block(block);
        frame.render_widget(input, area);
    } else {
        let (row, col) = cursor_position(text, app.input_cursor);

        // Scroll offsets that keep the cursor visible
        let row_offset = row.saturating_sub(height.saturating_sub(1));
        let col_offset = if width > 0 && col >= width { col - width + 1 } else { 0 };

        let visible: Vec<Line> = text
            .split('\n')
            .skip(row_offset)
            .take(height)
            .map(|l| Line::from(column_slice(l, col_offset, width)))
            .collect();

        let input = Paragraph::new(visible)
            .style(Style::default().fg(Color::Cyan))
            .block(block);
        frame.render_widget(input, area);
    }

    // Show cursor when editing and no popup has focus
    if editing && !app.show_attach_prompt && !app.show_view_picker {
        let (row, col) = cursor_position(text, app.input_cursor);
        let row_offset = row.saturating_sub(height.saturating_sub(1));
        let col_offset = if width > 0 && col >= width { col - width + 1 } else { 0 };
        frame.set_cursor_position((
            inner.x + (col - col_offset) as u16,
            inner.y + (row - row_offset) as u16,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " INSERT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);
    let hint = |key: &'static str, label: &'static str| {
        [Span::styled(key, key_style), Span::styled(label, label_style)]
    };

    let staged = app.session.composer().file().is_some();
    let mut hints: Vec<Span> = Vec::new();

    match app.input_mode {
        InputMode::Editing => {
            hints.extend(hint(" Enter ", " send "));
            hints.extend(hint(" Alt+Enter ", " newline "));
            hints.extend(hint(" Ctrl+O ", " attach "));
            if staged {
                hints.extend(hint(" Ctrl+X ", " remove file "));
            }
            hints.extend(hint(" Esc ", " stop typing "));
        }
        InputMode::Normal => {
            hints.extend(hint(" i ", " type "));
            hints.extend(hint(" a ", " attach "));
            if staged {
                hints.extend(hint(" x ", " remove file "));
            }
            hints.extend(hint(" j/k ", " scroll "));
            hints.extend(hint(" V ", " view "));
            if app.session.notification().is_open() {
                hints.extend(hint(" Esc ", " dismiss "));
            }
            hints.extend(hint(" q ", " quit "));
        }
    }

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_notification(app: &mut App, frame: &mut Frame, area: Rect) {
    let message = app.session.notification().message().to_string();

    let popup_width = (message.width() as u16 + 10).min(area.width.saturating_sub(2));
    let popup_height = 3.min(area.height);

    // Minimal view anchors top-right, rich view top-center
    let popup_x = match app.view {
        View::Compact => area.width.saturating_sub(popup_width + 1),
        View::Rich => area.width.saturating_sub(popup_width) / 2,
    };
    let popup_area = Rect::new(popup_x, area.y + 1, popup_width, popup_height);
    app.notification_area = Some(popup_area);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title_top(Line::from(" [x] ").right_aligned())
        .style(Style::default().bg(Color::Yellow).fg(Color::Black));

    let body = Paragraph::new(Line::from(vec![
        Span::styled(" ⚠ ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(message),
    ]))
    .block(block);

    frame.render_widget(body, popup_area);
}

fn render_attach_prompt(app: &App, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 64.min(area.width.saturating_sub(4));
    let popup_height = 7.min(area.height);

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" Attach file ({}) ", PICKER_HINT));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions = Paragraph::new("Type or drop a file path. Enter to attach, Esc to cancel.")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    // Input field with horizontal scrolling
    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let inner_width = input_area.width as usize;
    let (_, cursor_col) = cursor_position(&app.attach_input, app.attach_cursor);
    let scroll_offset = if inner_width > 0 && cursor_col >= inner_width {
        cursor_col - inner_width + 1
    } else {
        0
    };
    let visible_text = column_slice(&app.attach_input, scroll_offset, inner_width);
    frame.render_widget(
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan)),
        input_area,
    );
    frame.set_cursor_position((
        input_area.x + (cursor_col - scroll_offset) as u16,
        input_area.y,
    ));

    let status = Paragraph::new("PDF, PNG and JPEG files are accepted")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(status, Rect::new(inner.x, inner.y + 4, inner.width, 1));
}

fn render_view_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let views = View::all();

    // Calculate popup size and position (centered)
    let popup_width = 40.min(area.width.saturating_sub(4));
    let popup_height = (views.len() as u16 + 2).min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select View ");

    let items: Vec<ListItem> = views
        .iter()
        .map(|view| {
            let is_current = *view == app.view;
            let prefix = if is_current { "* " } else { "  " };
            let style = if is_current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}{}", prefix, view.display_name())).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.view_picker_state);
}
