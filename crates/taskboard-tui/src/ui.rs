use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use taskboard_shared::CommentWithAuthor;

use crate::app::{App, Focus};
use crate::comments::Control;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Comments list
            Constraint::Length(3), // Comment input
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_header(f, chunks[0], app);
    draw_comments(f, chunks[1], app);
    draw_input(f, chunks[2], app);
    draw_status_bar(f, chunks[3], app);

    if app.focus == Focus::TaskPrompt {
        draw_task_prompt(f, app);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " Comments ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("task {} ", app.panel.task_id()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("@ {}", app.server_url),
            Style::default().fg(Color::DarkGray),
        ),
    ]));

    f.render_widget(header, area);
}

fn comment_item<'a>(comment: &'a CommentWithAuthor, app: &'a App) -> ListItem<'a> {
    let timestamp = comment
        .created_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string();

    let editing = app
        .panel
        .editing
        .as_ref()
        .filter(|e| e.comment_id == comment.id);

    let body = match editing {
        Some(edit) => {
            let label = if app.panel.is_busy(Control::Save(comment.id)) {
                " saving... "
            } else {
                " Enter: save | Esc: cancel "
            };
            Line::from(vec![
                Span::styled("> ", Style::default().fg(Color::Yellow)),
                Span::styled(edit.buffer.as_str(), Style::default().fg(Color::Yellow)),
                Span::styled("_", Style::default().fg(Color::Yellow)),
                Span::styled(label, Style::default().fg(Color::DarkGray)),
            ])
        }
        None => Line::from(Span::raw(comment.content.as_str())),
    };

    let mut meta = vec![Span::styled(
        format!("{} • {}", comment.author_name, timestamp),
        Style::default().fg(Color::DarkGray),
    )];
    if app.panel.is_busy(Control::Delete(comment.id)) {
        meta.push(Span::styled(" deleting...", Style::default().fg(Color::Red)));
    }

    ListItem::new(Text::from(vec![body, Line::from(meta), Line::from("")]))
}

fn draw_comments(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(format!(" Comments ({}) ", app.panel.comments.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if app.panel.comments.is_empty() {
        let empty = Paragraph::new("No comments yet.")
            .style(Style::default().fg(Color::Gray))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .panel
        .comments
        .iter()
        .map(|comment| comment_item(comment, app))
        .collect();

    let highlight = if app.focus == Focus::List {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    };

    let list = List::new(items).block(block).highlight_style(highlight);
    let mut state = ListState::default().with_selected(Some(app.panel.selected));

    f.render_stateful_widget(list, area, &mut state);
}

fn draw_input(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Compose;
    let busy = app.panel.is_busy(Control::Add);

    let title = if busy { " Adding... " } else { " Add " };
    let border = if focused { Color::Yellow } else { Color::Gray };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let input = if app.panel.draft.is_empty() {
        Paragraph::new("Add a comment...").style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(app.panel.draft.as_str())
    };
    f.render_widget(input.block(block), area);

    if focused {
        f.set_cursor_position((
            area.x + 1 + app.panel.draft.chars().count() as u16,
            area.y + 1,
        ));
    }
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let (mode, mode_color) = match app.focus {
        Focus::List => ("NORMAL", Color::Blue),
        Focus::Compose => ("INSERT", Color::Green),
        Focus::Edit => ("EDIT", Color::Yellow),
        Focus::TaskPrompt => ("TASK", Color::Magenta),
    };

    let hints = match app.focus {
        Focus::List => "j/k: select | a: comment | e: edit | d: delete | r: refresh | t: task | q: quit",
        Focus::Compose => "Type comment | Enter: submit | Esc: back",
        Focus::Edit => "Type to edit | Enter: save | Esc: cancel",
        Focus::TaskPrompt => "Paste task id | Enter: open | Esc: cancel",
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", mode),
            Style::default().bg(mode_color).fg(Color::White),
        ),
        Span::raw(" "),
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]));

    f.render_widget(status, area);
}

fn draw_task_prompt(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 20, f.area());

    f.render_widget(Clear, area);

    let border = if app.task_input_invalid {
        Color::Red
    } else {
        Color::Cyan
    };
    let title = if app.task_input_invalid {
        " Not a valid task id "
    } else {
        " Open task "
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let input = Paragraph::new(app.task_input.as_str()).alignment(Alignment::Left);
    let line = Rect {
        height: 1.min(inner.height),
        ..inner
    };
    f.render_widget(input, line);

    f.set_cursor_position((
        line.x + app.task_input.chars().count() as u16,
        line.y,
    ));
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
