use chrono::{Local, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{relative_date, App, DetailState, View};

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // List or article
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    match app.view {
        View::List => render_article_list(frame, app, chunks[1]),
        View::Detail => render_article(frame, app, chunks[1]),
    }
    render_status(frame, app, chunks[2]);

    if app.show_help {
        render_help(frame);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let stats = format!(" {} Articles | {}", app.articles.len(), app.api_url());

    let block = Block::default()
        .title(" Auto Generated Blog ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = Paragraph::new(stats).style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, inner);
}

fn render_article_list(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().title(" Articles ").borders(Borders::ALL);

    if app.articles.is_empty() {
        let message = if app.is_refreshing {
            "Loading articles…"
        } else if let Some(error) = &app.error {
            error.as_str()
        } else {
            "No articles yet. Please check back later."
        };
        let paragraph = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
    }

    let now = Utc::now();
    let items: Vec<ListItem> = app
        .articles
        .iter()
        .map(|article| {
            let line = Line::from(vec![
                Span::styled(&article.title, Style::default().fg(Color::White)),
                Span::styled(
                    format!("  ({})", relative_date(article.created_at, now)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(Some(app.selected_index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_article(frame: &mut Frame, app: &App, area: Rect) {
    let article = match &app.detail {
        DetailState::Loaded(article) => article,
        DetailState::Loading => {
            let paragraph = Paragraph::new("Loading…")
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(paragraph, area);
            return;
        }
        DetailState::NotFound => {
            let paragraph = Paragraph::new("Article not found\n\nEsc: back to list")
                .block(Block::default().borders(Borders::ALL))
                .style(Style::default().fg(Color::Red));
            frame.render_widget(paragraph, area);
            return;
        }
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(1), // Timestamp
            Constraint::Min(0),    // Body
        ])
        .split(area);

    let title_block = Block::default()
        .title(" Article ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    let title = Paragraph::new(article.title.as_str())
        .block(title_block)
        .style(Style::default().add_modifier(Modifier::BOLD))
        .wrap(Wrap { trim: true });
    frame.render_widget(title, chunks[0]);

    let published = article
        .created_at
        .with_timezone(&Local)
        .format("Published %Y-%m-%d %H:%M:%S")
        .to_string();
    frame.render_widget(
        Paragraph::new(published).style(Style::default().fg(Color::DarkGray)),
        chunks[1],
    );

    let body = Paragraph::new(article.content.as_str())
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0));
    frame.render_widget(body, chunks[2]);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let status = if app.is_refreshing {
        format!("{} Refreshing...", app.spinner())
    } else {
        match app.view {
            View::List => "j/k:nav  enter:open  r:refresh  ?:help  q:quit".to_string(),
            View::Detail => "j/k:scroll  esc:back  r:refresh  ?:help  q:quit".to_string(),
        }
    };

    let paragraph = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 60, frame.area());

    let help_text = [
        "",
        " Article list:",
        "   j / ↓    Move down",
        "   k / ↑    Move up",
        "   < / >    First / last article",
        "   Enter    Read article",
        "",
        " Article:",
        "   j / k    Scroll",
        "   Esc      Back to list",
        "",
        " General:",
        "   r        Refresh articles",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
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
