//! Rendering - draws the session snapshot with ratatui.

use bookit_default::{
  Selection,
  ShortcutState,
};
use bookit_lib::{
  Bookmark,
  CategoryId,
};
use bookit_runtime::SessionSnapshot;
use eyre::Result;
use ratatui::{
  Frame,
  layout::{
    Constraint,
    Layout,
    Rect,
  },
  style::{
    Color,
    Modifier,
    Style,
  },
  text::{
    Line,
    Span,
  },
  widgets::{
    Block,
    Borders,
    Clear,
    List,
    ListItem,
    ListState,
    Paragraph,
  },
};

use crate::{
  app::Focus,
  terminal::Terminal,
};

const BAR_WIDTH: u16 = 60;
const HELP: &str = "type a shortcut · C-n/C-p select · C-j/C-k move · C-f search · C-s starred · C-t category · C-c quit";

/// What the surface needs besides the session snapshot.
pub struct Chrome<'a> {
  pub cursor: usize,
  pub focus:  Focus,
  pub status: Option<&'a str>,
}

pub fn render(snapshot: &SessionSnapshot, chrome: &Chrome<'_>, terminal: &mut Terminal) -> Result<()> {
  terminal.draw(|frame| draw(frame, snapshot, chrome))
}

fn draw(frame: &mut Frame<'_>, snapshot: &SessionSnapshot, chrome: &Chrome<'_>) {
  let [header, body, footer] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(1),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  frame.render_widget(Paragraph::new(header_line(snapshot, chrome.focus)), header);
  draw_list(frame, body, snapshot, chrome.cursor);

  let footer_text = chrome.status.unwrap_or(HELP);
  frame.render_widget(
    Paragraph::new(footer_text).style(Style::default().fg(Color::DarkGray)),
    footer,
  );

  if snapshot.shortcut.is_open {
    draw_command_bar(frame, body, &snapshot.shortcut);
  }
}

fn category_name(snapshot: &SessionSnapshot, id: CategoryId) -> &str {
  snapshot
    .categories
    .iter()
    .find(|category| category.id == id)
    .map_or("?", |category| category.name.as_str())
}

fn header_line<'a>(snapshot: &'a SessionSnapshot, focus: Focus) -> Line<'a> {
  let scope = match snapshot.view.selected_category {
    Some(id) => category_name(snapshot, id),
    None => "All bookmarks",
  };
  let mut spans = vec![Span::styled(scope, Style::default().add_modifier(Modifier::BOLD))];
  if snapshot.view.starred_only {
    spans.push(Span::styled("  ★ starred", Style::default().fg(Color::Yellow)));
  }
  if focus == Focus::Search || !snapshot.view.search.is_empty() {
    let cursor = if focus == Focus::Search { "▏" } else { "" };
    spans.push(Span::raw(format!("  search: {}{cursor}", snapshot.view.search)));
  }
  if snapshot.in_flight > 0 {
    spans.push(Span::styled("  saving…", Style::default().fg(Color::DarkGray)));
  }
  Line::from(spans)
}

fn shortcut_label(bookmark: &Bookmark) -> String {
  bookmark.shortcut_key().unwrap_or_default()
}

fn draw_list(frame: &mut Frame<'_>, area: Rect, snapshot: &SessionSnapshot, cursor: usize) {
  let items: Vec<ListItem> = snapshot
    .visible
    .iter()
    .map(|bookmark| {
      let star = if bookmark.starred { "★ " } else { "  " };
      ListItem::new(Line::from(vec![
        Span::styled(star, Style::default().fg(Color::Yellow)),
        Span::styled(
          format!("{:<8}", shortcut_label(bookmark)),
          Style::default().fg(Color::Cyan),
        ),
        Span::raw(bookmark.name.clone()),
        Span::styled(format!("  {}", bookmark.url), Style::default().fg(Color::DarkGray)),
      ]))
    })
    .collect();

  let empty = items.is_empty();
  let list = List::new(items)
    .block(Block::default().borders(Borders::TOP))
    .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
  let mut state = ListState::default().with_selected((!empty).then_some(cursor));
  frame.render_stateful_widget(list, area, &mut state);
}

fn command_bar_lines(state: &ShortcutState) -> Vec<Line<'_>> {
  if let Some(bookmark) = &state.activated {
    return vec![Line::from(Span::styled(
      format!("Opening {}…", bookmark.name),
      Style::default().fg(Color::Green),
    ))];
  }

  let highlight = Style::default().add_modifier(Modifier::REVERSED);
  let mut lines = vec![Line::from(vec![
    Span::styled("› ", Style::default().fg(Color::DarkGray)),
    Span::styled(state.sequence.as_str(), Style::default().add_modifier(Modifier::BOLD)),
  ])];

  if let Some(exact) = &state.exact_match {
    let mut spans = vec![
      Span::styled(format!("{:<8}", shortcut_label(exact)), Style::default().fg(Color::Cyan)),
      Span::raw(exact.name.clone()),
    ];
    if state.exact_slot_selectable() {
      spans.push(Span::styled("  enter", Style::default().fg(Color::DarkGray)));
    }
    let line = Line::from(spans);
    lines.push(if state.selected == Selection::Exact && state.exact_slot_selectable() {
      line.style(highlight)
    } else {
      line
    });
  }

  for (index, bookmark) in state.potential_matches.iter().enumerate() {
    let line = Line::from(vec![
      Span::styled(format!("{:<8}", shortcut_label(bookmark)), Style::default().fg(Color::Cyan)),
      Span::raw(bookmark.name.clone()),
    ]);
    lines.push(if state.selected == Selection::Index(index) {
      line.style(highlight)
    } else {
      line
    });
  }

  if state.exact_match.is_none() && state.potential_matches.is_empty() {
    lines.push(Line::from(Span::styled(
      "No matching shortcut",
      Style::default().fg(Color::DarkGray),
    )));
  }
  lines
}

fn draw_command_bar(frame: &mut Frame<'_>, area: Rect, state: &ShortcutState) {
  let lines = command_bar_lines(state);
  let width = BAR_WIDTH.min(area.width);
  let height = (lines.len() as u16 + 2).min(area.height);
  let popup = Rect {
    x: area.x + (area.width - width) / 2,
    y: area.y + area.height.saturating_sub(height) / 3,
    width,
    height,
  };

  frame.render_widget(Clear, popup);
  frame.render_widget(
    Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Shortcut ")),
    popup,
  );
}
