//! Interactive board: columns side by side, keyboard drag and drop.
//!
//! All edits go through the controller's command queue. Besides its
//! controller the view keeps cursor position, the input mode, the last status
//! message and the commands that changed the board but are not yet written.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use quay_core::model::{Card, CardId, ColumnKey, TitleDraft, Urgency};
use quay_core::{BoardController, Command, Effect, Outcome};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// A card is picked up; left/right choose where to drop it.
    Dragging,
    Renaming(TitleDraft),
    Adding(String),
    ConfirmDelete(CardId),
    ConfirmRemoveColumn(ColumnKey),
    Help,
}

pub struct BoardView {
    controller: BoardController,
    column: usize,
    row: usize,
    mode: Mode,
    status: Option<String>,
    unsaved: Vec<Command>,
    quit: bool,
}

impl BoardView {
    pub fn new(controller: BoardController) -> Self {
        Self {
            controller,
            column: 0,
            row: 0,
            mode: Mode::Normal,
            status: None,
            unsaved: Vec::new(),
            quit: false,
        }
    }

    pub const fn controller(&self) -> &BoardController {
        &self.controller
    }

    pub const fn mode(&self) -> &Mode {
        &self.mode
    }

    pub const fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn has_unsaved(&self) -> bool {
        !self.unsaved.is_empty()
    }

    /// Commands that changed the board here and still have to be written,
    /// oldest first.
    pub fn unsaved(&self) -> &[Command] {
        &self.unsaved
    }

    /// Forget the oldest `count` unsaved commands once they are written.
    pub fn mark_saved(&mut self, count: usize) {
        self.unsaved.drain(..count.min(self.unsaved.len()));
    }

    /// Swap in a freshly loaded controller. Unsaved commands are applied on
    /// top of it, and the focused card and any drag in progress carry over
    /// when the card still exists.
    pub fn reload(&mut self, mut controller: BoardController) {
        let selected = self.selected_card().map(|c| c.id);
        let dragging = self.controller.dragging();
        for command in &self.unsaved {
            let _ = controller.dispatch(command.clone());
        }
        self.controller = controller;

        if let Some(id) = dragging {
            if self.controller.dispatch(Command::BeginMove { id }).is_err() {
                self.mode = Mode::Normal;
                self.status = Some(format!("#{id} was removed"));
            }
        }
        if let Some(id) = selected.or(dragging) {
            self.focus_card(id);
        }
        self.clamp();
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    fn focused_key(&self) -> Option<ColumnKey> {
        self.controller
            .board()
            .columns()
            .get(self.column)
            .map(|c| c.key.clone())
    }

    fn column_len(&self) -> usize {
        self.controller
            .board()
            .column_views()
            .view(self.column)
            .map_or(0, |v| v.len())
    }

    pub fn selected_card(&self) -> Option<&Card> {
        let key = self.controller.board().columns().get(self.column)?.key.clone();
        let id = self
            .controller
            .board()
            .cards_in(&key)
            .nth(self.row)
            .map(|c| c.id)?;
        self.controller.board().card(id)
    }

    fn clamp(&mut self) {
        let columns = self.controller.board().columns().len();
        self.column = self.column.min(columns.saturating_sub(1));
        self.row = self.row.min(self.column_len().saturating_sub(1));
    }

    fn focus_card(&mut self, id: CardId) {
        let board = self.controller.board();
        let Some(card) = board.card(id) else {
            return;
        };
        if let Some(index) = board.column_index(&card.status) {
            self.column = index;
            self.row = board
                .cards_in(&card.status)
                .position(|c| c.id == id)
                .unwrap_or(0);
        }
    }

    /// Queue `command`, drain the queue, and report the result. Commands
    /// that change the board are kept until written.
    fn run(&mut self, command: Command) {
        let dragged = self.controller.dragging();
        self.controller.submit(command.clone());
        for result in self.controller.process_pending() {
            match result {
                Ok(Outcome::Changed(effect)) => {
                    self.record(command.clone(), dragged);
                    self.status = Some(describe(&effect));
                    if let Effect::CardMoved { id, .. } = effect {
                        self.focus_card(id);
                    }
                }
                Ok(Outcome::Unchanged) => {}
                Err(err) => self.status = Some(format!("{} ({})", err, err.code())),
            }
        }
        self.clamp();
    }

    /// A drop is replayed as its own pick-up followed by the commit.
    fn record(&mut self, command: Command, dragged: Option<CardId>) {
        if let (Command::CommitMove { .. }, Some(id)) = (&command, dragged) {
            self.unsaved.push(Command::BeginMove { id });
        }
        self.unsaved.push(command);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            if self.mode == Mode::Dragging {
                self.run(Command::CancelMove);
            }
            self.quit = true;
            return;
        }
        match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Dragging => self.handle_drag_key(key),
            Mode::Renaming(draft) => self.handle_rename_key(draft, key),
            Mode::Adding(buffer) => self.handle_add_key(buffer, key),
            Mode::ConfirmDelete(id) => {
                if matches!(key.code, KeyCode::Char('y' | 'Y')) {
                    self.run(Command::DeleteCard { id });
                } else {
                    self.status = Some("Delete cancelled".into());
                }
            }
            Mode::ConfirmRemoveColumn(key_to_remove) => {
                if matches!(key.code, KeyCode::Char('y' | 'Y')) {
                    self.run(Command::RemoveColumn { key: key_to_remove });
                } else {
                    self.status = Some("Remove cancelled".into());
                }
            }
            Mode::Help => {
                if !matches!(key.code, KeyCode::Esc | KeyCode::Char('?' | 'q')) {
                    self.mode = Mode::Help;
                }
            }
        }
    }

    fn move_column(&mut self, delta: isize) {
        let columns = self.controller.board().columns().len();
        if columns == 0 {
            return;
        }
        self.column = self.column.saturating_add_signed(delta).min(columns - 1);
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('h') | KeyCode::Left => {
                self.move_column(-1);
                self.row = 0;
            }
            KeyCode::Char('l') | KeyCode::Right => {
                self.move_column(1);
                self.row = 0;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.row = (self.row + 1).min(self.column_len().saturating_sub(1));
            }
            KeyCode::Char('k') | KeyCode::Up => self.row = self.row.saturating_sub(1),
            KeyCode::Char(' ' | 'm') => {
                if let Some(id) = self.selected_card().map(|c| c.id) {
                    self.run(Command::BeginMove { id });
                    if self.controller.dragging() == Some(id) {
                        self.mode = Mode::Dragging;
                        self.status = Some(format!("Moving #{id}: ←/→ pick a column, Enter drops"));
                    }
                }
            }
            KeyCode::Char('a') => {
                if let Some(id) = self.selected_card().map(|c| c.id) {
                    self.run(Command::AdvanceCard { id });
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_card().map(|c| c.id) {
                    self.mode = Mode::ConfirmDelete(id);
                }
            }
            KeyCode::Char('r') => {
                if let Some(column) = self.controller.board().columns().get(self.column) {
                    self.mode = Mode::Renaming(TitleDraft::begin(column));
                }
            }
            KeyCode::Char('n') => self.mode = Mode::Adding(String::new()),
            KeyCode::Char('X') => {
                if let Some(key) = self.focused_key() {
                    self.mode = Mode::ConfirmRemoveColumn(key);
                }
            }
            KeyCode::Char('?') => self.mode = Mode::Help,
            _ => {}
        }
    }

    fn handle_drag_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('h') | KeyCode::Left => self.move_column(-1),
            KeyCode::Char('l') | KeyCode::Right => self.move_column(1),
            KeyCode::Enter | KeyCode::Char(' ' | 'm') => {
                if let Some(target) = self.focused_key() {
                    let dragged = self.controller.dragging();
                    self.run(Command::CommitMove { target });
                    if let Some(id) = dragged {
                        self.focus_card(id);
                    }
                }
                return;
            }
            KeyCode::Esc => {
                let dragged = self.controller.dragging();
                self.run(Command::CancelMove);
                if let Some(id) = dragged {
                    self.focus_card(id);
                }
                self.status = Some("Move cancelled".into());
                return;
            }
            _ => {}
        }
        self.mode = Mode::Dragging;
    }

    fn handle_rename_key(&mut self, mut draft: TitleDraft, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if let Some((key, title)) = draft.commit() {
                    self.run(Command::RenameColumn { key, title });
                }
            }
            KeyCode::Esc => {
                let _ = draft.cancel();
            }
            KeyCode::Backspace => {
                draft.pop();
                self.mode = Mode::Renaming(draft);
            }
            KeyCode::Char(ch) => {
                draft.push(ch);
                self.mode = Mode::Renaming(draft);
            }
            _ => self.mode = Mode::Renaming(draft),
        }
    }

    fn handle_add_key(&mut self, mut buffer: String, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if !buffer.trim().is_empty() {
                    self.run(Command::AddColumn { title: buffer });
                }
            }
            KeyCode::Esc => {}
            KeyCode::Backspace => {
                buffer.pop();
                self.mode = Mode::Adding(buffer);
            }
            KeyCode::Char(ch) => {
                buffer.push(ch);
                self.mode = Mode::Adding(buffer);
            }
            _ => self.mode = Mode::Adding(buffer),
        }
    }

    pub fn render(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(area);
        self.render_columns(frame, chunks[0]);
        frame.render_widget(Paragraph::new(self.status_line()), chunks[1]);

        match &self.mode {
            Mode::Renaming(draft) => {
                render_prompt(frame, area, " Rename column ", draft.buffer());
            }
            Mode::Adding(buffer) => render_prompt(frame, area, " New column ", buffer),
            Mode::ConfirmDelete(id) => {
                render_prompt(frame, area, " Delete card ", &format!("Delete #{id}? [y/N]"));
            }
            Mode::ConfirmRemoveColumn(key) => {
                render_prompt(frame, area, " Remove column ", &format!("Remove {key}? [y/N]"));
            }
            Mode::Help => render_help(frame, area),
            Mode::Normal | Mode::Dragging => {}
        }
    }

    fn render_columns(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let board = self.controller.board();
        let views = board.column_views();
        let count = board.columns().len();
        if count == 0 {
            frame.render_widget(
                Paragraph::new("No columns. Press n to add one.")
                    .block(Block::default().borders(Borders::ALL)),
                area,
            );
            return;
        }
        let constraints: Vec<Constraint> = (0..count)
            .map(|_| Constraint::Ratio(1, u32::try_from(count).unwrap_or(u32::MAX)))
            .collect();
        let areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        let dragging = self.controller.dragging();
        for (index, view) in views.views().enumerate() {
            let focused = index == self.column;
            let border_color = match (focused, self.mode == Mode::Dragging) {
                (true, true) => Color::Yellow,
                (true, false) => Color::Green,
                _ => Color::DarkGray,
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .border_set(border::ROUNDED)
                .border_style(Style::default().fg(border_color))
                .title(format!(" {} ({}) ", view.column.title, view.len()));

            let items: Vec<ListItem<'_>> = view
                .cards()
                .map(|card| card_item(card, dragging == Some(card.id)))
                .collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
            let mut state = ListState::default();
            if focused && self.mode != Mode::Dragging && !view.is_empty() {
                state.select(Some(self.row));
            }
            frame.render_stateful_widget(list, areas[index], &mut state);
        }
    }

    fn status_line(&self) -> Line<'static> {
        let orphans = self.controller.board().orphaned_cards().count();
        let mut spans = vec![Span::styled(
            match self.mode {
                Mode::Dragging => " MOVE ",
                _ => " quay ",
            },
            Style::default().fg(Color::Black).bg(Color::Cyan),
        )];
        if orphans > 0 {
            spans.push(Span::styled(
                format!(" {orphans} orphaned "),
                Style::default().fg(Color::Red),
            ));
        }
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            self.status().unwrap_or("? for help").to_string(),
            Style::default().fg(Color::Gray),
        ));
        Line::from(spans)
    }
}

fn describe(effect: &Effect) -> String {
    match effect {
        Effect::ColumnAdded { key } => format!("Added column {key}"),
        Effect::ColumnRetitled { key, title } => format!("{key} is now \"{title}\""),
        Effect::ColumnRemoved { key } => format!("Removed column {key}"),
        Effect::CardCreated { id } => format!("Created #{id}"),
        Effect::CardUpdated { id } => format!("Updated #{id}"),
        Effect::CardDeleted { id } => format!("Deleted #{id}"),
        Effect::CardMoved { id, from, to } => format!("#{id}: {from} → {to}"),
        Effect::CommentAdded { id } => format!("Commented on #{id}"),
        Effect::AttachmentAdded { id } => format!("Attached to #{id}"),
    }
}

const fn urgency_color(urgency: Urgency) -> Color {
    match urgency {
        Urgency::Critical => Color::Red,
        Urgency::High => Color::Yellow,
        Urgency::Normal => Color::White,
        Urgency::Low => Color::DarkGray,
    }
}

fn card_item(card: &Card, dragged: bool) -> ListItem<'static> {
    let marker = if dragged { "⇄ " } else { "" };
    ListItem::new(vec![
        Line::from(vec![
            Span::styled(
                format!("{marker}#{} ", card.id),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(
                card.client.clone(),
                Style::default()
                    .fg(urgency_color(card.urgency))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            format!("  {}", card.service),
            Style::default().fg(Color::Gray),
        )),
    ])
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + area.width.saturating_sub(w) / 2,
        area.y + area.height.saturating_sub(h) / 2,
        w,
        h,
    )
}

fn render_prompt(frame: &mut ratatui::Frame<'_>, area: Rect, title: &str, text: &str) {
    let popup = centered(area, 48, 3);
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(format!("{text}▏")).block(
            Block::default()
                .borders(Borders::ALL)
                .border_set(border::ROUNDED)
                .border_style(Style::default().fg(Color::Green))
                .title(title.to_string()),
        ),
        popup,
    );
}

fn help_hotkeys() -> [(&'static str, &'static str); 12] {
    [
        ("h/l ←/→", "focus column"),
        ("j/k ↓/↑", "select card"),
        ("space/m", "pick up card, then drop with Enter"),
        ("esc", "cancel a move"),
        ("a", "advance card to next stage"),
        ("d", "delete card"),
        ("r", "rename column"),
        ("n", "new column"),
        ("X", "remove empty column"),
        ("?", "toggle help"),
        ("q", "quit"),
        ("ctrl+c", "quit"),
    ]
}

fn render_help(frame: &mut ratatui::Frame<'_>, area: Rect) {
    let hotkeys = help_hotkeys();
    let popup = centered(area, 56, u16::try_from(hotkeys.len()).unwrap_or(12) + 2);
    frame.render_widget(Clear, popup);
    let lines: Vec<Line<'static>> = hotkeys
        .into_iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!("{key:10}"), Style::default().fg(Color::Cyan)),
                Span::raw(desc),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_set(border::ROUNDED)
                .title(" Hotkeys "),
        ),
        popup,
    );
}
