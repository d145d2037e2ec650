use std::{cmp, collections::HashMap, io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use recipebox_core::{
    card::{render, CardView},
    models::Recipe,
    store::RecipeStore,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_FIELD_LEN: usize = 256;

/// Lines one card occupies in the browse list, separator included.
const CARD_HEIGHT: usize = 7;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    rating: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            rating: Color::Yellow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Browse,
    Add,
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// One editable form field, named after the record field it feeds.
#[derive(Debug, Clone)]
struct FieldInput {
    name: &'static str,
    label: &'static str,
    required: bool,
    value: String,
    cursor: usize,
}

impl FieldInput {
    fn new(name: &'static str, label: &'static str, required: bool) -> Self {
        Self {
            name,
            label,
            required,
            value: String::new(),
            cursor: 0,
        }
    }

    fn insert(&mut self, ch: char) {
        if self.value.len() >= MAX_FIELD_LEN {
            return;
        }
        if ch.is_ascii() && !ch.is_ascii_control() {
            self.value.insert(self.cursor, ch);
            self.cursor += ch.len_utf8();
        }
    }

    fn backspace(&mut self) {
        if self.cursor > 0 && self.cursor <= self.value.len() {
            self.cursor -= 1;
            self.value.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.value.len() {
            self.value.remove(self.cursor);
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.value.len() as isize;
        let mut next = self.cursor as isize + delta;
        if next < 0 {
            next = 0;
        } else if next > len {
            next = len;
        }
        self.cursor = next as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.value.len();
    }

    fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

/// The add-recipe form. Field names are exactly the record field names, so
/// submission is a straight name-to-field mapping with no renaming step.
#[derive(Debug, Clone)]
struct RecipeForm {
    fields: Vec<FieldInput>,
    focus: usize,
}

impl RecipeForm {
    fn new() -> Self {
        let fields = vec![
            FieldInput::new("imgSrc", "Image", true),
            FieldInput::new("imgAlt", "Image alt text", true),
            FieldInput::new("titleLnk", "Title link", true),
            FieldInput::new("titleTxt", "Title", true),
            FieldInput::new("organization", "Organization", true),
            FieldInput::new("rating", "Rating (0-5)", true),
            FieldInput::new("numRatings", "Number of ratings", true),
            FieldInput::new("lengthTime", "Time", true),
            FieldInput::new("ingredients", "Ingredients", true),
        ];
        Self { fields, focus: 0 }
    }

    fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    fn focus_prev(&mut self) {
        if self.focus == 0 {
            self.focus = self.fields.len() - 1;
        } else {
            self.focus -= 1;
        }
    }

    fn active_field_mut(&mut self) -> &mut FieldInput {
        let focus = self.focus.min(self.fields.len() - 1);
        &mut self.fields[focus]
    }

    /// First required field that is still empty, if any.
    fn missing_required(&self) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|field| field.required && field.value.trim().is_empty())
            .map(|field| field.label)
    }

    /// Submitted field set, keyed by record field name.
    fn values(&self) -> HashMap<String, String> {
        self.fields
            .iter()
            .map(|field| (field.name.to_string(), field.value.clone()))
            .collect()
    }

    fn reset(&mut self) {
        for field in &mut self.fields {
            field.clear();
        }
        self.focus = 0;
    }
}

/// High-level application state for the recipe box TUI.
pub struct RecipeBoxApp {
    store: RecipeStore,
    recipes: Vec<Recipe>,
    state: UiState,
    screen: Screen,
    form: RecipeForm,
    theme: Theme,
}

impl RecipeBoxApp {
    pub fn new(store: RecipeStore) -> Self {
        Self {
            store,
            recipes: Vec::new(),
            state: UiState::default(),
            screen: Screen::Browse,
            form: RecipeForm::new(),
            theme: Theme::default(),
        }
    }

    /// Load the stored collection and prime the view. Runs once per process.
    fn initialize(&mut self) -> Result<()> {
        self.recipes = self.store.load()?;
        info!("Loaded {} recipes from store", self.recipes.len());
        self.state
            .set_status(format!("Loaded {} recipes", self.recipes.len()));
        Ok(())
    }

    /// Cards for every recipe in collection order, one card per record.
    fn card_views(&self) -> Vec<CardView> {
        self.recipes.iter().map(render).collect()
    }

    /// Handle a form submission: map the field set through the schema,
    /// append the record, persist the whole collection, reset the form.
    fn submit_form(&mut self) -> bool {
        if let Some(label) = self.form.missing_required() {
            self.state.set_status(format!("{label} is required"));
            return false;
        }

        let recipe = Recipe::from_fields(&self.form.values());
        let title = recipe.title_txt.clone();
        self.recipes.push(recipe);

        match self.store.save(&self.recipes) {
            Ok(()) => {
                debug!("Saved {} recipes", self.recipes.len());
                self.state.set_status(format!(
                    "Added \"{title}\" at {}",
                    Local::now().format("%H:%M")
                ));
            }
            Err(err) => {
                error!("Failed to persist collection: {err}");
                self.state.set_status(format!("Save failed: {err}"));
            }
        }

        self.form.reset();
        self.state.move_cursor_to_end(self.recipes.len());
        true
    }

    /// Erase the stored collection and every rendered card.
    fn clear_recipes(&mut self) {
        match self.store.clear() {
            Ok(()) => {
                self.recipes.clear();
                self.state.reset_cursor();
                info!("Cleared recipe store");
                self.state.set_status("Cleared all recipes".to_string());
            }
            Err(err) => {
                error!("Failed to clear store: {err}");
                self.state.set_status(format!("Clear failed: {err}"));
            }
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.initialize()?;

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let result = loop {
            if let Err(err) = terminal.draw(|frame| self.draw(frame)) {
                break Err(err.into());
            }
            if self.state.should_quit {
                break Ok(());
            }
            match event_rx.recv().await {
                Some(AppEvent::Input(Event::Key(key))) => {
                    if let Err(err) = self.handle_key(key) {
                        break Err(err);
                    }
                }
                Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => {}
                None => break Ok(()),
            }
        };

        restore_terminal(&mut terminal)?;
        result
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return Ok(());
        }
        match self.screen {
            Screen::Browse => self.handle_browse_key(key),
            Screen::Add => self.handle_add_key(key),
        }
        Ok(())
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.state.should_quit = true,
            KeyCode::Char('a') => {
                self.screen = Screen::Add;
                self.state
                    .set_status("Add a recipe • Enter submits, Esc cancels".to_string());
            }
            KeyCode::Char('x') => self.clear_recipes(),
            KeyCode::Up | KeyCode::Char('k') => self.state.move_cursor(-1, self.recipes.len()),
            KeyCode::Down | KeyCode::Char('j') => self.state.move_cursor(1, self.recipes.len()),
            KeyCode::PageUp => self.state.page(-1, self.recipes.len()),
            KeyCode::PageDown => self.state.page(1, self.recipes.len()),
            KeyCode::Home => self.state.reset_cursor(),
            KeyCode::End => self.state.move_cursor_to_end(self.recipes.len()),
            _ => {}
        }
    }

    fn handle_add_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.screen = Screen::Browse;
                self.state.set_status("Add cancelled".to_string());
            }
            KeyCode::Enter => {
                if self.submit_form() {
                    self.screen = Screen::Browse;
                }
            }
            KeyCode::Tab | KeyCode::Down => self.form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.form.focus_prev(),
            KeyCode::Left => self.form.active_field_mut().move_cursor(-1),
            KeyCode::Right => self.form.active_field_mut().move_cursor(1),
            KeyCode::Home => self.form.active_field_mut().move_home(),
            KeyCode::End => self.form.active_field_mut().move_end(),
            KeyCode::Backspace => self.form.active_field_mut().backspace(),
            KeyCode::Delete => self.form.active_field_mut().delete(),
            KeyCode::Char(ch) => self.form.active_field_mut().insert(ch),
            _ => {}
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Browse => self.draw_browse(frame),
            Screen::Add => self.draw_add(frame),
        }
    }

    fn draw_browse(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);
        let list_area = chunks[0];
        let status_area = chunks[1];

        let inner_height = list_area.height.saturating_sub(2) as usize;
        let visible = (inner_height / CARD_HEIGHT).max(1);
        self.state.list_height = visible;
        self.state.clamp_cursor(self.recipes.len());

        let cards = self.card_views();
        let mut lines: Vec<Line> = Vec::new();
        if cards.is_empty() {
            lines.push(Line::from(Span::styled(
                "  No recipes yet. Press 'a' to add one.",
                Style::default().fg(self.theme.muted),
            )));
        } else {
            let end = cmp::min(self.state.offset + visible, cards.len());
            for (idx, card) in cards[self.state.offset..end].iter().enumerate() {
                let absolute_idx = self.state.offset + idx;
                let selected = absolute_idx == self.state.cursor;
                lines.extend(self.card_lines(card, selected));
            }
        }

        let title = format!("Recipes ({})", cards.len());
        let list = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false });
        frame.render_widget(list, list_area);
        self.render_status(frame, status_area, "a add • x clear all • q quit");
    }

    fn card_lines(&self, card: &CardView, selected: bool) -> Vec<Line<'static>> {
        let marker = if selected {
            Span::styled("▶ ", Style::default().fg(self.theme.accent))
        } else {
            Span::raw("  ")
        };
        let title_style = Style::default()
            .fg(self.theme.accent)
            .add_modifier(Modifier::BOLD);
        let muted = Style::default().fg(self.theme.muted);
        let body = Style::default().fg(self.theme.primary_fg);

        vec![
            Line::from(vec![
                marker,
                Span::styled(card.title_text.clone(), title_style),
                Span::styled(format!("  → {}", card.title_link), muted),
            ]),
            Line::from(Span::styled(format!("  {}", card.organization), body)),
            Line::from(vec![
                Span::styled(format!("  {} ", card.rating), body),
                Span::styled(card.star_glyphs(), Style::default().fg(self.theme.rating)),
                Span::styled(format!(" {}", card.rating_count), muted),
            ]),
            Line::from(Span::styled(format!("  {}", card.duration), muted)),
            Line::from(Span::styled(format!("  {}", card.ingredients), body)),
            Line::from(Span::styled(
                format!("  img: {} ({})", card.image_src, card.image_alt),
                muted,
            )),
            Line::from(""),
        ]
    }

    fn draw_add(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);
        let form_area = chunks[0];
        let status_area = chunks[1];

        let mut lines: Vec<Line> = Vec::new();
        for (idx, field) in self.form.fields.iter().enumerate() {
            let focused = idx == self.form.focus;
            let marker = if focused {
                Span::styled("▶ ", Style::default().fg(self.theme.accent))
            } else {
                Span::raw("  ")
            };
            let label_style = if focused {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.primary_fg)
            };
            let mut spans = vec![
                marker,
                Span::styled(format!("{:<18}", field.label), label_style),
            ];
            if focused {
                let (before, after) = field.value.split_at(field.cursor.min(field.value.len()));
                spans.push(Span::raw(before.to_string()));
                spans.push(Span::styled(
                    "█",
                    Style::default().fg(self.theme.accent),
                ));
                spans.push(Span::raw(after.to_string()));
            } else {
                spans.push(Span::raw(field.value.clone()));
            }
            lines.push(Line::from(spans));
            lines.push(Line::from(""));
        }

        let form = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Add Recipe"))
            .wrap(Wrap { trim: false });
        frame.render_widget(form, form_area);
        self.render_status(
            frame,
            status_area,
            "Tab next field • Enter submit • Esc cancel",
        );
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, hints: &str) {
        let line = Line::from(vec![
            Span::styled(
                self.state.status.clone(),
                Style::default().fg(self.theme.primary_fg),
            ),
            Span::styled(format!("  •  {hints}"), Style::default().fg(self.theme.muted)),
        ]);
        let status = Paragraph::new(line)
            .alignment(Alignment::Left)
            .block(Block::default().borders(Borders::ALL).title("Status"));
        frame.render_widget(status, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[derive(Debug)]
struct UiState {
    cursor: usize,
    offset: usize,
    list_height: usize,
    status: String,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            cursor: 0,
            offset: 0,
            list_height: 1,
            status: "Ready".to_string(),
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn move_cursor(&mut self, delta: isize, total: usize) {
        if total == 0 {
            self.reset_cursor();
            return;
        }
        let len = total as isize;
        let mut idx = self.cursor as isize + delta;
        if idx < 0 {
            idx = 0;
        } else if idx >= len {
            idx = len - 1;
        }
        self.cursor = idx as usize;
        self.ensure_cursor_visible(total);
    }

    fn page(&mut self, direction: isize, total: usize) {
        if total == 0 || self.list_height == 0 {
            return;
        }
        let delta = self.list_height.min(total) as isize * direction;
        self.move_cursor(delta, total);
    }

    fn move_cursor_to_end(&mut self, total: usize) {
        if total == 0 {
            self.reset_cursor();
            return;
        }
        self.cursor = total - 1;
        self.ensure_cursor_visible(total);
    }

    fn reset_cursor(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    fn clamp_cursor(&mut self, total: usize) {
        if total == 0 {
            self.reset_cursor();
        } else if self.cursor >= total {
            self.cursor = total - 1;
        }
        self.ensure_cursor_visible(total);
    }

    fn ensure_cursor_visible(&mut self, total: usize) {
        if total == 0 || self.list_height == 0 {
            self.offset = 0;
            return;
        }
        let height = self.list_height;
        let max_offset = total.saturating_sub(height);

        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }

        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn app_with_tempdir() -> (RecipeBoxApp, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let app = RecipeBoxApp::new(RecipeStore::new(dir.path()));
        (app, dir)
    }

    fn fill_form(app: &mut RecipeBoxApp, title: &str) {
        let values = [
            ("imgSrc", "a.jpg"),
            ("imgAlt", "alt"),
            ("titleLnk", "http://x"),
            ("titleTxt", title),
            ("organization", "Chef"),
            ("rating", "4"),
            ("numRatings", "10"),
            ("lengthTime", "PT30M"),
            ("ingredients", "carrot, salt"),
        ];
        for field in &mut app.form.fields {
            let (_, value) = values
                .iter()
                .find(|(name, _)| *name == field.name)
                .expect("form field outside schema");
            field.value = value.to_string();
        }
    }

    #[test]
    fn initialize_renders_one_card_per_stored_record_in_order() {
        let (mut app, dir) = app_with_tempdir();
        let seed = RecipeStore::new(dir.path());
        let mut fields = HashMap::new();
        fields.insert("titleTxt".to_string(), "Soup".to_string());
        let first = Recipe::from_fields(&fields);
        fields.insert("titleTxt".to_string(), "Stew".to_string());
        let second = Recipe::from_fields(&fields);
        seed.save(&[first, second]).unwrap();

        app.initialize().unwrap();

        let cards = app.card_views();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].title_text, "Soup");
        assert_eq!(cards[1].title_text, "Stew");
    }

    #[test]
    fn submit_appends_exactly_one_matching_record() {
        let (mut app, _dir) = app_with_tempdir();
        app.initialize().unwrap();
        fill_form(&mut app, "Soup");

        assert!(app.submit_form());

        assert_eq!(app.recipes.len(), 1);
        let recipe = app.recipes.last().unwrap();
        assert_eq!(recipe.img_src, "a.jpg");
        assert_eq!(recipe.title_txt, "Soup");
        assert_eq!(recipe.rating, 4);
        assert_eq!(recipe.num_ratings, 10);

        // The whole collection was persisted.
        assert_eq!(app.store.load().unwrap(), app.recipes);

        // Exactly one new card, with the contract's derived values.
        let cards = app.card_views();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title_text, "Soup");
        assert_eq!(cards[0].star_icon, "4-star");
        assert_eq!(cards[0].rating_count, "(10)");

        // The form was reset for the next entry.
        assert!(app.form.fields.iter().all(|field| field.value.is_empty()));
        assert_eq!(app.form.focus, 0);
    }

    #[test]
    fn submit_refuses_a_missing_required_field() {
        let (mut app, _dir) = app_with_tempdir();
        app.initialize().unwrap();
        fill_form(&mut app, "Soup");
        app.form.fields[3].value.clear(); // titleTxt

        assert!(!app.submit_form());
        assert!(app.recipes.is_empty());
        assert_eq!(app.store.load().unwrap(), Vec::new());
    }

    #[test]
    fn two_submits_then_clear_leaves_nothing() {
        let (mut app, _dir) = app_with_tempdir();
        app.initialize().unwrap();

        fill_form(&mut app, "Soup");
        assert!(app.submit_form());
        fill_form(&mut app, "Stew");
        assert!(app.submit_form());
        assert_eq!(app.card_views().len(), 2);

        app.clear_recipes();

        assert!(app.card_views().is_empty());
        assert_eq!(app.store.load().unwrap(), Vec::new());
    }

    #[test]
    fn form_field_names_match_the_record_schema() {
        let form = RecipeForm::new();
        let names: Vec<&str> = form.fields.iter().map(|field| field.name).collect();
        assert_eq!(names, recipebox_core::models::FIELD_NAMES);
    }

    #[test]
    fn field_editing_keeps_the_cursor_in_bounds() {
        let mut field = FieldInput::new("titleTxt", "Title", true);
        for ch in "Soup".chars() {
            field.insert(ch);
        }
        assert_eq!(field.value, "Soup");

        field.move_home();
        field.delete();
        assert_eq!(field.value, "oup");

        field.move_end();
        field.backspace();
        assert_eq!(field.value, "ou");

        field.move_cursor(-10);
        assert_eq!(field.cursor, 0);
        field.move_cursor(10);
        assert_eq!(field.cursor, field.value.len());
    }
}
