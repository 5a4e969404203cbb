//! Application state management for metforecast
//!
//! This module contains the navigation state machine: which screen is
//! active, how input events change the search query, selections and
//! resolution, and how fetch results complete the transitions that needed
//! them.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, error, info, warn};

use crate::data::{LocationRow, NormalizedForecast, Resolution};
use crate::fetch::{FetchOutcome, FetchRequest};
use crate::location_index::LocationIndex;
use crate::site_data::{SiteDataError, SiteDataStore};

/// Message shown when a list selection can't be resolved
const SELECTION_ERROR: &str = "Something went wrong opening that forecast";

/// Application state enum representing the current screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Location search with fuzzy filtering
    Search,
    /// Forecast periods for the chosen location
    LocationList,
    /// A single forecast period
    ForecastDetail,
}

/// Discrete input the state machine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Append a character to the search query
    Insert(char),
    /// Remove the last character of the search query
    Backspace,
    Up,
    Down,
    Confirm,
    Back,
    ToggleResolution,
    ToggleHelp,
    /// Quit from any screen
    Cancel,
}

/// The transition a pending fetch will complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    /// Search -> LocationList
    OpenLocation,
    /// LocationList -> LocationList at the other resolution
    ChangeResolution,
}

#[derive(Debug, Clone)]
struct PendingFetch {
    request: FetchRequest,
    transition: Transition,
    label: String,
}

/// One entry of the forecast list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastItem {
    pub title: String,
    pub summary: String,
}

/// What the search screen renders
#[derive(Debug, Clone)]
pub struct SearchView<'a> {
    pub query: &'a str,
    pub rows: Vec<&'a LocationRow>,
    pub selected: usize,
}

/// What the forecast list screen renders
#[derive(Debug, Clone)]
pub struct LocationListView {
    /// "Name, Country" of the loaded site
    pub header: String,
    pub resolution: Resolution,
    pub items: Vec<ForecastItem>,
    pub selected: usize,
}

/// What the forecast detail screen renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastDetailView {
    pub location_name: String,
    pub forecast: NormalizedForecast,
}

/// Main application struct managing state and data
pub struct App {
    /// Current screen
    pub state: AppState,
    /// Resolution used for the next location fetch
    pub resolution: Resolution,
    /// Search query as typed
    pub query: String,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Last error to surface to the user, cleared on the next input
    pub error: Option<String>,
    index: LocationIndex,
    /// Indices into `index` matching the current query, best first
    visible_rows: Vec<usize>,
    row_cursor: usize,
    site_data: SiteDataStore,
    forecast_cursor: usize,
    detail: Option<ForecastDetailView>,
    pending: Option<PendingFetch>,
    next_request_id: u64,
}

impl App {
    /// Creates the application on the search screen
    ///
    /// # Arguments
    /// * `index` - The loaded sitelist
    /// * `resolution` - Resolution for the first location fetch
    pub fn new(index: LocationIndex, resolution: Resolution) -> Self {
        let visible_rows = index.matches("");
        Self {
            state: AppState::Search,
            resolution,
            query: String::new(),
            should_quit: false,
            show_help: false,
            error: None,
            index,
            visible_rows,
            row_cursor: 0,
            site_data: SiteDataStore::new(),
            forecast_cursor: 0,
            detail: None,
            pending: None,
            next_request_id: 0,
        }
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `Ctrl+C`: Quit from anywhere
    /// - Search: type to filter, `Backspace`, `Up`/`Down`, `Enter` to open, `Esc` to clear
    /// - Forecast list: `Up`/`k`, `Down`/`j`, `Enter` to open, `r` to switch resolution,
    ///   `Esc` to go back, `?` for help, `q` to quit
    /// - Forecast detail: `Esc`/`Backspace` to go back, `?` for help, `q` to quit
    ///
    /// # Returns
    /// A fetch the caller must run if the key started a transition that needs data
    pub fn handle_key(&mut self, key_event: KeyEvent) -> Option<FetchRequest> {
        let event = self.key_to_event(key_event)?;
        self.dispatch(event)
    }

    fn key_to_event(&self, key_event: KeyEvent) -> Option<InputEvent> {
        if key_event.kind != KeyEventKind::Press {
            return None;
        }
        if key_event.code == KeyCode::Char('c')
            && key_event.modifiers.contains(KeyModifiers::CONTROL)
        {
            return Some(InputEvent::Cancel);
        }

        if self.show_help {
            return match key_event.code {
                KeyCode::Esc => Some(InputEvent::Back),
                KeyCode::Char('?') => Some(InputEvent::ToggleHelp),
                KeyCode::Char('q') => Some(InputEvent::Cancel),
                _ => None,
            };
        }

        match self.state {
            AppState::Search => match key_event.code {
                KeyCode::Char(c)
                    if !key_event
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
                {
                    Some(InputEvent::Insert(c))
                }
                KeyCode::Backspace => Some(InputEvent::Backspace),
                KeyCode::Up => Some(InputEvent::Up),
                KeyCode::Down => Some(InputEvent::Down),
                KeyCode::Enter => Some(InputEvent::Confirm),
                KeyCode::Esc => Some(InputEvent::Back),
                _ => None,
            },
            AppState::LocationList => match key_event.code {
                KeyCode::Up | KeyCode::Char('k') => Some(InputEvent::Up),
                KeyCode::Down | KeyCode::Char('j') => Some(InputEvent::Down),
                KeyCode::Enter => Some(InputEvent::Confirm),
                KeyCode::Esc => Some(InputEvent::Back),
                KeyCode::Char('r') => Some(InputEvent::ToggleResolution),
                KeyCode::Char('?') => Some(InputEvent::ToggleHelp),
                KeyCode::Char('q') => Some(InputEvent::Cancel),
                _ => None,
            },
            AppState::ForecastDetail => match key_event.code {
                KeyCode::Esc | KeyCode::Backspace => Some(InputEvent::Back),
                KeyCode::Char('?') => Some(InputEvent::ToggleHelp),
                KeyCode::Char('q') => Some(InputEvent::Cancel),
                _ => None,
            },
        }
    }

    /// Applies one input event to the active screen
    ///
    /// This is the only place screen handlers run, and only the handler of
    /// the current state is called. While a fetch is pending every event
    /// except [`InputEvent::Cancel`] is ignored.
    ///
    /// # Returns
    /// A fetch the caller must run to finish the transition, if any
    pub fn dispatch(&mut self, event: InputEvent) -> Option<FetchRequest> {
        if event == InputEvent::Cancel {
            self.should_quit = true;
            return None;
        }

        if self.pending.is_some() {
            debug!(?event, "ignoring input while a fetch is pending");
            return None;
        }

        if self.show_help {
            if matches!(event, InputEvent::ToggleHelp | InputEvent::Back) {
                self.show_help = false;
            }
            return None;
        }

        self.error = None;

        match self.state {
            AppState::Search => self.handle_search(event),
            AppState::LocationList => self.handle_location_list(event),
            AppState::ForecastDetail => {
                self.handle_forecast_detail(event);
                None
            }
        }
    }

    fn handle_search(&mut self, event: InputEvent) -> Option<FetchRequest> {
        match event {
            InputEvent::Insert(c) => {
                self.query.push(c);
                self.refilter();
            }
            InputEvent::Backspace => {
                if self.query.pop().is_some() {
                    self.refilter();
                }
            }
            InputEvent::Up => {
                self.row_cursor = wrap_up(self.row_cursor, self.visible_rows.len());
            }
            InputEvent::Down => {
                self.row_cursor = wrap_down(self.row_cursor, self.visible_rows.len());
            }
            InputEvent::Confirm => {
                let row = self
                    .visible_rows
                    .get(self.row_cursor)
                    .and_then(|&i| self.index.row(i))?;
                let (location_id, label) = (row.id.clone(), row.name.clone());
                return Some(self.begin_fetch(
                    location_id,
                    self.resolution,
                    Transition::OpenLocation,
                    label,
                ));
            }
            InputEvent::Back => {
                if !self.query.is_empty() {
                    self.query.clear();
                    self.refilter();
                }
            }
            InputEvent::ToggleHelp => {
                self.show_help = true;
            }
            InputEvent::ToggleResolution | InputEvent::Cancel => {}
        }
        None
    }

    fn handle_location_list(&mut self, event: InputEvent) -> Option<FetchRequest> {
        let count = self.site_data.forecasts().len();
        match event {
            InputEvent::Up => {
                self.forecast_cursor = wrap_up(self.forecast_cursor, count);
            }
            InputEvent::Down => {
                self.forecast_cursor = wrap_down(self.forecast_cursor, count);
            }
            InputEvent::Confirm => {
                self.open_selected_forecast();
            }
            InputEvent::ToggleResolution => {
                let location_id = self.site_data.location_id()?.to_string();
                let target = self.resolution.toggle();
                return Some(self.begin_fetch(
                    location_id,
                    target,
                    Transition::ChangeResolution,
                    format!("{} forecast", target),
                ));
            }
            InputEvent::Back => {
                self.site_data.clear();
                self.forecast_cursor = 0;
                self.query.clear();
                self.refilter();
                self.state = AppState::Search;
            }
            InputEvent::ToggleHelp => {
                self.show_help = true;
            }
            InputEvent::Insert(_) | InputEvent::Backspace | InputEvent::Cancel => {}
        }
        None
    }

    fn handle_forecast_detail(&mut self, event: InputEvent) {
        match event {
            InputEvent::Back => {
                self.detail = None;
                self.state = AppState::LocationList;
            }
            InputEvent::ToggleHelp => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    /// Moves to the detail screen for the highlighted forecast
    fn open_selected_forecast(&mut self) {
        let Some(item) = self.site_data.forecasts().get(self.forecast_cursor) else {
            return;
        };
        let (period_index, forecast_index) = (item.period_index, item.forecast_index);

        match self.site_data.resolve_forecast(period_index, forecast_index) {
            Ok(forecast) => {
                let location_name = self.site_data.site_name().unwrap_or_default().to_string();
                self.detail = Some(ForecastDetailView {
                    location_name,
                    forecast,
                });
                self.state = AppState::ForecastDetail;
            }
            Err(e) => {
                error!(error = %e, period_index, forecast_index, "could not open forecast");
                self.error = Some(SELECTION_ERROR.to_string());
            }
        }
    }

    /// Records a pending transition and returns the fetch it needs
    fn begin_fetch(
        &mut self,
        location_id: String,
        resolution: Resolution,
        transition: Transition,
        label: String,
    ) -> FetchRequest {
        self.next_request_id += 1;
        let request = FetchRequest {
            id: self.next_request_id,
            location_id,
            resolution,
        };
        info!(
            id = request.id,
            location_id = %request.location_id,
            resolution = %resolution,
            ?transition,
            "requesting forecast"
        );
        self.pending = Some(PendingFetch {
            request: request.clone(),
            transition,
            label,
        });
        request
    }

    /// Completes the pending transition with a fetch result
    ///
    /// On success the new data replaces the old and the forecast list is
    /// shown. On failure the state, resolution and data stay as they were
    /// and `error` is set. Outcomes that don't belong to the pending fetch
    /// are dropped.
    pub fn complete_fetch(&mut self, outcome: FetchOutcome) {
        let pending = match self.pending.take() {
            Some(p) if p.request.id == outcome.request.id => p,
            other => {
                warn!(
                    id = outcome.request.id,
                    "dropping fetch outcome with no matching pending request"
                );
                self.pending = other;
                return;
            }
        };

        let request = pending.request;
        let site_data = &mut self.site_data;
        let result = outcome
            .result
            .map_err(SiteDataError::from)
            .and_then(|site| {
                site_data
                    .install(&request.location_id, request.resolution, site)
                    .map(|forecasts| forecasts.len())
            });

        match result {
            Ok(count) => {
                info!(
                    location_id = %request.location_id,
                    resolution = %request.resolution,
                    count,
                    "forecast loaded"
                );
                self.resolution = request.resolution;
                self.forecast_cursor = 0;
                self.state = AppState::LocationList;
            }
            Err(e) => {
                warn!(location_id = %request.location_id, error = %e, "forecast transition aborted");
                self.error = Some(match pending.transition {
                    Transition::OpenLocation => {
                        format!("Could not load forecast for {}: {}", pending.label, e)
                    }
                    Transition::ChangeResolution => {
                        format!("Could not load {}: {}", pending.label, e)
                    }
                });
            }
        }
    }

    fn refilter(&mut self) {
        self.visible_rows = self.index.matches(&self.query);
        self.row_cursor = 0;
    }

    /// Returns true while a fetch is pending
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Describes what is being loaded, if anything
    pub fn loading_label(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.label.as_str())
    }

    /// View-model for the search screen
    pub fn search_view(&self) -> SearchView<'_> {
        SearchView {
            query: &self.query,
            rows: self
                .visible_rows
                .iter()
                .filter_map(|&i| self.index.row(i))
                .collect(),
            selected: self.row_cursor,
        }
    }

    /// View-model for the forecast list screen, if a site is loaded
    pub fn location_view(&self) -> Option<LocationListView> {
        let header = self.site_data.header()?;
        let items = self
            .site_data
            .forecasts()
            .iter()
            .map(|f| ForecastItem {
                title: f.title(),
                summary: f.summary(),
            })
            .collect();

        Some(LocationListView {
            header,
            resolution: self.resolution,
            items,
            selected: self.forecast_cursor,
        })
    }

    /// View-model for the forecast detail screen
    pub fn detail_view(&self) -> Option<&ForecastDetailView> {
        self.detail.as_ref()
    }

    /// The loaded site data
    pub fn site_data(&self) -> &SiteDataStore {
        &self.site_data
    }

    /// The sitelist index
    pub fn index(&self) -> &LocationIndex {
        &self.index
    }
}

/// Moves a cursor up, wrapping to the bottom
fn wrap_up(cursor: usize, count: usize) -> usize {
    if count == 0 {
        0
    } else if cursor == 0 {
        count - 1
    } else {
        cursor - 1
    }
}

/// Moves a cursor down, wrapping to the top
fn wrap_down(cursor: usize, count: usize) -> usize {
    if count == 0 {
        0
    } else {
        (cursor + 1) % count
    }
}
