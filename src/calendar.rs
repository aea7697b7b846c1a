//! Month-grid calendar: color-tagged events in per-day cells.
//!
//! The anchor substructure is one or more `<section class="month-grid">`
//! blocks, each titled `<month-name> <year>` (Dutch month names). Day cells
//! live under `.calendar-days` as `.calendar-day` elements; `.padding-day`
//! cells belong to neighboring months and are never touched. Events are
//! direct-child `<span class="calendar-event event-<color>">` markers,
//! optionally wrapping an `<a>`.
//!
//! Saving is a destructive rebuild *per day*: every existing marker in a
//! real day cell is removed (with its indent text node), then the markers
//! for the day's events are re-emitted sorted by name. Days with no events
//! in the new data set end up empty. Sections whose title doesn't parse are
//! skipped on both parse and save, which leaves their markup untouched.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::config::month_number;
use crate::dom::{Document, Element, NodeId};
use crate::error::{Error, Result};
use crate::loader::DocumentStore;
use crate::serializer::{escape_attr, escape_text};

lazy_static! {
    /// `<month-name> <year>` at the start of a month title.
    static ref MONTH_TITLE_RE: Regex = Regex::new(r"^(\w+)\s+(\d{4})").unwrap();
    /// Strict zero-padded ISO date shape.
    static ref ISO_DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

/// The closed set of event colors the calendar's stylesheet knows.
///
/// The first variant is the parse default when a marker carries no
/// recognizable `event-<color>` class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventColor {
    /// Default color.
    #[default]
    Black,
    /// Club activities.
    Green,
    /// Competitions.
    Blue,
    /// Deadlines and cancellations.
    Red,
}

impl EventColor {
    /// Every color, for UI pickers.
    pub const ALL: [EventColor; 4] =
        [EventColor::Black, EventColor::Green, EventColor::Blue, EventColor::Red];

    /// The CSS token for this color (the `<color>` in `event-<color>`).
    pub fn as_str(self) -> &'static str {
        match self {
            EventColor::Black => "black",
            EventColor::Green => "green",
            EventColor::Blue => "blue",
            EventColor::Red => "red",
        }
    }

    /// Parse a CSS color token; `None` for anything outside the set.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "black" => Some(EventColor::Black),
            "green" => Some(EventColor::Green),
            "blue" => Some(EventColor::Blue),
            "red" => Some(EventColor::Red),
            _ => None,
        }
    }
}

/// One calendar event.
///
/// Identity is the index in the flat [`EventList`]; duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    /// Zero-padded ISO date, `YYYY-MM-DD`.
    pub date: String,
    /// Event name (also becomes the marker's `title` attribute).
    pub name: String,
    /// Marker color.
    pub color: EventColor,
    /// Optional link target; rendered as a nested anchor when set.
    pub link: Option<String>,
}

impl CalendarEvent {
    /// Create an event. Validation happens on [`EventList::add`]/`update`.
    pub fn new(
        date: impl Into<String>,
        name: impl Into<String>,
        color: EventColor,
        link: Option<String>,
    ) -> Self {
        CalendarEvent { date: date.into(), name: name.into(), color, link }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::MissingField("name"));
        }
        if !ISO_DATE_RE.is_match(&self.date)
            || NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").is_err()
        {
            return Err(Error::InvalidDate(self.date.clone()));
        }
        Ok(())
    }
}

/// The editable flat list of calendar events.
///
/// Indices are the add/update/delete target and are only stable until the
/// next mutation or sort; callers must use the index in effect when they
/// picked the event.
#[derive(Debug, Clone, Default)]
pub struct EventList {
    events: Vec<CalendarEvent>,
    modified: bool,
}

impl EventList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    fn from_events(events: Vec<CalendarEvent>) -> Self {
        EventList { events, modified: false }
    }

    /// The events, currently ordered as parsed/sorted.
    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the list holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The event at an index, if in range.
    pub fn get(&self, index: usize) -> Option<&CalendarEvent> {
        self.events.get(index)
    }

    /// Append an event after validating its date and name.
    pub fn add(&mut self, event: CalendarEvent) -> Result<()> {
        event.validate()?;
        self.events.push(event);
        self.modified = true;
        Ok(())
    }

    /// Replace the event at `index` after validating the replacement.
    pub fn update(&mut self, index: usize, event: CalendarEvent) -> Result<()> {
        event.validate()?;
        match self.events.get_mut(index) {
            Some(slot) => {
                *slot = event;
                self.modified = true;
                Ok(())
            }
            None => Err(Error::IndexOutOfRange { index, len: self.events.len() }),
        }
    }

    /// Remove and return the event at `index`.
    pub fn remove(&mut self, index: usize) -> Result<CalendarEvent> {
        if index >= self.events.len() {
            return Err(Error::IndexOutOfRange { index, len: self.events.len() });
        }
        self.modified = true;
        Ok(self.events.remove(index))
    }

    /// Sort ascending by date (stable, so same-day order is preserved).
    pub fn sort_by_date(&mut self) {
        self.events.sort_by(|a, b| a.date.cmp(&b.date));
    }

    /// Whether the list changed since it was parsed or last saved.
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

/// Read a month section's title and map it to (year, month).
///
/// `None` when the title is absent, doesn't match `<name> <year>`, or names
/// an unknown month; such sections are skipped entirely.
fn section_year_month(doc: &Document, section: NodeId) -> Option<(i32, u32)> {
    let title = doc.find_element(section, |el| el.name == "h2" && el.has_class("month-title"))?;
    let text = doc.text_of(title);
    let captures = MONTH_TITLE_RE.captures(&text)?;
    let month = month_number(&captures[1])?;
    let year: i32 = captures[2].parse().ok()?;
    Some((year, month))
}

/// The real (non-padding) day cells of a month section, in grid order.
fn day_cells(doc: &Document, section: NodeId) -> Vec<NodeId> {
    let Some(days) = doc.find_element(section, |el| el.has_class("calendar-days")) else {
        return Vec::new();
    };
    doc.find_all_elements(days, |el| {
        el.has_class("calendar-day") && !el.has_class("padding-day")
    })
}

/// The zero-padded ISO date of a day cell, from its `day-number` span.
fn cell_date(doc: &Document, cell: NodeId, year: i32, month: u32) -> Option<String> {
    let number = doc.find_element(cell, |el| el.name == "span" && el.has_class("day-number"))?;
    let day: u32 = doc.text_of(number).parse().ok()?;
    Some(format!("{year:04}-{month:02}-{day:02}"))
}

/// All month-grid sections of the document.
fn month_sections(doc: &Document) -> Vec<NodeId> {
    doc.find_all_elements(doc.root(), |el| el.name == "section" && el.has_class("month-grid"))
}

/// Parse the calendar page into an [`EventList`], sorted ascending by date.
///
/// A document without any month section is a hard failure. Sections with
/// unparseable titles, cells with non-numeric day numbers, and markers with
/// empty names are logged and skipped.
pub fn parse(store: &mut DocumentStore, path: &Path) -> Result<EventList> {
    let doc = store.load(path)?;
    let sections = month_sections(doc);
    if sections.is_empty() {
        return Err(Error::AnchorNotFound {
            anchor: "<section class=\"month-grid\">".to_string(),
            path: path.to_path_buf(),
        });
    }

    let mut events = Vec::new();
    for section in sections {
        let Some((year, month)) = section_year_month(doc, section) else {
            log::warn!("skipping month section with unrecognized title in '{}'", path.display());
            continue;
        };
        for cell in day_cells(doc, section) {
            let Some(date) = cell_date(doc, cell, year, month) else {
                continue;
            };
            for marker in doc
                .children(cell)
                .filter(|&c| {
                    doc.element(c)
                        .is_some_and(|el| el.name == "span" && el.has_class("calendar-event"))
                })
                .collect::<Vec<_>>()
            {
                let (name, link) = match doc.find_element(marker, |el| el.name == "a") {
                    Some(anchor) => (doc.text_of(anchor), doc.attr_of(anchor, "href")),
                    None => (doc.text_of(marker), None),
                };
                if name.is_empty() {
                    log::warn!("dropping unnamed event on {} in '{}'", date, path.display());
                    continue;
                }
                let color = doc
                    .element(marker)
                    .into_iter()
                    .flat_map(Element::classes)
                    .find_map(|class| class.strip_prefix("event-").and_then(EventColor::from_token))
                    .unwrap_or_default();
                events.push(CalendarEvent { date: date.clone(), name, color, link });
            }
        }
    }

    events.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(EventList::from_events(events))
}

/// Write an [`EventList`] back into the calendar page and flush the file.
///
/// Sorts the list ascending by date first, then destructively rebuilds each
/// real day cell's markers.
pub fn save(store: &mut DocumentStore, path: &Path, list: &mut EventList) -> Result<()> {
    list.sort_by_date();

    let mut by_date: HashMap<String, Vec<CalendarEvent>> = HashMap::new();
    for event in list.events() {
        by_date.entry(event.date.clone()).or_default().push(event.clone());
    }
    for bucket in by_date.values_mut() {
        bucket.sort_by(|a, b| a.name.cmp(&b.name));
    }

    let doc = store.load(path)?;
    let sections = month_sections(doc);
    if sections.is_empty() {
        return Err(Error::AnchorNotFound {
            anchor: "<section class=\"month-grid\">".to_string(),
            path: path.to_path_buf(),
        });
    }

    for section in sections {
        let Some((year, month)) = section_year_month(doc, section) else {
            continue;
        };
        for cell in day_cells(doc, section) {
            // Drop existing markers along with the indent node before each.
            let old_markers: Vec<NodeId> = doc
                .children(cell)
                .filter(|&c| {
                    doc.element(c)
                        .is_some_and(|el| el.name == "span" && el.has_class("calendar-event"))
                })
                .collect();
            for marker in old_markers {
                if let Some(prev) = doc.prev_sibling(marker) {
                    if doc.text_content(prev).is_some_and(|t| t.trim().is_empty()) {
                        doc.detach(prev);
                    }
                }
                doc.detach(marker);
            }

            let Some(date) = cell_date(doc, cell, year, month) else {
                continue;
            };
            let Some(day_events) = by_date.get(&date) else {
                continue;
            };
            if day_events.is_empty() {
                continue;
            }
            // The cell's old closing whitespace is re-emitted after the new
            // markers; dropping it first keeps repeated saves byte-stable.
            if let Some(last) = doc.last_child(cell) {
                if doc.text_content(last).is_some_and(|t| t.trim().is_empty()) {
                    doc.detach(last);
                }
            }
            for event in day_events {
                let indent = doc.create_text("\n        ");
                doc.append_child(cell, indent);

                let mut span = Element::new("span");
                span.set_attr("class", format!("calendar-event event-{}", event.color.as_str()));
                span.set_attr("title", escape_attr(&event.name));
                let marker = doc.create_element(span);

                match &event.link {
                    Some(link) => {
                        let mut a = Element::new("a");
                        a.set_attr("href", escape_attr(link));
                        let anchor = doc.create_element(a);
                        let text = doc.create_text(escape_text(&event.name));
                        doc.append_child(anchor, text);
                        doc.append_child(marker, anchor);
                    }
                    None => {
                        let text = doc.create_text(escape_text(&event.name));
                        doc.append_child(marker, text);
                    }
                }
                doc.append_child(cell, marker);
            }
            let closing = doc.create_text("\n      ");
            doc.append_child(cell, closing);
        }
    }

    store.flush(path)?;
    list.modified = false;
    Ok(())
}
