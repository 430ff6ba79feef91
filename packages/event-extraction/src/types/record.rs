//! The accumulating event record.
//!
//! Serialized keys are the ledger's column names, so the field schema, the
//! backend's JSON output and the API response share one vocabulary.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured event output for one request.
///
/// Every field is optional; a field no source supplied stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event date (`DD.MM.YY`)
    #[serde(rename = "תאריך", default)]
    pub date: Option<String>,

    /// Start time (`HH:MM`)
    #[serde(rename = "משעה", default)]
    pub start_time: Option<String>,

    /// End time (`HH:MM`)
    #[serde(rename = "עד_שעה", default)]
    pub end_time: Option<String>,

    #[serde(rename = "שם_האירוע", default)]
    pub event_name: Option<String>,

    #[serde(rename = "תעשיה", default)]
    pub industry: Option<String>,

    /// Always empty; kept so the ledger column exists
    #[serde(rename = "תעשיה_2", default)]
    pub secondary_industry: Option<String>,

    /// Physical, online or hybrid (free text)
    #[serde(rename = "אירועי_פיזי_אונליין", default)]
    pub event_mode: Option<String>,

    #[serde(rename = "תוכן", default)]
    pub description: Option<String>,

    #[serde(rename = "חברה_מארחת", default)]
    pub host_organization: Option<String>,

    /// Up to 3 additional organizations
    #[serde(rename = "חברות_נוספות", default)]
    pub additional_organizations: Option<Vec<String>>,

    #[serde(rename = "מרצה_מארח", default)]
    pub host_speaker: Option<String>,

    /// Up to 4 additional speakers
    #[serde(rename = "מרצים_נוספים", default)]
    pub additional_speakers: Option<Vec<String>>,

    #[serde(rename = "לינק_להרשמה", default)]
    pub registration_link: Option<String>,

    #[serde(rename = "לינקים_נוספים", default)]
    pub additional_links: Option<Vec<String>>,

    /// URL of the first image that carried date, name or start time
    #[serde(rename = "IMAGE", default)]
    pub image: Option<String>,

    /// Free text, or [`NO_COST`]
    #[serde(rename = "עלות", default)]
    pub cost: Option<String>,

    #[serde(rename = "אי_מייל_למשתתפים", default)]
    pub participant_email: Option<String>,

    #[serde(rename = "יום_בשבוע", default)]
    pub day_of_week: Option<String>,

    /// Always unset; the curation team sets it in the ledger
    #[serde(rename = "IN_CALENDAR", default)]
    pub in_calendar: Option<bool>,

    /// Accumulated conflict and conversion notes, `; `-separated
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

/// Cost sentinel for free events.
pub const NO_COST: &str = "ללא עלות";

/// Separator between notes in [`EventRecord::error`].
pub const NOTE_SEPARATOR: &str = "; ";

/// Shape of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    List,
    Flag,
}

/// Every data field of [`EventRecord`] (the note annotation excluded), in
/// ledger column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventField {
    Date,
    StartTime,
    EndTime,
    EventName,
    Industry,
    SecondaryIndustry,
    EventMode,
    Description,
    HostOrganization,
    AdditionalOrganizations,
    HostSpeaker,
    AdditionalSpeakers,
    RegistrationLink,
    AdditionalLinks,
    Image,
    Cost,
    ParticipantEmail,
    DayOfWeek,
    InCalendar,
}

impl EventField {
    pub const ALL: [EventField; 19] = [
        EventField::Date,
        EventField::StartTime,
        EventField::EndTime,
        EventField::EventName,
        EventField::Industry,
        EventField::SecondaryIndustry,
        EventField::EventMode,
        EventField::Description,
        EventField::HostOrganization,
        EventField::AdditionalOrganizations,
        EventField::HostSpeaker,
        EventField::AdditionalSpeakers,
        EventField::RegistrationLink,
        EventField::AdditionalLinks,
        EventField::Image,
        EventField::Cost,
        EventField::ParticipantEmail,
        EventField::DayOfWeek,
        EventField::InCalendar,
    ];

    /// Column key used in the schema, backend output and ledger.
    pub fn key(self) -> &'static str {
        match self {
            EventField::Date => "תאריך",
            EventField::StartTime => "משעה",
            EventField::EndTime => "עד_שעה",
            EventField::EventName => "שם_האירוע",
            EventField::Industry => "תעשיה",
            EventField::SecondaryIndustry => "תעשיה_2",
            EventField::EventMode => "אירועי_פיזי_אונליין",
            EventField::Description => "תוכן",
            EventField::HostOrganization => "חברה_מארחת",
            EventField::AdditionalOrganizations => "חברות_נוספות",
            EventField::HostSpeaker => "מרצה_מארח",
            EventField::AdditionalSpeakers => "מרצים_נוספים",
            EventField::RegistrationLink => "לינק_להרשמה",
            EventField::AdditionalLinks => "לינקים_נוספים",
            EventField::Image => "IMAGE",
            EventField::Cost => "עלות",
            EventField::ParticipantEmail => "אי_מייל_למשתתפים",
            EventField::DayOfWeek => "יום_בשבוע",
            EventField::InCalendar => "IN_CALENDAR",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    pub fn kind(self) -> FieldKind {
        match self {
            EventField::AdditionalOrganizations
            | EventField::AdditionalSpeakers
            | EventField::AdditionalLinks => FieldKind::List,
            EventField::InCalendar => FieldKind::Flag,
            _ => FieldKind::Text,
        }
    }

    /// Fields that are always left unset, whatever a source says.
    pub fn is_reserved(self) -> bool {
        matches!(self, EventField::SecondaryIndustry | EventField::InCalendar)
    }

    /// Human description handed to the field backend.
    pub fn description(self) -> &'static str {
        match self {
            EventField::Date => "Event date",
            EventField::StartTime => "Event start time",
            EventField::EndTime => "Event end time",
            EventField::EventName => "Event name",
            EventField::Industry => "Industry the event belongs to (e.g. \"ESG וקיימות\")",
            EventField::SecondaryIndustry => "Always empty",
            EventField::EventMode => "Whether the event is physical, online or hybrid",
            EventField::Description => "Event description or details",
            EventField::HostOrganization => "Hosting company or organization",
            EventField::AdditionalOrganizations => "Up to 3 additional companies",
            EventField::HostSpeaker => "Hosting speaker or organizer",
            EventField::AdditionalSpeakers => "Up to 4 additional speakers",
            EventField::RegistrationLink => "Registration link",
            EventField::AdditionalLinks => "Additional links",
            EventField::Image => "Event image URL",
            EventField::Cost => "Cost, or \"ללא עלות\" for no cost",
            EventField::ParticipantEmail => "Contact email for participants",
            EventField::DayOfWeek => "Day of the week, derived from the date",
            EventField::InCalendar => "Always empty",
        }
    }

    /// Expected textual format handed to the field backend.
    pub fn format(self) -> &'static str {
        match self {
            EventField::Date => "DD.MM.YY",
            EventField::StartTime | EventField::EndTime => "HH:MM",
            EventField::AdditionalOrganizations | EventField::AdditionalSpeakers => {
                "list of text"
            }
            EventField::RegistrationLink | EventField::Image => "HttpUrl",
            EventField::AdditionalLinks => "list of HttpUrl",
            EventField::ParticipantEmail => "email",
            EventField::InCalendar => "boolean",
            _ => "text",
        }
    }
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A typed field value, as read from or written to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Flag(bool),
}

impl FieldValue {
    /// Empty strings and empty lists count as "not supplied".
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Flag(_) => false,
        }
    }

    /// Cell text for the ledger.
    pub fn to_cell(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(", "),
            FieldValue::Flag(true) => "TRUE".to_string(),
            FieldValue::Flag(false) => "FALSE".to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::List(items) => write!(f, "[{}]", items.join(", ")),
            FieldValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

impl EventRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a field. Returns `None` when unset.
    pub fn get(&self, field: EventField) -> Option<FieldValue> {
        let text = |v: &Option<String>| v.clone().map(FieldValue::Text);
        let list = |v: &Option<Vec<String>>| v.clone().map(FieldValue::List);

        match field {
            EventField::Date => text(&self.date),
            EventField::StartTime => text(&self.start_time),
            EventField::EndTime => text(&self.end_time),
            EventField::EventName => text(&self.event_name),
            EventField::Industry => text(&self.industry),
            EventField::SecondaryIndustry => text(&self.secondary_industry),
            EventField::EventMode => text(&self.event_mode),
            EventField::Description => text(&self.description),
            EventField::HostOrganization => text(&self.host_organization),
            EventField::AdditionalOrganizations => list(&self.additional_organizations),
            EventField::HostSpeaker => text(&self.host_speaker),
            EventField::AdditionalSpeakers => list(&self.additional_speakers),
            EventField::RegistrationLink => text(&self.registration_link),
            EventField::AdditionalLinks => list(&self.additional_links),
            EventField::Image => text(&self.image),
            EventField::Cost => text(&self.cost),
            EventField::ParticipantEmail => text(&self.participant_email),
            EventField::DayOfWeek => text(&self.day_of_week),
            EventField::InCalendar => self.in_calendar.map(FieldValue::Flag),
        }
    }

    /// Read a field, treating empty values as unset.
    pub fn present(&self, field: EventField) -> Option<FieldValue> {
        self.get(field).filter(|v| !v.is_empty())
    }

    /// Write a field. A value of the wrong shape for the field is ignored
    /// and reported back as `false`.
    pub fn set(&mut self, field: EventField, value: FieldValue) -> bool {
        match value {
            FieldValue::Text(s) => self.text_slot(field).map(|slot| *slot = Some(s)).is_some(),
            FieldValue::List(items) => self
                .list_slot(field)
                .map(|slot| *slot = Some(items))
                .is_some(),
            FieldValue::Flag(b) if field == EventField::InCalendar => {
                self.in_calendar = Some(b);
                true
            }
            FieldValue::Flag(_) => false,
        }
    }

    fn text_slot(&mut self, field: EventField) -> Option<&mut Option<String>> {
        let slot = match field {
            EventField::Date => &mut self.date,
            EventField::StartTime => &mut self.start_time,
            EventField::EndTime => &mut self.end_time,
            EventField::EventName => &mut self.event_name,
            EventField::Industry => &mut self.industry,
            EventField::SecondaryIndustry => &mut self.secondary_industry,
            EventField::EventMode => &mut self.event_mode,
            EventField::Description => &mut self.description,
            EventField::HostOrganization => &mut self.host_organization,
            EventField::HostSpeaker => &mut self.host_speaker,
            EventField::RegistrationLink => &mut self.registration_link,
            EventField::Image => &mut self.image,
            EventField::Cost => &mut self.cost,
            EventField::ParticipantEmail => &mut self.participant_email,
            EventField::DayOfWeek => &mut self.day_of_week,
            _ => return None,
        };
        Some(slot)
    }

    fn list_slot(&mut self, field: EventField) -> Option<&mut Option<Vec<String>>> {
        match field {
            EventField::AdditionalOrganizations => Some(&mut self.additional_organizations),
            EventField::AdditionalSpeakers => Some(&mut self.additional_speakers),
            EventField::AdditionalLinks => Some(&mut self.additional_links),
            _ => None,
        }
    }

    /// Append a note to the error annotation.
    pub fn annotate(&mut self, note: impl AsRef<str>) {
        let note = note.as_ref();
        if note.is_empty() {
            return;
        }
        self.error = Some(match self.error.take().filter(|e| !e.is_empty()) {
            Some(existing) => format!("{}{}{}", existing, NOTE_SEPARATOR, note),
            None => note.to_string(),
        });
    }

    /// True when the record carries date, event name or start time.
    pub fn has_headline(&self) -> bool {
        [EventField::Date, EventField::EventName, EventField::StartTime]
            .into_iter()
            .any(|f| self.present(f).is_some())
    }

    /// True when no data field and no note is set.
    pub fn is_empty(&self) -> bool {
        EventField::ALL.iter().all(|f| self.present(*f).is_none())
            && self.error.as_deref().map_or(true, str::is_empty)
    }

    /// Build a record from a backend field map.
    ///
    /// Unknown keys are dropped, `null` means absent, reserved fields are
    /// forced unset. Text fields take strings, numbers and booleans; list
    /// fields take arrays of scalars or a single string. Anything else is
    /// dropped and noted as a conversion error on the record.
    pub fn from_field_map(map: &Map<String, Value>) -> Self {
        let mut record = EventRecord::default();
        let mut rejected = Vec::new();

        for (key, value) in map {
            let Some(field) = EventField::from_key(key) else {
                continue;
            };
            if field.is_reserved() || value.is_null() {
                continue;
            }
            match convert_value(field.kind(), value) {
                Some(converted) => {
                    record.set(field, converted);
                }
                None => rejected.push(field.key()),
            }
        }

        for field in rejected {
            record.annotate(format!("Data conversion error: {}", field));
        }
        record
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn convert_value(kind: FieldKind, value: &Value) -> Option<FieldValue> {
    match kind {
        FieldKind::Text => scalar_to_string(value).map(FieldValue::Text),
        FieldKind::List => match value {
            Value::Array(items) => items
                .iter()
                .filter(|v| !v.is_null())
                .map(scalar_to_string)
                .collect::<Option<Vec<_>>>()
                .map(|items| items.into_iter().filter(|s| !s.is_empty()).collect())
                .map(FieldValue::List),
            Value::String(s) => {
                let s = s.trim();
                Some(FieldValue::List(if s.is_empty() {
                    Vec::new()
                } else {
                    vec![s.to_string()]
                }))
            }
            _ => None,
        },
        FieldKind::Flag => value.as_bool().map(FieldValue::Flag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_keys_round_trip() {
        for field in EventField::ALL {
            assert_eq!(EventField::from_key(field.key()), Some(field));
        }
        assert_eq!(EventField::from_key("summary"), None);
    }

    #[test]
    fn test_serializes_with_ledger_keys() {
        let record = EventRecord {
            date: Some("05.06.25".into()),
            image: Some("https://a.com/i.png".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["תאריך"], "05.06.25");
        assert_eq!(json["IMAGE"], "https://a.com/i.png");
        assert!(json["Error"].is_null());
    }

    #[test]
    fn test_from_field_map_drops_unknown_and_reserved() {
        let map = json!({
            "תאריך": "05.06.25",
            "summary": "ignored",
            "IN_CALENDAR": true,
            "תעשיה_2": "ignored too",
            "משעה": null
        });
        let record = EventRecord::from_field_map(map.as_object().unwrap());

        assert_eq!(record.date.as_deref(), Some("05.06.25"));
        assert_eq!(record.in_calendar, None);
        assert_eq!(record.secondary_industry, None);
        assert_eq!(record.start_time, None);
        assert_eq!(record.error, None);
    }

    #[test]
    fn test_from_field_map_lenient_shapes() {
        let map = json!({
            "חברות_נוספות": "Acme",
            "מרצים_נוספים": ["Dana", "", "Avi"],
            "עלות": 50,
            "תוכן": {"nested": true}
        });
        let record = EventRecord::from_field_map(map.as_object().unwrap());

        assert_eq!(record.additional_organizations, Some(vec!["Acme".to_string()]));
        assert_eq!(
            record.additional_speakers,
            Some(vec!["Dana".to_string(), "Avi".to_string()])
        );
        assert_eq!(record.cost.as_deref(), Some("50"));
        assert_eq!(record.description, None);
        assert_eq!(record.error.as_deref(), Some("Data conversion error: תוכן"));
    }

    #[test]
    fn test_set_rejects_wrong_shape() {
        let mut record = EventRecord::new();
        assert!(!record.set(EventField::Date, FieldValue::List(vec!["x".into()])));
        assert!(record.set(EventField::AdditionalLinks, FieldValue::List(vec!["x".into()])));
        assert_eq!(record.date, None);
        assert_eq!(record.additional_links, Some(vec!["x".to_string()]));
    }

    #[test]
    fn test_annotate_joins_notes() {
        let mut record = EventRecord::new();
        record.annotate("first");
        record.annotate("");
        record.annotate("second");
        assert_eq!(record.error.as_deref(), Some("first; second"));
    }

    #[test]
    fn test_has_headline() {
        let mut record = EventRecord::new();
        assert!(!record.has_headline());
        record.cost = Some(NO_COST.into());
        assert!(!record.has_headline());
        record.start_time = Some("18:00".into());
        assert!(record.has_headline());
    }
}
