//! The record under validation: a meetup issue, its parsed body fields, and
//! the side outputs produced by lint rules.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BodyField
// ---------------------------------------------------------------------------

/// A parsed body field. Declaration order is the section order in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyField {
    EventTitle,
    EventDate,
    Hoster,
    EventDescription,
    Agenda,
    MeetupLink,
    CncfLink,
    DriveLink,
}

impl BodyField {
    pub const ALL: [BodyField; 8] = [
        BodyField::EventTitle,
        BodyField::EventDate,
        BodyField::Hoster,
        BodyField::EventDescription,
        BodyField::Agenda,
        BodyField::MeetupLink,
        BodyField::CncfLink,
        BodyField::DriveLink,
    ];

    /// Machine name, as found in the parsed body input (`event_date`, ...).
    pub fn key(&self) -> &'static str {
        match self {
            BodyField::EventTitle => "event_title",
            BodyField::EventDate => "event_date",
            BodyField::Hoster => "hoster",
            BodyField::EventDescription => "event_description",
            BodyField::Agenda => "agenda",
            BodyField::MeetupLink => "meetup_link",
            BodyField::CncfLink => "cncf_link",
            BodyField::DriveLink => "drive_link",
        }
    }

    /// Human label, used as the `### <label>` section heading and as the
    /// prefix of lint messages.
    pub fn label(&self) -> &'static str {
        match self {
            BodyField::EventTitle => "Event Title",
            BodyField::EventDate => "Event Date",
            BodyField::Hoster => "Hoster",
            BodyField::EventDescription => "Event Description",
            BodyField::Agenda => "Agenda",
            BodyField::MeetupLink => "Meetup Link",
            BodyField::CncfLink => "CNCF Link",
            BodyField::DriveLink => "Drive Link",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for BodyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// Value of a parsed body field: free text or an ordered list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            FieldValue::Text(_) => None,
        }
    }

    /// Text used when the value is rendered into the issue body. Lists are
    /// joined with `", "`.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(", "),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::List(items) => serde_json::json!(items),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// Canonical machine-readable state of an issue body.
pub type IssueFields = BTreeMap<BodyField, FieldValue>;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A named external entity (hoster, speaker) and its canonical URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub url: String,
}

impl Entity {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Derived
// ---------------------------------------------------------------------------

/// Side outputs written by rules and read by the output payload builder.
///
/// Each slot is written at most once per run, by the rule that owns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Derived {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hoster: Option<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speakers: Option<Vec<Entity>>,
    /// Template kind + `-link` mapped to the provisioned file URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_files: Option<BTreeMap<String, String>>,
}

// ---------------------------------------------------------------------------
// StoredIssue / MeetupIssue
// ---------------------------------------------------------------------------

/// Issue attributes as held by the backing record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredIssue {
    pub number: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub body: String,
}

/// The record validated and fixed by one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetupIssue {
    pub number: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    /// Markdown rendering of `fields`, one `### <label>` section per field.
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub fields: IssueFields,
    #[serde(default)]
    pub derived: Derived,
}

impl MeetupIssue {
    pub fn new(number: u64) -> Self {
        Self {
            number,
            title: None,
            labels: Vec::new(),
            body: String::new(),
            fields: IssueFields::new(),
            derived: Derived::default(),
        }
    }

    /// Combine store data with externally parsed body fields.
    pub fn from_stored(stored: StoredIssue, fields: IssueFields) -> Self {
        Self {
            number: stored.number,
            title: stored.title,
            labels: stored.labels,
            body: stored.body,
            fields,
            derived: Derived::default(),
        }
    }

    pub fn field(&self, field: BodyField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    /// Text value of `field`, or `None` when absent or list-valued.
    pub fn text(&self, field: BodyField) -> Option<&str> {
        self.field(field).and_then(FieldValue::as_text)
    }

    /// List value of `field`, or `None` when absent or text-valued.
    pub fn list(&self, field: BodyField) -> Option<&[String]> {
        self.field(field).and_then(FieldValue::as_list)
    }

    pub fn set_field(&mut self, field: BodyField, value: impl Into<FieldValue>) {
        self.fields.insert(field, value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_field_keys_round_trip() {
        for field in BodyField::ALL {
            assert_eq!(BodyField::from_key(field.key()), Some(field));
        }
        assert_eq!(BodyField::from_key("unknown"), None);
    }

    #[test]
    fn body_field_labels() {
        assert_eq!(BodyField::CncfLink.label(), "CNCF Link");
        assert_eq!(BodyField::EventDescription.label(), "Event Description");
    }

    #[test]
    fn fields_deserialize_from_parsed_body_json() {
        let json = serde_json::json!({
            "event_date": "2021-12-31",
            "hoster": ["Acme"],
            "agenda": "- Alice: Talk"
        });
        let fields: IssueFields = serde_json::from_value(json).unwrap();

        assert_eq!(
            fields.get(&BodyField::EventDate),
            Some(&FieldValue::Text("2021-12-31".into()))
        );
        assert_eq!(
            fields.get(&BodyField::Hoster),
            Some(&FieldValue::List(vec!["Acme".into()]))
        );
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn field_value_render_joins_lists() {
        let value = FieldValue::List(vec!["A".into(), "B".into()]);
        assert_eq!(value.render(), "A, B");
        assert_eq!(FieldValue::from("x").render(), "x");
    }

    #[test]
    fn typed_accessors_distinguish_text_and_list() {
        let mut issue = MeetupIssue::new(7);
        issue.set_field(BodyField::Agenda, "- Alice: Talk");
        issue.set_field(BodyField::Hoster, vec!["Acme".to_string()]);

        assert_eq!(issue.text(BodyField::Agenda), Some("- Alice: Talk"));
        assert_eq!(issue.list(BodyField::Agenda), None);
        assert_eq!(issue.list(BodyField::Hoster), Some(&["Acme".to_string()][..]));
        assert_eq!(issue.text(BodyField::Hoster), None);
        assert_eq!(issue.text(BodyField::EventDate), None);
    }

    #[test]
    fn clone_is_reference_independent() {
        let mut original = MeetupIssue::new(1);
        original.labels.push("meetup".into());
        original.set_field(BodyField::Hoster, vec!["Acme".to_string()]);

        let mut copy = original.clone();
        copy.labels.push("extra".into());
        copy.set_field(BodyField::Hoster, vec!["Other".to_string()]);
        copy.derived.hoster = Some(Entity::new("Other", "https://other.example"));

        assert_eq!(original.labels, vec!["meetup".to_string()]);
        assert_eq!(original.list(BodyField::Hoster), Some(&["Acme".to_string()][..]));
        assert!(original.derived.hoster.is_none());
    }

    #[test]
    fn from_stored_keeps_store_attributes() {
        let stored = StoredIssue {
            number: 3,
            title: Some("t".into()),
            labels: vec!["meetup".into()],
            body: "### Agenda\n\n- A: B\n".into(),
        };
        let issue = MeetupIssue::from_stored(stored, IssueFields::new());
        assert_eq!(issue.number, 3);
        assert_eq!(issue.title.as_deref(), Some("t"));
        assert_eq!(issue.derived, Derived::default());
    }
}
