use serde_json::{Value, json};

use crate::change::Change;
use crate::credit::{CreditNames, Credits, Role};
use crate::projection::{FieldName, Record};
use crate::validators::Uri;

////////////////////////////////////////////// Person //////////////////////////////////////////////

/// A person credited on at least one film, or waiting to be.
///
/// The credit lists are read-only views over the credit table, holding the
/// titles of the films that credit this person in each role.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Person {
    /// Surrogate key.
    pub id: i64,
    /// Unique display name.
    pub name: String,
    /// Remote profile image.
    pub image_uri: Option<String>,
    /// Films this person produced.
    pub producer_credits: Vec<String>,
    /// Films this person directed.
    pub director_credits: Vec<String>,
    /// Films this person wrote.
    pub writer_credits: Vec<String>,
    /// Films this person edited.
    pub editor_credits: Vec<String>,
    /// Films this person appeared in.
    pub cast_credits: Vec<String>,
    /// Films this person scored or performed music for.
    pub musician_credits: Vec<String>,
}

impl Person {
    /// The film titles credited to this person in `role`.
    pub fn credits(&self, role: Role) -> &[String] {
        match role {
            Role::Producer => &self.producer_credits,
            Role::Director => &self.director_credits,
            Role::Writer => &self.writer_credits,
            Role::Editor => &self.editor_credits,
            Role::Cast => &self.cast_credits,
            Role::Musician => &self.musician_credits,
        }
    }

    pub(crate) fn credits_mut(&mut self, role: Role) -> &mut Vec<String> {
        match role {
            Role::Producer => &mut self.producer_credits,
            Role::Director => &mut self.director_credits,
            Role::Writer => &mut self.writer_credits,
            Role::Editor => &mut self.editor_credits,
            Role::Cast => &mut self.cast_credits,
            Role::Musician => &mut self.musician_credits,
        }
    }
}

/// The fields a caller may request from a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonField {
    /// `id`
    Id,
    /// `name`
    Name,
    /// `image_uri`
    ImageUri,
    /// One of the `*_credits` lists.
    Credits(Role),
}

impl FieldName for PersonField {
    const ALL: &'static [Self] = &[
        PersonField::Id,
        PersonField::Name,
        PersonField::ImageUri,
        PersonField::Credits(Role::Producer),
        PersonField::Credits(Role::Director),
        PersonField::Credits(Role::Writer),
        PersonField::Credits(Role::Editor),
        PersonField::Credits(Role::Cast),
        PersonField::Credits(Role::Musician),
    ];

    fn as_str(self) -> &'static str {
        match self {
            PersonField::Id => "id",
            PersonField::Name => "name",
            PersonField::ImageUri => "image_uri",
            PersonField::Credits(role) => role.person_field(),
        }
    }
}

impl Record for Person {
    type Field = PersonField;

    fn id(&self) -> i64 {
        self.id
    }

    fn value(&self, field: PersonField) -> Value {
        match field {
            PersonField::Id => json!(self.id),
            PersonField::Name => json!(self.name),
            PersonField::ImageUri => json!(self.image_uri),
            PersonField::Credits(role) => json!(self.credits(role)),
        }
    }
}

/////////////////////////////////////////////// Inputs ///////////////////////////////////////////////

/// A validated request to create a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    /// Unique display name.
    pub name: String,
    /// Remote profile image.
    pub image_uri: Option<Uri>,
    /// Film ids to credit, keyed by role; unset roles start empty.
    pub credits: Credits,
}

impl NewPerson {
    /// A person with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_uri: None,
            credits: Credits::new(),
        }
    }

    /// Sets the profile image.
    pub fn with_image_uri(mut self, uri: Uri) -> Self {
        self.image_uri = Some(uri);
        self
    }

    /// Sets the film ids credited in `role`.
    pub fn with_credits(mut self, role: Role, film_ids: Option<Vec<i64>>) -> Self {
        self.credits.set(role, film_ids);
        self
    }
}

/// A validated request to change a person.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonChanges {
    /// New name, if one was supplied.
    pub name: Option<String>,
    /// Change to the profile image.
    pub image_uri: Change<Uri>,
    /// Relation sets to replace.
    pub credits: Credits,
}

impl PersonChanges {
    /// True when the request names nothing to change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && !self.image_uri.is_write() && self.credits.is_empty()
    }
}

/// A validated set of constraints for listing people.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonFilter {
    /// Substring of the name.
    pub name: Option<String>,
    /// Substring of the profile image URI.
    pub image_uri: Option<String>,
    /// Film titles the person must be credited on.
    pub credits: CreditNames,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nic() -> Person {
        Person {
            id: 1,
            name: "Nicolas Cage".to_string(),
            cast_credits: vec!["Con Air".to_string(), "Face/Off".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn serialize_includes_every_field() {
        let output = nic().serialize();
        let keys: Vec<&str> = output.keys().map(String::as_str).collect();
        for name in PersonField::names() {
            assert!(keys.contains(&name), "missing {}", name);
        }
        assert_eq!(output.len(), PersonField::ALL.len());
        assert_eq!(output["image_uri"], Value::Null);
        assert_eq!(output["producer_credits"], json!([]));
        assert_eq!(output["cast_credits"], json!(["Con Air", "Face/Off"]));
    }

    #[test]
    fn project_returns_only_requested_keys() {
        let output = nic().project(&[PersonField::Name]);
        assert_eq!(output.len(), 1);
        assert_eq!(output["name"], json!("Nicolas Cage"));
        assert!(!output.contains_key("id"));
        assert!(!output.contains_key("producer_credits"));
    }

    #[test]
    fn serialize_fields_falls_back_to_everything() {
        assert_eq!(nic().serialize_fields(&[]), nic().serialize());
    }

    #[test]
    fn field_names_parse() {
        assert_eq!(PersonField::parse("name"), Some(PersonField::Name));
        assert_eq!(
            PersonField::parse("editor_credits"),
            Some(PersonField::Credits(Role::Editor))
        );
        assert_eq!(PersonField::parse("title"), None);
    }

    #[test]
    fn changes_empty_only_without_fields() {
        assert!(PersonChanges::default().is_empty());
        let changes = PersonChanges {
            image_uri: Change::Clear,
            ..Default::default()
        };
        assert!(!changes.is_empty());
        let mut credits = Credits::new();
        credits.set(Role::Cast, None);
        let changes = PersonChanges {
            credits,
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
