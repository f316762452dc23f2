//! Declarative coercion of untrusted request parameters into typed inputs.
//!
//! Every schema reads a [`Params`] map (a JSON object, whether it came from a
//! query string, a form body, or a JSON body) and either returns the typed
//! record for its operation or a [`FieldErrors`] map naming every field that
//! failed.  All failures are collected; a schema never stops at the first one.
//!
//! ```rust
//! use ncmdb::schema::{CreatePersonSchema, Params, Schema};
//! use serde_json::json;
//!
//! let params: Params = serde_json::from_value(json!({"name": "Nicolas Cage"})).unwrap();
//! let person = CreatePersonSchema::deserialize(&params).unwrap();
//! assert_eq!(person.name, "Nicolas Cage");
//!
//! let errors = CreatePersonSchema::deserialize(&Params::new()).unwrap_err();
//! assert_eq!(errors.get("name"), Some("Required"));
//! ```

use std::collections::BTreeMap;
use std::marker::PhantomData;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::change::Change;
use crate::credit::{CreditNames, Credits, Role};
use crate::film::{FilmChanges, FilmFilter, NewFilm};
use crate::person::{NewPerson, PersonChanges, PersonFilter};
use crate::projection::FieldName;
use crate::validators::{FieldError, NonNegative, Uri, UriValidator, check_min};

/// Request parameters, keyed by field name.
pub type Params = Map<String, Value>;

//////////////////////////////////////////// FieldErrors ///////////////////////////////////////////

/// Failure messages keyed by field name (or `field.index` for list items).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// An empty error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure for `field`, keeping the first message if one exists.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    /// The message recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Folds every failure of `other` into this map.
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.insert(field, message);
        }
    }

    /// True if `field` failed.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// True if nothing failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failed fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<FieldError> for FieldErrors {
    fn from(err: FieldError) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(err.field, err.message);
        errors
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/////////////////////////////////////////////// Schema ///////////////////////////////////////////////

/// Coerces a parameter map into the typed input of one operation.
pub trait Schema {
    /// The validated record.
    type Output;

    /// Validates `params`, collecting every failure.
    fn deserialize(params: &Params) -> Result<Self::Output, FieldErrors>;
}

////////////////////////////////////////////// Coercion /////////////////////////////////////////////

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Turns a scalar, a comma-delimited string, or a list into a uniform list.
///
/// A string is split on commas and its items are trimmed.  The items of an
/// actual list are kept whole, so a repeated key can carry values that contain
/// commas.  Blank items are dropped either way.
pub fn sequence(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .filter(|item| match item {
                Value::String(s) => !s.trim().is_empty(),
                other => !other.is_null(),
            })
            .cloned()
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_string()))
            .collect(),
        other => vec![other.clone()],
    }
}

fn coerce_integer(value: &Value) -> Result<i64, String> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| format!("\"{}\" is not a number", display(value)))
}

/// Reads fields out of a parameter map, accumulating failures.
struct Reader<'a> {
    params: &'a Params,
    errors: FieldErrors,
}

impl<'a> Reader<'a> {
    fn new(params: &'a Params) -> Self {
        Self {
            params,
            errors: FieldErrors::new(),
        }
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.params.get(field)
    }

    fn record<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.errors.insert(err.field, err.message);
                None
            }
        }
    }

    fn text(&mut self, field: &str) -> Option<String> {
        let value = self.get(field)?;
        match value {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Array(_) | Value::Object(_) => {
                self.errors
                    .insert(field, format!("\"{}\" is not a string", display(value)));
                None
            }
        }
    }

    fn required_text(&mut self, field: &str) -> Option<String> {
        let value = self.text(field);
        if value.is_none() && !self.errors.contains(field) {
            self.errors.insert(field, "Required");
        }
        value
    }

    fn change_text(&mut self, field: &str) -> Change<String> {
        match self.get(field) {
            None => Change::Keep,
            Some(value) if is_blank(value) => Change::Clear,
            Some(_) => self.text(field).map_or(Change::Keep, Change::Set),
        }
    }

    fn integer(&mut self, field: &str) -> Option<i64> {
        let value = self.get(field)?;
        if is_blank(value) {
            return None;
        }
        match coerce_integer(value) {
            Ok(n) => Some(n),
            Err(message) => {
                self.errors.insert(field, message);
                None
            }
        }
    }

    fn non_negative(&mut self, field: &str) -> Option<NonNegative> {
        let value = self.integer(field)?;
        self.record(NonNegative::new(field, value))
    }

    fn change_non_negative(&mut self, field: &str) -> Change<NonNegative> {
        match self.get(field) {
            None => Change::Keep,
            Some(value) if is_blank(value) => Change::Clear,
            Some(_) => self.non_negative(field).map_or(Change::Keep, Change::Set),
        }
    }

    fn uri(&mut self, field: &str) -> Option<Uri> {
        let value = self.text(field)?;
        self.record(UriValidator::default().check(field, &value))?;
        Uri::parse(value)
    }

    fn change_uri(&mut self, field: &str) -> Change<Uri> {
        match self.get(field) {
            None => Change::Keep,
            Some(value) if is_blank(value) => Change::Clear,
            Some(_) => self.uri(field).map_or(Change::Keep, Change::Set),
        }
    }

    /// `None` when the field is absent; a blank value yields the empty list.
    fn id_list(&mut self, field: &str) -> Option<Vec<i64>> {
        let value = self.get(field)?;
        let mut ids: Vec<i64> = Vec::new();
        for (index, item) in sequence(value).iter().enumerate() {
            let key = format!("{}.{}", field, index);
            let id = match coerce_integer(item) {
                Ok(id) => id,
                Err(message) => {
                    self.errors.insert(key, message);
                    continue;
                }
            };
            let Some(id) = self.record(check_min(&key, id, 1)) else {
                continue;
            };
            if ids.contains(&id) {
                self.errors
                    .insert(key, format!("{} appears more than once", id));
                continue;
            }
            ids.push(id);
        }
        Some(ids)
    }

    fn names(&self, field: &str) -> Vec<String> {
        self.get(field)
            .map(|value| sequence(value).iter().map(display).collect())
            .unwrap_or_default()
    }

    fn choices<F: FieldName>(&mut self, field: &str) -> Vec<F> {
        let Some(value) = self.get(field) else {
            return Vec::new();
        };
        let mut chosen = Vec::new();
        for (index, item) in sequence(value).iter().enumerate() {
            let name = display(item);
            match F::parse(&name) {
                Some(choice) if !chosen.contains(&choice) => chosen.push(choice),
                Some(_) => {}
                None => {
                    self.errors.insert(
                        format!("{}.{}", field, index),
                        format!("\"{}\" is not one of {}", name, F::names().join(", ")),
                    );
                }
            }
        }
        chosen
    }

    fn credits(&mut self, field_of: fn(Role) -> &'static str, fill_missing: bool) -> Credits {
        let mut credits = Credits::new();
        for role in Role::ALL {
            match self.id_list(field_of(role)) {
                Some(ids) => credits.set(role, Some(ids)),
                None if fill_missing => credits.set(role, None),
                None => {}
            }
        }
        credits
    }

    fn credit_names(&self, field_of: fn(Role) -> &'static str) -> CreditNames {
        let mut names = CreditNames::default();
        for role in Role::ALL {
            let values = self.names(field_of(role));
            if !values.is_empty() {
                names.extend(role, values);
            }
        }
        names
    }

    fn finish<T>(self, output: T) -> Result<T, FieldErrors> {
        if self.errors.is_empty() {
            Ok(output)
        } else {
            Err(self.errors)
        }
    }
}

////////////////////////////////////////////// Shared //////////////////////////////////////////////

/// Validates the identifier segment of a row path, passed as `{"id": ...}`.
pub struct IdSchema;

impl Schema for IdSchema {
    type Output = i64;

    fn deserialize(params: &Params) -> Result<i64, FieldErrors> {
        let mut reader = Reader::new(params);
        let id = match reader.integer("id") {
            Some(id) => reader.record(check_min("id", id, 1)),
            None => {
                if !reader.errors.contains("id") {
                    reader.errors.insert("id", "Required");
                }
                None
            }
        };
        let id = id.unwrap_or_default();
        reader.finish(id)
    }
}

/// Validates an optional `fields` projection against the canonical field list of `F`.
pub struct FieldsSchema<F>(PhantomData<F>);

impl<F: FieldName> Schema for FieldsSchema<F> {
    type Output = Vec<F>;

    fn deserialize(params: &Params) -> Result<Vec<F>, FieldErrors> {
        let mut reader = Reader::new(params);
        let fields = reader.choices::<F>("fields");
        reader.finish(fields)
    }
}

/// `fields` projection for people.
pub type PersonFieldsSchema = FieldsSchema<crate::person::PersonField>;

/// `fields` projection for films.
pub type FilmFieldsSchema = FieldsSchema<crate::film::FilmField>;

////////////////////////////////////////////// Person //////////////////////////////////////////////

/// Input for creating a person.
pub struct CreatePersonSchema;

impl Schema for CreatePersonSchema {
    type Output = NewPerson;

    fn deserialize(params: &Params) -> Result<NewPerson, FieldErrors> {
        let mut reader = Reader::new(params);
        let name = reader.required_text("name");
        let image_uri = reader.uri("image_uri");
        let credits = reader.credits(Role::person_field, true);
        reader.finish(NewPerson {
            name: name.unwrap_or_default(),
            image_uri,
            credits,
        })
    }
}

/// Input for changing a person; nothing is mandatory.
pub struct UpdatePersonSchema;

impl Schema for UpdatePersonSchema {
    type Output = PersonChanges;

    fn deserialize(params: &Params) -> Result<PersonChanges, FieldErrors> {
        let mut reader = Reader::new(params);
        let name = match reader.get("name") {
            Some(_) => reader.required_text("name"),
            None => None,
        };
        let image_uri = reader.change_uri("image_uri");
        let credits = reader.credits(Role::person_field, false);
        reader.finish(PersonChanges {
            name,
            image_uri,
            credits,
        })
    }
}

/// Constraints for listing people.
pub struct PersonFilterSchema;

impl Schema for PersonFilterSchema {
    type Output = PersonFilter;

    fn deserialize(params: &Params) -> Result<PersonFilter, FieldErrors> {
        let mut reader = Reader::new(params);
        let name = reader.text("name");
        let image_uri = reader.text("image_uri");
        let credits = reader.credit_names(Role::person_field);
        reader.finish(PersonFilter {
            name,
            image_uri,
            credits,
        })
    }
}

/////////////////////////////////////////////// Film ///////////////////////////////////////////////

/// Input for creating a film.
pub struct CreateFilmSchema;

impl Schema for CreateFilmSchema {
    type Output = NewFilm;

    fn deserialize(params: &Params) -> Result<NewFilm, FieldErrors> {
        let mut reader = Reader::new(params);
        let title = reader.required_text("title");
        let plot = reader.text("plot");
        let rating = reader.text("rating");
        let year = reader.non_negative("year");
        let running_time = reader.non_negative("running_time");
        let poster_uri = reader.uri("poster_uri");
        let trailer_uri = reader.uri("trailer_uri");
        let wiki_uri = reader.uri("wiki_uri");
        let credits = reader.credits(Role::film_field, true);
        reader.finish(NewFilm {
            title: title.unwrap_or_default(),
            plot,
            rating,
            year,
            running_time,
            poster_uri,
            trailer_uri,
            wiki_uri,
            credits,
        })
    }
}

/// Input for changing a film; nothing is mandatory.
pub struct UpdateFilmSchema;

impl Schema for UpdateFilmSchema {
    type Output = FilmChanges;

    fn deserialize(params: &Params) -> Result<FilmChanges, FieldErrors> {
        let mut reader = Reader::new(params);
        let title = match reader.get("title") {
            Some(_) => reader.required_text("title"),
            None => None,
        };
        let changes = FilmChanges {
            title,
            plot: reader.change_text("plot"),
            rating: reader.change_text("rating"),
            year: reader.change_non_negative("year"),
            running_time: reader.change_non_negative("running_time"),
            poster_uri: reader.change_uri("poster_uri"),
            trailer_uri: reader.change_uri("trailer_uri"),
            wiki_uri: reader.change_uri("wiki_uri"),
            credits: reader.credits(Role::film_field, false),
        };
        reader.finish(changes)
    }
}

/// Constraints for listing films.
pub struct FilmFilterSchema;

impl Schema for FilmFilterSchema {
    type Output = FilmFilter;

    fn deserialize(params: &Params) -> Result<FilmFilter, FieldErrors> {
        let mut reader = Reader::new(params);
        let filter = FilmFilter {
            title: reader.text("title"),
            plot: reader.text("plot"),
            rating: reader.text("rating"),
            year: reader.non_negative("year").map(NonNegative::get),
            running_time: reader.non_negative("running_time").map(NonNegative::get),
            poster_uri: reader.text("poster_uri"),
            trailer_uri: reader.text("trailer_uri"),
            wiki_uri: reader.text("wiki_uri"),
            credits: reader.credit_names(Role::film_field),
        };
        reader.finish(filter)
    }
}
