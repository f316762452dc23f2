use serde_json::{Value, json};

use crate::change::Change;
use crate::credit::{CreditNames, Credits, Role};
use crate::projection::{FieldName, Record};
use crate::validators::{NonNegative, Uri};

/////////////////////////////////////////////// Film ///////////////////////////////////////////////

/// A film and the people credited on it.
///
/// Each relation list holds the names of the people credited in that role.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Film {
    /// Surrogate key.
    pub id: i64,
    /// Unique title.
    pub title: String,
    /// Plot summary.
    pub plot: Option<String>,
    /// Certification, e.g. `R`.
    pub rating: Option<String>,
    /// Year of first release.
    pub year: Option<i64>,
    /// Running time in minutes.
    pub running_time: Option<i64>,
    /// Remote poster image.
    pub poster_uri: Option<String>,
    /// Remote trailer.
    pub trailer_uri: Option<String>,
    /// Remote wiki page.
    pub wiki_uri: Option<String>,
    /// Producers.
    pub producers: Vec<String>,
    /// Directors.
    pub directors: Vec<String>,
    /// Writers.
    pub writers: Vec<String>,
    /// Editors.
    pub editors: Vec<String>,
    /// Cast.
    pub cast: Vec<String>,
    /// Musicians.
    pub musicians: Vec<String>,
}

impl Film {
    /// The names credited on this film in `role`.
    pub fn credits(&self, role: Role) -> &[String] {
        match role {
            Role::Producer => &self.producers,
            Role::Director => &self.directors,
            Role::Writer => &self.writers,
            Role::Editor => &self.editors,
            Role::Cast => &self.cast,
            Role::Musician => &self.musicians,
        }
    }

    pub(crate) fn credits_mut(&mut self, role: Role) -> &mut Vec<String> {
        match role {
            Role::Producer => &mut self.producers,
            Role::Director => &mut self.directors,
            Role::Writer => &mut self.writers,
            Role::Editor => &mut self.editors,
            Role::Cast => &mut self.cast,
            Role::Musician => &mut self.musicians,
        }
    }
}

/// The fields a caller may request from a film.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilmField {
    /// `id`
    Id,
    /// `title`
    Title,
    /// `plot`
    Plot,
    /// `rating`
    Rating,
    /// `year`
    Year,
    /// `running_time`
    RunningTime,
    /// `poster_uri`
    PosterUri,
    /// `trailer_uri`
    TrailerUri,
    /// `wiki_uri`
    WikiUri,
    /// One of the relation lists.
    Credits(Role),
}

impl FieldName for FilmField {
    const ALL: &'static [Self] = &[
        FilmField::Id,
        FilmField::Title,
        FilmField::Plot,
        FilmField::Rating,
        FilmField::Year,
        FilmField::RunningTime,
        FilmField::PosterUri,
        FilmField::TrailerUri,
        FilmField::WikiUri,
        FilmField::Credits(Role::Producer),
        FilmField::Credits(Role::Director),
        FilmField::Credits(Role::Writer),
        FilmField::Credits(Role::Editor),
        FilmField::Credits(Role::Cast),
        FilmField::Credits(Role::Musician),
    ];

    fn as_str(self) -> &'static str {
        match self {
            FilmField::Id => "id",
            FilmField::Title => "title",
            FilmField::Plot => "plot",
            FilmField::Rating => "rating",
            FilmField::Year => "year",
            FilmField::RunningTime => "running_time",
            FilmField::PosterUri => "poster_uri",
            FilmField::TrailerUri => "trailer_uri",
            FilmField::WikiUri => "wiki_uri",
            FilmField::Credits(role) => role.film_field(),
        }
    }
}

impl Record for Film {
    type Field = FilmField;

    fn id(&self) -> i64 {
        self.id
    }

    fn value(&self, field: FilmField) -> Value {
        match field {
            FilmField::Id => json!(self.id),
            FilmField::Title => json!(self.title),
            FilmField::Plot => json!(self.plot),
            FilmField::Rating => json!(self.rating),
            FilmField::Year => json!(self.year),
            FilmField::RunningTime => json!(self.running_time),
            FilmField::PosterUri => json!(self.poster_uri),
            FilmField::TrailerUri => json!(self.trailer_uri),
            FilmField::WikiUri => json!(self.wiki_uri),
            FilmField::Credits(role) => json!(self.credits(role)),
        }
    }
}

/////////////////////////////////////////////// Inputs ///////////////////////////////////////////////

/// A validated request to create a film.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFilm {
    /// Unique title.
    pub title: String,
    /// Plot summary.
    pub plot: Option<String>,
    /// Certification.
    pub rating: Option<String>,
    /// Year of first release.
    pub year: Option<NonNegative>,
    /// Running time in minutes.
    pub running_time: Option<NonNegative>,
    /// Remote poster image.
    pub poster_uri: Option<Uri>,
    /// Remote trailer.
    pub trailer_uri: Option<Uri>,
    /// Remote wiki page.
    pub wiki_uri: Option<Uri>,
    /// Person ids to credit, keyed by role; unset roles start empty.
    pub credits: Credits,
}

impl NewFilm {
    /// A film with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            plot: None,
            rating: None,
            year: None,
            running_time: None,
            poster_uri: None,
            trailer_uri: None,
            wiki_uri: None,
            credits: Credits::new(),
        }
    }

    /// Sets the release year.
    pub fn with_year(mut self, year: NonNegative) -> Self {
        self.year = Some(year);
        self
    }

    /// Sets the running time.
    pub fn with_running_time(mut self, minutes: NonNegative) -> Self {
        self.running_time = Some(minutes);
        self
    }

    /// Sets the rating.
    pub fn with_rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    /// Sets the person ids credited in `role`.
    pub fn with_credits(mut self, role: Role, person_ids: Option<Vec<i64>>) -> Self {
        self.credits.set(role, person_ids);
        self
    }
}

/// A validated request to change a film.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilmChanges {
    /// New title, if one was supplied.
    pub title: Option<String>,
    /// Change to the plot.
    pub plot: Change<String>,
    /// Change to the rating.
    pub rating: Change<String>,
    /// Change to the release year.
    pub year: Change<NonNegative>,
    /// Change to the running time.
    pub running_time: Change<NonNegative>,
    /// Change to the poster.
    pub poster_uri: Change<Uri>,
    /// Change to the trailer.
    pub trailer_uri: Change<Uri>,
    /// Change to the wiki page.
    pub wiki_uri: Change<Uri>,
    /// Relation sets to replace.
    pub credits: Credits,
}

impl FilmChanges {
    /// True when the request names nothing to change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && !self.plot.is_write()
            && !self.rating.is_write()
            && !self.year.is_write()
            && !self.running_time.is_write()
            && !self.poster_uri.is_write()
            && !self.trailer_uri.is_write()
            && !self.wiki_uri.is_write()
            && self.credits.is_empty()
    }
}

/// A validated set of constraints for listing films.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilmFilter {
    /// Substring of the title.
    pub title: Option<String>,
    /// Substring of the plot.
    pub plot: Option<String>,
    /// Exact rating.
    pub rating: Option<String>,
    /// Exact release year.
    pub year: Option<i64>,
    /// Exact running time.
    pub running_time: Option<i64>,
    /// Substring of the poster URI.
    pub poster_uri: Option<String>,
    /// Substring of the trailer URI.
    pub trailer_uri: Option<String>,
    /// Substring of the wiki URI.
    pub wiki_uri: Option<String>,
    /// Names of people the film must credit.
    pub credits: CreditNames,
}
