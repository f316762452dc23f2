//! Collection and row handles over the catalog tables.
//!
//! A [`Table`] ties one stored type to its schemas and its SQL functions.
//! [`Collection`] and [`Row`] are the request-scoped handles the views work
//! through; both borrow the request's [`Session`].

use std::marker::PhantomData;
use std::sync::Arc;

use axum::async_trait;
use sqlx::{QueryBuilder, Sqlite, Transaction};

use crate::DataStoreError;
use crate::film::{Film, FilmChanges, FilmFilter, NewFilm};
use crate::person::{NewPerson, Person, PersonChanges, PersonFilter};
use crate::projection::Record;
use crate::schema::{
    CreateFilmSchema, CreatePersonSchema, FilmFieldsSchema, FilmFilterSchema, PersonFieldsSchema,
    PersonFilterSchema, Schema, UpdateFilmSchema, UpdatePersonSchema,
};
use crate::session::Session;
use crate::sql::{self, Match, SqlResult, classify, push_match};
use crate::traversal::{Node, TableKind};

/////////////////////////////////////////////// Table //////////////////////////////////////////////

/// One stored type: its records, its validated inputs, and its queries.
#[async_trait]
pub trait Table: Send + Sync + 'static {
    /// The record a row reads back as.
    type Record: Record + Send + Sync;
    /// Validated create input.
    type Create: Send + Sync;
    /// Validated update input.
    type Update: Send + Sync;
    /// Validated listing constraints.
    type Filter: Send + Sync;

    /// Schema for [`Table::Create`].
    type CreateSchema: Schema<Output = Self::Create>;
    /// Schema for [`Table::Update`].
    type UpdateSchema: Schema<Output = Self::Update>;
    /// Schema for [`Table::Filter`].
    type FilterSchema: Schema<Output = Self::Filter>;
    /// Schema for the `fields` projection.
    type FieldsSchema: Schema<Output = Vec<<Self::Record as Record>::Field>>;

    /// The SQL table name.
    const TABLE: &'static str;
    /// The collection kind this table is mounted as.
    const KIND: TableKind;

    /// Inserts a row and returns its id.
    async fn insert(tx: &mut Transaction<'_, Sqlite>, data: &Self::Create) -> SqlResult<i64>;

    /// Reads one row.
    async fn get(tx: &mut Transaction<'_, Sqlite>, id: i64) -> SqlResult<Option<Self::Record>>;

    /// Applies changes; `false` when the row does not exist.
    async fn update(
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
        changes: &Self::Update,
    ) -> SqlResult<bool>;

    /// Removes one row; `false` when it did not exist.
    async fn delete(tx: &mut Transaction<'_, Sqlite>, id: i64) -> SqlResult<bool>;

    /// True when `changes` names nothing to write.
    fn is_noop(changes: &Self::Update) -> bool;

    /// Per-column constraints for `filter`.
    fn matches(filter: &Self::Filter) -> Vec<Match>;

    /// Narrows a `SELECT id FROM <table> WHERE 1 = 1` query to rows matching `filter`.
    fn filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &Self::Filter) {
        for constraint in Self::matches(filter) {
            push_match(qb, constraint);
        }
    }
}

fn contains(column: &'static str, value: &Option<String>) -> Option<Match> {
    value
        .as_ref()
        .map(|needle| Match::Contains(column, needle.clone()))
}

/// The `person` table.
pub struct People;

#[async_trait]
impl Table for People {
    type Record = Person;
    type Create = NewPerson;
    type Update = PersonChanges;
    type Filter = PersonFilter;
    type CreateSchema = CreatePersonSchema;
    type UpdateSchema = UpdatePersonSchema;
    type FilterSchema = PersonFilterSchema;
    type FieldsSchema = PersonFieldsSchema;

    const TABLE: &'static str = "person";
    const KIND: TableKind = TableKind::People;

    async fn insert(tx: &mut Transaction<'_, Sqlite>, data: &NewPerson) -> SqlResult<i64> {
        sql::person::create(tx, data).await
    }

    async fn get(tx: &mut Transaction<'_, Sqlite>, id: i64) -> SqlResult<Option<Person>> {
        sql::person::get(tx, id).await
    }

    async fn update(
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
        changes: &PersonChanges,
    ) -> SqlResult<bool> {
        sql::person::update(tx, id, changes).await
    }

    async fn delete(tx: &mut Transaction<'_, Sqlite>, id: i64) -> SqlResult<bool> {
        sql::person::delete(tx, id).await
    }

    fn is_noop(changes: &PersonChanges) -> bool {
        changes.is_empty()
    }

    fn matches(filter: &PersonFilter) -> Vec<Match> {
        [
            contains("name", &filter.name),
            contains("image_uri", &filter.image_uri),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &PersonFilter) {
        for constraint in Self::matches(filter) {
            push_match(qb, constraint);
        }
        for (role, title) in filter.credits.iter() {
            sql::credit::push_person_credits(qb, role, title);
        }
    }
}

/// The `film` table.
pub struct Films;

#[async_trait]
impl Table for Films {
    type Record = Film;
    type Create = NewFilm;
    type Update = FilmChanges;
    type Filter = FilmFilter;
    type CreateSchema = CreateFilmSchema;
    type UpdateSchema = UpdateFilmSchema;
    type FilterSchema = FilmFilterSchema;
    type FieldsSchema = FilmFieldsSchema;

    const TABLE: &'static str = "film";
    const KIND: TableKind = TableKind::Films;

    async fn insert(tx: &mut Transaction<'_, Sqlite>, data: &NewFilm) -> SqlResult<i64> {
        sql::film::create(tx, data).await
    }

    async fn get(tx: &mut Transaction<'_, Sqlite>, id: i64) -> SqlResult<Option<Film>> {
        sql::film::get(tx, id).await
    }

    async fn update(
        tx: &mut Transaction<'_, Sqlite>,
        id: i64,
        changes: &FilmChanges,
    ) -> SqlResult<bool> {
        sql::film::update(tx, id, changes).await
    }

    async fn delete(tx: &mut Transaction<'_, Sqlite>, id: i64) -> SqlResult<bool> {
        sql::film::delete(tx, id).await
    }

    fn is_noop(changes: &FilmChanges) -> bool {
        changes.is_empty()
    }

    fn matches(filter: &FilmFilter) -> Vec<Match> {
        let mut matches: Vec<Match> = [
            contains("title", &filter.title),
            contains("plot", &filter.plot),
            contains("poster_uri", &filter.poster_uri),
            contains("trailer_uri", &filter.trailer_uri),
            contains("wiki_uri", &filter.wiki_uri),
        ]
        .into_iter()
        .flatten()
        .collect();
        if let Some(rating) = &filter.rating {
            matches.push(Match::Equals("rating", rating.clone()));
        }
        if let Some(year) = filter.year {
            matches.push(Match::EqualsInteger("year", year));
        }
        if let Some(running_time) = filter.running_time {
            matches.push(Match::EqualsInteger("running_time", running_time));
        }
        matches
    }

    fn filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &FilmFilter) {
        for constraint in Self::matches(filter) {
            push_match(qb, constraint);
        }
        for (role, name) in filter.credits.iter() {
            sql::credit::push_film_credits(qb, role, name);
        }
    }
}

///////////////////////////////////////////// Collection /////////////////////////////////////////////

/// A handle on one table, bound to the request's unit of work.
pub struct Collection<'s, T: Table> {
    node: Arc<Node>,
    session: &'s mut Session,
    table: PhantomData<T>,
}

impl<'s, T: Table> Collection<'s, T> {
    /// Binds the table mounted at `node` to `session`.
    pub fn new(node: Arc<Node>, session: &'s mut Session) -> Self {
        Self {
            node,
            session,
            table: PhantomData,
        }
    }

    /// The node this collection is mounted at.
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Persists a new row inside a savepoint.
    ///
    /// A uniqueness conflict rolls back only the savepoint and yields `None`.
    pub async fn create(&mut self, data: &T::Create) -> SqlResult<Option<T::Record>> {
        let tx = self.session.tx();
        let mut savepoint = sqlx::Connection::begin(&mut **tx)
            .await
            .map_err(|e| classify("opening savepoint", e))?;
        match T::insert(&mut savepoint, data).await {
            Ok(id) => {
                savepoint
                    .commit()
                    .await
                    .map_err(|e| classify("releasing savepoint", e))?;
                T::get(self.session.tx(), id).await
            }
            Err(err) => {
                savepoint
                    .rollback()
                    .await
                    .map_err(|e| classify("rolling back savepoint", e))?;
                match err {
                    DataStoreError::AlreadyExists => {
                        tracing::debug!(table = T::TABLE, "create conflicts with existing row");
                        Ok(None)
                    }
                    err => Err(err),
                }
            }
        }
    }

    /// Every row matching `filter`, ordered by id.
    pub async fn retrieve(&mut self, filter: &T::Filter) -> SqlResult<Vec<T::Record>> {
        let mut qb = QueryBuilder::new(format!("SELECT id FROM {} WHERE 1 = 1", T::TABLE));
        Self::filter(&mut qb, filter);
        qb.push(" ORDER BY id");
        let ids = sql::select_ids(self.session.tx(), qb).await?;
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = T::get(self.session.tx(), id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Narrows a listing query to rows matching `filter`.
    pub fn filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &T::Filter) {
        T::filter(qb, filter)
    }
}

//////////////////////////////////////////////// Row ///////////////////////////////////////////////

/// A handle on one row, addressed by id; nothing is read until asked.
pub struct Row<'s, T: Table> {
    node: Arc<Node>,
    id: i64,
    session: &'s mut Session,
    table: PhantomData<T>,
}

impl<'s, T: Table> Row<'s, T> {
    /// Binds row `id`, reached through `node`, to `session`.
    pub fn new(node: Arc<Node>, id: i64, session: &'s mut Session) -> Self {
        Self {
            node,
            id,
            session,
            table: PhantomData,
        }
    }

    /// The node this row was reached through.
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// The row's id.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Reads the row.
    pub async fn retrieve(&mut self) -> SqlResult<Option<T::Record>> {
        T::get(self.session.tx(), self.id).await
    }

    /// Applies `changes` inside a savepoint and returns the refreshed record.
    ///
    /// Yields `None` when nothing was supplied, the row does not exist, or the
    /// new unique key conflicts with another row.
    pub async fn update(&mut self, changes: &T::Update) -> SqlResult<Option<T::Record>> {
        if T::is_noop(changes) {
            return Ok(None);
        }
        let tx = self.session.tx();
        let mut savepoint = sqlx::Connection::begin(&mut **tx)
            .await
            .map_err(|e| classify("opening savepoint", e))?;
        match T::update(&mut savepoint, self.id, changes).await {
            Ok(true) => {
                savepoint
                    .commit()
                    .await
                    .map_err(|e| classify("releasing savepoint", e))?;
                self.retrieve().await
            }
            Ok(false) => {
                savepoint
                    .rollback()
                    .await
                    .map_err(|e| classify("rolling back savepoint", e))?;
                Ok(None)
            }
            Err(err) => {
                savepoint
                    .rollback()
                    .await
                    .map_err(|e| classify("rolling back savepoint", e))?;
                match err {
                    DataStoreError::AlreadyExists => Ok(None),
                    err => Err(err),
                }
            }
        }
    }

    /// Removes the row; deleting a missing row succeeds.
    pub async fn delete(&mut self) -> SqlResult<()> {
        if !T::delete(self.session.tx(), self.id).await? {
            tracing::debug!(table = T::TABLE, id = self.id, "delete of missing row");
        }
        Ok(())
    }
}
