//! Person operations for the SQLite catalog.

use sqlx::{QueryBuilder, Sqlite, Transaction};

use super::{SqlResult, classify, credit, push_text_change};
use crate::DataStoreError;
use crate::person::{NewPerson, Person, PersonChanges};
use crate::validators::Uri;

/// Creates a person and the credits it names.
///
/// # Arguments
/// * `tx` - SQLite transaction
/// * `person` - The validated person to create
///
/// # Returns
/// * `Ok(id)` - Person created with the given id
/// * `Err(DataStoreError::AlreadyExists)` - The name is taken
/// * `Err(DataStoreError::InvalidReference)` - A credit names a missing film
/// * `Err(DataStoreError::Internal)` - Database error
pub async fn create(tx: &mut Transaction<'_, Sqlite>, person: &NewPerson) -> SqlResult<i64> {
    let result = sqlx::query("INSERT INTO person (name, image_uri) VALUES (?, ?)")
        .bind(&person.name)
        .bind(person.image_uri.as_ref().map(Uri::as_str))
        .execute(&mut **tx)
        .await;

    let id = match result {
        Ok(result) => result.last_insert_rowid(),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(DataStoreError::AlreadyExists);
        }
        Err(e) => {
            tracing::error!(error = %e, "database error creating person");
            return Err(DataStoreError::Internal(e.to_string()));
        }
    };
    for (role, film_ids) in person.credits.iter() {
        credit::replace_for_person(tx, id, role, film_ids).await?;
    }
    Ok(id)
}

/// True when a person with `id` exists.
pub async fn exists(tx: &mut Transaction<'_, Sqlite>, id: i64) -> SqlResult<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT id FROM person WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| classify("checking person", e))?;
    Ok(found.is_some())
}

/// Retrieves a person with every credit list filled in.
///
/// # Returns
/// * `Ok(Some(Person))` - Person found
/// * `Ok(None)` - Person not found
/// * `Err(DataStoreError::Internal)` - Database error
pub async fn get(tx: &mut Transaction<'_, Sqlite>, id: i64) -> SqlResult<Option<Person>> {
    let row = sqlx::query_as::<_, (i64, String, Option<String>)>(
        "SELECT id, name, image_uri FROM person WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| classify("reading person", e))?;

    let Some((id, name, image_uri)) = row else {
        return Ok(None);
    };
    let mut person = Person {
        id,
        name,
        image_uri,
        ..Default::default()
    };
    for (role, title) in credit::titles_for_person(tx, id).await? {
        person.credits_mut(role).push(title);
    }
    Ok(Some(person))
}

/// Applies `changes` to the person with `id`.
///
/// # Returns
/// * `Ok(true)` - Person updated
/// * `Ok(false)` - Person not found
/// * `Err(DataStoreError::AlreadyExists)` - The new name is taken
/// * `Err(DataStoreError::InvalidReference)` - A credit names a missing film
/// * `Err(DataStoreError::Internal)` - Database error
pub async fn update(
    tx: &mut Transaction<'_, Sqlite>,
    id: i64,
    changes: &PersonChanges,
) -> SqlResult<bool> {
    if !exists(tx, id).await? {
        return Ok(false);
    }
    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE person SET id = id");
    if let Some(name) = &changes.name {
        qb.push(", name = ").push_bind(name.clone());
    }
    push_text_change(
        &mut qb,
        "image_uri",
        &changes.image_uri.clone().map(Uri::into_string),
    );
    qb.push(" WHERE id = ").push_bind(id);
    qb.build()
        .execute(&mut **tx)
        .await
        .map_err(|e| classify("updating person", e))?;

    for (role, film_ids) in changes.credits.iter() {
        credit::replace_for_person(tx, id, role, film_ids).await?;
    }
    Ok(true)
}

/// Deletes the person with `id`; its credits cascade.
///
/// # Returns
/// * `Ok(true)` - Person deleted
/// * `Ok(false)` - Person did not exist
/// * `Err(DataStoreError::Internal)` - Database error
pub async fn delete(tx: &mut Transaction<'_, Sqlite>, id: i64) -> SqlResult<bool> {
    let result = sqlx::query("DELETE FROM person WHERE id = ?")
        .bind(id)
        .execute(&mut **tx)
        .await
        .map_err(|e| classify("deleting person", e))?;
    Ok(result.rows_affected() > 0)
}
