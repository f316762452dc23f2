//! Credit rows linking films to people.
//!
//! One row `(film_id, person_id, role)` backs both the film's relation set and
//! the person's reverse list, so both sides read and write the same table.

use sqlx::{QueryBuilder, Sqlite, Transaction};

use super::{SqlResult, classify};
use crate::DataStoreError;
use crate::credit::Role;

fn parse_role(value: &str) -> SqlResult<Role> {
    value.parse::<Role>().map_err(|e| {
        tracing::error!(role = value, "corrupt credit row");
        DataStoreError::Internal(e)
    })
}

/// Replaces the people credited on `film_id` in `role`.
///
/// # Returns
/// * `Ok(())` - Credits replaced
/// * `Err(DataStoreError::InvalidReference)` - A person id does not exist
/// * `Err(DataStoreError::Internal)` - Database error
pub async fn replace_for_film(
    tx: &mut Transaction<'_, Sqlite>,
    film_id: i64,
    role: Role,
    person_ids: &[i64],
) -> SqlResult<()> {
    sqlx::query("DELETE FROM credit WHERE film_id = ? AND role = ?")
        .bind(film_id)
        .bind(role.as_str())
        .execute(&mut **tx)
        .await
        .map_err(|e| classify("clearing film credits", e))?;
    for &person_id in person_ids {
        if !super::person::exists(tx, person_id).await? {
            return Err(DataStoreError::InvalidReference {
                field: role.film_field(),
                id: person_id,
            });
        }
        insert(tx, film_id, person_id, role).await?;
    }
    Ok(())
}

/// Replaces the films crediting `person_id` in `role`.
///
/// # Returns
/// * `Ok(())` - Credits replaced
/// * `Err(DataStoreError::InvalidReference)` - A film id does not exist
/// * `Err(DataStoreError::Internal)` - Database error
pub async fn replace_for_person(
    tx: &mut Transaction<'_, Sqlite>,
    person_id: i64,
    role: Role,
    film_ids: &[i64],
) -> SqlResult<()> {
    sqlx::query("DELETE FROM credit WHERE person_id = ? AND role = ?")
        .bind(person_id)
        .bind(role.as_str())
        .execute(&mut **tx)
        .await
        .map_err(|e| classify("clearing person credits", e))?;
    for &film_id in film_ids {
        if !super::film::exists(tx, film_id).await? {
            return Err(DataStoreError::InvalidReference {
                field: role.person_field(),
                id: film_id,
            });
        }
        insert(tx, film_id, person_id, role).await?;
    }
    Ok(())
}

async fn insert(
    tx: &mut Transaction<'_, Sqlite>,
    film_id: i64,
    person_id: i64,
    role: Role,
) -> SqlResult<()> {
    sqlx::query("INSERT OR IGNORE INTO credit (film_id, person_id, role) VALUES (?, ?, ?)")
        .bind(film_id)
        .bind(person_id)
        .bind(role.as_str())
        .execute(&mut **tx)
        .await
        .map_err(|e| classify("inserting credit", e))?;
    Ok(())
}

/// The names of everyone credited on `film_id`, by role, in the order they were credited.
pub async fn names_for_film(
    tx: &mut Transaction<'_, Sqlite>,
    film_id: i64,
) -> SqlResult<Vec<(Role, String)>> {
    let rows = sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT c.role, p.name
        FROM credit c JOIN person p ON p.id = c.person_id
        WHERE c.film_id = ?
        ORDER BY c.rowid
        "#,
    )
    .bind(film_id)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| classify("reading film credits", e))?;
    rows.into_iter()
        .map(|(role, name)| Ok((parse_role(&role)?, name)))
        .collect()
}

/// The titles of every film crediting `person_id`, by role, in the order they were credited.
pub async fn titles_for_person(
    tx: &mut Transaction<'_, Sqlite>,
    person_id: i64,
) -> SqlResult<Vec<(Role, String)>> {
    let rows = sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT c.role, f.title
        FROM credit c JOIN film f ON f.id = c.film_id
        WHERE c.person_id = ?
        ORDER BY c.rowid
        "#,
    )
    .bind(person_id)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| classify("reading person credits", e))?;
    rows.into_iter()
        .map(|(role, title)| Ok((parse_role(&role)?, title)))
        .collect()
}

/// Requires the film row in scope to credit a person named exactly `name` in `role`.
pub fn push_film_credits(qb: &mut QueryBuilder<'_, Sqlite>, role: Role, name: &str) {
    qb.push(
        " AND EXISTS (SELECT 1 FROM credit c JOIN person p ON p.id = c.person_id \
         WHERE c.film_id = film.id AND c.role = ",
    )
    .push_bind(role.as_str())
    .push(" AND p.name = ")
    .push_bind(name.to_string())
    .push(")");
}

/// Requires the person row in scope to be credited in `role` on a film titled exactly `title`.
pub fn push_person_credits(qb: &mut QueryBuilder<'_, Sqlite>, role: Role, title: &str) {
    qb.push(
        " AND EXISTS (SELECT 1 FROM credit c JOIN film f ON f.id = c.film_id \
         WHERE c.person_id = person.id AND c.role = ",
    )
    .push_bind(role.as_str())
    .push(" AND f.title = ")
    .push_bind(title.to_string())
    .push(")");
}
