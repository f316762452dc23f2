//! Film operations for the SQLite catalog.

use sqlx::{QueryBuilder, Sqlite, Transaction};

use super::{SqlResult, classify, credit, push_integer_change, push_text_change};
use crate::DataStoreError;
use crate::film::{Film, FilmChanges, NewFilm};
use crate::validators::{NonNegative, Uri};

type FilmRow = (
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<i64>,
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// Creates a film and the credits it names.
///
/// # Returns
/// * `Ok(id)` - Film created with the given id
/// * `Err(DataStoreError::AlreadyExists)` - The title is taken
/// * `Err(DataStoreError::InvalidReference)` - A credit names a missing person
/// * `Err(DataStoreError::Internal)` - Database error
pub async fn create(tx: &mut Transaction<'_, Sqlite>, film: &NewFilm) -> SqlResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO film (title, plot, rating, year, running_time, poster_uri, trailer_uri, wiki_uri)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&film.title)
    .bind(film.plot.as_deref())
    .bind(film.rating.as_deref())
    .bind(film.year.map(NonNegative::get))
    .bind(film.running_time.map(NonNegative::get))
    .bind(film.poster_uri.as_ref().map(Uri::as_str))
    .bind(film.trailer_uri.as_ref().map(Uri::as_str))
    .bind(film.wiki_uri.as_ref().map(Uri::as_str))
    .execute(&mut **tx)
    .await;

    let id = match result {
        Ok(result) => result.last_insert_rowid(),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(DataStoreError::AlreadyExists);
        }
        Err(e) => {
            tracing::error!(error = %e, "database error creating film");
            return Err(DataStoreError::Internal(e.to_string()));
        }
    };
    for (role, person_ids) in film.credits.iter() {
        credit::replace_for_film(tx, id, role, person_ids).await?;
    }
    Ok(id)
}

/// True when a film with `id` exists.
pub async fn exists(tx: &mut Transaction<'_, Sqlite>, id: i64) -> SqlResult<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT id FROM film WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| classify("checking film", e))?;
    Ok(found.is_some())
}

/// Retrieves a film with every relation list filled in.
///
/// # Returns
/// * `Ok(Some(Film))` - Film found
/// * `Ok(None)` - Film not found
/// * `Err(DataStoreError::Internal)` - Database error
pub async fn get(tx: &mut Transaction<'_, Sqlite>, id: i64) -> SqlResult<Option<Film>> {
    let row = sqlx::query_as::<_, FilmRow>(
        r#"
        SELECT id, title, plot, rating, year, running_time, poster_uri, trailer_uri, wiki_uri
        FROM film
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| classify("reading film", e))?;

    let Some((id, title, plot, rating, year, running_time, poster_uri, trailer_uri, wiki_uri)) =
        row
    else {
        return Ok(None);
    };
    let mut film = Film {
        id,
        title,
        plot,
        rating,
        year,
        running_time,
        poster_uri,
        trailer_uri,
        wiki_uri,
        ..Default::default()
    };
    for (role, name) in credit::names_for_film(tx, id).await? {
        film.credits_mut(role).push(name);
    }
    Ok(Some(film))
}

/// Applies `changes` to the film with `id`.
///
/// # Returns
/// * `Ok(true)` - Film updated
/// * `Ok(false)` - Film not found
/// * `Err(DataStoreError::AlreadyExists)` - The new title is taken
/// * `Err(DataStoreError::InvalidReference)` - A credit names a missing person
/// * `Err(DataStoreError::Internal)` - Database error
pub async fn update(
    tx: &mut Transaction<'_, Sqlite>,
    id: i64,
    changes: &FilmChanges,
) -> SqlResult<bool> {
    if !exists(tx, id).await? {
        return Ok(false);
    }
    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE film SET id = id");
    if let Some(title) = &changes.title {
        qb.push(", title = ").push_bind(title.clone());
    }
    push_text_change(&mut qb, "plot", &changes.plot);
    push_text_change(&mut qb, "rating", &changes.rating);
    push_integer_change(&mut qb, "year", &changes.year.clone().map(NonNegative::get));
    push_integer_change(
        &mut qb,
        "running_time",
        &changes.running_time.clone().map(NonNegative::get),
    );
    for (column, change) in [
        ("poster_uri", &changes.poster_uri),
        ("trailer_uri", &changes.trailer_uri),
        ("wiki_uri", &changes.wiki_uri),
    ] {
        push_text_change(&mut qb, column, &change.clone().map(Uri::into_string));
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.build()
        .execute(&mut **tx)
        .await
        .map_err(|e| classify("updating film", e))?;

    for (role, person_ids) in changes.credits.iter() {
        credit::replace_for_film(tx, id, role, person_ids).await?;
    }
    Ok(true)
}

/// Deletes the film with `id`; its credits cascade.
///
/// # Returns
/// * `Ok(true)` - Film deleted
/// * `Ok(false)` - Film did not exist
/// * `Err(DataStoreError::Internal)` - Database error
pub async fn delete(tx: &mut Transaction<'_, Sqlite>, id: i64) -> SqlResult<bool> {
    let result = sqlx::query("DELETE FROM film WHERE id = ?")
        .bind(id)
        .execute(&mut **tx)
        .await
        .map_err(|e| classify("deleting film", e))?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::Change;
    use crate::credit::Role;
    use crate::person::NewPerson;
    use crate::sql::tests::setup_test_db;

    fn year(value: i64) -> NonNegative {
        NonNegative::new("year", value).unwrap()
    }

    #[tokio::test]
    async fn create_then_get() {
        let pool = setup_test_db().await;
        let mut tx = pool.begin().await.unwrap();

        let film = NewFilm::new("Leaving Las Vegas")
            .with_year(year(1995))
            .with_rating("R");
        let id = create(&mut tx, &film).await.unwrap();
        let film = get(&mut tx, id).await.unwrap().unwrap();
        assert_eq!(film.title, "Leaving Las Vegas");
        assert_eq!(film.year, Some(1995));
        assert_eq!(film.rating.as_deref(), Some("R"));
        assert_eq!(film.running_time, None);
        assert!(film.cast.is_empty());
    }

    #[tokio::test]
    async fn zero_year_is_stored() {
        let pool = setup_test_db().await;
        let mut tx = pool.begin().await.unwrap();

        let id = create(&mut tx, &NewFilm::new("Untitled").with_year(year(0)))
            .await
            .unwrap();
        assert_eq!(get(&mut tx, id).await.unwrap().unwrap().year, Some(0));
    }

    #[tokio::test]
    async fn negative_year_is_refused_by_storage() {
        let pool = setup_test_db().await;
        let mut tx = pool.begin().await.unwrap();

        let result = sqlx::query("INSERT INTO film (title, year) VALUES ('Bad', -1)")
            .execute(&mut *tx)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn duplicate_title_already_exists() {
        let pool = setup_test_db().await;
        let mut tx = pool.begin().await.unwrap();

        create(&mut tx, &NewFilm::new("Con Air")).await.unwrap();
        let id = create(&mut tx, &NewFilm::new("Face/Off")).await.unwrap();
        let err = create(&mut tx, &NewFilm::new("Con Air")).await.unwrap_err();
        assert_eq!(err, DataStoreError::AlreadyExists);

        let changes = FilmChanges {
            title: Some("Con Air".to_string()),
            ..Default::default()
        };
        let err = update(&mut tx, id, &changes).await.unwrap_err();
        assert_eq!(err, DataStoreError::AlreadyExists);
    }

    #[tokio::test]
    async fn credits_read_back_as_names() {
        let pool = setup_test_db().await;
        let mut tx = pool.begin().await.unwrap();
        let woo = crate::sql::person::create(&mut tx, &NewPerson::new("John Woo"))
            .await
            .unwrap();
        let cage = crate::sql::person::create(&mut tx, &NewPerson::new("Nicolas Cage"))
            .await
            .unwrap();

        let film = NewFilm::new("Face/Off")
            .with_credits(Role::Director, Some(vec![woo]))
            .with_credits(Role::Cast, Some(vec![cage]));
        let id = create(&mut tx, &film).await.unwrap();
        let film = get(&mut tx, id).await.unwrap().unwrap();
        assert_eq!(film.directors, vec!["John Woo"]);
        assert_eq!(film.cast, vec!["Nicolas Cage"]);

        let person = crate::sql::person::get(&mut tx, cage).await.unwrap().unwrap();
        assert_eq!(person.cast_credits, vec!["Face/Off"]);
    }

    #[tokio::test]
    async fn update_clears_and_sets() {
        let pool = setup_test_db().await;
        let mut tx = pool.begin().await.unwrap();

        let film = NewFilm::new("Con Air")
            .with_year(year(1997))
            .with_running_time(NonNegative::new("running_time", 115).unwrap());
        let id = create(&mut tx, &film).await.unwrap();

        let changes = FilmChanges {
            year: Change::Clear,
            plot: Change::Set("A prison plane is hijacked.".to_string()),
            ..Default::default()
        };
        assert!(update(&mut tx, id, &changes).await.unwrap());
        let film = get(&mut tx, id).await.unwrap().unwrap();
        assert_eq!(film.year, None);
        assert_eq!(film.running_time, Some(115));
        assert_eq!(film.plot.as_deref(), Some("A prison plane is hijacked."));
    }

    #[tokio::test]
    async fn delete_cascades_credits() {
        let pool = setup_test_db().await;
        let mut tx = pool.begin().await.unwrap();
        let cage = crate::sql::person::create(&mut tx, &NewPerson::new("Nicolas Cage"))
            .await
            .unwrap();
        let id = create(
            &mut tx,
            &NewFilm::new("Con Air").with_credits(Role::Cast, Some(vec![cage])),
        )
        .await
        .unwrap();

        assert!(delete(&mut tx, id).await.unwrap());
        let person = crate::sql::person::get(&mut tx, cage).await.unwrap().unwrap();
        assert!(person.cast_credits.is_empty());
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credit")
            .fetch_one(&mut *tx)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
