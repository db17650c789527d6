use crate::errors::{AppError, ResultExt};
use crate::models::{NewPerson, Person, PersonFilter};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const PERSON_COLUMNS: &str =
    "id, name, surname, patronymic, age, gender, nationality, created_at, updated_at";

/// Persistence for person records.
///
/// Implementations assign the id and both timestamps on insert and refresh
/// `updated_at` on update.
#[async_trait]
pub trait PersonStore: Send + Sync {
    async fn create(&self, person: NewPerson) -> Result<Person, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Person>, AppError>;

    /// Overwrites the stored record with `person`. Returns `None` if no
    /// record with that id exists.
    async fn update(&self, person: &Person) -> Result<Option<Person>, AppError>;

    /// Returns `false` if no record with that id exists.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    async fn list(&self, filter: &PersonFilter) -> Result<Vec<Person>, AppError>;
}

/// PostgreSQL-backed person storage.
pub struct PersonStorage {
    pool: PgPool,
}

impl PersonStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersonStore for PersonStorage {
    async fn create(&self, person: NewPerson) -> Result<Person, AppError> {
        let id = Uuid::new_v4();

        let stored = sqlx::query_as::<_, Person>(&format!(
            r#"
            INSERT INTO persons (id, name, surname, patronymic, age, gender, nationality, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            RETURNING {}
            "#,
            PERSON_COLUMNS
        ))
        .bind(id)
        .bind(&person.name)
        .bind(&person.surname)
        .bind(&person.patronymic)
        .bind(person.age)
        .bind(&person.gender)
        .bind(&person.nationality)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert person")?;

        tracing::info!("✓ Stored person {} ({} {})", stored.id, stored.name, stored.surname);
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Person>, AppError> {
        sqlx::query_as::<_, Person>(&format!(
            "SELECT {} FROM persons WHERE id = $1",
            PERSON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to load person {}", id))
    }

    async fn update(&self, person: &Person) -> Result<Option<Person>, AppError> {
        sqlx::query_as::<_, Person>(&format!(
            r#"
            UPDATE persons
            SET name = $2, surname = $3, patronymic = $4, age = $5, gender = $6,
                nationality = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PERSON_COLUMNS
        ))
        .bind(person.id)
        .bind(&person.name)
        .bind(&person.surname)
        .bind(&person.patronymic)
        .bind(person.age)
        .bind(&person.gender)
        .bind(&person.nationality)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to update person {}", person.id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM persons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete person {}", id))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &PersonFilter) -> Result<Vec<Person>, AppError> {
        let filter = filter.normalized();
        let mut query = build_list_query(&filter);

        query
            .build_query_as::<Person>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list persons")
    }
}

/// Builds the filtered, paginated `SELECT` for [`PersonStore::list`].
/// Expects a filter that already went through [`PersonFilter::normalized`].
pub fn build_list_query(filter: &PersonFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("SELECT {} FROM persons WHERE 1=1", PERSON_COLUMNS));

    if let Some(name) = &filter.name {
        query
            .push(" AND name ILIKE ")
            .push_bind(format!("%{}%", escape_like(name)));
    }
    if let Some(surname) = &filter.surname {
        query
            .push(" AND surname ILIKE ")
            .push_bind(format!("%{}%", escape_like(surname)));
    }
    if let Some(gender) = &filter.gender {
        query.push(" AND gender = ").push_bind(gender.clone());
    }
    if let Some(nationality) = &filter.nationality {
        query.push(" AND nationality = ").push_bind(nationality.clone());
    }
    if let Some(age_min) = filter.age_min {
        query.push(" AND age >= ").push_bind(age_min);
    }
    if let Some(age_max) = filter.age_max {
        query.push(" AND age <= ").push_bind(age_max);
    }

    query
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(filter.limit())
        .push(" OFFSET ")
        .push_bind(filter.offset());

    query
}

/// Escapes `LIKE` wildcards so user input only matches literally.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
