use crate::db_storage::PersonStore;
use crate::enrichment::{EnrichContext, Enricher, EnrichmentResult};
use crate::errors::AppError;
use crate::models::{CreatePersonRequest, Gender, NewPerson, Person, PersonFilter, UpdatePersonRequest};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

pub const MAX_AGE: i32 = 150;

/// Person CRUD with enrichment on create.
#[derive(Clone)]
pub struct PersonService {
    store: Arc<dyn PersonStore>,
    enricher: Enricher,
}

impl PersonService {
    pub fn new(store: Arc<dyn PersonStore>, enricher: Enricher) -> Self {
        Self { store, enricher }
    }

    /// Validates the request, enriches the name and stores the record.
    ///
    /// Enrichment never fails creation: whatever the lookups could not
    /// resolve is simply stored as absent.
    pub async fn create(
        &self,
        request: CreatePersonRequest,
        ctx: &EnrichContext,
    ) -> Result<Person, AppError> {
        let validated = validate_create(request)?;

        let enrichment = self.enricher.enrich(&validated.name, ctx).await;
        if enrichment.is_empty() {
            tracing::warn!(
                "No enrichment data for '{}', storing person without age/gender/nationality",
                validated.name
            );
        }

        let person = build_person(validated, enrichment);
        self.store.create(person).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Person, AppError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn list(&self, filter: &PersonFilter) -> Result<Vec<Person>, AppError> {
        if let (Some(min), Some(max)) = (filter.age_min, filter.age_max) {
            if min > max {
                return Err(AppError::BadRequest(
                    "age_min cannot be greater than age_max".to_string(),
                ));
            }
        }
        self.store.list(filter).await
    }

    /// Applies the fields present in `request` to the stored record.
    ///
    /// Enrichment is not re-run, even when the name changes.
    pub async fn update(&self, id: Uuid, request: UpdatePersonRequest) -> Result<Person, AppError> {
        let mut person = self.get(id).await?;
        apply_update(&mut person, request)?;

        self.store
            .update(&person)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if self.store.delete(id).await? {
            tracing::info!("Deleted person {}", id);
            Ok(())
        } else {
            Err(not_found(id))
        }
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("person {} not found", id))
}

/// Create request after trimming and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCreate {
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
}

/// Trims all fields; name and surname must be non-empty afterwards. A blank
/// patronymic is dropped.
pub fn validate_create(request: CreatePersonRequest) -> Result<ValidatedCreate, AppError> {
    let name = request.name.trim().to_string();
    let surname = request.surname.trim().to_string();

    if name.is_empty() || surname.is_empty() {
        return Err(AppError::BadRequest(
            "name and surname are required".to_string(),
        ));
    }

    Ok(ValidatedCreate {
        name,
        surname,
        patronymic: trimmed(request.patronymic),
    })
}

/// Combines client-supplied fields with enrichment output.
pub fn build_person(validated: ValidatedCreate, enrichment: EnrichmentResult) -> NewPerson {
    NewPerson {
        name: validated.name,
        surname: validated.surname,
        patronymic: validated.patronymic,
        age: enrichment.age.and_then(|age| i32::try_from(age).ok()),
        gender: enrichment.gender.map(|g| g.as_str().to_string()),
        nationality: enrichment.nationality,
    }
}

/// Merges present fields of `request` into `person`.
///
/// Blank name or surname are treated as absent. A blank patronymic clears it.
/// Gender, nationality and age are validated before anything is changed.
pub fn apply_update(person: &mut Person, request: UpdatePersonRequest) -> Result<(), AppError> {
    let gender = request
        .gender
        .as_deref()
        .map(|g| g.parse::<Gender>().map_err(AppError::BadRequest))
        .transpose()?;

    let nationality = request
        .nationality
        .as_deref()
        .map(normalize_country_code)
        .transpose()?;

    if let Some(age) = request.age {
        if !(0..=MAX_AGE).contains(&age) {
            return Err(AppError::BadRequest(format!(
                "age must be between 0 and {}",
                MAX_AGE
            )));
        }
        person.age = Some(age);
    }

    if let Some(name) = trimmed(request.name) {
        person.name = name;
    }
    if let Some(surname) = trimmed(request.surname) {
        person.surname = surname;
    }
    if request.patronymic.is_some() {
        person.patronymic = trimmed(request.patronymic);
    }
    if let Some(gender) = gender {
        person.gender = Some(gender.as_str().to_string());
    }
    if let Some(nationality) = nationality {
        person.nationality = Some(nationality);
    }

    Ok(())
}

fn country_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{2}$").expect("country code regex is valid"))
}

/// Uppercases and checks an ISO 3166-1 alpha-2 style code.
pub fn normalize_country_code(raw: &str) -> Result<String, AppError> {
    let code = raw.trim().to_ascii_uppercase();
    if country_code_regex().is_match(&code) {
        Ok(code)
    } else {
        Err(AppError::BadRequest(format!(
            "nationality must be a two-letter country code, got '{}'",
            raw
        )))
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
