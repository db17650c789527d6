use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

// ============ Database Models ============

/// A person record enriched with inferred age, gender and nationality.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Person {
    /// Unique identifier, assigned on insert.
    pub id: Uuid,
    #[schema(example = "Dmitriy")]
    pub name: String,
    #[schema(example = "Ushakov")]
    pub surname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Vasilevich")]
    pub patronymic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 42)]
    pub age: Option<i32>,
    /// `male` or `female`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "male")]
    pub gender: Option<String>,
    /// Two-letter country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "UA")]
    pub nationality: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A person that has been validated and enriched but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub name: String,
    pub surname: String,
    pub patronymic: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
}

/// Gender label as reported by genderize.io.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("unknown gender '{}'", other)),
        }
    }
}

// ============ API Request/Response Models ============

/// Body of `POST /api/v1/persons`.
///
/// Age, gender and nationality are filled by enrichment; if a client sends
/// them they are ignored.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreatePersonRequest {
    #[serde(default)]
    #[schema(example = "Dmitriy")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "Ushakov")]
    pub surname: String,
    #[schema(example = "Vasilevich")]
    pub patronymic: Option<String>,
}

/// Body of `PUT /api/v1/persons/:id`. Only present fields are applied.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdatePersonRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub age: Option<i32>,
    #[schema(example = "female")]
    pub gender: Option<String>,
    #[schema(example = "RU")]
    pub nationality: Option<String>,
}

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Query parameters of `GET /api/v1/persons`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PersonFilter {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    /// Case-insensitive substring of the surname.
    pub surname: Option<String>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    /// Page size, 10 by default and at most 100.
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PersonFilter {
    pub fn limit(&self) -> i64 {
        self.limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Filter values with surrounding whitespace removed and blanks dropped.
    pub fn normalized(&self) -> PersonFilter {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }

        PersonFilter {
            name: clean(&self.name),
            surname: clean(&self.surname),
            gender: clean(&self.gender).map(|g| g.to_ascii_lowercase()),
            nationality: clean(&self.nationality).map(|n| n.to_ascii_uppercase()),
            age_min: self.age_min,
            age_max: self.age_max,
            limit: Some(self.limit()),
            offset: Some(self.offset()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "name and surname are required")]
    pub error: String,
}

// ============ External API Models ============

/// Response of agify.io.
#[derive(Debug, Clone, Deserialize)]
pub struct AgifyResponse {
    #[serde(default)]
    pub name: Option<String>,
    pub age: Option<u32>,
    #[serde(default)]
    pub count: u64,
}

/// Response of genderize.io.
#[derive(Debug, Clone, Deserialize)]
pub struct GenderizeResponse {
    #[serde(default)]
    pub name: Option<String>,
    pub gender: Option<Gender>,
    #[serde(default)]
    pub probability: f64,
    #[serde(default)]
    pub count: u64,
}

/// Response of nationalize.io, countries ranked by probability.
#[derive(Debug, Clone, Deserialize)]
pub struct NationalizeResponse {
    #[serde(default)]
    pub name: Option<String>,
    pub country: Vec<CountryProbability>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryProbability {
    pub country_id: String,
    pub probability: f64,
}
