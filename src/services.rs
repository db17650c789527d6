use crate::config::Config;
use crate::errors::{AppError, LookupError};
use crate::models::{AgifyResponse, CountryProbability, Gender, GenderizeResponse, NationalizeResponse};
use reqwest::Client;
use serde::de::DeserializeOwned;

/// Outcome of one lookup: a value, no confident answer, or a failure.
pub type LookupOutcome<T> = Result<Option<T>, LookupError>;

/// Client for the three name lookup services (agify, genderize, nationalize).
///
/// Every request carries the configured per-lookup timeout. The underlying
/// `reqwest::Client` is a connection pool and is cheap to clone, so one
/// instance is shared by all concurrent lookups.
#[derive(Clone)]
pub struct LookupService {
    client: Client,
    agify_url: String,
    genderize_url: String,
    nationalize_url: String,
}

impl LookupService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.lookup_timeout)
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create lookup client: {}", e))
            })?;

        Ok(Self {
            client,
            agify_url: config.agify_url.clone(),
            genderize_url: config.genderize_url.clone(),
            nationalize_url: config.nationalize_url.clone(),
        })
    }

    /// Most likely age for `name`, absent when agify has no data for it.
    pub async fn get_age(&self, name: &str) -> LookupOutcome<u32> {
        let response: AgifyResponse = self.fetch(&self.agify_url, name).await?;
        tracing::debug!(
            "agify: name={} age={:?} count={}",
            name,
            response.age,
            response.count
        );
        Ok(response.age)
    }

    /// Most likely gender for `name`.
    pub async fn get_gender(&self, name: &str) -> LookupOutcome<Gender> {
        let response: GenderizeResponse = self.fetch(&self.genderize_url, name).await?;
        tracing::debug!(
            "genderize: name={} gender={:?} probability={} count={}",
            name,
            response.gender,
            response.probability,
            response.count
        );
        Ok(response.gender)
    }

    /// Country code with the highest probability for `name`.
    pub async fn get_nationality(&self, name: &str) -> LookupOutcome<String> {
        let response: NationalizeResponse = self.fetch(&self.nationalize_url, name).await?;
        tracing::debug!(
            "nationalize: name={} candidates={}",
            name,
            response.country.len()
        );
        Ok(most_probable_country(&response.country))
    }

    /// Issues one GET with `name` as a URL-encoded query parameter and decodes
    /// the JSON body. No retries.
    async fn fetch<T: DeserializeOwned>(&self, base_url: &str, name: &str) -> Result<T, LookupError> {
        let url = reqwest::Url::parse_with_params(&format!("{}/", base_url), &[("name", name)])
            .map_err(|e| LookupError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }
}

/// Picks the first entry with the highest probability. Entries with a blank
/// country id are skipped.
pub fn most_probable_country(countries: &[CountryProbability]) -> Option<String> {
    countries
        .iter()
        .filter(|c| !c.country_id.trim().is_empty())
        .fold(None, |best: Option<&CountryProbability>, candidate| match best {
            Some(b) if b.probability >= candidate.probability => Some(b),
            _ => Some(candidate),
        })
        .map(|c| c.country_id.trim().to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn country(id: &str, probability: f64) -> CountryProbability {
        CountryProbability {
            country_id: id.to_string(),
            probability,
        }
    }

    #[test]
    fn test_most_probable_country_picks_highest() {
        let countries = vec![country("UA", 0.2), country("RU", 0.5), country("BY", 0.3)];
        assert_eq!(most_probable_country(&countries), Some("RU".to_string()));
    }

    #[test]
    fn test_most_probable_country_keeps_first_on_tie() {
        let countries = vec![country("ua", 0.4), country("RU", 0.4)];
        assert_eq!(most_probable_country(&countries), Some("UA".to_string()));
    }

    #[test]
    fn test_most_probable_country_empty() {
        assert_eq!(most_probable_country(&[]), None);
        assert_eq!(most_probable_country(&[country(" ", 0.9)]), None);
    }

    #[tokio::test]
    async fn test_unparseable_base_url_is_invalid_url_not_network() {
        let config = Config {
            database_url: "postgresql://test".to_string(),
            port: 8080,
            rate_limit: 10,
            agify_url: "not a url".to_string(),
            genderize_url: "not a url".to_string(),
            nationalize_url: "not a url".to_string(),
            lookup_timeout: std::time::Duration::from_secs(1),
            enrichment_deadline: std::time::Duration::from_secs(1),
        };
        let service = LookupService::new(&config).unwrap();

        assert!(matches!(
            service.get_age("Ivan").await,
            Err(LookupError::InvalidUrl(_))
        ));
    }
}
