use std::time::Duration;

use crate::catalog::MediaRef;
#[cfg(any(feature = "fetch", test))]
use crate::catalog::MediaType;
use crate::error::{ScorebandError, ScorebandResult};
use crate::scores::SourceScore;

/// Explicit configuration for the provider layer; no process-wide state.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub user_agent: String,
    pub tmdb_api_key: String,
    pub trakt_client_id: Option<String>,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(tmdb_api_key: impl Into<String>) -> Self {
        Self {
            user_agent: concat!("scoreband/", env!("CARGO_PKG_VERSION")).to_string(),
            tmdb_api_key: tmdb_api_key.into(),
            trakt_client_id: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Assemble from `TMDB_API_KEY` (required), `TRAKT_CLIENT_ID`, and
    /// `SCOREBAND_USER_AGENT`.
    pub fn from_env() -> ScorebandResult<Self> {
        let tmdb_api_key = std::env::var("TMDB_API_KEY")
            .map_err(|_| ScorebandError::provider("TMDB_API_KEY is not set"))?;
        let mut cfg = Self::new(tmdb_api_key);
        if let Ok(ua) = std::env::var("SCOREBAND_USER_AGENT") {
            cfg.user_agent = ua;
        }
        if let Ok(id) = std::env::var("TRAKT_CLIENT_ID") {
            cfg.trakt_client_id = Some(id);
        }
        Ok(cfg)
    }
}

/// One rating source. Dispatch is a fixed explicit list, not a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RatingSource {
    Imdb,
    Tmdb,
    Trakt,
}

impl RatingSource {
    /// Stock sources in display priority order.
    pub const DEFAULT: [RatingSource; 3] =
        [RatingSource::Imdb, RatingSource::Tmdb, RatingSource::Trakt];

    pub fn name(self) -> &'static str {
        match self {
            Self::Imdb => "imdb",
            Self::Tmdb => "tmdb",
            Self::Trakt => "trakt",
        }
    }

    /// Logo handle in the caller's logo store, when the source ships one.
    pub fn logo_handle(self) -> Option<&'static str> {
        match self {
            Self::Imdb => Some("imdb.png"),
            Self::Tmdb => Some("tmdb.png"),
            Self::Trakt => None,
        }
    }

    /// A source's score for `media`, `None` when it has no answer.
    pub fn fetch_score(
        self,
        media: &MediaRef,
        cfg: &ProviderConfig,
    ) -> ScorebandResult<Option<f64>> {
        match self {
            Self::Imdb => fetch_imdb_score(media, cfg),
            // the catalog payload already carries the tmdb average
            Self::Tmdb => Ok(media.vote_average),
            Self::Trakt => fetch_trakt_score(media, cfg),
        }
    }
}

/// Query every source in order. A failing source yields an absent score and
/// never aborts the batch.
pub fn collect_scores(
    sources: &[RatingSource],
    media: &MediaRef,
    cfg: &ProviderConfig,
) -> Vec<SourceScore> {
    sources
        .iter()
        .map(|&source| {
            let raw = match source.fetch_score(media, cfg) {
                Ok(Some(value)) => Some(format!("{value:.1}")),
                Ok(None) => None,
                Err(err) => {
                    tracing::debug!(source = source.name(), error = %err, "score fetch failed");
                    None
                }
            };
            SourceScore {
                source: source.name().to_string(),
                logo: source.logo_handle().map(str::to_string),
                raw,
            }
        })
        .collect()
}

#[cfg(feature = "fetch")]
pub(crate) fn http_client(cfg: &ProviderConfig) -> ScorebandResult<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(&cfg.user_agent)
        .timeout(cfg.timeout)
        .build()
        .map_err(|e| ScorebandError::provider(format!("failed to build http client: {e}")))
}

#[cfg(feature = "fetch")]
fn fetch_imdb_score(media: &MediaRef, cfg: &ProviderConfig) -> ScorebandResult<Option<f64>> {
    #[derive(serde::Deserialize)]
    struct Meta {
        #[serde(rename = "imdbRating")]
        imdb_rating: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct MetaOut {
        meta: Option<Meta>,
    }

    let kind = match media.media_type {
        MediaType::Movie => "movie",
        MediaType::Show => "series",
    };
    let url = format!(
        "https://v3-cinemeta.strem.io/meta/{kind}/{}.json",
        media.imdb_id
    );

    let client = http_client(cfg)?;
    let resp = client
        .get(&url)
        .send()
        .map_err(|e| ScorebandError::provider(format!("cinemeta request failed: {e}")))?;
    if !resp.status().is_success() {
        return Err(ScorebandError::provider(format!(
            "cinemeta returned {} for '{}'",
            resp.status(),
            media.imdb_id
        )));
    }
    let parsed: MetaOut = resp
        .json()
        .map_err(|e| ScorebandError::provider(format!("cinemeta json parse failed: {e}")))?;

    // cinemeta reports the rating as text; unusable text counts as no answer
    Ok(parsed
        .meta
        .and_then(|m| m.imdb_rating)
        .and_then(|r| r.trim().parse::<f64>().ok()))
}

#[cfg(not(feature = "fetch"))]
fn fetch_imdb_score(_media: &MediaRef, _cfg: &ProviderConfig) -> ScorebandResult<Option<f64>> {
    Err(ScorebandError::provider(
        "the imdb source requires the 'fetch' feature",
    ))
}

#[cfg(feature = "fetch")]
fn fetch_trakt_score(media: &MediaRef, cfg: &ProviderConfig) -> ScorebandResult<Option<f64>> {
    #[derive(serde::Deserialize)]
    struct Ratings {
        rating: Option<f64>,
    }

    let client_id = cfg
        .trakt_client_id
        .as_deref()
        .ok_or_else(|| ScorebandError::provider("TRAKT_CLIENT_ID is not configured"))?;
    let kind = match media.media_type {
        MediaType::Movie => "movies",
        MediaType::Show => "shows",
    };
    let url = format!("https://api.trakt.tv/{kind}/{}/ratings", media.imdb_id);

    let client = http_client(cfg)?;
    let resp = client
        .get(&url)
        .header("Content-Type", "application/json")
        .header("trakt-api-version", "2")
        .header("trakt-api-key", client_id)
        .send()
        .map_err(|e| ScorebandError::provider(format!("trakt request failed: {e}")))?;
    if !resp.status().is_success() {
        return Err(ScorebandError::provider(format!(
            "trakt returned {} for '{}'",
            resp.status(),
            media.imdb_id
        )));
    }
    let parsed: Ratings = resp
        .json()
        .map_err(|e| ScorebandError::provider(format!("trakt json parse failed: {e}")))?;
    Ok(parsed.rating)
}

#[cfg(not(feature = "fetch"))]
fn fetch_trakt_score(_media: &MediaRef, _cfg: &ProviderConfig) -> ScorebandResult<Option<f64>> {
    Err(ScorebandError::provider(
        "the trakt source requires the 'fetch' feature",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(vote_average: Option<f64>) -> MediaRef {
        MediaRef {
            imdb_id: "tt0137523".to_string(),
            media_type: MediaType::Movie,
            vote_average,
            poster_path: None,
        }
    }

    #[test]
    fn default_sources_keep_priority_order() {
        let names: Vec<&str> = RatingSource::DEFAULT.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["imdb", "tmdb", "trakt"]);
    }

    #[test]
    fn logo_handles_match_sources() {
        assert_eq!(RatingSource::Imdb.logo_handle(), Some("imdb.png"));
        assert_eq!(RatingSource::Tmdb.logo_handle(), Some("tmdb.png"));
        assert_eq!(RatingSource::Trakt.logo_handle(), None);
    }

    #[test]
    fn tmdb_score_comes_from_the_catalog_payload() {
        let cfg = ProviderConfig::new("k");
        let score = RatingSource::Tmdb.fetch_score(&media(Some(6.86)), &cfg).unwrap();
        assert_eq!(score, Some(6.86));
        let none = RatingSource::Tmdb.fetch_score(&media(None), &cfg).unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn collect_formats_scores_to_one_decimal() {
        let cfg = ProviderConfig::new("k");
        let scores = collect_scores(&[RatingSource::Tmdb], &media(Some(6.86)), &cfg);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].source, "tmdb");
        assert_eq!(scores[0].logo.as_deref(), Some("tmdb.png"));
        assert_eq!(scores[0].raw.as_deref(), Some("6.9"));
    }

    #[test]
    fn collect_maps_source_failure_to_absent_score() {
        // trakt without a client id fails before any request is made
        let cfg = ProviderConfig::new("k");
        let scores = collect_scores(
            &[RatingSource::Trakt, RatingSource::Tmdb],
            &media(Some(7.0)),
            &cfg,
        );
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].source, "trakt");
        assert_eq!(scores[0].raw, None);
        assert_eq!(scores[1].raw.as_deref(), Some("7.0"));
    }

    #[test]
    fn config_defaults_are_sensible() {
        let cfg = ProviderConfig::new("key");
        assert!(cfg.user_agent.starts_with("scoreband/"));
        assert_eq!(cfg.trakt_client_id, None);
        assert_eq!(cfg.timeout, Duration::from_secs(10));
    }
}
