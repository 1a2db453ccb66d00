use crate::error::{ScorebandError, ScorebandResult};
use crate::providers::ProviderConfig;

pub const TMDB_FIND_BASE: &str = "https://api.themoviedb.org/3/find";
pub const TMDB_POSTER_BASE: &str = "https://image.tmdb.org/t/p/original";

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Show,
}

/// Catalog record for one title, resolved from an IMDb id.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct MediaRef {
    pub imdb_id: String,
    pub media_type: MediaType,
    pub vote_average: Option<f64>,
    pub poster_path: Option<String>,
}

impl MediaRef {
    pub fn poster_url(&self) -> Option<String> {
        self.poster_path
            .as_deref()
            .map(|p| format!("{TMDB_POSTER_BASE}{p}"))
    }
}

/// Resolve an IMDb id through the TMDB find endpoint.
///
/// Movie results win over TV results; the poster path is taken from the
/// matched result, so a movie never picks up a TV poster.
#[cfg(feature = "fetch")]
pub fn find_by_imdb_id(imdb_id: &str, cfg: &ProviderConfig) -> ScorebandResult<MediaRef> {
    #[derive(serde::Deserialize)]
    struct FindResult {
        vote_average: Option<f64>,
        poster_path: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct FindOut {
        #[serde(default)]
        movie_results: Vec<FindResult>,
        #[serde(default)]
        tv_results: Vec<FindResult>,
    }

    let url = format!(
        "{TMDB_FIND_BASE}/{imdb_id}?api_key={}&external_source=imdb_id",
        cfg.tmdb_api_key
    );
    let client = crate::providers::http_client(cfg)?;
    let resp = client
        .get(&url)
        .send()
        .map_err(|e| ScorebandError::provider(format!("tmdb find request failed: {e}")))?;
    if !resp.status().is_success() {
        return Err(ScorebandError::provider(format!(
            "tmdb find returned {} for '{imdb_id}'",
            resp.status()
        )));
    }
    let parsed: FindOut = resp
        .json()
        .map_err(|e| ScorebandError::provider(format!("tmdb find json parse failed: {e}")))?;

    let (media_type, result) = if let Some(movie) = parsed.movie_results.first() {
        (MediaType::Movie, movie)
    } else if let Some(tv) = parsed.tv_results.first() {
        (MediaType::Show, tv)
    } else {
        return Err(ScorebandError::provider(format!(
            "no tmdb results for '{imdb_id}'"
        )));
    };

    Ok(MediaRef {
        imdb_id: imdb_id.to_string(),
        media_type,
        vote_average: result.vote_average,
        poster_path: result.poster_path.clone(),
    })
}

#[cfg(not(feature = "fetch"))]
pub fn find_by_imdb_id(_imdb_id: &str, _cfg: &ProviderConfig) -> ScorebandResult<MediaRef> {
    Err(ScorebandError::provider(
        "catalog lookup requires the 'fetch' feature",
    ))
}

#[cfg(feature = "fetch")]
pub fn fetch_poster_bytes(media: &MediaRef, cfg: &ProviderConfig) -> ScorebandResult<Vec<u8>> {
    let url = media.poster_url().ok_or_else(|| {
        ScorebandError::provider(format!("no poster path for '{}'", media.imdb_id))
    })?;

    let client = crate::providers::http_client(cfg)?;
    let resp = client
        .get(&url)
        .send()
        .map_err(|e| ScorebandError::provider(format!("poster download failed: {e}")))?;
    if !resp.status().is_success() {
        return Err(ScorebandError::provider(format!(
            "poster download returned {} for '{url}'",
            resp.status()
        )));
    }
    let bytes = resp
        .bytes()
        .map_err(|e| ScorebandError::provider(format!("poster download read failed: {e}")))?;
    Ok(bytes.to_vec())
}

#[cfg(not(feature = "fetch"))]
pub fn fetch_poster_bytes(_media: &MediaRef, _cfg: &ProviderConfig) -> ScorebandResult<Vec<u8>> {
    Err(ScorebandError::provider(
        "poster download requires the 'fetch' feature",
    ))
}
