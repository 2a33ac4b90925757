use crate::config::RadarrConfig;
use crate::error::SyncError;
use crate::http::{check_success, HttpClient};
use crate::models::{LibraryEntry, MovieDetail, TmdbId};
use crate::ratelimit::RateLimiter;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct RadarrClient {
    http: HttpClient,
    config: RadarrConfig,
    add_limiter: Arc<RateLimiter>,
}

#[derive(Debug, Serialize)]
struct AddMoviePayload {
    #[serde(rename = "tmdbId")]
    tmdb_id: TmdbId,
    #[serde(rename = "qualityProfileId")]
    quality_profile_id: u64,
    monitored: bool,
    #[serde(rename = "rootFolderPath")]
    root_folder_path: String,
    title: String,
    #[serde(rename = "titleSlug")]
    title_slug: String,
    images: Vec<serde_json::Value>,
    year: String,
    #[serde(rename = "addOptions")]
    add_options: AddOptions,
}

#[derive(Debug, Serialize)]
struct AddOptions {
    #[serde(rename = "searchForMovie")]
    search_for_movie: bool,
}

impl RadarrClient {
    pub fn new(http: HttpClient, config: RadarrConfig, add_limiter: Arc<RateLimiter>) -> Self {
        Self {
            http,
            config,
            add_limiter,
        }
    }

    fn movie_url(&self) -> String {
        format!(
            "http://{}:{}/api/movie",
            self.config.host, self.config.port
        )
    }

    /// TMDB ids of every movie Radarr already manages.
    #[instrument(skip(self))]
    pub async fn managed_ids(&self) -> Result<HashSet<TmdbId>, SyncError> {
        info!("Fetching movies from Radarr");

        let response = self
            .http
            .get(&self.movie_url())
            .query(&[("apikey", self.config.api_key.as_str())])
            .send()
            .await?;
        let entries: Vec<LibraryEntry> = check_success("radarr", response).await?.json().await?;

        Ok(entries.into_iter().map(|entry| entry.tmdb_id).collect())
    }

    /// Submits one add request, rate-limited. A rejected or failed add is
    /// logged and swallowed; the movie stays missing and is retried on the
    /// next cycle.
    #[instrument(skip(self, detail), fields(title = %detail.title, tmdb_id = detail.tmdb_id))]
    pub async fn add_movie(&self, detail: &MovieDetail) {
        self.add_limiter.acquire().await;

        let payload = self.build_payload(detail);
        info!("Adding movie to Radarr: {} ({})", detail.title, detail.year);

        let result = async {
            let response = self
                .http
                .post(&self.movie_url())
                .query(&[("apikey", self.config.api_key.as_str())])
                .json(&payload)
                .send()
                .await?;
            check_success("radarr", response).await?;
            Ok::<_, SyncError>(())
        }
        .await;

        match result {
            Ok(()) => info!("Successfully added movie: {}", detail.title),
            Err(e) => warn!("Could not add movie {}: {}", detail.title, e),
        }
    }

    fn build_payload(&self, detail: &MovieDetail) -> AddMoviePayload {
        AddMoviePayload {
            tmdb_id: detail.tmdb_id,
            quality_profile_id: self.config.quality_profile_id,
            monitored: true,
            root_folder_path: self.config.root_folder_path.clone(),
            title: detail.title.clone(),
            title_slug: slugify(&format!("{} {}", detail.title, detail.tmdb_id)),
            images: Vec::new(),
            year: detail.year.clone(),
            add_options: AddOptions {
                search_for_movie: true,
            },
        }
    }
}

/// Lowercase, alphanumeric runs joined by single hyphens. Non-ASCII titles
/// are transliterated first so an `original_title` like "Amélie" keeps its
/// letters instead of degrading to separators. The slug carries the TMDB id
/// so same-titled movies stay distinguishable in Radarr.
fn slugify(input: &str) -> String {
    let input = deunicode::deunicode(input);
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}
