use crate::config::TmdbConfig;
use crate::error::SyncError;
use crate::http::{check_success, HttpClient};
use crate::models::{ListEntry, ListEnvelope, ListPage, MovieDetail, MovieResponse, TmdbId};
use crate::ratelimit::RateLimiter;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const LIST_BASE_URL: &str = "https://api.themoviedb.org/4/list";
const MOVIE_BASE_URL: &str = "https://api.themoviedb.org/3/movie";

pub struct TmdbClient {
    http: HttpClient,
    config: TmdbConfig,
    detail_limiter: Arc<RateLimiter>,
    list_base: String,
    movie_base: String,
}

impl TmdbClient {
    pub fn new(http: HttpClient, config: TmdbConfig, detail_limiter: Arc<RateLimiter>) -> Self {
        Self {
            http,
            config,
            detail_limiter,
            list_base: LIST_BASE_URL.to_string(),
            movie_base: MOVIE_BASE_URL.to_string(),
        }
    }

    /// Same client, pointed at a local server instead of TMDB.
    #[cfg(test)]
    pub(crate) fn with_base_urls(
        http: HttpClient,
        config: TmdbConfig,
        detail_limiter: Arc<RateLimiter>,
        list_base: &str,
        movie_base: &str,
    ) -> Self {
        Self {
            http,
            config,
            detail_limiter,
            list_base: list_base.to_string(),
            movie_base: movie_base.to_string(),
        }
    }

    fn list_url(&self) -> String {
        format!("{}/{}", self.list_base, self.config.list_id)
    }

    /// Fetches every TMDB id on the configured list. Page 1 carries the
    /// page count; remaining pages are fetched concurrently and unioned.
    /// Only a page-1 failure is fatal to the cycle.
    #[instrument(skip(self))]
    pub async fn listed_ids(&self) -> Result<HashSet<TmdbId>, SyncError> {
        info!("Fetching TMDB list {}", self.config.list_id);

        let response = self
            .http
            .get(&self.list_url())
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;
        let envelope: ListEnvelope = check_success("tmdb list", response)
            .await?
            .json()
            .await?;

        let total_pages = envelope.total_pages;
        debug!(total_pages, "Received first list page");

        let mut pages = vec![envelope.results];
        if total_pages > 1 {
            let fetches = (2..=total_pages).map(|page| self.list_page(page));
            pages.extend(join_all(fetches).await);
        }

        let ids = union_ids(pages);
        info!("Retrieved {} movies from TMDB list", ids.len());
        Ok(ids)
    }

    /// A single non-first list page. Failures here drop the page with a
    /// warning rather than aborting the cycle; the next cycle re-fetches.
    async fn list_page(&self, page: u32) -> Vec<ListEntry> {
        let result = async {
            let response = self
                .http
                .get(&self.list_url())
                .bearer_auth(&self.config.access_token)
                .query(&[("page", page)])
                .send()
                .await?;
            let body: ListPage = check_success("tmdb list", response).await?.json().await?;
            Ok::<_, SyncError>(body.results)
        }
        .await;

        match result {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to fetch list page {}: {}", page, e);
                Vec::new()
            }
        }
    }

    /// Resolves title and release year for one movie, rate-limited. Returns
    /// `None` for unreleased movies and for failed lookups; neither may
    /// abort resolution of the other missing ids.
    #[instrument(skip(self))]
    pub async fn movie_detail(&self, id: TmdbId) -> Option<MovieDetail> {
        self.detail_limiter.acquire().await;
        info!("Getting movie info for movie: {}", id);

        let url = format!("{}/{}", self.movie_base, id);
        let result = async {
            let response = self
                .http
                .get(&url)
                .query(&[("api_key", self.config.api_key.as_str())])
                .send()
                .await?;
            let body: MovieResponse = check_success("tmdb movie", response).await?.json().await?;
            Ok::<_, SyncError>(body)
        }
        .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("Unable to get movie info for TMDB ID {}: {}", id, e);
                return None;
            }
        };

        let detail = MovieDetail::from_response(response);
        if detail.is_none() {
            info!("Skipping movie {} because it has no release date yet", id);
        }
        detail
    }
}

/// Unions page results into one id set, collapsing duplicates. Page order
/// is irrelevant; reconciliation is set-based.
fn union_ids<I>(pages: I) -> HashSet<TmdbId>
where
    I: IntoIterator<Item = Vec<ListEntry>>,
{
    pages
        .into_iter()
        .flatten()
        .map(|entry| entry.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page(ids: &[TmdbId]) -> Vec<ListEntry> {
        ids.iter().map(|&id| ListEntry { id }).collect()
    }

    fn client_for(server: &MockServer) -> TmdbClient {
        let config = TmdbConfig {
            access_token: "token".to_string(),
            api_key: "key".to_string(),
            list_id: "99".to_string(),
        };
        TmdbClient::with_base_urls(
            HttpClient::new(),
            config,
            Arc::new(RateLimiter::new(5, Duration::from_secs(15))),
            &format!("{}/4/list", server.uri()),
            &format!("{}/3/movie", server.uri()),
        )
    }

    #[tokio::test]
    async fn three_page_list_issues_exactly_three_requests() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/4/list/99"))
            .and(query_param_is_missing("page"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_pages": 3,
                "results": [{"id": 1}, {"id": 2}],
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/4/list/99"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"id": 2}, {"id": 3}],
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/4/list/99"))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"id": 4}],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ids = client_for(&server).listed_ids().await.unwrap();

        assert_eq!(ids, HashSet::from([1, 2, 3, 4]));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
    }

    #[tokio::test]
    async fn single_page_list_issues_one_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/4/list/99"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_pages": 1,
                "results": [{"id": 7}],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ids = client_for(&server).listed_ids().await.unwrap();

        assert_eq!(ids, HashSet::from([7]));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn first_page_failure_is_upstream_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/4/list/99"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server).listed_ids().await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::UpstreamUnavailable { status: 503, .. }
        ));
    }

    #[tokio::test]
    async fn failed_later_page_is_dropped_not_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/4/list/99"))
            .and(query_param_is_missing("page"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_pages": 2,
                "results": [{"id": 1}],
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/4/list/99"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let ids = client_for(&server).listed_ids().await.unwrap();
        assert_eq!(ids, HashSet::from([1]));
    }

    #[test]
    fn pages_union_with_duplicates_collapsed() {
        let pages = vec![page(&[1, 2]), page(&[2, 3]), page(&[4])];
        assert_eq!(union_ids(pages), HashSet::from([1, 2, 3, 4]));
    }

    #[test]
    fn dropped_page_leaves_remaining_ids_intact() {
        // A failed page contributes an empty vec, nothing more.
        let pages = vec![page(&[1, 2]), Vec::new(), page(&[4])];
        assert_eq!(union_ids(pages), HashSet::from([1, 2, 4]));
    }

    #[test]
    fn first_page_envelope_carries_page_count() {
        let raw = r#"{"total_pages": 3, "results": [{"id": 438631}, {"id": 118340}]}"#;
        let envelope: ListEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.total_pages, 3);
        assert_eq!(union_ids([envelope.results]), HashSet::from([438631, 118340]));
    }

    #[test]
    fn later_pages_parse_without_page_count() {
        let raw = r#"{"page": 2, "results": [{"id": 550}]}"#;
        let body: ListPage = serde_json::from_str(raw).unwrap();
        assert_eq!(body.results.len(), 1);
        assert_eq!(body.results[0].id, 550);
    }
}
