use serde::Deserialize;

/// TMDB's stable numeric movie id, shared between the list, the detail
/// endpoint and Radarr's `tmdbId` field.
pub type TmdbId = u64;

/// First page of a TMDB v4 list, which also carries the page count.
#[derive(Debug, Deserialize)]
pub struct ListEnvelope {
    pub total_pages: u32,
    pub results: Vec<ListEntry>,
}

/// Any subsequent list page.
#[derive(Debug, Deserialize)]
pub struct ListPage {
    pub results: Vec<ListEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ListEntry {
    pub id: TmdbId,
}

/// One movie from Radarr's collection endpoint. Only the TMDB id matters
/// for reconciliation; the rest of the entry is ignored.
#[derive(Debug, Deserialize)]
pub struct LibraryEntry {
    #[serde(rename = "tmdbId")]
    pub tmdb_id: TmdbId,
}

/// TMDB v3 movie detail response.
#[derive(Debug, Deserialize)]
pub struct MovieResponse {
    pub id: TmdbId,
    pub original_title: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// A released movie, resolved and ready to submit to Radarr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieDetail {
    pub tmdb_id: TmdbId,
    pub title: String,
    pub year: String,
}

impl MovieDetail {
    /// Returns `None` when the movie has no release date recorded, which
    /// TMDB reports either as an absent field or an empty string; those
    /// movies are not yet released and must not be submitted. The year is
    /// whatever precedes the first `-` of the release date.
    pub fn from_response(response: MovieResponse) -> Option<Self> {
        let release_date = response.release_date.filter(|date| !date.is_empty())?;
        let year = release_date
            .split('-')
            .next()
            .unwrap_or(&release_date)
            .to_string();

        Some(Self {
            tmdb_id: response.id,
            title: response.original_title,
            year,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(release_date: Option<&str>) -> MovieResponse {
        MovieResponse {
            id: 438631,
            original_title: "Dune".to_string(),
            release_date: release_date.map(str::to_string),
        }
    }

    #[test]
    fn released_movie_resolves_with_year() {
        let detail = MovieDetail::from_response(response(Some("2021-09-15"))).unwrap();
        assert_eq!(detail.tmdb_id, 438631);
        assert_eq!(detail.title, "Dune");
        assert_eq!(detail.year, "2021");
    }

    #[test]
    fn missing_release_date_is_skipped() {
        assert_eq!(MovieDetail::from_response(response(None)), None);
    }

    #[test]
    fn empty_release_date_is_skipped() {
        assert_eq!(MovieDetail::from_response(response(Some(""))), None);
    }

    #[test]
    fn detail_response_deserializes_without_release_date() {
        let raw = r#"{"id": 9, "original_title": "Unannounced"}"#;
        let parsed: MovieResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.release_date, None);
    }
}
