use serde::Deserialize;

use crate::media::config::PLACEHOLDER_POSTER_PATH;
use crate::media::errors::CatalogError;
use crate::media::types::MediaSource;

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MovieImages {
    pub posters: Vec<String>,
    pub stills: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MovieLink {
    pub description: String,
    pub url: String,
}

/// A movie as returned by the catalog service. Only `videos` matters to the
/// playback session; the rest is carried for the details surface.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MovieRecord {
    pub id: String,
    /// Document id as stored by the catalog database; some responses carry
    /// it next to `id`, some instead of it.
    #[serde(rename = "_id")]
    pub object_id: Option<String>,
    pub title: String,
    pub year: Option<i32>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub production_company: Option<String>,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub screenwriters: Vec<String>,
    pub actors: Vec<String>,
    pub description: Option<String>,
    pub images: MovieImages,
    pub videos: Vec<String>,
    /// Older records carry a single video instead of `videos`.
    #[serde(rename = "videoUrl")]
    pub video_url: Option<String>,
    #[serde(rename = "posterUrl")]
    pub poster_url: Option<String>,
    pub links: Vec<MovieLink>,
}

impl MovieRecord {
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// `id` when present, otherwise the database `_id`.
    pub fn record_id(&self) -> &str {
        match self.object_id.as_deref() {
            Some(object_id) if self.id.trim().is_empty() => object_id,
            _ => &self.id,
        }
    }

    /// Source URIs in catalog order, blanks dropped.
    pub fn playable_sources(&self) -> Vec<String> {
        let sources: Vec<String> = self
            .videos
            .iter()
            .map(|uri| uri.trim())
            .filter(|uri| !uri.is_empty())
            .map(str::to_string)
            .collect();
        if !sources.is_empty() {
            return sources;
        }
        self.video_url
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .map(|uri| vec![uri.to_string()])
            .unwrap_or_default()
    }

    pub fn source_catalog(&self) -> Vec<MediaSource> {
        MediaSource::catalog(self.playable_sources())
    }

    pub fn require_sources(&self) -> Result<Vec<String>, CatalogError> {
        let sources = self.playable_sources();
        if sources.is_empty() {
            return Err(CatalogError::NoPlayableSources {
                id: self.record_id().to_string(),
            });
        }
        Ok(sources)
    }

    pub fn poster(&self) -> &str {
        self.images
            .posters
            .iter()
            .chain(self.poster_url.as_ref())
            .map(|poster| poster.trim())
            .find(|poster| !poster.is_empty())
            .unwrap_or(PLACEHOLDER_POSTER_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"{
        "_id": "65f0c2",
        "title": "Shadows of Forgotten Ancestors",
        "year": 1965,
        "country": "USSR",
        "directors": ["Sergei Parajanov"],
        "images": { "posters": ["/posters/shadows.jpg"], "stills": [] },
        "videos": ["https://cdn.example/shadows-1.mp4", "  ", "https://cdn.example/shadows-2.mp4"],
        "links": [{ "description": "Trailer", "url": "https://example.org/t" }]
    }"#;

    #[test]
    fn test_parses_record_with_mongo_id() {
        let record = MovieRecord::from_json(RECORD).unwrap();
        assert_eq!(record.record_id(), "65f0c2");
        assert_eq!(record.year, Some(1965));
        assert_eq!(record.language, None);
        assert_eq!(record.links.len(), 1);
        assert_eq!(record.poster(), "/posters/shadows.jpg");
    }

    #[test]
    fn test_record_with_both_ids_prefers_id() {
        let record = MovieRecord::from_json(r#"{"id": "m-17", "_id": "65f0c3", "title": "Both"}"#)
            .unwrap();
        assert_eq!(record.record_id(), "m-17");
        assert_eq!(record.object_id.as_deref(), Some("65f0c3"));
    }

    #[test]
    fn test_blank_first_poster_falls_back_to_poster_url() {
        let record = MovieRecord::from_json(
            r#"{"id": "p1", "images": {"posters": ["  "]}, "posterUrl": "/posters/p1.jpg"}"#,
        )
        .unwrap();
        assert_eq!(record.poster(), "/posters/p1.jpg");

        let record =
            MovieRecord::from_json(r#"{"id": "p2", "images": {"posters": ["", "/posters/p2b.jpg"]}}"#)
                .unwrap();
        assert_eq!(record.poster(), "/posters/p2b.jpg");
    }

    #[test]
    fn test_source_catalog_drops_blanks_and_keeps_order() {
        let record = MovieRecord::from_json(RECORD).unwrap();
        let catalog = record.source_catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].uri, "https://cdn.example/shadows-1.mp4");
        assert_eq!(catalog[1].index, 1);
        assert_eq!(catalog[1].uri, "https://cdn.example/shadows-2.mp4");
    }

    #[test]
    fn test_legacy_video_url_fallback() {
        let record =
            MovieRecord::from_json(r#"{"id": "a1", "videoUrl": "https://cdn.example/a1.mp4"}"#)
                .unwrap();
        assert_eq!(record.playable_sources(), vec!["https://cdn.example/a1.mp4"]);
    }

    #[test]
    fn test_missing_sources_and_poster() {
        let record = MovieRecord::from_json(r#"{"id": "b2", "title": "Untitled"}"#).unwrap();
        assert!(record.playable_sources().is_empty());
        assert!(matches!(
            record.require_sources(),
            Err(CatalogError::NoPlayableSources { id }) if id == "b2"
        ));
        assert_eq!(record.poster(), PLACEHOLDER_POSTER_PATH);
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        assert!(matches!(
            MovieRecord::from_json("{\"videos\": 3}"),
            Err(CatalogError::Parse(_))
        ));
    }
}
