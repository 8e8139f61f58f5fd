/// Shared data structures for the catalogue state
///
/// These structs represent the records served by the hosted backend.
/// They are never mutated by the client. Field names on the wire are the
/// backend's camelCase column names; every field except the identity may
/// be absent, so consumers must handle `None`.

use serde::{Deserialize, Deserializer, Serialize};

/// A gallery (museum) holding paintings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Gallery {
    /// Unique backend ID
    pub gallery_id: i64,
    pub gallery_name: Option<String>,
    pub gallery_native_name: Option<String>,
    pub gallery_city: Option<String>,
    pub gallery_address: Option<String>,
    pub gallery_country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub gallery_web_site: Option<String>,
    #[serde(rename = "flickerPlaceId", deserialize_with = "string_or_number")]
    pub flickr_place_id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub yahoo_woe_id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub google_place_id: Option<String>,
}

impl Gallery {
    /// Display name, falling back to the native name
    pub fn display_name(&self) -> &str {
        self.gallery_name
            .as_deref()
            .or(self.gallery_native_name.as_deref())
            .unwrap_or("Untitled gallery")
    }
}

/// An artist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Artist {
    /// Unique backend ID
    pub artist_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub year_of_birth: Option<i32>,
    pub year_of_death: Option<i32>,
    /// Biography text
    pub details: Option<String>,
    pub artist_link: Option<String>,
}

impl Artist {
    /// "First Last", skipping whichever half is missing
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Join record associating a painting with a genre
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaintingGenre {
    pub painting_genre_id: i64,
    pub painting_id: i64,
    pub genre_id: i64,
}

/// A genre with its painting associations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Genre {
    /// Unique backend ID
    pub genre_id: i64,
    pub genre_name: Option<String>,
    pub era_id: Option<i64>,
    pub description: Option<String>,
    pub wiki_link: Option<String>,
    /// Many-to-many join rows; empty unless fetched with the join
    #[serde(rename = "paintinggenres")]
    pub painting_genres: Vec<PaintingGenre>,
}

impl Genre {
    /// Whether this genre lists the painting in its join records
    pub fn includes(&self, painting_id: i64) -> bool {
        self.painting_genres
            .iter()
            .any(|pg| pg.painting_id == painting_id && pg.genre_id == self.genre_id)
    }
}

/// Image variants served alongside the catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    /// Square thumbnail used in grids
    Square,
    /// Full-size image used in the detail view
    Full,
}

impl ImageSize {
    fn dir(self) -> &'static str {
        match self {
            ImageSize::Square => "square",
            ImageSize::Full => "full",
        }
    }
}

/// A painting, optionally with its artist and gallery embedded
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Painting {
    /// Unique backend ID
    pub painting_id: i64,
    pub artist_id: Option<i64>,
    pub gallery_id: Option<i64>,
    #[serde(deserialize_with = "string_or_number")]
    pub image_file_name: Option<String>,
    pub title: Option<String>,
    pub shape_id: Option<i64>,
    pub museum_link: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub accession_number: Option<String>,
    pub copyright_text: Option<String>,
    pub description: Option<String>,
    pub excerpt: Option<String>,
    pub year_of_work: Option<i32>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub medium: Option<String>,
    pub cost: Option<f64>,
    #[serde(rename = "MSRP")]
    pub msrp: Option<f64>,
    pub google_link: Option<String>,
    pub google_description: Option<String>,
    pub wiki_link: Option<String>,
    /// Raw annotation blob; see [`Painting::annotations`]
    pub json_annotations: Option<String>,
    /// Embedded artist from the join, if requested
    pub artists: Option<Artist>,
    /// Embedded gallery from the join, if requested
    pub galleries: Option<Gallery>,
}

impl Painting {
    pub fn title_or_untitled(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    /// Last name of the embedded artist, if the join was fetched
    pub fn artist_last_name(&self) -> Option<&str> {
        self.artists.as_ref()?.last_name.as_deref()
    }

    /// Parse the annotation blob.
    /// A missing or malformed blob yields `None`.
    pub fn annotations(&self) -> Option<Annotations> {
        let raw = self.json_annotations.as_deref()?;
        match serde_json::from_str(raw) {
            Ok(annotations) => Some(annotations),
            Err(e) => {
                tracing::debug!(painting_id = self.painting_id, error = %e, "ignoring malformed annotations");
                None
            }
        }
    }

    /// Relative image path, e.g. `paintings/square/000123.jpg`
    pub fn image_path(&self, size: ImageSize) -> Option<String> {
        let name = self.image_file_name.as_deref()?;
        Some(format!("paintings/{}/{:0>6}.jpg", size.dir(), name))
    }
}

/// Parsed painting annotations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Annotations {
    pub dominant_colors: Vec<DominantColor>,
}

/// One dominant colour of a painting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DominantColor {
    /// Human-readable colour name
    pub name: Option<String>,
    /// CSS hex value, e.g. "#A1B2C3"
    pub web: Option<String>,
}

/// Accept either a JSON string or number; the backend is inconsistent
/// about some identifier columns.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_painting_from_backend_json() {
        let json = r#"{
            "paintingId": 7,
            "artistId": 3,
            "galleryId": 2,
            "imageFileName": 1234,
            "title": "Starry Night",
            "yearOfWork": 1889,
            "MSRP": 250.0,
            "accessionNumber": "472.1941",
            "unknownColumn": true,
            "artists": { "artistId": 3, "firstName": "Vincent", "lastName": "van Gogh" },
            "galleries": null
        }"#;

        let painting: Painting = serde_json::from_str(json).unwrap();

        assert_eq!(painting.painting_id, 7);
        assert_eq!(painting.image_file_name.as_deref(), Some("1234"));
        assert_eq!(painting.accession_number.as_deref(), Some("472.1941"));
        assert_eq!(painting.msrp, Some(250.0));
        assert_eq!(painting.artist_last_name(), Some("van Gogh"));
        assert!(painting.galleries.is_none());
    }

    #[test]
    fn test_cached_painting_reloads_equal() {
        let painting = Painting {
            painting_id: 1,
            gallery_id: Some(4),
            image_file_name: Some("42".into()),
            title: Some("B".into()),
            ..Default::default()
        };

        let json = serde_json::to_string(&painting).unwrap();
        let restored: Painting = serde_json::from_str(&json).unwrap();

        assert_eq!(painting, restored);
    }

    #[test]
    fn test_image_path_is_zero_padded() {
        let painting = Painting {
            image_file_name: Some("42".into()),
            ..Default::default()
        };

        assert_eq!(
            painting.image_path(ImageSize::Square).as_deref(),
            Some("paintings/square/000042.jpg")
        );
        assert_eq!(
            painting.image_path(ImageSize::Full).as_deref(),
            Some("paintings/full/000042.jpg")
        );
    }

    #[test]
    fn test_annotations_parse_on_demand() {
        let mut painting = Painting {
            json_annotations: Some(
                r##"{"dominantColors":[{"color":{"red":1},"web":"#112233","name":"Navy"}]}"##.into(),
            ),
            ..Default::default()
        };

        let annotations = painting.annotations().unwrap();
        assert_eq!(annotations.dominant_colors.len(), 1);
        assert_eq!(annotations.dominant_colors[0].web.as_deref(), Some("#112233"));

        painting.json_annotations = Some("{not json".into());
        assert!(painting.annotations().is_none());
    }

    #[test]
    fn test_genre_includes_by_join_record() {
        let genre = Genre {
            genre_id: 9,
            painting_genres: vec![PaintingGenre {
                painting_genre_id: 1,
                painting_id: 5,
                genre_id: 9,
            }],
            ..Default::default()
        };

        assert!(genre.includes(5));
        assert!(!genre.includes(6));
    }

    #[test]
    fn test_artist_full_name_skips_missing_parts() {
        let artist = Artist {
            last_name: Some("Vermeer".into()),
            ..Default::default()
        };
        assert_eq!(artist.full_name(), "Vermeer");
    }
}
