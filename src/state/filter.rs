/// Selection, filtering and sorting of paintings
///
/// The visible painting list is never stored. It is recomputed from the
/// full painting collection, the genres (for their join rows), the active
/// selection and the sort key.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::data::{Genre, Painting};

/// The single active filter axis.
///
/// Holding one value makes it impossible for a gallery and a genre (say)
/// to be selected at the same time.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Selection {
    /// Nothing selected: nothing shown
    #[default]
    None,
    ByGallery(i64),
    ByGenre(i64),
    ByArtist(i64),
    /// The explicit painting-filter view
    Filtered(PaintingFilter),
}

/// Criteria for the painting-filter view. Exactly one axis at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintingFilter {
    /// Case-insensitive substring of the title. Empty text matches all.
    Title(String),
    Artist(i64),
    Gallery(i64),
    /// Inclusive year range; a missing bound is open
    Years { min: Option<i32>, max: Option<i32> },
}

impl Default for PaintingFilter {
    /// The filter view opens on the year axis with 1600..=1650
    fn default() -> Self {
        PaintingFilter::Years {
            min: Some(1600),
            max: Some(1650),
        }
    }
}

impl PaintingFilter {
    fn matches(&self, painting: &Painting) -> bool {
        match self {
            PaintingFilter::Title(text) => {
                let needle = text.to_lowercase();
                painting
                    .title
                    .as_deref()
                    .map(|t| t.to_lowercase().contains(&needle))
                    .unwrap_or(needle.is_empty())
            }
            PaintingFilter::Artist(id) => painting.artist_id == Some(*id),
            PaintingFilter::Gallery(id) => painting.gallery_id == Some(*id),
            PaintingFilter::Years { min, max } => {
                if min.is_none() && max.is_none() {
                    return true;
                }
                match painting.year_of_work {
                    Some(year) => {
                        min.map_or(true, |lo| year >= lo) && max.map_or(true, |hi| year <= hi)
                    }
                    None => false,
                }
            }
        }
    }

    /// Short label for status lines, e.g. "year"
    pub fn axis(&self) -> &'static str {
        match self {
            PaintingFilter::Title(_) => "title",
            PaintingFilter::Artist(_) => "artist",
            PaintingFilter::Gallery(_) => "gallery",
            PaintingFilter::Years { .. } => "year",
        }
    }
}

/// Compute the visible paintings for a selection.
///
/// Absent fields never match; with no selection the result is empty.
pub fn derive_visible_paintings(
    all: &[Painting],
    genres: &[Genre],
    selection: &Selection,
) -> Vec<Painting> {
    match selection {
        Selection::None => Vec::new(),
        Selection::ByGallery(id) => all
            .iter()
            .filter(|p| p.gallery_id == Some(*id))
            .cloned()
            .collect(),
        Selection::ByArtist(id) => all
            .iter()
            .filter(|p| p.artist_id == Some(*id))
            .cloned()
            .collect(),
        Selection::ByGenre(id) => {
            let Some(genre) = genres.iter().find(|g| g.genre_id == *id) else {
                return Vec::new();
            };
            all.iter()
                .filter(|p| genre.includes(p.painting_id))
                .cloned()
                .collect()
        }
        Selection::Filtered(filter) => all.iter().filter(|p| filter.matches(p)).cloned().collect(),
    }
}

/// Orderings offered by the painting lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Title,
    Year,
    LastName,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Title => "title",
            SortKey::Year => "year",
            SortKey::LastName => "lastName",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortKey(pub String);

impl fmt::Display for UnknownSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sort key '{}' (expected title, year or lastName)", self.0)
    }
}

impl std::error::Error for UnknownSortKey {}

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(SortKey::Title),
            "year" => Ok(SortKey::Year),
            "lastname" | "last-name" | "last_name" => Ok(SortKey::LastName),
            _ => Err(UnknownSortKey(s.to_string())),
        }
    }
}

/// Sort paintings in place. The sort is stable; `None` leaves the order as is.
pub fn sort_paintings(list: &mut [Painting], key: Option<SortKey>) {
    match key {
        Some(SortKey::Title) => list.sort_by(|a, b| locale_compare(a.title.as_deref(), b.title.as_deref())),
        Some(SortKey::Year) => list.sort_by(|a, b| missing_last(a.year_of_work, b.year_of_work, Ord::cmp)),
        Some(SortKey::LastName) => {
            list.sort_by(|a, b| locale_compare(a.artist_last_name(), b.artist_last_name()))
        }
        None => {}
    }
}

/// Sort by a textual key; unrecognized keys leave the order untouched
pub fn sort_paintings_by(list: &mut [Painting], key: &str) {
    sort_paintings(list, key.parse().ok());
}

/// Locale-style comparison in three levels: base letters (accents and
/// case folded away), then accents (unaccented first), then case
/// (lowercase first). Missing values sort last.
pub fn locale_compare(a: Option<&str>, b: Option<&str>) -> Ordering {
    missing_last(a, b, |a, b| {
        base_letters(a)
            .cmp(&base_letters(b))
            .then_with(|| accented(a).cmp(&accented(b)))
            .then_with(|| b.cmp(a))
    })
}

/// Lowercased with diacritics stripped, e.g. "École" -> "ecole"
fn base_letters(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Lowercased and decomposed, keeping the combining marks
fn accented(s: &str) -> String {
    s.nfd().flat_map(char::to_lowercase).collect()
}

fn missing_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(&a, &b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
