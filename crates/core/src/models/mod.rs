//! Shared domain models.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Highest rating a recipe can carry.
pub const MAX_RATING: u8 = 5;

/// One user-entered recipe.
///
/// The serialized keys keep the camelCase names used by the stored
/// collection format, so an existing `recipes.json` keeps loading
/// across versions of the app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Image location (URL or path).
    #[serde(rename = "imgSrc", default)]
    pub img_src: String,
    /// Accessibility text for the image.
    #[serde(rename = "imgAlt", default)]
    pub img_alt: String,
    /// External URL the title links to.
    #[serde(rename = "titleLnk", default)]
    pub title_lnk: String,
    /// Display title.
    #[serde(rename = "titleTxt", default)]
    pub title_txt: String,
    /// Source name (site, chef, publication).
    #[serde(default)]
    pub organization: String,
    /// Star rating, 0 through [`MAX_RATING`].
    #[serde(default)]
    pub rating: u8,
    /// How many ratings the score is based on.
    #[serde(rename = "numRatings", default)]
    pub num_ratings: u32,
    /// Duration, used verbatim as both machine and display value.
    #[serde(rename = "lengthTime", default)]
    pub length_time: String,
    /// Free-text ingredient summary.
    #[serde(default)]
    pub ingredients: String,
}

/// Field names accepted by [`Recipe::from_fields`], in display order.
pub const FIELD_NAMES: [&str; 9] = [
    "imgSrc",
    "imgAlt",
    "titleLnk",
    "titleTxt",
    "organization",
    "rating",
    "numRatings",
    "lengthTime",
    "ingredients",
];

impl Recipe {
    /// Build a recipe from submitted form fields.
    ///
    /// Field names are the serialized field names (`imgSrc`, `rating`, ...).
    /// Fields outside the schema are dropped; missing fields stay at their
    /// defaults. The numeric fields are normalized here: an unparseable
    /// `rating` or `numRatings` becomes 0, and `rating` is capped at
    /// [`MAX_RATING`].
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let text = |name: &str| fields.get(name).cloned().unwrap_or_default();
        let rating = fields
            .get("rating")
            .and_then(|value| value.trim().parse::<u8>().ok())
            .unwrap_or(0)
            .min(MAX_RATING);
        let num_ratings = fields
            .get("numRatings")
            .and_then(|value| value.trim().parse::<u32>().ok())
            .unwrap_or(0);

        Self {
            img_src: text("imgSrc"),
            img_alt: text("imgAlt"),
            title_lnk: text("titleLnk"),
            title_txt: text("titleTxt"),
            organization: text("organization"),
            rating,
            num_ratings,
            length_time: text("lengthTime"),
            ingredients: text("ingredients"),
        }
    }

    /// Name of the star icon asset for this rating (e.g. `4-star`).
    pub fn star_icon(&self) -> String {
        format!("{}-star", self.rating)
    }
}
