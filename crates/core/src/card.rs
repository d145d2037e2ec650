//! Pure mapping from a recipe record to its visual card.

use crate::models::Recipe;

/// Toolkit-independent contents of one rendered recipe card.
///
/// Frontends decide layout; this struct fixes what a card shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    /// Image location.
    pub image_src: String,
    /// Accessibility text for the image.
    pub image_alt: String,
    /// Title text, rendered as a hyperlink.
    pub title_text: String,
    /// Target of the title hyperlink.
    pub title_link: String,
    /// Source name.
    pub organization: String,
    /// Numeric rating shown next to the star indicator.
    pub rating: u8,
    /// Star icon asset name, `{rating}-star`.
    pub star_icon: String,
    /// Rating count label, `(N)`.
    pub rating_count: String,
    /// Duration, shown verbatim.
    pub duration: String,
    /// Ingredient summary.
    pub ingredients: String,
}

impl CardView {
    /// Star indicator as text, for frontends without image assets.
    pub fn star_glyphs(&self) -> String {
        let filled = usize::from(self.rating.min(crate::models::MAX_RATING));
        let mut glyphs = "★".repeat(filled);
        glyphs.push_str(&"☆".repeat(usize::from(crate::models::MAX_RATING) - filled));
        glyphs
    }
}

/// Render one recipe into its card. One record, one card.
pub fn render(recipe: &Recipe) -> CardView {
    CardView {
        image_src: recipe.img_src.clone(),
        image_alt: recipe.img_alt.clone(),
        title_text: recipe.title_txt.clone(),
        title_link: recipe.title_lnk.clone(),
        organization: recipe.organization.clone(),
        rating: recipe.rating,
        star_icon: recipe.star_icon(),
        rating_count: format!("({})", recipe.num_ratings),
        duration: recipe.length_time.clone(),
        ingredients: recipe.ingredients.clone(),
    }
}
