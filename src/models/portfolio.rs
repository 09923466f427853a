use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Category a portfolio piece belongs to.
///
/// The wire format matches the CMS schema's radio list values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Photography,
    GraphicDesign,
}

impl Category {
    /// Human readable label used in the studio preview and the UI.
    pub fn label(self) -> &'static str {
        match self {
            Category::Photography => "Photography",
            Category::GraphicDesign => "Graphic Design",
        }
    }
}

/// A single image of the portfolio as delivered by the content provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioImage {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub src: String,
    pub alt: String,
}

impl PortfolioImage {
    /// Build an image whose alt text is its title, as the CMS mapping does.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        category: Category,
        src: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            alt: title.clone(),
            title,
            category,
            src: src.into(),
        }
    }

    /// The read-only record handed to the slideshow engine.
    pub fn to_record(&self) -> ImageRecord {
        ImageRecord {
            id: self.id.clone(),
            display_text: self.alt.clone(),
            locator: self.src.clone(),
        }
    }
}

/// Immutable value the slideshow engine displays.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRecord {
    pub id: String,
    pub display_text: String,
    pub locator: String,
}

/// Ordered, shared, read-only list of records. Insertion order is display order.
pub type ImageSequence = Arc<[ImageRecord]>;

/// Active category filter of the gallery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Filter {
    #[default]
    All,
    Photography,
    GraphicDesign,
}

impl Filter {
    /// Tab order used by the header and by category chaining.
    pub const ORDER: [Filter; 3] = [Filter::Photography, Filter::GraphicDesign, Filter::All];

    pub fn matches(self, category: Category) -> bool {
        match self {
            Filter::All => true,
            Filter::Photography => category == Category::Photography,
            Filter::GraphicDesign => category == Category::GraphicDesign,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Photography => Category::Photography.label(),
            Filter::GraphicDesign => Category::GraphicDesign.label(),
        }
    }

    /// Stable key used across the UI boundary.
    pub fn key(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Photography => "photography",
            Filter::GraphicDesign => "graphic-design",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "all" => Some(Filter::All),
            "photography" => Some(Filter::Photography),
            "graphic-design" => Some(Filter::GraphicDesign),
            _ => None,
        }
    }

    /// Slice `images` down to this filter, keeping display order.
    pub fn apply(self, images: &[PortfolioImage]) -> ImageSequence {
        images
            .iter()
            .filter(|image| self.matches(image.category))
            .map(PortfolioImage::to_record)
            .collect()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
