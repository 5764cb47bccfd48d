//! Asset categories.
//!
//! A category is a class of static asset with its own source folder,
//! destination folder and pipeline.

use std::str::FromStr;

/// Class of static asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// HTML pages
    Markup,
    /// Stylesheets (SCSS, Sass, CSS)
    Style,
    /// JavaScript
    Script,
    /// Raster images
    Image,
    /// Web fonts
    Font,
}

impl Category {
    /// Every category, in aggregate build order.
    pub const ALL: [Category; 5] =
        [Category::Markup, Category::Style, Category::Script, Category::Image, Category::Font];

    /// Task name used on the command line and in config sections.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Markup => "markup",
            Category::Style => "style",
            Category::Script => "script",
            Category::Image => "image",
            Category::Font => "font",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markup" | "html" => Ok(Category::Markup),
            "style" | "css" => Ok(Category::Style),
            "script" | "js" => Ok(Category::Script),
            "image" | "images" => Ok(Category::Image),
            "font" | "fonts" => Ok(Category::Font),
            other => Err(format!(
                "unknown category '{}'; expected one of markup, style, script, image, font",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display_round_trips_through_from_str() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn test_category_aliases() {
        assert_eq!("CSS".parse::<Category>(), Ok(Category::Style));
        assert_eq!("images".parse::<Category>(), Ok(Category::Image));
        assert!("video".parse::<Category>().is_err());
    }
}
