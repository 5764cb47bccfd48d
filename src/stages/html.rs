//! Markup minification via minify-html.

use super::{Diagnostic, StageError, Transform};
use crate::build::{AssetFile, Fileset};
use crate::config::HtmlMinifyConfig;

#[derive(Debug, Clone)]
pub struct MarkupMinify {
    keep_comments: bool,
    minify_css: bool,
    minify_js: bool,
}

impl MarkupMinify {
    pub fn new(config: &HtmlMinifyConfig) -> Self {
        Self { keep_comments: config.keep_comments, minify_css: config.minify_css, minify_js: config.minify_js }
    }

    fn cfg(&self) -> minify_html::Cfg {
        let mut cfg = minify_html::Cfg::new();
        cfg.keep_comments = self.keep_comments;
        cfg.minify_css = self.minify_css;
        cfg.minify_js = self.minify_js;
        cfg
    }
}

impl Transform for MarkupMinify {
    fn name(&self) -> &'static str {
        "minify"
    }

    fn apply(&self, files: Fileset, _diagnostics: &mut Vec<Diagnostic>) -> Result<Fileset, StageError> {
        let cfg = self.cfg();
        Ok(files
            .into_iter()
            .map(|file| match file.extension().as_deref() {
                Some("html" | "htm") => AssetFile { contents: minify_html::minify(&file.contents, &cfg), ..file },
                _ => file,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const PAGE: &str =
        "<!doctype html>\n<html>\n  <body>\n    <!-- banner -->\n    <p>  Hello   world  </p>\n  </body>\n</html>\n";

    fn page() -> Fileset {
        Fileset::new(vec![AssetFile::new("index.html", "/src/index.html", PAGE.as_bytes().to_vec())])
    }

    #[test]
    fn test_markup_minify_strips_whitespace_and_comments() {
        let out = MarkupMinify::new(&HtmlMinifyConfig::default()).apply(page(), &mut vec![]).unwrap();

        let html = String::from_utf8(out.get(Path::new("index.html")).unwrap().contents.clone()).unwrap();
        assert!(html.len() < PAGE.len());
        assert!(!html.contains("banner"));
        assert!(html.contains("Hello world"));
    }

    #[test]
    fn test_markup_minify_keep_comments() {
        let config = HtmlMinifyConfig { enabled: true, keep_comments: true, ..HtmlMinifyConfig::default() };

        let out = MarkupMinify::new(&config).apply(page(), &mut vec![]).unwrap();

        let html = String::from_utf8(out.get(Path::new("index.html")).unwrap().contents.clone()).unwrap();
        assert!(html.contains("banner"));
    }
}
