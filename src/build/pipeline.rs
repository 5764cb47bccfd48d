//! Per-category stage pipelines.
//!
//! Every category has a fixed, ordered list of stages. A stage that is
//! disabled in the configuration stays in the list as [`Stage::Identity`],
//! so the shape of a pipeline never depends on configuration; only what
//! each slot does.

use crate::build::{BuildContext, Category, Fileset};
use crate::config::{AssetConfig, MinifyConfig};
use crate::stages::css::{Autoprefix, Comb, StyleLint, StyleMinify};
use crate::stages::html::MarkupMinify;
use crate::stages::image::Optimize;
use crate::stages::js::{ScriptLint, ScriptMinify};
use crate::stages::rename::Rename;
use crate::stages::sass::Compile;
use crate::stages::sourcemap::{SourceMapsInit, SourceMapsWrite};
use crate::stages::{Diagnostic, MinifyTarget, StageError, Transform};

/// One slot in a pipeline.
pub enum Stage {
    /// Disabled stage; passes the fileset through unchanged
    Identity(&'static str),
    /// Enabled stage
    Transform(Box<dyn Transform>),
}

impl Stage {
    /// Build a slot that is `Transform` when `enabled`, `Identity` otherwise.
    fn when<T: Transform + 'static>(enabled: bool, name: &'static str, make: impl FnOnce() -> T) -> Self {
        if enabled {
            Stage::Transform(Box::new(make()))
        } else {
            Stage::Identity(name)
        }
    }

    /// Stage name.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Identity(name) => name,
            Stage::Transform(t) => t.name(),
        }
    }

    /// Whether the stage transforms anything.
    pub fn is_enabled(&self) -> bool {
        matches!(self, Stage::Transform(_))
    }

    /// Run the stage.
    pub fn apply(&self, files: Fileset, diagnostics: &mut Vec<Diagnostic>) -> Result<Fileset, StageError> {
        match self {
            Stage::Identity(_) => Ok(files),
            Stage::Transform(t) => t.apply(files, diagnostics),
        }
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Identity(name) => write!(f, "Identity({})", name),
            Stage::Transform(t) => write!(f, "Transform({})", t.name()),
        }
    }
}

fn minify_target(config: &MinifyConfig) -> MinifyTarget {
    MinifyTarget { keep_original: config.keep_original, suffix: config.suffix.clone() }
}

/// The ordered stages of one category.
#[derive(Debug)]
pub struct Pipeline {
    category: Category,
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Assemble the pipeline of `category` from the context's configuration.
    pub fn for_category(ctx: &BuildContext, category: Category) -> Self {
        let config: &AssetConfig = ctx.config();
        let stages = match category {
            Category::Markup => {
                let markup = &config.markup;
                vec![Stage::when(markup.minify.enabled, "minify", || MarkupMinify::new(&markup.minify))]
            }
            Category::Style => {
                let style = &config.style;
                let include_paths = style.compile.include_paths.iter().map(|p| ctx.resolve_path(p)).collect();
                // Keep prefixes that autoprefix added when minifying.
                let browsers =
                    if style.autoprefix.enabled { style.autoprefix.browsers.clone() } else { Vec::new() };
                vec![
                    Stage::when(style.sourcemaps.enabled, "sourcemaps-init", || SourceMapsInit),
                    Stage::when(style.compile.enabled, "compile", || {
                        Compile::new(include_paths, style.compile.output_style)
                    }),
                    Stage::when(style.autoprefix.enabled, "autoprefix", || {
                        Autoprefix::new(style.autoprefix.browsers.clone())
                    }),
                    Stage::when(style.comb.enabled, "comb", || Comb),
                    Stage::when(style.lint.enabled, "lint", || StyleLint::new(style.lint.strict)),
                    Stage::when(style.minify.enabled, "minify", || {
                        StyleMinify::new(minify_target(&style.minify), browsers)
                    }),
                    Stage::when(style.rename.enabled, "rename", || {
                        Rename::new(style.rename.prefix.as_str(), style.rename.suffix.as_str())
                    }),
                    Stage::when(style.sourcemaps.enabled, "sourcemaps-write", || {
                        SourceMapsWrite::new(style.sourcemaps.target)
                    }),
                ]
            }
            Category::Script => {
                let script = &config.script;
                vec![
                    Stage::when(script.lint.enabled, "lint", || ScriptLint::new(script.lint.strict)),
                    Stage::when(script.minify.enabled, "minify", || ScriptMinify::new(minify_target(&script.minify))),
                    Stage::when(script.rename.enabled, "rename", || {
                        Rename::new(script.rename.prefix.as_str(), script.rename.suffix.as_str())
                    }),
                ]
            }
            Category::Image => {
                let optimize = &config.image.optimize;
                vec![Stage::when(optimize.enabled, "optimize", || Optimize::new(optimize.jpeg_quality))]
            }
            Category::Font => vec![],
        };
        Self { category, stages }
    }

    /// Category this pipeline belongs to.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Names of all stages in order, enabled or not.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }

    /// Names of the enabled stages in order.
    pub fn enabled_stages(&self) -> Vec<&'static str> {
        self.stages.iter().filter(|s| s.is_enabled()).map(Stage::name).collect()
    }

    /// Fold the fileset through every stage in order.
    pub fn run(&self, files: Fileset, diagnostics: &mut Vec<Diagnostic>) -> Result<Fileset, StageError> {
        self.stages.iter().try_fold(files, |set, stage| {
            tracing::trace!(category = %self.category, stage = stage.name(), files = set.len(), "stage");
            stage.apply(set, diagnostics)
        })
    }
}
