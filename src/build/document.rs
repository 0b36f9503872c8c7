use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::markdown::{MarkdownError, render_page};
use super::paths::document_name;
use super::pipeline::{TransformContext, TransformError, Transformer};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum DocumentError {
    #[error("failed to read file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to render markdown for file {name}: {source}")]
    Markdown { name: String, source: MarkdownError },

    #[error("failed to process HTML tree for file {name}: {source}")]
    Transform { name: String, source: TransformError },
}

// =============================================================================
// Discovery
// =============================================================================

/// Find every markdown document below `dir`, as document names.
///
/// Names are `/`-separated paths relative to `dir` without the `.md`
/// extension, in walk order with each directory's entries sorted by name.
/// Hidden files are included; listings decide whether to show them.
pub fn discover(dir: &Path) -> Result<Vec<String>, walkdir::Error> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        if let Some(name) = document_name(relative) {
            names.push(name);
        }
    }
    Ok(names)
}

// =============================================================================
// Documents
// =============================================================================

/// A rendered document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Document name, also its id: source path relative to the documents
    /// directory without the `.md` extension
    pub name: String,
    /// Title from the `<attributes>` marker
    pub title: String,
    /// Every attribute from the `<attributes>` markers, title included
    pub attributes: BTreeMap<String, String>,
    /// The final page
    pub rendered: String,
}

impl Document {
    /// Render a document from its markdown source.
    ///
    /// Leading blank lines are dropped before rendering.
    pub fn from_markdown(
        name: &str,
        markdown: &str,
        ctx: &TransformContext,
        transformer: &Transformer,
    ) -> Result<Self, DocumentError> {
        let markdown = markdown.trim_start_matches('\n');

        let page = render_page(markdown, &ctx.config.markdown).map_err(|source| {
            DocumentError::Markdown {
                name: name.to_string(),
                source,
            }
        })?;

        let output = transformer
            .run(&page, ctx)
            .map_err(|source| DocumentError::Transform {
                name: name.to_string(),
                source,
            })?;

        Ok(Self {
            name: name.to_string(),
            title: output.title().to_string(),
            attributes: output.attributes,
            rendered: output.html,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::build::pipeline::stages::MemoryTemplateStore;
    use crate::config::SiteConfig;

    fn write(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_discover_walks_recursively_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.md", "");
        write(dir.path(), "a.md", "");
        write(dir.path(), "guides/setup.md", "");
        write(dir.path(), "guides/notes.txt", "");
        write(dir.path(), ".hidden.md", "");

        let names = discover(dir.path()).unwrap();

        assert_eq!(names, [".hidden", "a", "b", "guides/setup"]);
    }

    #[test]
    fn test_discover_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_from_markdown() {
        let config = SiteConfig::default();
        let store = MemoryTemplateStore::default();
        let siblings = vec!["intro".to_string()];
        let ctx = TransformContext::new(&config, Some(siblings.as_slice()), &store);

        let doc = Document::from_markdown(
            "intro",
            "\n\n<attributes title=\"Intro\" tag=\"start\"></attributes>\n\n# Welcome\n",
            &ctx,
            &Transformer::default(),
        )
        .unwrap();

        assert_eq!(doc.title, "Intro");
        assert_eq!(doc.attributes["tag"], "start");
        assert!(doc.rendered.contains("<title>Intro</title>"));
        assert!(doc.rendered.contains(r#"<h1 id="welcome">Welcome</h1>"#));
        assert!(!doc.rendered.contains("<attributes"));
    }

    #[test]
    fn test_from_markdown_without_title_fails() {
        let config = SiteConfig::default();
        let store = MemoryTemplateStore::default();
        let ctx = TransformContext::new(&config, None, &store);

        let err = Document::from_markdown(
            "draft",
            "# No metadata\n",
            &ctx,
            &Transformer::default(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            DocumentError::Transform {
                source: TransformError::MissingTitleAttribute,
                ..
            }
        ));
        assert!(err.to_string().starts_with("failed to process HTML tree for file draft"));
    }
}
