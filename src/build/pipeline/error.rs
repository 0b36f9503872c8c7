//! Transformation error types.

use std::path::PathBuf;

/// Errors that abort the transformation of a single document.
///
/// None of these are retried. The caller decides whether a failure is fatal
/// (the `build` command) or isolated to one document (the server refresh).
#[derive(thiserror::Error, Debug)]
pub enum TransformError {
    #[error(
        "document does not contain mandatory <attributes title=\"Your Document Title\"></attributes> attribute"
    )]
    MissingTitleAttribute,

    #[error("must specify template HTML attribute file, none was specified")]
    MissingTemplateFile,

    #[error("failed to read template file {file}: {source}")]
    TemplateFileReadError {
        file: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse template html: {0}")]
    TemplateParseError(std::io::Error),

    #[error("unable to identify rendered template body or parent node for template {file}")]
    InvalidTemplateOutput { file: String },

    #[error("document directory not initialized")]
    DirectoryNotInitialized,

    #[error("cannot find parent for table node")]
    NoParentForTableNode,

    #[error("cannot find parent for directory node")]
    NoParentForDirectoryNode,

    #[error("document has no body node")]
    MissingBodyNode,

    #[error("gave up after expanding {limit} <{tag}> nodes; is a template including itself?")]
    SpecialNodeLimit { tag: &'static str, limit: usize },

    #[error("failed to process {tag} node: {source}")]
    SpecialNode {
        tag: &'static str,
        source: Box<TransformError>,
    },

    #[error("failed to parse html: {0}")]
    HtmlParseError(std::io::Error),

    #[error("failed to render html: {0}")]
    HtmlRenderError(String),
}

impl TransformError {
    /// Wrap a handler failure with the tag that was being drained.
    pub fn special_node(tag: &'static str, source: TransformError) -> Self {
        Self::SpecialNode {
            tag,
            source: Box::new(source),
        }
    }
}
