//! The document library.
//!
//! A library is an immutable snapshot of every document that rendered
//! successfully in one scan of the documents directory. The server swaps in
//! a fresh library after each refresh.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::document::{Document, DocumentError, discover};
use super::paths::source_path;
use super::pipeline::stages::{FsTemplateStore, TemplateStore};
use super::pipeline::{TransformContext, Transformer};
use crate::config::SiteConfig;

#[derive(thiserror::Error, Debug)]
pub enum LibraryError {
    #[error("failed to walk documents directory {}: {source}", dir.display())]
    Discover {
        dir: PathBuf,
        source: walkdir::Error,
    },
}

/// Rendered documents, looked up by name.
#[derive(Debug, Default)]
pub struct Library {
    /// Every discovered name, rendered or not
    names: Arc<[String]>,
    documents: HashMap<String, Document>,
    failures: Vec<DocumentError>,
}

impl Library {
    /// Scan the configured documents directory and render every document
    /// with the default transformer and templates from disk.
    pub fn from_config(config: &SiteConfig) -> Result<Self, LibraryError> {
        let store = FsTemplateStore::new(&config.directories.templates);
        Self::load(config, &store, &Transformer::default())
    }

    /// Scan the documents directory and render every document.
    ///
    /// A document that fails is logged and left out; the others are still
    /// rendered.
    pub fn load(
        config: &SiteConfig,
        store: &dyn TemplateStore,
        transformer: &Transformer,
    ) -> Result<Self, LibraryError> {
        let dir = &config.directories.documents;
        let names: Arc<[String]> = discover(dir)
            .map_err(|source| LibraryError::Discover {
                dir: dir.clone(),
                source,
            })?
            .into();
        tracing::debug!(dir = %dir.display(), count = names.len(), "discovered documents");

        let ctx = TransformContext::new(config, Some(&*names), store);
        let mut documents = HashMap::with_capacity(names.len());
        let mut failures = Vec::new();

        for name in names.iter() {
            let result = std::fs::read_to_string(source_path(dir, name))
                .map_err(|source| DocumentError::Read {
                    path: source_path(dir, name),
                    source,
                })
                .and_then(|markdown| {
                    Document::from_markdown(name, &markdown, &ctx, transformer)
                });

            match result {
                Ok(document) => {
                    tracing::debug!(
                        document = %name,
                        title = %document.title,
                        attributes = document.attributes.len(),
                        "rendered document"
                    );
                    documents.insert(name.clone(), document);
                }
                Err(e) => {
                    tracing::warn!(document = %name, "failed to process document: {e}");
                    failures.push(e);
                }
            }
        }

        tracing::info!(
            documents = documents.len(),
            failed = failures.len(),
            "done reading directory"
        );

        Ok(Self {
            names,
            documents,
            failures,
        })
    }

    /// The document with the given name.
    pub fn get(&self, name: &str) -> Option<&Document> {
        self.documents.get(name)
    }

    /// Find the document served as `file_name`, i.e. whose name plus
    /// `url_file_suffix` equals it.
    pub fn find_by_file_name(&self, file_name: &str, url_file_suffix: &str) -> Option<&Document> {
        file_name
            .strip_suffix(url_file_suffix)
            .and_then(|name| self.get(name))
    }

    /// Rendered documents in discovery order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.names.iter().filter_map(|name| self.documents.get(name))
    }

    /// Every discovered document name, including failed ones.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Errors of the documents that failed to render.
    pub fn failures(&self) -> &[DocumentError] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
