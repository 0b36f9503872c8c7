//! Special-node handlers.
//!
//! The transformer drains these in order:
//!
//! 1. **TemplateNode** - Expand `<template file="...">` inclusions
//! 2. **DirectoryNode** - Replace `<directory>` with a listing of the site
//! 3. **TableNode** - Wrap tables in a responsive container

mod directory;
mod table;
mod template;

pub use directory::DirectoryNode;
pub use table::TableNode;
#[cfg(test)]
pub use template::MemoryTemplateStore;
pub use template::{FsTemplateStore, TemplateNode, TemplateStore};
