use std::path::Path;

use crate::{
    BuildArgs,
    build::{Library, output_path},
    config::SiteConfig,
};

pub async fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let config = SiteConfig::load_from_arg(args.config_file.as_deref())?;
    let suffix = config.routing.url_file_suffix.clone();

    let library = tokio::task::spawn_blocking(move || Library::from_config(&config)).await??;
    let written = write_pages(&library, &args.output, &suffix).await?;

    println!(
        "Built site to {} ({} documents)",
        args.output.display(),
        written
    );

    let failed = library.failures().len();
    if failed > 0 {
        return Err(anyhow::anyhow!(
            "{failed} of {total} documents failed to render",
            total = library.names().len()
        ));
    }

    Ok(())
}

/// Write every rendered document below `output_dir`.
async fn write_pages(
    library: &Library,
    output_dir: &Path,
    url_file_suffix: &str,
) -> Result<usize, std::io::Error> {
    let mut written = 0;
    for document in library.documents() {
        let path = output_path(output_dir, &document.name, url_file_suffix);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &document.rendered).await?;
        tracing::debug!(path = %path.display(), "wrote page");
        written += 1;
    }
    Ok(written)
}
