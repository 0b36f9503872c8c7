use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

use crate::{
    ServeArgs,
    build::{ChangeKind, FileWatcher, Library, WatchEvent, WatchPaths},
    config::SiteConfig,
    server::{self, AppState},
};

pub async fn run(args: &ServeArgs) -> Result<(), anyhow::Error> {
    let config = Arc::new(SiteConfig::load_from_arg(args.config_file.as_deref())?);

    // The first scan must succeed; later failures keep the last good library
    let initial = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || Library::from_config(&config)).await??
    };
    if initial.is_empty() {
        tracing::warn!(
            dir = %config.directories.documents.display(),
            "no documents rendered, every page will 404 until the next refresh"
        );
    }
    let state = Arc::new(AppState::new(initial, config.routing.clone()));

    let listen_addr = args.bind.as_deref().unwrap_or(&config.listen_addr);
    let addr: SocketAddr = listen_addr.parse()?;
    // Nothing is started until the address is ours
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let display_host = if addr.ip().is_unspecified() {
        "localhost".to_string()
    } else {
        addr.ip().to_string()
    };
    let url = format!(
        "http://{}:{}{}",
        display_host,
        addr.port(),
        config.routing.route_prefix
    );
    tracing::info!("begin listening on {addr}, serving {url}");

    let trigger = Arc::new(Notify::new());
    if config.watch.enabled && !args.no_watch {
        spawn_watcher(&config, trigger.clone());
    }
    tokio::spawn(refresh_loop(state.clone(), config.clone(), trigger));

    if args.open
        && let Err(e) = open::that(&url)
    {
        tracing::warn!("Failed to open browser: {e}");
    }

    let app = server::router(state, &config);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Refresh the library every `refresh_interval_secs`, and whenever the
/// watcher reports a change.
async fn refresh_loop(state: Arc<AppState>, config: Arc<SiteConfig>, trigger: Arc<Notify>) {
    let period = Duration::from_secs(config.refresh_interval_secs);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately and the library was just loaded
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = trigger.notified() => interval.reset(),
        }
        state.refresh(config.clone()).await;
        tracing::info!(
            documents = state.library().len(),
            "done reading directory, sleeping {}s",
            period.as_secs()
        );
    }
}

/// Start the file watcher on its own thread. Every batch of changes wakes
/// the refresh loop.
/// The thread is detached and never joined.
fn spawn_watcher(config: &SiteConfig, trigger: Arc<Notify>) {
    let paths = WatchPaths::canonical(
        &config.directories.documents,
        &config.directories.templates,
    );

    let watcher = match FileWatcher::new(&config.watch, paths) {
        Ok(watcher) => watcher,
        Err(e) => {
            tracing::warn!("Failed to start file watcher: {e}");
            return;
        }
    };

    tracing::info!("Watching for changes...");
    let spawned = std::thread::Builder::new()
        .name("lightsites-watch".to_string())
        .spawn(move || {
            while let Some(event) = watcher.recv() {
                match event {
                    WatchEvent::FilesChanged(changes) => {
                        tracing::info!("Detected {} change(s), refreshing", changes.len());
                        for change in &changes {
                            match change {
                                ChangeKind::Document { path, deleted } => {
                                    tracing::debug!(path = %path.display(), deleted, "document changed");
                                }
                                ChangeKind::Template { path } => {
                                    tracing::debug!(path = %path.display(), "template changed");
                                }
                            }
                        }
                        trigger.notify_one();
                    }
                    WatchEvent::Error(e) => {
                        tracing::warn!("Watch error: {e}");
                    }
                }
            }
        });
    if let Err(e) = spawned {
        tracing::warn!("Failed to start file watcher thread: {e}");
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use super::*;

    fn write_site(dir: &Path, listen_addr: &str) -> std::path::PathBuf {
        let content = dir.join("content");
        std::fs::create_dir_all(&content).unwrap();
        std::fs::create_dir_all(dir.join("templates")).unwrap();
        std::fs::write(content.join("index.md"), "<attributes title=\"Home\"></attributes>\n").unwrap();

        let config_file = dir.join("lightsites.yaml");
        std::fs::write(
            &config_file,
            format!(
                "listen_addr: \"{listen_addr}\"\ndirectories:\n  documents: {}\n  templates: {}\n  assets: {}\nwatch:\n  enabled: true\n",
                content.display(),
                dir.join("templates").display(),
                dir.join("assets").display(),
            ),
        )
        .unwrap();
        config_file
    }

    // Runs on a dedicated runtime: dropping it waits for every blocking task,
    // so a watcher left behind by a failed start would hang the test.
    #[test]
    fn test_address_in_use_fails_without_hanging() {
        let dir = tempfile::tempdir().unwrap();
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap().to_string();
        let args = ServeArgs {
            config_file: Some(write_site(dir.path(), &addr)),
            bind: None,
            no_watch: false,
            open: false,
            verbose: false,
        };

        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let result = runtime.block_on(run(&args));
            drop(runtime);
            let _ = tx.send(result.is_err());
        });

        let failed = rx
            .recv_timeout(Duration::from_secs(30))
            .expect("serve did not exit after failing to bind");
        assert!(failed);
        drop(taken);
    }
}
