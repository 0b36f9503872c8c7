use crate::{
    InitArgs,
    config::{DEFAULT_CONFIG_FILE, SiteConfig},
};

pub async fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = if args.path.is_relative() {
        std::env::current_dir()?.join(&args.path)
    } else {
        args.path.clone()
    };

    if !path.exists() {
        if args.create {
            tokio::fs::create_dir_all(&path).await?;
            println!("Created directory {path}", path = path.display());
        } else {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {path}",
                path = path.display()
            ));
        }
    }

    let config_file = path.join(DEFAULT_CONFIG_FILE);
    if config_file.exists() {
        return Err(anyhow::anyhow!(
            "Config file already exists: {config_file}",
            config_file = config_file.display()
        ));
    }

    println!("Initializing project in {}", path.display());

    let config_text = serde_yaml::to_string(&SiteConfig::default())?;
    tokio::fs::write(&config_file, config_text).await?;

    println!(
        "Created config file {config_file}",
        config_file = config_file.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_writes_loadable_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            path: dir.path().join("site"),
            create: true,
        };

        run(&args).await.unwrap();

        let config = SiteConfig::load_from_arg(Some(&args.path.join(DEFAULT_CONFIG_FILE))).unwrap();
        assert_eq!(config, SiteConfig::default());

        // A second run never overwrites the file
        assert!(run(&args).await.is_err());
    }

    #[tokio::test]
    async fn test_init_requires_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            path: dir.path().join("missing"),
            create: false,
        };

        assert!(run(&args).await.is_err());
        assert!(!args.path.exists());
    }
}
