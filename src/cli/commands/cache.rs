//! Cache command - inspect or clear cached status

use crate::cache::CacheStore;
use crate::cli::args::{CacheAction, CacheArgs};
use crate::config::Config;
use crate::domains::Domain;
use crate::error::{DotpulseError, DotpulseResult};
use crate::refresh::cache_key;
use crate::ui::{self, UiContext};
use console::style;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> DotpulseResult<()> {
    match args.action {
        CacheAction::Path => {
            println!("{}", config.cache_dir().display());
            Ok(())
        }
        CacheAction::Show { domain } => {
            let store = CacheStore::open(config.cache_dir()).await?;
            show(&store, config, domain).await
        }
        CacheAction::Clear { domain, yes } => {
            let ctx = UiContext::detect().with_auto_yes(yes);
            let store = CacheStore::open(config.cache_dir()).await?;
            clear(&ctx, &store, config, domain).await
        }
    }
}

async fn show(store: &CacheStore, config: &Config, domain: Option<Domain>) -> DotpulseResult<()> {
    let domains = domain.map_or_else(|| Domain::ALL.to_vec(), |d| vec![d]);

    for domain in domains {
        let path = store.entry_path(&cache_key(config, domain));
        println!("{} {}", style(format!("# {}", domain)).bold(), style(path.display()).dim());
        match read_raw(&path).await? {
            Some(content) => println!("{}", content.trim_end()),
            None => println!("{}", style("(never checked)").dim()),
        }
    }

    Ok(())
}

async fn read_raw(path: &Path) -> DotpulseResult<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DotpulseError::io(format!("reading {}", path.display()), e)),
    }
}

async fn clear(
    ctx: &UiContext,
    store: &CacheStore,
    config: &Config,
    domain: Option<Domain>,
) -> DotpulseResult<()> {
    let prompt = match domain {
        Some(d) => format!("Delete the cached {} status?", d),
        None => format!("Delete every cache file in {}?", store.dir().display()),
    };
    if !ui::confirm(ctx, &prompt, false).await? {
        ui::step_info(ctx, "Nothing deleted (pass --yes to skip the prompt)");
        return Ok(());
    }

    match domain {
        Some(domain) => {
            if store.remove(&cache_key(config, domain)).await? {
                ui::step_ok(ctx, &format!("Cleared {} cache", domain));
            } else {
                ui::step_info(ctx, &format!("No {} cache to clear", domain));
            }
        }
        None => {
            let removed = store.clear().await?;
            ui::step_ok(ctx, &format!("Removed {} cache file(s)", removed));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, CacheKey};
    use crate::domains::GitPayload;
    use tempfile::TempDir;

    fn yes() -> UiContext {
        UiContext::non_interactive().with_auto_yes(true)
    }

    async fn setup() -> (TempDir, Config, CacheStore) {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.cache.dir = Some(temp.path().join("cache"));
        config.git.repo = Some(temp.path().to_path_buf());
        let store = CacheStore::open(config.cache_dir()).await.unwrap();
        (temp, config, store)
    }

    #[tokio::test]
    async fn clear_single_domain() {
        let (_temp, config, store) = setup().await;
        let git = cache_key(&config, Domain::Git);
        store
            .write(&git, &CacheEntry::new(1, GitPayload::default()))
            .await
            .unwrap();
        std::fs::write(store.dir().join("init.json"), "{}").unwrap();

        clear(&yes(), &store, &config, Some(Domain::Git)).await.unwrap();

        assert!(!store.entry_path(&git).exists());
        assert!(store.dir().join("init.json").exists());
    }

    #[tokio::test]
    async fn clear_declined_without_terminal() {
        let (_temp, config, store) = setup().await;
        std::fs::write(store.dir().join("init.json"), "{}").unwrap();

        clear(&UiContext::non_interactive(), &store, &config, None)
            .await
            .unwrap();

        assert!(store.dir().join("init.json").exists());
    }

    #[tokio::test]
    async fn clear_everything_with_yes() {
        let (_temp, config, store) = setup().await;
        std::fs::write(store.dir().join("init.json"), "{}").unwrap();
        std::fs::write(store.dir().join("packages.json"), "{}").unwrap();

        clear(&yes(), &store, &config, None).await.unwrap();

        assert!(!store.dir().join("init.json").exists());
        assert!(!store.dir().join("packages.json").exists());
    }

    #[test]
    fn git_key_matches_the_refresher() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.git.repo = Some(temp.path().to_path_buf());
        let canonical = std::fs::canonicalize(temp.path()).unwrap();

        assert_eq!(
            cache_key(&config, Domain::Git),
            CacheKey::scoped(Domain::Git, &canonical)
        );
    }
}
