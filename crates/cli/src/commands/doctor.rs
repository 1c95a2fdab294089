//! `pagewise doctor`: Diagnose configuration and provider health.

use pagewise_config::AppConfig;
use pagewise_core::Provider;
use pagewise_store::SqliteStore;

pub async fn run() -> anyhow::Result<()> {
    println!("🩺 Pagewise Doctor");
    println!("================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ❌ No config file, run `pagewise onboard`");
        issues += 1;
    }

    match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");

            if config.has_api_key() {
                println!("  ✅ API key configured");

                match pagewise_providers::build_from_config(&config) {
                    Ok(provider) => match provider.health_check().await {
                        Ok(true) => println!("  ✅ Provider reachable ({})", provider.name()),
                        Ok(false) => {
                            println!("  ⚠️  Provider responded but reports unhealthy");
                            issues += 1;
                        }
                        Err(e) => {
                            println!("  ❌ Provider unreachable: {e}");
                            issues += 1;
                        }
                    },
                    Err(e) => {
                        println!("  ❌ Provider setup failed: {e}");
                        issues += 1;
                    }
                }
            } else {
                println!("  ⚠️  No API key, set PAGEWISE_API_KEY or add it to config.toml");
                issues += 1;
            }

            if config.store.backend == "sqlite" {
                let path = config.store_path();
                match SqliteStore::new(&path.to_string_lossy()).await {
                    Ok(_) => println!("  ✅ Catalog database opens: {}", path.display()),
                    Err(e) => {
                        println!("  ❌ Catalog database failed: {e}");
                        issues += 1;
                    }
                }
            }

            let transcript_dir = config.transcript_dir();
            if transcript_dir.exists() {
                println!("  ✅ Transcript directory exists");
            } else {
                println!(
                    "  ⚠️  No transcript directory yet (created on first chat): {}",
                    transcript_dir.display()
                );
            }
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
