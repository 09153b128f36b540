use anyhow::Result;
use sheetstage::{run, DirStage, HttpStage, Loader, ParquetStore, StaticMappings};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) destination store ────────────────────────────────────────
    let store = ParquetStore::new("warehouse");
    let mut resolver = StaticMappings;

    // ─── 3) resolve mappings + load, sequentially ────────────────────
    // SHEETSTAGE_STAGE_URL serves the stage over HTTP; otherwise files are
    // taken from a local ./stage directory.
    let status = match std::env::var("SHEETSTAGE_STAGE_URL") {
        Ok(base) => {
            let stage = HttpStage::new(Url::parse(&base)?);
            run(&mut resolver, &Loader::new(stage, store))?
        }
        Err(_) => {
            let stage = DirStage::new("stage");
            run(&mut resolver, &Loader::new(stage, store))?
        }
    };

    info!(%status, "run complete");
    println!("{status}");
    Ok(())
}
