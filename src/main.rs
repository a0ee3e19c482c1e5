use anyhow::Result;
use kibitz_core::EngineSettings;
use kibitz_engine::ReferenceEngine;
use kibitz_uci::UciEngine;
use tracing::info;

fn main() -> Result<()> {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    info!("kibitz starting");

    let engine = ReferenceEngine::with_settings(&EngineSettings::default());
    UciEngine::new(engine)?.run()?;
    Ok(())
}
