use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use blaze_consensus::chainparams::{install_params, GenesisCheck};
use blaze_consensus::primitives::Sha256dHasher;
use blaze_consensus::{ChainRegistry, Settings};

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::load(path.as_deref())?;

    let mut registry = ChainRegistry::new(Arc::new(Sha256dHasher), GenesisCheck::MerkleRoot)?;
    let params = settings.apply(&mut registry)?;
    install_params(Arc::clone(&params))?;

    println!("{}", serde_json::to_string_pretty(&params.summary())?);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    log::info!("Blaze chain params starting up...");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
