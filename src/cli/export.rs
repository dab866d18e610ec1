use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use crate::store::ResourceStore;

use super::{StoreArgs, load_config, open_catalog};

pub fn run_export(args: StoreArgs, output: PathBuf) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let catalog = open_catalog(&config)?;

    let mut sink = BufWriter::new(File::create(&output)?);
    let bytes = catalog.export_snapshot(&mut sink)?;
    sink.into_inner().map_err(|e| e.into_error())?.sync_all()?;

    println!("Wrote {bytes} bytes to {}", output.display());
    Ok(())
}
