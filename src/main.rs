use gfu_lib::{logger, pattern_loader, Runner, Settings};

use clap::Parser;
use log::{info, error};
use std::error::Error;

const BANNER: &str = r"
          ____
   ____ _/ __/_  __
  / __ `/ /_/ / / /
 / /_/ / __/ /_/ /
 \__, /_/  \__,_/
/____/
";

fn main() -> Result<(), Box<dyn Error>> {
    let settings = Settings::parse();
    logger::init(settings.verbose);
    println!("{}", BANNER);

    // Listing never touches the network.
    if settings.list && settings.custom.is_none() {
        let dir = settings.pattern_dir();
        let files = pattern_loader::list_patterns(&dir).map_err(|e| {
            error!("Cannot read pattern folder {}: {}", dir.display(), e);
            e
        })?;
        if files.is_empty() {
            info!("No pattern files found in {}", dir.display());
        } else {
            println!("Available pattern files:");
            for file in files {
                println!("- {}", file);
            }
        }
        return Ok(());
    }

    info!("Delay between requests: {}", settings.delay);
    let runner = Runner::new(settings)?;
    let summary = runner.run()?;
    info!(
        "Done. {} unique URLs, {} files downloaded.",
        summary.urls.len(),
        summary.downloads.downloaded.len()
    );
    Ok(())
}
