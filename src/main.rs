use std::env;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process;
use std::time::Instant;

use anyhow::Context;

use one_brc_pipeline::pipeline::{self, Options};

fn main() -> anyhow::Result<()> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "one-brc-pipeline".into());
    let path = match (args.next(), args.next()) {
        (Some(path), None) => path,
        _ => {
            eprintln!("Usage: {program} <measurements.txt>");
            process::exit(2);
        }
    };

    let start = Instant::now();
    let rows = pipeline::run(Path::new(&path), &Options::default())
        .with_context(|| format!("failed to aggregate {path}"))?;

    let stdout = io::stdout().lock();
    let mut out = BufWriter::new(stdout);
    pipeline::write_report(&mut out, &rows)?;
    out.flush()?;

    eprintln!("{} keys in {:?}", rows.len(), start.elapsed());
    Ok(())
}
