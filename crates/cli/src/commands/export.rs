use anyhow::{Context, Result};
use pvasim_analysis::Summary;
use pvasim_sim::simulation::ReplicateBatch;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::args::ExportFormat;

/// Write the summary as pretty JSON.
pub fn export_summary(summary: &Summary, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create summary file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary).context("Failed to serialize summary")?;
    writer.flush()?;
    Ok(())
}

/// Write every replicate's trajectory.
///
/// CSV has one row per replicate and year with sex totals; JSON is the full
/// batch including per-age-class counts.
pub fn export_trajectories(batch: &ReplicateBatch, path: &Path, format: ExportFormat) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create trajectories file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    match format {
        ExportFormat::Csv => write_csv(batch, &mut writer)?,
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, batch).context("Failed to serialize batch")?
        }
    }
    writer.flush()?;
    Ok(())
}

fn write_csv(batch: &ReplicateBatch, writer: &mut impl Write) -> Result<()> {
    writeln!(writer, "replicate,year,females,males,total,extinct")?;
    for trajectory in &batch.trajectories {
        let extinction = trajectory.extinction_time();
        for (year, state) in trajectory.states().iter().enumerate() {
            let extinct = extinction.is_some_and(|t| year >= t);
            writeln!(
                writer,
                "{},{},{},{},{},{}",
                trajectory.replicate(),
                year,
                state.total_females(),
                state.total_males(),
                state.total(),
                u8::from(extinct)
            )?;
        }
    }
    Ok(())
}
