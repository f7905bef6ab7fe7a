use std::path::Path;

use anyhow::{Context, Result};

use crate::normalize::PriceRecord;

/// Write the record set as a UTF-8 CSV with one header row.
pub fn write_csv(records: &[PriceRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for record in records {
        writer
            .serialize(record)
            .context("serializing record to CSV")?;
    }
    writer.flush().context("flushing CSV writer")?;
    Ok(())
}

pub fn read_csv(path: &Path) -> Result<Vec<PriceRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: PriceRecord = row.context("deserializing CSV record")?;
        records.push(record);
    }
    Ok(records)
}
