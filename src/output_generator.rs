// ============================================================================
// Output Generation Module
// ============================================================================
// CSV file generation and console summary

use anyhow::{Context, Result};
use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::correlator::Status;
use crate::geo_locator::GeoLocation;

pub const OUTPUT_FILE: &str = "dz_latency_result.csv";

const BASE_HEADER: [&str; 4] = ["IP", "Status", "Validator Name", "Latency"];
const GEO_HEADER: [&str; 2] = ["City", "Country"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpRecord {
    pub ip: String,
    pub status: Status,
    pub name: Option<String>,
    pub latency_ms: Option<f64>,
    pub location: Option<GeoLocation>,
}

impl IpRecord {
    fn latency_field(&self) -> String {
        self.latency_ms
            .map(|ms| format!("{:.3}", ms))
            .unwrap_or_default()
    }

    fn to_row(&self, with_geo: bool) -> Vec<String> {
        let mut row = vec![
            self.ip.clone(),
            self.status.to_string(),
            self.name.clone().unwrap_or_default(),
            self.latency_field(),
        ];
        if with_geo {
            let location = self.location.clone().unwrap_or_default();
            row.push(location.city);
            row.push(location.country);
        }
        row
    }
}

pub struct OutputGenerator;

impl OutputGenerator {
    /// Header plus one row per record, in the order given
    pub fn write_csv<W: Write>(records: &[IpRecord], with_geo: bool, out: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);

        if with_geo {
            writer.write_record(BASE_HEADER.iter().chain(GEO_HEADER.iter()))?;
        } else {
            writer.write_record(BASE_HEADER)?;
        }

        for record in records {
            writer.write_record(record.to_row(with_geo))?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn save_csv<P: AsRef<Path>>(records: &[IpRecord], with_geo: bool, output_path: P) -> Result<()> {
        let output_path = output_path.as_ref();
        let file = std::fs::File::create(output_path)
            .with_context(|| format!("Error writing to output file '{}'", output_path.display()))?;
        Self::write_csv(records, with_geo, file)
    }

    pub fn print_summary(records: &[IpRecord]) {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for record in records {
            *counts.entry(record.status.as_str()).or_default() += 1;
        }

        println!("\n=== DOUBLEZERO LATENCY SUMMARY ===");
        println!("{:<18} {:<18} {:<28} {:>10}", "IP", "Status", "Validator", "Latency");
        println!("{}", "-".repeat(77));

        for record in records {
            let name = record.name.as_deref().unwrap_or("");
            let name_short: String = if name.chars().count() > 28 {
                name.chars().take(25).chain("...".chars()).collect()
            } else {
                name.to_string()
            };
            let latency = match record.latency_ms {
                Some(ms) => format!("{:.3} ms", ms),
                None => "-".to_string(),
            };

            println!(
                "{:<18} {:<18} {:<28} {:>10}",
                record.ip,
                Self::colored_status(record.status),
                name_short,
                latency
            );
        }

        println!();
        for (status, count) in &counts {
            println!("  {:<18} {}", status, count);
        }
        let unreachable = records.iter().filter(|r| r.latency_ms.is_none()).count();
        if unreachable > 0 {
            println!("  {:<18} {}", "unreachable".red(), unreachable);
        }
    }

    fn colored_status(status: Status) -> ColoredString {
        // pad before coloring so escape codes don't break alignment
        let padded = format!("{:<18}", status.as_str());
        match status {
            Status::Validator => padded.green().bold(),
            Status::Gossip => padded.yellow(),
            Status::GossipNotFound => padded.dimmed(),
        }
    }
}
