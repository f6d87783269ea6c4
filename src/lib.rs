// ============================================================================
// DoubleZero Latency Library
// ============================================================================

pub mod command_runner;
pub mod correlator;
pub mod geo_locator;
pub mod ip_source;
pub mod latency_prober;
pub mod output_generator;
pub mod pipeline;
pub mod solana_cli;

// Re-export main types for testing
pub use correlator::{classify, Classification, Status};
pub use output_generator::{IpRecord, OutputGenerator, OUTPUT_FILE};
pub use pipeline::ClusterTables;
