use clap::Parser;
use etl_config::shared::{PublisherConfig, ValidationError};
use etl_config::{Config, load_config};
use serde::{Deserialize, Serialize};

/// Command line overrides of the values in `configuration/`.
#[derive(Debug, Parser)]
#[command(name = "snapshot", version, about)]
pub struct DemoArgs {
    /// Number of tables to snapshot
    #[arg(long)]
    pub table_count: Option<usize>,
    /// Maximum number of tables scanned concurrently
    #[arg(long)]
    pub workers: Option<usize>,
    /// Abort the snapshot once this many tables completed
    #[arg(long)]
    pub abort_after_tables: Option<usize>,
}

/// Configuration of the snapshot demo.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DemoConfig {
    pub pipeline_id: u64,
    #[serde(default)]
    pub publisher: PublisherConfig,
    pub simulation: SimulationConfig,
}

impl DemoConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.publisher.validate()?;
        self.simulation.validate()
    }
}

impl Config for DemoConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}

/// Shape of the simulated snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of tables selected for the snapshot.
    pub table_count: usize,
    /// Rows scanned from every table.
    pub rows_per_table: u64,
    /// Rows scanned between two progress reports of a table.
    pub batch_size: u64,
    /// Simulated time spent scanning one batch.
    pub batch_delay_ms: u64,
    /// Maximum number of tables scanned at the same time.
    pub workers: usize,
    /// When set, the snapshot is aborted once this many tables completed.
    #[serde(default)]
    pub abort_after_tables: Option<usize>,
}

impl SimulationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.workers == 0 {
            return Err(ValidationError::ZeroValue("simulation.workers"));
        }
        if self.batch_size == 0 {
            return Err(ValidationError::ZeroValue("simulation.batch_size"));
        }

        Ok(())
    }
}

/// Loads the [`DemoConfig`], applies the command line overrides and validates the result.
pub fn load_demo_config(args: &DemoArgs) -> anyhow::Result<DemoConfig> {
    let mut config = load_config::<DemoConfig>()?;

    if let Some(table_count) = args.table_count {
        config.simulation.table_count = table_count;
    }
    if let Some(workers) = args.workers {
        config.simulation.workers = workers;
    }
    if args.abort_after_tables.is_some() {
        config.simulation.abort_after_tables = args.abort_after_tables;
    }

    config.validate()?;

    Ok(config)
}
