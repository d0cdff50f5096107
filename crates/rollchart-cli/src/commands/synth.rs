//! Synth command - build the chart from a config file and write manifests

use std::fs;
use std::path::{Path, PathBuf};

use console::style;
use rollchart_core::{App, Chart, ChartConfig};
use tracing::debug;

use crate::error::{CliError, Result};

/// Environment variable overriding the output directory
pub const OUTDIR_ENV: &str = "ROLLCHART_OUTDIR";

const DEFAULT_OUTDIR: &str = "dist";

/// Output directory from the environment, `dist` by default
pub fn output_dir() -> PathBuf {
    std::env::var_os(OUTDIR_ENV)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTDIR))
}

/// Load `config_path`, build one chart and write it under `output_dir`
///
/// Nothing is written unless the whole tree builds and renders.
pub fn run(config_path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let raw =
        fs::read_to_string(config_path).map_err(|e| CliError::io("read", config_path, e))?;
    let config =
        ChartConfig::from_json(&raw).map_err(|e| CliError::from_chart(config_path, e))?;

    debug!(
        path = %config_path.display(),
        name = %config.name,
        env = %config.env,
        "loaded config"
    );

    let chart = Chart::from_config(&config.name, &config)
        .map_err(|e| CliError::from_chart(config_path, e))?;
    let mut app = App::new();
    app.add_chart(chart)
        .map_err(|e| CliError::from_chart(config_path, e))?;
    let output = app
        .synth()
        .map_err(|e| CliError::from_chart(config_path, e))?;

    fs::create_dir_all(output_dir).map_err(|e| CliError::io("create", output_dir, e))?;

    let mut written = Vec::with_capacity(output.len());
    for chart in output {
        let file_path = output_dir.join(&chart.file_name);
        fs::write(&file_path, chart.content())
            .map_err(|e| CliError::io("write", &file_path, e))?;

        println!("{} {}", style("wrote").green(), file_path.display());
        written.push(file_path);
    }

    Ok(written)
}
