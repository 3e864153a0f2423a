/* Copyright (C) 2024  AlphaKeks <alphakeks@dawn.sh>
 *
 * This library is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This library is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this repository.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::fs;
use std::path::Path;

use anyhow::Context;
use signon::config::TracingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::{Layer as _, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

mod cli;

const DEFAULT_CONFIG_PATH: &str = "./signon.toml";

fn main() -> anyhow::Result<()> {
    let cli_args = cli::args();
    let mut config = if let Some(config_path) = cli_args.config_path.as_deref() {
        read_and_parse_config_file(config_path)?
    } else if Path::new(DEFAULT_CONFIG_PATH).try_exists()? {
        read_and_parse_config_file(Path::new(DEFAULT_CONFIG_PATH))?
    } else {
        signon::Config::default()
    };

    cli_args.apply_to_config(&mut config);

    let _guard = if config.tracing.enable {
        init_tracing(&config.tracing).context("failed to initialize tracing")?
    } else {
        None
    };

    signon::runtime::panic_hook::install();
    signon::run(config).context("failed to run server")
}

fn read_and_parse_config_file(path: &Path) -> anyhow::Result<signon::Config> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file `{}`", path.display()))
        .and_then(|text| toml::from_str(&text).context("failed to parse configuration file"))
}

fn init_tracing(config: &TracingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("signon=info,warn"));

    let stderr = config.stderr.enable.then(|| {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_ansi(config.stderr.ansi)
            .with_writer(std::io::stderr)
    });

    let (files, guard) = config
        .files
        .enable
        .then(|| {
            if !config.files.directory.exists() {
                fs::create_dir_all(&config.files.directory).context("create log dir")?;
            }

            let log_dir = config
                .files
                .directory
                .canonicalize()
                .context("canonicalize log dir path")?;

            let (writer, guard) = tracing_appender::rolling::Builder::new()
                .rotation(Rotation::DAILY)
                .filename_prefix("signon")
                .filename_suffix("log")
                .build(&log_dir)
                .map(tracing_appender::non_blocking)
                .context("failed to initialize logger")?;

            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(false)
                .with_file(true)
                .with_level(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                .with_target(true)
                .with_thread_ids(true)
                .with_writer(writer);

            anyhow::Ok((layer, guard))
        })
        .transpose()?
        .unzip();

    #[cfg(target_os = "linux")]
    let journald = config
        .journald
        .enable
        .then(|| {
            let mut layer =
                tracing_journald::layer().context("failed to initialize journald logger")?;

            if let Some(ref syslog_identifier) = config.journald.syslog_identifier {
                layer = layer.with_syslog_identifier(syslog_identifier.clone());
            }

            anyhow::Ok(layer)
        })
        .transpose()?;

    let layers = tracing_subscriber::Layer::and_then(stderr, files);

    #[cfg(target_os = "linux")]
    let layers = tracing_subscriber::Layer::and_then(layers, journald);

    tracing_subscriber::registry()
        .with(layers.with_filter(env_filter()))
        .init();

    Ok(guard)
}
