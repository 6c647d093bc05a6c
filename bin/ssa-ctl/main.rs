use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{info, LevelFilter};
use siglent_sa::{
    load_config, load_config_or_default, plot_trace, AnalyzerSettings, AppConfig, Channel,
    MessageInstrument, Recorder, Spd3303x, SpectrumAnalyzer, Trace, TraceFormat, TraceIndex,
};
use std::path::PathBuf;

/// Siglent spectrum analyzer control tool
#[derive(Parser, Debug)]
#[command(name = "ssa-ctl")]
#[command(about = "Configure and read out Siglent SSA3000X/SVA1000X analyzers", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Instrument address, overrides the configuration
    #[arg(short, long, value_name = "RESOURCE")]
    address: Option<String>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the instrument identification
    Idn,
    /// Reset the analyzer to its default state
    Reset,
    /// Push acquisition settings from the configuration and command line
    Configure(SettingsArgs),
    /// Print the current acquisition settings as JSON
    Status,
    /// Capture a trace
    Trace {
        /// Trace number (1-4)
        #[arg(short, long)]
        index: Option<u8>,
        /// Transfer encoding (ascii, real)
        #[arg(short, long)]
        format: Option<String>,
        /// Print the trace as JSON
        #[arg(long)]
        json: bool,
        /// Draw the trace in the terminal
        #[arg(long)]
        plot: bool,
        /// Append the trace to a JSONL file
        #[arg(long, value_name = "FILE")]
        record: Option<PathBuf>,
    },
    /// Sweep once and report the highest peak
    Peak {
        /// Marker number (1-8)
        #[arg(short, long, default_value_t = 1)]
        marker: u8,
        /// Trace the marker reads from (1-4)
        #[arg(short, long, default_value_t = 1)]
        trace: u8,
    },
    /// Read the outputs of an SPD3303X power supply
    Psu {
        /// Supply address
        #[arg(long, value_name = "RESOURCE")]
        address: String,
        /// Output channel (1 or 2)
        #[arg(long, default_value_t = 1)]
        channel: u8,
    },
}

#[derive(clap::Args, Debug, Default)]
struct SettingsArgs {
    /// Center frequency in Hz
    #[arg(long)]
    center: Option<f64>,
    /// Span in Hz, 0 for zero span
    #[arg(long)]
    span: Option<f64>,
    /// Resolution bandwidth in Hz
    #[arg(long)]
    rbw: Option<f64>,
    /// Video bandwidth in Hz
    #[arg(long)]
    vbw: Option<f64>,
    /// Input attenuation in dB
    #[arg(long)]
    attenuation: Option<f64>,
    /// Preamplifier on or off
    #[arg(long)]
    preamp: Option<bool>,
    /// Reference level in dBm
    #[arg(long)]
    ref_level: Option<f64>,
    /// Sweep time in seconds
    #[arg(long)]
    sweep_time: Option<f64>,
}

impl SettingsArgs {
    /// Command line values win over configured ones
    fn merge_into(&self, base: &AnalyzerSettings) -> AnalyzerSettings {
        AnalyzerSettings {
            center_hz: self.center.or(base.center_hz),
            span_hz: self.span.or(base.span_hz),
            rbw_hz: self.rbw.or(base.rbw_hz),
            vbw_hz: self.vbw.or(base.vbw_hz),
            attenuation_db: self.attenuation.or(base.attenuation_db),
            preamp: self.preamp.or(base.preamp),
            ref_level_dbm: self.ref_level.or(base.ref_level_dbm),
            sweep_time_s: self.sweep_time.or(base.sweep_time_s),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => load_config(Some(path))?,
        None => load_config_or_default(None),
    };
    if let Some(address) = &args.address {
        config.instrument.address = address.clone();
    }

    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.log_level.clone());
    initialize_logging(&log_level)?;

    if let Command::Psu { address, channel } = &args.command {
        return read_power_supply(address, *channel, &config);
    }

    info!("=== ssa-ctl ===");
    info!("Instrument: {}", config.instrument.address);
    let mut analyzer = connect(&config)?;

    match args.command {
        Command::Idn => {
            println!("{}", analyzer.identifier()?);
        }
        Command::Reset => {
            analyzer.reset()?;
            analyzer.block_until_complete()?;
            info!("Analyzer reset");
        }
        Command::Configure(settings) => {
            let settings = settings.merge_into(&config.analyzer);
            if settings.is_empty() {
                info!("Nothing to configure");
            } else {
                analyzer.apply_settings(&settings)?;
                info!("Settings applied");
            }
        }
        Command::Status => {
            let status = analyzer.status()?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Trace {
            index,
            format,
            json,
            plot,
            record,
        } => {
            let format = match format {
                Some(name) => parse_trace_format(&name)?,
                None => config.trace.format,
            };
            let index = index.unwrap_or(config.trace.index);
            let record = record.or_else(|| config.trace.record_path.as_ref().map(PathBuf::from));
            capture_trace(&mut analyzer, index, format, json, plot, record)?;
        }
        Command::Peak { marker, trace } => {
            let (x, y) = find_peak(&mut analyzer, marker, trace)?;
            println!("{:.0} Hz\t{:.2} dBm", x, y);
        }
        Command::Psu { .. } => {}
    }

    Ok(())
}

fn connect(config: &AppConfig) -> Result<SpectrumAnalyzer, Box<dyn std::error::Error>> {
    let analyzer = SpectrumAnalyzer::builder()
        .address(&config.instrument.address)
        .config(config.instrument.connection())
        .verify_identity(config.instrument.verify_identity)
        .build()?;
    Ok(analyzer)
}

fn parse_trace_format(name: &str) -> Result<TraceFormat, Box<dyn std::error::Error>> {
    match name.to_lowercase().as_str() {
        "ascii" => Ok(TraceFormat::Ascii),
        "real" => Ok(TraceFormat::Real),
        other => Err(format!("Unknown trace format '{}', expected ascii or real", other).into()),
    }
}

fn capture_trace(
    analyzer: &mut SpectrumAnalyzer,
    index: u8,
    format: TraceFormat,
    json: bool,
    plot: bool,
    record: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    analyzer.set_trace_format(format)?;
    let trace = analyzer.trace(index)?.data()?;
    info!(
        "Captured trace {} ({} points) at {}",
        trace.index,
        trace.len(),
        trace.captured_at
    );

    if json {
        println!("{}", serde_json::to_string(&trace)?);
    }

    if plot {
        let start = analyzer.get_start_frequency()?;
        let stop = analyzer.get_stop_frequency()?;
        let range = (stop > start).then_some((start, stop));
        let title = format!("Trace {}", trace.index);
        plot_trace(&trace.samples, range, Some(&title), None, None)?;
    }

    if let Some(path) = record {
        let mut recorder: Recorder<Trace> = Recorder::new(path, 1);
        recorder.add(trace.clone())?;
        info!("Trace recorded to {}", recorder.path().display());
    }

    if !json && !plot {
        if let Some((i, peak)) = trace.peak() {
            println!("{} points, peak {:.2} at point {}", trace.len(), peak, i);
        }
    }

    Ok(())
}

fn find_peak(
    analyzer: &mut SpectrumAnalyzer,
    marker: u8,
    trace: u8,
) -> Result<(f64, f64), Box<dyn std::error::Error>> {
    let trace = TraceIndex::new(trace)?;
    analyzer.sweep_restart()?;
    analyzer.block_until_complete()?;

    let mut marker = analyzer.marker(marker)?;
    marker.set_enabled(true)?;
    marker.set_trace(trace)?;
    marker.peak()?;
    Ok((marker.get_x()?, marker.get_y()?))
}

fn read_power_supply(
    address: &str,
    channel: u8,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let channel = Channel::try_from(channel)?;
    let mut psu = Spd3303x::connect_with(address, &config.instrument.connection())?;
    psu.select_channel(channel)?;
    println!(
        "{:?}: {:.3} V  {:.3} A  {:.3} W",
        channel,
        psu.measure_voltage()?,
        psu.measure_current()?,
        psu.measure_power()?
    );
    Ok(())
}

fn initialize_logging(log_level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => {
            eprintln!("Warning: Invalid log level '{}', using 'info'", log_level);
            LevelFilter::Info
        }
    };

    env_logger::Builder::from_env(Env::default())
        .filter_level(level)
        .format_timestamp_millis()
        .init();

    Ok(())
}
