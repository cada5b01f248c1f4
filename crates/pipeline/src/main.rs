//! Command line tool for the SGPS fluence and spectrum pipeline

// standard library
use std::error::Error as StdError;
use std::path::PathBuf;
use std::process::ExitCode;

// ptools modules
use ptools_fluence::{read_fluence_table, write_fluence_table};
use ptools_format::NumFormat;
use ptools_pipeline::{PipelineConfig, PipelineDriver, Result};
use ptools_spectrum::write_spectrum_file;

// external crates
use clap::{Args, Parser, Subcommand};
use log::{error, info};

/// Proton fluence and Monte Carlo source spectrum from GOES SGPS flux files
///
/// Options given on the command line override any configuration file, and
/// anything left unset takes the default value.
#[derive(Parser, Debug)]
#[command(name = "sgps-spectrum", version, about, arg_required_else_help(true))]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose logging (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Supress all log output (overrules --verbose)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Hide the progress bar
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Accumulate fluence and synthesize the spectrum
    Run(ConfigArgs),

    /// Accumulate fluence and write the band fluence table only
    Accumulate(ConfigArgs),

    /// Synthesize a spectrum from an existing band fluence table
    Synthesize {
        /// Band fluence table, as written by `accumulate`
        fluence: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Write the resolved configuration to a JSON file
    Config {
        /// Path of the configuration file to write
        #[arg(default_value = "sgps.json")]
        output: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// JSON configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory with one sub-directory of measurement files per year
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// First and last year of the observation window
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    years: Option<Vec<u16>>,

    /// First and last month of each year
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    months: Option<Vec<u8>>,

    /// First and last day of each month
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    days: Option<Vec<u8>>,

    /// Summed flux to fluence conversion factor
    #[arg(long, value_name = "FACTOR")]
    scaling_factor: Option<f64>,

    /// Power-law index within each band
    #[arg(short, long)]
    gamma: Option<f64>,

    /// Log-spaced sub-bins per band
    #[arg(short = 'n', long, value_name = "N")]
    sub_bins: Option<usize>,

    /// Number of threads reading files
    #[arg(short = 'j', long, value_name = "N")]
    workers: Option<usize>,

    /// Band fluence table path
    #[arg(long, value_name = "PATH")]
    fluence_output: Option<PathBuf>,

    /// Spectrum file path
    #[arg(long, value_name = "PATH")]
    spectrum_output: Option<PathBuf>,
}

impl ConfigArgs {
    /// Configuration file or defaults, with every given option applied
    fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(years) = self.years.as_deref().and_then(pair) {
            config.window.years = years;
        }
        if let Some(months) = self.months.as_deref().and_then(pair) {
            config.window.months = months;
        }
        if let Some(days) = self.days.as_deref().and_then(pair) {
            config.window.days = days;
        }
        if let Some(scaling_factor) = self.scaling_factor {
            config.scaling_factor = scaling_factor;
        }
        if let Some(gamma) = self.gamma {
            config.gamma = gamma;
        }
        if let Some(sub_bins) = self.sub_bins {
            config.sub_bins_per_band = sub_bins;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(path) = &self.fluence_output {
            config.fluence_output = Some(path.clone());
        }
        if let Some(path) = &self.spectrum_output {
            config.spectrum_output = path.clone();
        }

        Ok(config)
    }

    fn driver(&self, no_progress: bool) -> Result<PipelineDriver> {
        let mut driver = PipelineDriver::new(self.resolve()?)?;
        if no_progress {
            driver.disable_progress();
        }
        Ok(driver)
    }
}

fn pair<T: Copy>(values: &[T]) -> Option<(T, T)> {
    match values {
        [start, end] => Some((*start, *end)),
        _ => None,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging_init(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            let mut source = StdError::source(&e);
            while let Some(cause) = source {
                error!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Run(args) => {
            let report = args.driver(cli.no_progress)?.run()?;
            info!(
                "{} sub-bins synthesized from {} bands, total fluence {} particles/cm²",
                report.sub_bins,
                report.fluence.len(),
                report.total_fluence.sci(4, 2)
            );
        }
        Command::Accumulate(args) => {
            let driver = args.driver(cli.no_progress)?;
            let (fluence, _) = driver.accumulate()?;
            let path = driver.config().fluence_output();
            write_fluence_table(&fluence, &path)?;
            info!("Band fluence written to {}", path.display());
        }
        Command::Synthesize { fluence, config } => {
            let driver = config.driver(cli.no_progress)?;
            let table = read_fluence_table(fluence)?;
            let spectrum = driver.synthesize(&table)?;
            let path = &driver.config().spectrum_output;
            write_spectrum_file(&spectrum, path)?;
            info!("Spectrum written to {}", path.display());
        }
        Command::Config { output, config } => {
            let config = config.resolve()?;
            config.validate()?;
            config.to_file(output)?;
            info!("Configuration written to {}", output.display());
        }
    }
    Ok(())
}

/// Sets up logging at runtime to allow for multiple verbosity levels
fn logging_init(cli: &Cli) {
    let result = stderrlog::new()
        .modules([
            module_path!(),
            "ptools_fluence",
            "ptools_pipeline",
            "ptools_spectrum",
        ])
        .quiet(cli.quiet)
        .verbosity(cli.verbose as usize + 2)
        .show_level(true)
        .timestamp(stderrlog::Timestamp::Off)
        .init();

    if let Err(e) = result {
        eprintln!("Unable to initialise logging: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn options_override_defaults() {
        let cli = Cli::try_parse_from([
            "sgps-spectrum",
            "run",
            "--data-dir",
            "archive",
            "--years",
            "2021",
            "2022",
            "--days",
            "1",
            "7",
            "-g",
            "3.0",
            "-n",
            "20",
            "-j",
            "2",
        ])
        .unwrap();

        let Command::Run(args) = cli.command else {
            panic!("expected the run subcommand");
        };

        let config = args.resolve().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("archive"));
        assert_eq!(config.window.years, (2021, 2022));
        assert_eq!(config.window.months, (1, 12));
        assert_eq!(config.window.days, (1, 7));
        assert_eq!(config.gamma, 3.0);
        assert_eq!(config.sub_bins_per_band, 20);
        assert_eq!(config.workers, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn window_options_need_two_values() {
        let result = Cli::try_parse_from(["sgps-spectrum", "run", "--years", "2021"]);
        assert!(result.is_err());
    }

    #[test]
    fn synthesize_takes_a_fluence_table() {
        let cli = Cli::try_parse_from(["sgps-spectrum", "-q", "synthesize", "fluence.txt"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(
            cli.command,
            Command::Synthesize { ref fluence, .. } if fluence == &PathBuf::from("fluence.txt")
        ));
    }

    #[test]
    fn defaults_without_options() {
        let config = ConfigArgs::default().resolve().unwrap();
        assert_eq!(config, PipelineConfig::default());
    }
}
