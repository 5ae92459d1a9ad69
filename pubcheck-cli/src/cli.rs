use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use colored::Colorize;

use pubcheck::output::{verdict, write_human, write_json};
use pubcheck::{
    CheckConfig, ContentChecker, DirContainer, FormatVersion, MemoryReport, NavChecker, Profile,
    check_all,
};

/// Exit code when a checked document has fatal errors, errors or warnings.
pub const EXIT_FINDINGS: i32 = 1;

/// Exit code for usage and configuration errors.
pub const EXIT_USAGE: i32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// Check the navigation documents of an unpacked publication.
#[derive(Debug, Parser)]
#[command(name = "pubcheck")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// YAML or JSON check configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Unpacked publication directory
    pub dir: PathBuf,

    /// Navigation document path inside the publication (repeatable)
    #[arg(long = "nav")]
    pub nav: Vec<String>,

    /// Publication format version (2 or 3)
    #[arg(long)]
    pub version: Option<FormatVersion>,

    /// Validation profile (default, edupub, idx, dict, preview)
    #[arg(long)]
    pub profile: Option<Profile>,

    /// Declared publication type, e.g. `edupub` (repeatable)
    #[arg(long = "pub-type")]
    pub pub_types: Vec<String>,

    /// Raw `properties` of the navigation document's manifest item
    #[arg(long)]
    pub properties: Option<String>,

    /// Glob of entries that cannot be decrypted (repeatable)
    #[arg(long)]
    pub encrypted: Vec<String>,
}

impl Cli {
    /// Load the config file, if any, and apply the flags on top of it.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be loaded.
    pub fn check_config(&self) -> anyhow::Result<CheckConfig> {
        let mut config = match &self.config {
            Some(path) => CheckConfig::from_path(path)?,
            None => CheckConfig::default(),
        };

        if !self.nav.is_empty() {
            config.nav.clone_from(&self.nav);
        }
        if let Some(version) = self.version {
            config.version = version;
        }
        if let Some(profile) = self.profile {
            config.profile = profile;
        }
        if !self.pub_types.is_empty() {
            config.publication_types.clone_from(&self.pub_types);
        }
        if let Some(properties) = &self.properties {
            config.properties.clone_from(properties);
        }
        config.encrypted.extend(self.encrypted.iter().cloned());
        Ok(config)
    }
}

/// Run the checks and write the report to `out`.
///
/// Returns whether every document validated.
///
/// # Errors
/// Returns an error on configuration problems or when the report cannot be
/// written. Findings are never errors.
pub fn run(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<bool> {
    let config = cli.check_config()?;
    let container = Arc::new(
        DirContainer::open(&cli.dir, &config.encrypted)
            .with_context(|| format!("cannot open publication {}", cli.dir.display()))?,
    );
    let report = Arc::new(MemoryReport::new());

    let checkers = config
        .nav_paths()
        .iter()
        .map(|path| {
            let context = config
                .context_builder(path, container.clone(), report.clone())
                .build();
            NavChecker::new(context).with_context(|| format!("cannot check {path}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    tracing::info!(documents = checkers.len(), dir = %cli.dir.display(), "checking");

    let refs: Vec<&(dyn ContentChecker + Sync)> = checkers
        .iter()
        .map(|c| c as &(dyn ContentChecker + Sync))
        .collect();
    check_all(&refs);

    let summary = report.summary();
    match cli.format {
        OutputFormat::Json => write_json(&summary, out)?,
        OutputFormat::Human => {
            write_human(&summary, out)?;
            let line = verdict(&summary);
            if summary.ok {
                writeln!(out, "{}", line.green().bold())?;
            } else {
                writeln!(out, "{}", line.red().bold())?;
            }
        }
    }
    Ok(summary.ok)
}
