use std::path::PathBuf;

use clap::Parser;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::options::MutationOptions;

#[derive(Parser, Debug)]
#[command(name = "text-mutator")]
#[command(version)]
#[command(about = "Proofreading practice: mutate your text, then find every introduced error")]
pub struct Args {
    /// Text to mutate immediately (otherwise type it at the prompt)
    pub text: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the mutation service (overrides config and MUTATOR_BACKEND_URL)
    #[arg(long)]
    pub url: Option<String>,

    /// Mutation rate between 0 and 1 (clamped)
    #[arg(long)]
    pub rate: Option<f64>,

    /// Seed for deterministic mutations
    #[arg(long)]
    pub seed: Option<u64>,

    /// Disable homophone replacement
    #[arg(long)]
    pub no_homophones: bool,

    /// Disable letter swaps
    #[arg(long)]
    pub no_swaps: bool,

    /// Disable punctuation removal
    #[arg(long)]
    pub no_punctuation: bool,

    /// Probe the service once and exit (status 0 when healthy)
    #[arg(long)]
    pub health: bool,
}

impl Args {
    /// Initial live options implied by the flags.
    pub fn options(&self) -> MutationOptions {
        let mut options = MutationOptions::default().with_seed(self.seed);
        if let Some(rate) = self.rate {
            options = options.with_mutation_rate(rate);
        }
        options.allow_homophones = !self.no_homophones;
        options.allow_swaps = !self.no_swaps;
        options.allow_punctuation_removal = !self.no_punctuation;
        options
    }

    /// Load the config file and environment, then apply `--url`.
    pub fn resolve_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::load(self.config.as_deref())?;
        if let Some(url) = &self.url {
            config.base_url = url.clone();
        }
        config.validate()?;
        Ok(config)
    }
}
