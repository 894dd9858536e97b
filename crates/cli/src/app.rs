use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;

use streamlinks::prelude::*;

use crate::args::*;
use crate::logger::*;
use crate::prompt::*;
use crate::render::*;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub streams_args: StreamsArgs,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Aggregate playable links for a title from every provider
    Streams(StreamsArgs),
    /// List the resolutions offered by an HLS master playlist
    Qualities(QualitiesArgs),
}

impl Cli {
    fn app_args(&self) -> &AppArgs {
        match &self.command {
            Some(Commands::Streams(args)) => &args.app_args,
            Some(Commands::Qualities(args)) => &args.app_args,
            None => &self.streams_args.app_args,
        }
    }
}

#[derive(Debug)]
pub struct App {
    cli: Cli,
    logger: Arc<CliLogger>,
}

impl App {
    pub fn new() -> Self {
        Self::from_cli(Cli::parse())
    }

    pub fn from_cli(cli: Cli) -> Self {
        let logger = Arc::new(CliLogger::new(&cli.app_args().log_level));
        Self { cli, logger }
    }

    pub async fn run(&self) -> ExitCode {
        init_tracing(Arc::clone(&self.logger));

        let result = match &self.cli.command {
            Some(Commands::Streams(args)) => self.streams(args.clone()).await,
            Some(Commands::Qualities(args)) => self.qualities(args.clone()).await,
            None => self.streams(self.cli.streams_args.clone()).await,
        };

        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                self.logger.failed(format!("{err}"));
                if err.is_validation() {
                    ExitCode::from(2)
                } else {
                    ExitCode::FAILURE
                }
            }
        }
    }

    pub async fn streams(&self, args: StreamsArgs) -> Result<()> {
        let logger = &self.logger;

        let params = if args.app_args.interactive {
            prompt_for_params(args.params())?
        } else {
            args.params()
        };
        let spec = params.validate(args.policy())?;
        let client = args.provider.builder().build()?;

        if args.dry_run {
            for (id, url) in client.resolve_endpoints(&spec) {
                println!("{:>10} {}", id.bold(), url.yellow());
            }
            return Ok(());
        }

        let streams = logger
            .while_loading(
                format!(
                    "querying {} providers for {}",
                    client.providers().len(),
                    spec.content_id()
                ),
                client.aggregate(&spec),
            )
            .await?;

        if args.json {
            println!("{}", render_streams_json(&streams)?);
            return Ok(());
        }

        if streams.is_empty() {
            logger.warn("no provider returned a playable link");
            return Ok(());
        }

        logger.success(format!("found {} streams", streams.len()));
        print!("{}", render_streams(&streams));
        Ok(())
    }

    pub async fn qualities(&self, args: QualitiesArgs) -> Result<()> {
        let logger = &self.logger;

        let url = match (args.app_args.interactive, args.url.clone()) {
            (false, Some(url)) => url,
            (_, url) => prompt_for_playlist(url)?,
        };
        let client = args.provider.builder().build()?;

        let resolutions = logger
            .while_loading("reading playlist", client.fetch_resolutions(&url))
            .await?;

        if args.json {
            println!("{}", render_resolutions_json(&resolutions)?);
            return Ok(());
        }

        for resolution in &resolutions {
            logger.success(format!(
                "{}x{}",
                resolution.width,
                resolution.height.to_string().yellow()
            ));
        }
        Ok(())
    }
}
