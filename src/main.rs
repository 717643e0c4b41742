use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use osf_fetch::config::{DEFAULT_CONFIG_FILE, backoff_from_millis};
use osf_fetch::{Error, Fetcher, FileDescriptor, OsfClient, OsfConfig, Result, list_files, render};
use std::fs::File;
use std::io::BufWriter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file with OSF_TOKEN / OSF_PROJECT and friends
    #[arg(long, short = 'c', global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Log progress (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the files of a project
    List(Source),

    /// Download and parse one file
    Fetch {
        /// File name as shown by `list`
        name: String,

        #[command(flatten)]
        source: Source,

        /// Write the parsed data here instead of printing a preview
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<String>,

        /// Attempts before giving up on an empty download
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Fixed wait between attempts, in milliseconds
        #[arg(long)]
        backoff_ms: Option<u64>,

        /// Rows shown in the preview
        #[arg(long, default_value_t = 10)]
        preview_rows: usize,
    },
}

#[derive(Args, Debug)]
struct Source {
    /// OSF project (node) id
    #[arg(long, short = 'p')]
    project: Option<String>,

    /// Personal access token
    #[arg(long, short = 't')]
    token: Option<String>,

    /// Only files created after this day (DD/MM/YYYY)
    #[arg(long, short = 'a', value_name = "DD/MM/YYYY")]
    after: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {e}", "Error:".red());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = OsfConfig::load(&cli.config)?;

    match cli.command {
        Command::List(source) => {
            let (client, project) = connect(&mut config, &source)?;
            let files = list_files(&client, &project, source.after.as_deref())?;
            render::print_directory(&project, &files);
        }
        Command::Fetch {
            name,
            source,
            output,
            max_attempts,
            backoff_ms,
            preview_rows,
        } => {
            if let Some(attempts) = max_attempts {
                config.retry = config.retry.with_max_attempts(attempts);
            }
            if let Some(ms) = backoff_ms {
                config.retry = config.retry.with_backoff(backoff_from_millis(ms));
            }

            let (client, project) = connect(&mut config, &source)?;
            let files = list_files(&client, &project, source.after.as_deref())?;
            let file = find_file(&files, &name)
                .ok_or_else(|| Error::Config(format!("no file named {name:?} in project {project}")))?;

            let payload = Fetcher::new(&client, config.retry.clone()).fetch(file)?;

            match output {
                Some(path) => {
                    render::write_payload(&payload, BufWriter::new(File::create(&path)?))?;
                    println!(
                        "{} {} records written to {path}",
                        "Done:".green(),
                        payload.len()
                    );
                }
                None => {
                    println!(
                        "{}",
                        format!("=== {} ({} records) ===", file.name(), payload.len()).cyan()
                    );
                    println!("{}", render::payload_preview(&payload, preview_rows)?);
                }
            }
        }
    }

    Ok(())
}

/// Applies command-line overrides and opens the client.
fn connect(config: &mut OsfConfig, source: &Source) -> Result<(OsfClient, String)> {
    if let Some(token) = &source.token {
        config.token.clone_from(token);
    }
    if let Some(project) = &source.project {
        config.project = Some(project.clone());
    }

    let project = config.project.clone().ok_or_else(|| {
        Error::Config("no project given (use --project or OSF_PROJECT)".to_string())
    })?;

    let client = OsfClient::with_options(&config.token, &config.api_url, config.timeout)?;
    Ok((client, project))
}

/// Matches either the listed name or the original remote name.
fn find_file<'a>(files: &'a [FileDescriptor], name: &str) -> Option<&'a FileDescriptor> {
    let wanted = osf_fetch::lister::display_name(name);
    files.iter().find(|f| f.name() == name || f.name() == wanted)
}
