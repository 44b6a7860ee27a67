use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use scrubber_cli::OutputFormat;
use scrubber_cli::commands::{self, GlobalOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scrubber")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Scheduled browsing history cleanup for the sites you choose",
    long_about = "Scrubber deletes browsing history for a list of tracked sites, on demand or \
                  on a schedule, and can keep its settings behind a password lock."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding settings and local history
    #[arg(long, global = true, env = "SCRUBBER_HOME", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "pretty")]
    format: OutputFormat,

    /// Match sites by public-suffix registrable domain instead of the last two labels
    #[arg(long, global = true)]
    public_suffix: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage tracked sites
    Site {
        #[command(subcommand)]
        command: SiteCommands,
    },

    /// Show or set the global cleanup interval
    ///
    /// When set, every tracked site is cleaned on this interval and per-site
    /// intervals are ignored.
    Interval {
        /// Minutes between cleanups, or 'off'
        #[arg(value_name = "MINUTES")]
        minutes: Option<String>,
    },

    /// Show or set how far back history is cleaned (hour, day, week, all)
    Range {
        #[arg(value_name = "RANGE")]
        range: Option<String>,
    },

    /// Clean history for every tracked site now
    Clear {
        /// Range to clean (hour, day, week, all); stored for next time
        #[arg(short, long)]
        range: Option<String>,
    },

    /// Show the activity log
    Logs {
        /// Delete all log entries
        #[arg(long)]
        clear: bool,
    },

    /// Manage the password lock
    Lock {
        #[command(subcommand)]
        command: LockCommands,
    },

    /// Export all settings to a JSON file
    Export {
        /// Output file, or '-' for stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import settings from a JSON file
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Inspect or add to the local browsing history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Run the background daemon that owns alarms and the idle lock
    Run {
        /// Serve UI messages as JSON lines on stdin; exits when stdin closes
        #[arg(long)]
        stdin: bool,

        /// Length of one alarm minute in seconds
        #[arg(long, default_value_t = 60, hide = true)]
        minute_secs: u64,
    },

    /// Generate shell completion scripts
    #[command(after_help = "SUPPORTED SHELLS:\n  \
        bash, zsh, fish, powershell, elvish\n\n\
        INSTALLATION:\n  \
        bash:  scrubber completion --shell bash >> ~/.bashrc\n  \
        zsh:   scrubber completion --shell zsh > ~/.zfunc/_scrubber\n  \
        fish:  scrubber completion --shell fish > ~/.config/fish/completions/scrubber.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum SiteCommands {
    /// Start tracking a site
    Add {
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Stop tracking a site
    Remove {
        /// Site URL or its position in 'site list'
        #[arg(value_name = "SITE")]
        site: String,
    },

    /// List tracked sites
    List,

    /// Rename a site, or look its name up again in history
    Rename {
        /// Site URL or its position in 'site list'
        #[arg(value_name = "SITE")]
        site: String,

        /// New display name; omit to use the title found in history
        #[arg(value_name = "NAME")]
        name: Option<String>,
    },

    /// Look up names for sites still called "Unknown site"
    Refresh,

    /// Clean a site on its own interval
    Schedule {
        /// Site URL or its position in 'site list'
        #[arg(value_name = "SITE")]
        site: String,

        /// Minutes between cleanups
        #[arg(long, value_name = "MINUTES", conflicts_with = "off")]
        every: Option<u32>,

        /// Stop cleaning this site on a schedule
        #[arg(long)]
        off: bool,
    },
}

#[derive(Subcommand)]
enum LockCommands {
    /// Set the first password; locks immediately
    SetPassword {
        #[arg(long, env = "SCRUBBER_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Reminder shown by 'lock hint'
        #[arg(long)]
        hint: Option<String>,
    },

    /// Replace the password
    ChangePassword {
        #[arg(long)]
        old: Option<String>,

        #[arg(long)]
        new: Option<String>,

        #[arg(long)]
        hint: Option<String>,
    },

    /// Unlock with the password
    Unlock {
        #[arg(long, env = "SCRUBBER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Lock right away
    Now,

    /// Show whether scrubber is locked
    Status,

    /// Show the password hint
    Hint,

    /// Show or set the idle lock timeout
    Timeout {
        #[arg(value_name = "SECONDS")]
        seconds: Option<u64>,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List visits, newest first
    List {
        /// Only visits whose URL or title contains this text
        #[arg(long)]
        text: Option<String>,

        /// Maximum number of visits to show
        #[arg(long)]
        max: Option<usize>,
    },

    /// Record a visit
    Add {
        #[arg(value_name = "URL")]
        url: String,

        #[arg(long)]
        title: Option<String>,

        /// Date the visit this many minutes in the past
        #[arg(long, default_value_t = 0)]
        minutes_ago: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let options = GlobalOptions {
        data_dir: cli.data_dir,
        format: cli.format,
        public_suffix: cli.public_suffix,
    };

    match cli.command {
        Commands::Site { command } => match command {
            SiteCommands::Add { url } => commands::site::add(&options, &url),
            SiteCommands::Remove { site } => commands::site::remove(&options, &site),
            SiteCommands::List => commands::site::list(&options),
            SiteCommands::Rename { site, name } => {
                commands::site::rename(&options, &site, name.as_deref())
            }
            SiteCommands::Refresh => commands::site::refresh(&options),
            SiteCommands::Schedule { site, every, off } => {
                let minutes = if off { None } else { every };
                if minutes.is_none() && !off {
                    anyhow::bail!("Pass --every <MINUTES> or --off");
                }
                commands::site::schedule(&options, &site, minutes)
            }
        },
        Commands::Interval { minutes } => {
            commands::schedule::interval(&options, minutes.as_deref())
        }
        Commands::Range { range } => commands::schedule::range(&options, range.as_deref()),
        Commands::Clear { range } => commands::clear::execute(&options, range.as_deref()),
        Commands::Logs { clear } => commands::logs::execute(&options, clear),
        Commands::Lock { command } => match command {
            LockCommands::SetPassword { password, hint } => {
                commands::lock::set_password(&options, password, hint)
            }
            LockCommands::ChangePassword { old, new, hint } => {
                commands::lock::change_password(&options, old, new, hint)
            }
            LockCommands::Unlock { password } => commands::lock::unlock(&options, password),
            LockCommands::Now => commands::lock::lock_now(&options),
            LockCommands::Status => commands::lock::status(&options),
            LockCommands::Hint => commands::lock::hint(&options),
            LockCommands::Timeout { seconds } => commands::lock::timeout(&options, seconds),
        },
        Commands::Export { output } => commands::transfer::export(&options, output),
        Commands::Import { file } => commands::transfer::import(&options, &file),
        Commands::History { command } => match command {
            HistoryCommands::List { text, max } => commands::history::list(&options, text, max),
            HistoryCommands::Add {
                url,
                title,
                minutes_ago,
            } => commands::history::add(&options, &url, title, minutes_ago),
        },
        Commands::Run { stdin, minute_secs } => {
            commands::run::execute(&options, stdin, minute_secs)
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            commands::completion::execute(shell, &mut cmd)
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new(
            "scrubber=debug,scrubber_cli=debug,scrubber_core=debug,scrubber_engine=debug,scrubber_host=debug",
        )
    } else {
        EnvFilter::new("scrubber=info,scrubber_cli=info,scrubber_engine=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
