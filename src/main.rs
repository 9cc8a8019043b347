use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use gtree::commands::plumbing::diff_tree::DiffFormat;
use gtree::{DiffFlags, DiffOptions, Repository};
use is_terminal::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "gtree",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "Inspect and diff git tree objects",
    long_about = "Read-only tools over git trees: list entries, look them up by path, \
    and compare a tree against another tree, the index or the working directory.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[arg(long, global = true, env = "GIT_DIR", help = "Path to the git directory")]
    git_dir: Option<PathBuf>,
    #[arg(long, global = true, env = "GIT_WORK_TREE", help = "Path to the working directory")]
    work_tree: Option<PathBuf>,
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::default(), help = "Diagnostics written to stderr")]
    log_level: LogLevel,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
    Silent,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<tracing::Level> {
        match self {
            LogLevel::Trace => Some(tracing::Level::TRACE),
            LogLevel::Debug => Some(tracing::Level::DEBUG),
            LogLevel::Info => Some(tracing::Level::INFO),
            LogLevel::Warn => Some(tracing::Level::WARN),
            LogLevel::Error => Some(tracing::Level::ERROR),
            LogLevel::Silent => None,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct DiffArgs {
    #[arg(short = 'U', long = "unified", default_value_t = 3, help = "Lines of context around each change")]
    unified: u32,
    #[arg(long, default_value_t = 0, help = "Merge hunks separated by at most this many extra lines")]
    inter_hunk_context: u32,
    #[arg(short = 'R', help = "Swap the two sides of the diff")]
    reverse: bool,
    #[arg(short = 'w', long = "ignore-all-space", help = "Ignore whitespace when comparing lines")]
    ignore_all_space: bool,
    #[arg(short = 'b', long = "ignore-space-change", help = "Ignore changes in amount of whitespace")]
    ignore_space_change: bool,
    #[arg(long, help = "Ignore whitespace at line end")]
    ignore_space_at_eol: bool,
    #[arg(short = 'a', long, help = "Treat all files as text")]
    text: bool,
    #[arg(long, help = "Report files missing from the tree")]
    untracked: bool,
    #[arg(long, help = "Show only the status letter and path of each change")]
    name_status: bool,
}

impl DiffArgs {
    fn options(&self) -> DiffOptions {
        let switches = [
            (self.reverse, DiffFlags::REVERSE),
            (self.ignore_all_space, DiffFlags::IGNORE_WHITESPACE),
            (self.ignore_space_change, DiffFlags::IGNORE_WHITESPACE_CHANGE),
            (self.ignore_space_at_eol, DiffFlags::IGNORE_WHITESPACE_EOL),
            (self.text, DiffFlags::FORCE_TEXT),
            (self.untracked, DiffFlags::INCLUDE_UNTRACKED),
        ];
        let flags = switches
            .into_iter()
            .filter(|(enabled, _)| *enabled)
            .fold(DiffFlags::empty(), |flags, (_, flag)| flags | flag);

        DiffOptions::default()
            .with_flags(flags)
            .with_context_lines(self.unified)
            .with_interhunk_lines(self.inter_hunk_context)
    }

    fn format(&self) -> DiffFormat {
        match self.name_status {
            true => DiffFormat::NameStatus,
            false => DiffFormat::Patch,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "ls-tree",
        about = "List the contents of a tree object",
        long_about = "This command lists the entries of the tree a revision points at. \
        A path selects a single entry; a trailing slash lists that subtree instead."
    )]
    LsTree {
        #[arg(short = 'r', help = "Recurse into subtrees")]
        recursive: bool,
        #[arg(index = 1, help = "Commit or tree to list")]
        revision: String,
        #[arg(index = 2, help = "Path inside the tree")]
        path: Option<String>,
    },
    #[command(
        name = "show-entry",
        about = "Describe the tree entry at a path",
        long_about = "This command looks up a slash-separated path inside the tree of a revision \
        and prints its name, kind, object ID and mode."
    )]
    ShowEntry {
        #[arg(index = 1, help = "Commit or tree to look in")]
        revision: String,
        #[arg(index = 2, help = "Path of the entry")]
        path: String,
    },
    #[command(
        name = "diff-tree",
        about = "Compare two trees",
        long_about = "This command compares the tree of one revision against another. \
        Without a second revision the tree is compared against the empty tree."
    )]
    DiffTree {
        #[arg(index = 1, help = "Old side")]
        old: String,
        #[arg(index = 2, help = "New side")]
        new: Option<String>,
        #[arg(long, help = "Exchange the two trees")]
        swap: bool,
        #[command(flatten)]
        diff: DiffArgs,
    },
    #[command(
        name = "diff-index",
        about = "Compare a tree against the index",
        long_about = "This command compares the tree of a revision against the staged content."
    )]
    DiffIndex {
        #[arg(index = 1, help = "Commit or tree to compare")]
        revision: String,
        #[command(flatten)]
        diff: DiffArgs,
    },
    #[command(
        name = "diff-files",
        about = "Compare a tree against the working directory",
        long_about = "This command compares the tree of a revision against the files in the working directory."
    )]
    DiffFiles {
        #[arg(index = 1, help = "Commit or tree to compare")]
        revision: String,
        #[command(flatten)]
        diff: DiffArgs,
    },
}

fn setup_tracing(cli: &Cli) {
    if let Some(level) = cli.log_level.to_tracing_level() {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .without_time()
            .compact()
            .init();
    }
}

fn open_repository(cli: &Cli) -> Result<Arc<Repository>> {
    match &cli.git_dir {
        Some(git_dir) => Repository::open_with(git_dir, cli.work_tree.as_deref()),
        None => {
            let pwd = std::env::current_dir()?;
            Repository::discover(&pwd)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(&cli);

    let color = std::io::stdout().is_terminal();
    colored::control::set_override(color);

    let repository = open_repository(&cli)?;
    let stdout = std::io::stdout();
    let mut writer = stdout.lock();

    match &cli.command {
        Commands::LsTree {
            recursive,
            revision,
            path,
        } => repository.ls_tree(&mut writer, revision, path.as_deref(), *recursive)?,
        Commands::ShowEntry { revision, path } => {
            repository.show_entry(&mut writer, revision, path)?
        }
        Commands::DiffTree {
            old,
            new,
            swap,
            diff,
        } => repository.diff_tree(
            &mut writer,
            old,
            new.as_deref(),
            *swap,
            &diff.options(),
            diff.format(),
            color,
        )?,
        Commands::DiffIndex { revision, diff } => repository.diff_index(
            &mut writer,
            revision,
            &diff.options(),
            diff.format(),
            color,
        )?,
        Commands::DiffFiles { revision, diff } => repository.diff_files(
            &mut writer,
            revision,
            &diff.options(),
            diff.format(),
            color,
        )?,
    }

    Ok(())
}
