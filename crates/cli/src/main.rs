use anyhow::Result;
use clap::{Parser, Subcommand};

use function_parser::commands::{
    corpus_command, dirs_command, file_command, languages_command, runs_command, stream_command,
};
use function_parser::{init_logging, GlobalArgs};
use function_parser_core::db::RunMode;
use function_parser_core::model::Language;

/// Function-level corpus builder.
///
/// Splits source into functions, normalizes each into a training record,
/// drops content duplicates and writes the survivors. This CLI is a thin
/// wrapper around `function-parser-core`; all substantive logic lives in the
/// library.
#[derive(Parser, Debug)]
#[command(
    name = "function-parser",
    version,
    about = "Extract, normalize and deduplicate function-level code corpora",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract every function of one source file.
    ///
    /// Writes `<sha256>.json` (the record) and `<sha256>.<ext>` (its source)
    /// per function into the output directory.
    File {
        /// Language of the input file (python, java, go).
        #[arg(long)]
        language: Language,

        /// Source file to extract.
        #[arg(long)]
        input: String,

        /// Output directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        output_dir: String,
    },

    /// Process a test/train/valid corpus of gzipped JSON lines.
    ///
    /// Reads `<input>/<split>.jsonl.gz` and `<input>/<split>/*.jsonl.gz`;
    /// writes `<output>/<split>.jsonl.gz`.
    Corpus {
        /// Corpus root directory.
        #[arg(long)]
        input: String,

        /// Output directory.
        #[arg(long)]
        output: String,
    },

    /// Normalize JSON lines from stdin to JSON lines on stdout.
    Stream,

    /// Mirror directories listed on stdin (one per line) into an output tree.
    Dirs {
        /// Language of the source files to pick up.
        #[arg(long)]
        language: Language,

        /// Output root; each input directory gets `<output>/<dir>/functions.jsonl.gz`.
        #[arg(long)]
        output: String,
    },

    /// List languages with a compiled-in extractor.
    Languages {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List runs recorded in a run database.
    Runs {
        /// Run database path. Defaults to `--runs-db` or the config file value.
        #[arg(long)]
        db: Option<String>,

        /// Only show runs of this mode (file, corpus, stream, dirs).
        #[arg(long)]
        mode: Option<RunMode>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.global.resolve()?;
    init_logging(&config.log_level)?;

    match cli.command {
        Command::File { language, input, output_dir } => {
            file_command(&config, language, &input, &output_dir)?;
        }
        Command::Corpus { input, output } => {
            corpus_command(&config, &input, &output)?;
        }
        Command::Stream => {
            stream_command(&config)?;
        }
        Command::Dirs { language, output } => {
            dirs_command(&config, language, &output)?;
        }
        Command::Languages { json } => languages_command(json)?,
        Command::Runs { db, mode, json } => {
            let db = db.or_else(|| config.runs_db.clone());
            runs_command(db.as_deref(), mode, json)?
        }
    }

    Ok(())
}
