use clap::{Args, Parser as ClapParser, Subcommand};
use sqljson_path::cli::{self, CliError, Command, ExecuteOptions};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "sqljson-path")]
#[command(about = "Evaluate SQL/JSON path expressions against JSON documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every result as a JSON array
    Query(QueryArgs),

    /// Print the first result, or null
    First(QueryArgs),

    /// Print whether the path selects anything (true, false or null)
    Exists(QueryArgs),

    /// Print the boolean result of a predicate path (true, false or null)
    Match(QueryArgs),

    /// Print the canonical form of a path
    Parse {
        /// The path to parse
        path: String,
    },
}

#[derive(Args)]
struct QueryArgs {
    /// The path to evaluate
    path: String,

    /// JSON input (reads from stdin if not provided)
    #[arg(short, long)]
    input: Option<String>,

    /// JSON object with the values of $variables
    #[arg(long)]
    vars: Option<String>,

    /// Evaluate in strict mode, whatever the path says
    #[arg(long, conflicts_with = "lax")]
    strict: bool,

    /// Evaluate in lax mode, whatever the path says
    #[arg(long)]
    lax: bool,

    /// Suppress evaluation errors
    #[arg(short, long)]
    silent: bool,

    /// Read like_regex patterns as POSIX regular expressions
    #[arg(long)]
    posix: bool,

    /// Pretty-print the output
    #[arg(short, long)]
    pretty: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Query(args) => run(Command::Query, args),
        Commands::First(args) => run(Command::First, args),
        Commands::Exists(args) => run(Command::Exists, args),
        Commands::Match(args) => run(Command::Match, args),
        Commands::Parse { path } => {
            let options = ExecuteOptions {
                path,
                ..Default::default()
            };
            cli::execute(Command::Parse, &options).map(|output| match output {
                serde_json::Value::String(text) => println!("{}", text),
                other => println!("{}", other),
            })
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Command, args: QueryArgs) -> Result<(), CliError> {
    let input = match args.input {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let strict = match (args.strict, args.lax) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };

    let options = ExecuteOptions {
        path: args.path,
        input,
        vars: args.vars,
        strict,
        silent: args.silent,
        posix: args.posix,
    };

    let output = cli::execute(command, &options)?;
    println!("{}", cli::format_json(&output, args.pretty)?);
    Ok(())
}
