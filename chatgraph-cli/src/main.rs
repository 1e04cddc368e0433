//! chatgraph binary: parse flags, load `.env`, init logging and run a turn or the chat loop.

use clap::Parser;
use chatgraph_cli::{describe_error, run, Action, RunConfig, RunOptions, ToolCallMode};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chatgraph")]
#[command(about = "Tool-using chat agent; runs one message or an interactive loop")]
struct Args {
    /// User message (also accepted as positional words). Without one, starts the chat loop.
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    /// Conversation thread to resume or start.
    #[arg(short, long)]
    thread_id: Option<String>,

    /// List saved conversation threads and exit.
    #[arg(long)]
    list_threads: bool,

    /// Print the saved transcript of the thread and exit.
    #[arg(long)]
    history: bool,

    /// Tool call mode: native or json.
    #[arg(long, value_parser = parse_mode)]
    mode: Option<ToolCallMode>,

    /// Maximum tool hops per turn.
    #[arg(long)]
    max_hops: Option<usize>,

    /// SQLite checkpoint database.
    #[arg(long)]
    db_path: Option<String>,

    /// Keep the conversation in memory only.
    #[arg(long)]
    ephemeral: bool,

    #[arg(long)]
    temperature: Option<f32>,

    /// Debug logs and a config summary on stderr.
    #[arg(short, long)]
    verbose: bool,

    #[arg(trailing_var_arg = true)]
    rest: Vec<String>,
}

fn parse_mode(s: &str) -> Result<ToolCallMode, String> {
    s.parse()
}

fn action(args: &Args) -> Action {
    if args.list_threads {
        return Action::ListThreads;
    }
    if args.history {
        return Action::History;
    }
    if let Some(m) = &args.message {
        return Action::Message(m.clone());
    }
    let joined = args.rest.join(" ").trim().to_string();
    if joined.is_empty() {
        Action::Repl
    } else {
        Action::Message(joined)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = match RunConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };
    config.apply_options(&RunOptions {
        thread_id: args.thread_id.clone(),
        mode: args.mode,
        max_tool_hops: args.max_hops,
        db_path: args.db_path.clone(),
        ephemeral: args.ephemeral,
        temperature: args.temperature,
        verbose: args.verbose,
    });

    if let Err(e) = run(config, action(&args)).await {
        eprintln!("error: {}", describe_error(&e));
        std::process::exit(1);
    }
}
