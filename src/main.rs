//! Purpose: `tiddlyweb-jsonp` CLI entry point.
//! Role: Binary crate root; parses args, registers serializers, renders or serves.
//! Invariants: `jsonp::init` runs once at startup before any serializer is built.
//! Invariants: `render` writes only the response body to stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `to_exit_code`.
use std::io::{self, IsTerminal};
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};

mod render;
mod serve;

use render::{Target, render_target, select_serializer};
use tiddlyweb_jsonp::config::Config;
use tiddlyweb_jsonp::core::environ::Environ;
use tiddlyweb_jsonp::core::error::{Error, ErrorKind, to_exit_code};
use tiddlyweb_jsonp::jsonp;
use tiddlyweb_jsonp::store::Store;

#[derive(Parser)]
#[command(
    name = "tiddlyweb-jsonp",
    version,
    about = "Render TiddlyWeb resources as JSON, or JSONP when a callback is given",
    after_help = r#"EXAMPLES
  $ tiddlyweb-jsonp --store store.json render bags
  $ tiddlyweb-jsonp --store store.json render tiddler docs Intro --query 'callback=show'
  $ tiddlyweb-jsonp --store store.json serve --bind 127.0.0.1:8080
  $ curl 'http://127.0.0.1:8080/bags?callback=show'"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        default_value = "store.json",
        help = "JSON file holding `recipes` and `bags`",
        value_hint = ValueHint::FilePath
    )]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Render one resource shape to stdout")]
    Render {
        #[arg(
            long,
            global = true,
            default_value = "",
            help = "Request query string, e.g. 'callback=fn&fat=1'"
        )]
        query: String,
        #[arg(long, global = true, help = "Accept header used to pick the serializer")]
        accept: Option<String>,
        #[command(subcommand)]
        target: Target,
    },
    #[command(about = "Serve resources over HTTP (loopback default)")]
    Serve(ServeRunArgs),
}

#[derive(Args)]
struct ServeRunArgs {
    #[arg(long, default_value = "127.0.0.1:8080", help = "Bind address")]
    bind: String,
    #[arg(long, help = "Allow non-loopback binds")]
    allow_non_loopback: bool,
}

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<i32, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(exit_code);
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `tiddlyweb-jsonp --help` for usage."));
            }
        },
    };

    let mut config = Config::default();
    jsonp::init(&mut config);
    let store = Store::load(&cli.store)?;

    match cli.command {
        Command::Render {
            query,
            accept,
            target,
        } => {
            serve::init_tracing();
            let environ = Environ::from_query_string(&query);
            let (serializer, _) = select_serializer(&config, accept.as_deref(), &environ)?;
            let body = render_target(serializer.as_ref(), &store, &target)?;
            println!("{body}");
            Ok(0)
        }
        Command::Serve(run) => {
            let bind: SocketAddr = run.bind.parse().map_err(|_| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("invalid bind address: {}", run.bind))
                    .with_hint("Use host:port, e.g. 127.0.0.1:8080.")
            })?;
            let serve_config = serve::ServeConfig {
                bind,
                store,
                config,
                allow_non_loopback: run.allow_non_loopback,
            };
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to start runtime")
                        .with_source(err)
                })?;
            runtime.block_on(serve::serve(serve_config))?;
            Ok(0)
        }
    }
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(|line| line.trim())
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error: ").to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {}", error_message(err));
        if let Some(hint) = err.hint() {
            eprintln!("hint: {hint}");
        }
        if let Some(path) = err.path() {
            eprintln!("path: {}", path.display());
        }
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Serialization => "serialization failed".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}
