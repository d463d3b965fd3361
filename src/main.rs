//! Purpose: `ghorg` CLI entry point.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Successful commands print exactly one JSON value on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal, Read};

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use ghorg::api::{DEFAULT_API_BASE, Error, ErrorKind, FetchConfig, to_exit_code};
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod command_dispatch;

const TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Try `ghorg --help`."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    let config = fetch_config(cli.token, std::env::var(TOKEN_ENV).ok(), &cli.api_url);
    let settings = command_dispatch::Settings {
        api_base: cli.api_url,
        fetch: config,
    };

    command_dispatch::dispatch_command(cli.command, &settings)
        .map_err(add_not_found_hint)
        .map_err(add_permission_hint)
        .map_err(|err| (err, color_mode))
}

/// The token is scoped to `--api-url` so URLs taken from payloads never see it.
fn fetch_config(flag: Option<String>, env: Option<String>, api_url: &str) -> FetchConfig {
    let token = flag
        .or(env)
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    let config = FetchConfig::default().with_token_scope(api_url);
    match token {
        Some(token) => config.with_token(token),
        None => config,
    }
}

#[derive(Parser)]
#[command(
    name = "ghorg",
    version,
    about = "Walk nested JSON and list a GitHub organization's public repos",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Every command prints one JSON value on stdout.

Mental model:
  - `get` walks a key path through JSON you already have
  - `fetch` GETs a JSON document and optionally walks a key path
  - `repos` lists an org's public repos, optionally by license
"#,
    after_help = r#"EXAMPLES
  $ echo '{"a": {"b": 2}}' | ghorg get a b       # prints 2
  $ ghorg fetch https://api.github.com/orgs/google repos_url
  $ ghorg repos google --license apache-2.0

LEARN MORE
  $ ghorg <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        default_value = DEFAULT_API_BASE,
        help = "GitHub API base URL (for GitHub Enterprise or a local stub)",
        value_hint = ValueHint::Url
    )]
    api_url: String,
    #[arg(long, help = "API token sent as a bearer token (default: $GITHUB_TOKEN)")]
    token: Option<String>,
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Walk a key path through a JSON document",
        long_about = r#"Read a JSON document and print the value found by following KEY... in order.

Input comes from --json, -f/--file, or stdin. With no keys the whole document is printed.
Only objects are indexable: a key applied to an array or scalar is reported as missing."#,
        after_help = r#"EXAMPLES
  $ ghorg get --json '{"a": {"b": 2}}' a b       # 2
  $ ghorg get -f org.json repos_url
  $ curl -s https://api.github.com/orgs/google | ghorg get repos_url

NOTES
  - The first key that cannot be resolved is reported (exit code 3)"#
    )]
    Get {
        #[arg(help = "Keys to follow, root to leaf")]
        keys: Vec<String>,
        #[arg(long = "json", help = "Inline JSON document", conflicts_with = "file")]
        json: Option<String>,
        #[arg(
            short = 'f',
            long = "file",
            help = "Input file path (use - for stdin)",
            value_hint = ValueHint::FilePath
        )]
        file: Option<String>,
    },
    #[command(
        arg_required_else_help = true,
        about = "GET a JSON document over HTTP",
        after_help = r#"EXAMPLES
  $ ghorg fetch https://api.github.com/orgs/google
  $ ghorg fetch https://api.github.com/orgs/google repos_url"#
    )]
    Fetch {
        #[arg(help = "http(s) URL to fetch", value_hint = ValueHint::Url)]
        url: String,
        #[arg(help = "Keys to follow in the response, root to leaf")]
        keys: Vec<String>,
    },
    #[command(
        arg_required_else_help = true,
        about = "List an organization's public repos",
        after_help = r#"EXAMPLES
  $ ghorg repos google
  $ ghorg repos google --license apache-2.0

NOTES
  - Repos without license.key never match --license"#
    )]
    Repos {
        #[arg(help = "Organization login")]
        org: String,
        #[arg(long, help = "Only list repos whose license.key matches")]
        license: Option<String>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ ghorg completion bash > ~/.local/share/bash-completion/completions/ghorg
  $ ghorg completion zsh > ~/.zfunc/_ghorg
  $ ghorg completion fish > ~/.config/fish/completions/ghorg.fish"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn read_document(json: Option<String>, file: Option<String>) -> Result<Value, Error> {
    let (text, source) = match (json, file) {
        (Some(text), _) => (text, "--json".to_string()),
        (None, Some(path)) if path != "-" => {
            let text = std::fs::read_to_string(&path).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message(format!("failed to read {path}"))
                    .with_source(err)
            })?;
            (text, path)
        }
        (None, _) => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read stdin")
                    .with_source(err)
            })?;
            (text, "stdin".to_string())
        }
    };
    ghorg::json::parse::from_str(&text).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!(
                "invalid json from {source} (line {}, column {})",
                err.line(),
                err.column()
            ))
            .with_source(err)
    })
}

fn add_not_found_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::NotFound || err.hint().is_some() {
        return err;
    }
    if err.key().is_some() {
        return err.with_hint("Check the key path against the document (keys are case-sensitive).");
    }
    err
}

fn add_permission_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Permission || err.hint().is_some() {
        return err;
    }
    err.with_hint(format!("Pass --token or set {TOKEN_ENV}."))
}

fn emit_json(value: &Value) {
    let pretty = io::stdout().is_terminal();
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
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
        ErrorKind::Busy => "rate limited".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Corrupt => "unexpected payload".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(url) = err.url() {
        inner.insert("url".to_string(), json!(url));
    }
    if let Some(key) = err.key() {
        inner.insert("key".to_string(), json!(key));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(key) = err.key() {
        lines.push(format!(
            "{} {key}",
            colorize_label("key:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(url) = err.url() {
        lines.push(format!(
            "{} {url}",
            colorize_label("url:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    for cause in error_causes(err) {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
