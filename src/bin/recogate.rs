//! recogate: query the caching gateway from the command line
//!
//! Builds a gateway from the resolved configuration, serves one request
//! through it and prints the JSON response.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use recogate::config::Config;
use recogate::{RecogateBuilder, RecommendationRequest};
use serde_json::{Map, Value, json};

/// Recogate CLI
#[derive(Parser)]
#[command(name = "recogate")]
#[command(version)]
#[command(about = "Caching recommendation gateway for the Jikan API")]
struct Cli {
    /// Config file (default: ~/.recogate/config.toml, then /etc/recogate/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Shared redis store, overriding the config file
    #[arg(long, env = "RECOGATE_REDIS_URL")]
    redis_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search anime recommendations
    Anime {
        #[command(flatten)]
        filters: Filters,
        /// Age rating (g, pg, pg13, r17, r, rx)
        #[arg(long)]
        rating: Option<String>,
    },

    /// Search manga recommendations
    Manga {
        #[command(flatten)]
        filters: Filters,
    },

    /// Send a JSON request body
    Request {
        /// JSON request (or omit to read from stdin)
        json: Option<String>,
    },
}

/// Filters shared by both subjects, using the upstream's value names.
#[derive(Args)]
struct Filters {
    /// Media type, e.g. tv or manga
    #[arg(long = "type")]
    kind: Option<String>,
    #[arg(long)]
    order_by: Option<String>,
    /// asc or desc
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    status: Option<String>,
    /// Genre name; repeat for several
    #[arg(short, long = "genre")]
    genres: Vec<String>,
    /// Free-text query
    #[arg(short)]
    q: Option<String>,
    #[arg(long)]
    min_score: Option<f64>,
    #[arg(long)]
    max_score: Option<f64>,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
    /// Include adult entries
    #[arg(long)]
    nsfw: bool,
}

impl Filters {
    fn into_fields(self, subject: &str) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("subject".into(), json!(subject));
        fields.insert("sfw".into(), json!(!self.nsfw));
        let optional = [
            ("type", self.kind.map(Value::from)),
            ("order_by", self.order_by.map(Value::from)),
            ("sort", self.sort.map(Value::from)),
            ("status", self.status.map(Value::from)),
            ("q", self.q.map(Value::from)),
            ("min_score", self.min_score.map(Value::from)),
            ("max_score", self.max_score.map(Value::from)),
            ("page", self.page.map(Value::from)),
            ("limit", self.limit.map(Value::from)),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                fields.insert(name.into(), value);
            }
        }
        if !self.genres.is_empty() {
            fields.insert("genres".into(), json!(self.genres));
        }
        fields
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: info; override with RUST_LOG). Logs go to
    // stderr so stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Cli::parse();
    let config = Config::load(args.config.as_deref())?;

    let request: RecommendationRequest = match args.command {
        Command::Anime { filters, rating } => {
            let mut fields = filters.into_fields("anime");
            if let Some(rating) = rating {
                fields.insert("rating".into(), json!(rating));
            }
            serde_json::from_value(Value::Object(fields))?
        }
        Command::Manga { filters } => {
            serde_json::from_value(Value::Object(filters.into_fields("manga")))?
        }
        Command::Request { json } => serde_json::from_str(&read_input(json)?)?,
    };

    let mut builder = RecogateBuilder::from_config(&config);
    if let Some(url) = args.redis_url {
        builder = builder.redis_url(url);
    }
    let gateway = builder.connect().await?;

    match gateway.handle(&request).await {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("error ({}): {e}", e.status_code());
            std::process::exit(1);
        }
    }
}

/// Use the argument if given, otherwise read stdin (unless it is a terminal).
fn read_input(arg: Option<String>) -> io::Result<String> {
    if let Some(text) = arg {
        return Ok(text);
    }
    if io::stdin().is_terminal() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no request given: pass JSON as an argument or pipe it on stdin",
        ));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
