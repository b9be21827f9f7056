use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "passerelle-cli")]
#[command(about = "Call a running passerelle-imio gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// API key, when the gateway requires one.
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    IaDelib,
    Keycloak,
}

impl Kind {
    fn path(self) -> &'static str {
        match self {
            Kind::IaDelib => "ia-delib",
            Kind::Keycloak => "keycloak",
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum HttpMethod {
    Get,
    Post,
    Delete,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured connector instances
    Instances,
    /// Show the endpoints of one instance
    Endpoints { kind: Kind, slug: String },
    /// Call an endpoint
    Call {
        kind: Kind,
        slug: String,
        endpoint: String,
        /// Query parameter, as key=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// JSON body (implies POST unless --method is given)
        #[arg(short, long)]
        body: Option<String>,
        #[arg(short, long, value_enum)]
        method: Option<HttpMethod>,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Instances => client.get(format!("{}/", base)),
        Commands::Endpoints { kind, slug } => client.get(format!("{}/{}/{}/", base, kind.path(), slug)),
        Commands::Call {
            kind,
            slug,
            endpoint,
            params,
            body,
            method,
        } => {
            let method = match (method, &body) {
                (Some(HttpMethod::Get), _) => Method::GET,
                (Some(HttpMethod::Post), _) | (None, Some(_)) => Method::POST,
                (Some(HttpMethod::Delete), _) => Method::DELETE,
                (None, None) => Method::GET,
            };
            let url = format!("{}/{}/{}/{}", base, kind.path(), slug, endpoint);
            let mut request = client.request(method, url).query(&params);
            if let Some(body) = body {
                let json: Value = serde_json::from_str(&body)?;
                request = request.json(&json);
            }
            request
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        std::process::exit(1);
    }
    Ok(())
}
