use clap::{Parser, Subcommand};
use reqwest::{Method, RequestBuilder};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "neightn-cli")]
#[command(about = "Call a running neightn backend from the command line", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness check
    Health,
    /// List a device's variables
    Variables {
        device: String,
        /// Only this key
        #[arg(short, long)]
        key: Option<String>,
    },
    /// Save a variable
    SetVariable {
        device: String,
        key: String,
        value: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a variable
    DeleteVariable { device: String, key: String },
    /// Show whether a device has an active subscription
    Subscription { device: String },
    /// Start a subscription
    StartTrial {
        device: String,
        #[arg(short, long)]
        plan: Option<String>,
    },
    /// Print the personalized workflow template
    Template { device: String },
}

impl Commands {
    fn request(&self, client: &reqwest::Client, base: &str) -> RequestBuilder {
        let url = |path: String| format!("{}{}", base.trim_end_matches('/'), path);
        match self {
            Commands::Health => client.get(url("/health".to_string())),
            Commands::Variables { device, key } => {
                let request = client.get(url(format!("/api/variables/{}", device)));
                match key {
                    Some(key) => request.query(&[("key", key)]),
                    None => request,
                }
            }
            Commands::SetVariable { device, key, value, description } => client
                .post(url(format!("/api/variables/{}", device)))
                .json(&json!({ "key": key, "value": value, "description": description })),
            Commands::DeleteVariable { device, key } => client.request(
                Method::DELETE,
                url(format!("/api/variables/{}/{}", device, encode_segment(key))),
            ),
            Commands::Subscription { device } => {
                client.get(url(format!("/api/subscription/{}", device)))
            }
            Commands::StartTrial { device, plan } => client
                .post(url(format!("/api/subscription/{}", device)))
                .json(&json!({ "plan": plan })),
            Commands::Template { device } => {
                client.get(url(format!("/api/workflow-template/{}", device)))
            }
        }
    }
}

/// Percent-encode a single path segment.
fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = cli.command.request(&client, &cli.url).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    let body = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", body);
    } else {
        eprintln!("Error: backend returned status {}", status);
        eprintln!("{}", body);
    }
    Ok(())
}
