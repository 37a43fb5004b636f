use std::io::Read;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

use automation_helper::dispatch::{AutomationExitCode, AutomationRequest};

#[derive(Parser)]
#[command(name = "automation-cli")]
#[command(about = "Client for the local automation helper", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8765")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show when the served configuration was last reloaded
    Health,
    /// Run an automation and exit with its exit code
    Run {
        name: String,
        args: Vec<String>,
        /// Payload for the automation's stdin; `-` reads our own stdin
        #[arg(long)]
        stdin: Option<String>,
        /// Numeric verbosity (10 debug, 20 info, 30 warning, 40 error)
        #[arg(long, default_value_t = 30)]
        log_level: i32,
        /// Ask for a shorter timeout than the helper's ceiling
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            name,
            args,
            stdin,
            log_level,
            timeout,
        } => {
            let stdin = match stdin.as_deref() {
                Some("-") => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
                Some(text) => text.to_string(),
                None => String::new(),
            };
            let request = AutomationRequest::new(name)
                .with_args(args)
                .with_stdin(stdin)
                .with_log_level(log_level);

            let mut headers = HeaderMap::new();
            if let Some(secs) = timeout {
                headers.insert(
                    "keep-alive",
                    HeaderValue::from_str(&format!("timeout={secs}"))?,
                );
            }

            let res = client
                .post(format!("{}/automation", cli.url))
                .headers(headers)
                .json(&request)
                .send()
                .await?;
            let body = print_response(res).await?;

            let code = body
                .as_ref()
                .and_then(|json| json.get("exit_code"))
                .and_then(Value::as_i64)
                .unwrap_or(i64::from(AutomationExitCode::UnknownError.code()));
            Ok(ExitCode::from(u8::try_from(code).unwrap_or(u8::MAX)))
        }
    }
}

async fn print_response(res: reqwest::Response) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => {
            println!("{}", serde_json::to_string_pretty(&json)?);
            Ok(Some(json))
        }
        Err(_) => {
            eprintln!("Error: helper returned status {}", status);
            eprintln!("Response: {}", text);
            Ok(None)
        }
    }
}
