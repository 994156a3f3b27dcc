use anyhow::{Result, bail};
use clap::Parser;
use lookup::{error::ErrorBody, lookup::LookupResult, page::ViewState};
use reqwest::Client;
use serde_json::json;

/// Looks up a RUT against a running server and prints the labeled fields.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    rut: String,

    #[arg(long, default_value = "http://localhost:1111")]
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut view = ViewState::new(args.rut);
    view.begin_submit();

    let outcome = submit(&args.url, &view.rut).await?;
    view.apply(outcome);

    if !view.error.is_empty() {
        bail!("{}", view.error);
    }

    for (index, row) in view.fields().iter().enumerate() {
        println!("Resultado {}", index + 1);

        for field in row {
            println!("  {}: {}", field.label, field.value);
        }
    }

    Ok(())
}

async fn submit(base_url: &str, rut: &str) -> Result<Result<LookupResult, String>> {
    let url = format!("{}/api/sheets", base_url.trim_end_matches('/'));

    let response = Client::new()
        .post(url)
        .json(&json!({ "rut": rut }))
        .send()
        .await?;

    if response.status().is_success() {
        return Ok(Ok(response.json().await?));
    }

    let body: ErrorBody = response.json().await?;

    Ok(Err(body.error))
}
