use anyhow::{anyhow, bail, Context, Result};
use donation_verifier::middleware::ADMIN_TOKEN_HEADER;
use donation_verifier::models::BulkIdsRequest;
use reqwest::{Client, Url};
use serde_json::Value;

/// Operator helper: bulk-verify donations or inspect one verification on a
/// running donation verifier.
///
/// ```text
/// ops-agent verify <donation-id>...
/// ops-agent status <donation-id>
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();

    let base_url = std::env::var("DONATION_VERIFIER_URL")
        .unwrap_or_else(|_| "http://localhost:8080".to_string());
    let admin_token = std::env::var("ADMIN_TOKEN").unwrap_or_default();

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_default();
    let ids: Vec<String> = args.collect();

    println!("Donation Verifier Ops Agent");
    println!("===========================");
    println!("Server: {}", base_url);
    println!();

    let client = Client::new();
    match command.as_str() {
        "verify" if !ids.is_empty() => bulk_verify(&client, &base_url, &admin_token, ids).await,
        "status" if ids.len() == 1 => status(&client, &base_url, &ids[0]).await,
        _ => {
            println!("Usage:");
            println!("  ops-agent verify <donation-id>...");
            println!("  ops-agent status <donation-id>");
            Ok(())
        }
    }
}

async fn bulk_verify(client: &Client, base_url: &str, admin_token: &str, ids: Vec<String>) -> Result<()> {
    println!("Submitting {} donation(s) for verification...", ids.len());

    let response = client
        .post(format!("{}/admin/verifications/bulk", base_url))
        .header(ADMIN_TOKEN_HEADER, admin_token)
        .json(&BulkIdsRequest { ids })
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await?;
        bail!("Bulk verification rejected ({}): {}", status, error_text);
    }

    let body: Value = response.json().await?;
    let data = &body["data"];
    println!(
        "[DONE] {} succeeded, {} failed, {} total",
        data["successful"], data["failed"], data["total"]
    );

    if let Some(items) = data["items"].as_array() {
        for item in items {
            match item["status"].as_str() {
                Some("succeeded") => println!(
                    "   [OK] {} -> {}",
                    item["id"],
                    item["value"]["transactionHash"]
                ),
                _ => println!("   [FAILED] {}: {}", item["id"], item["error"]),
            }
        }
    }

    Ok(())
}

async fn status(client: &Client, base_url: &str, id: &str) -> Result<()> {
    let response = client.get(verification_url(base_url, id)?).send().await?;

    if !response.status().is_success() {
        let error_text = response.text().await?;
        bail!("Request failed: {}", error_text);
    }

    let body: Value = response.json().await?;
    let view = &body["data"];
    println!("Donation: {}", id);
    println!("State:    {}", view["state"]);
    if let Some(url) = view["explorer_url"].as_str() {
        println!("Explorer: {}", url);
    }
    if let Some(confirmed_at) = view["confirmed_at"].as_str() {
        println!("Confirmed at: {}", confirmed_at);
    }

    Ok(())
}

fn verification_url(base_url: &str, id: &str) -> Result<Url> {
    let mut url = Url::parse(base_url).context("DONATION_VERIFIER_URL is not a valid URL")?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("{} cannot be used as a base URL", base_url))?
        .pop_if_empty()
        .extend(["donations", id, "verification"]);
    Ok(url)
}
