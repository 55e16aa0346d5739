//! Posts two files to a running server
//!
//! ```text
//! cargo run --example compare_client -- cat.jpg dog.jpg [http://127.0.0.1:8000]
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use imagesim::CompareResponse;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

async fn file_part(path: &str) -> Result<Part> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path))?;
    let file_name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    Ok(Part::bytes(bytes).file_name(file_name))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (first, second, base) = match args.as_slice() {
        [a, b] => (a, b, "http://127.0.0.1:8000"),
        [a, b, base] => (a, b, base.as_str()),
        _ => bail!("usage: compare_client <image1> <image2> [base-url]"),
    };

    let form = Form::new()
        .part("image1", file_part(first).await?)
        .part("image2", file_part(second).await?);

    let response = reqwest::Client::new()
        .post(format!("{}/api/compare/images", base.trim_end_matches('/')))
        .multipart(form)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        bail!("{}: {}", status, body["detail"]);
    }

    let result: CompareResponse = response.json().await?;
    println!("similarity_score = {}", result.similarity_score.value());
    Ok(())
}
