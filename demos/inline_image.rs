//! Send an image inline as a base64 data URI instead of uploading it first.
use nvocr::{Document, NvOcr, PromptMode};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "page.png".to_string());
    let client = NvOcr::from_env()?;

    let health = client.health_check().await?;
    info!(%health, "service is up");

    let document = Document::from_path(&path).await?;
    let output = client.process_image(document, PromptMode::Ocr).await?;

    println!("{}", output.into_text());
    Ok(())
}
