//! Upload a file, process it, fetch and download the results, then delete it.
use nvocr::{FileUpload, NvOcr, PromptMode};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "scan.png".to_string());
    let client = NvOcr::from_env()?;

    // 1. Upload
    let content = tokio::fs::read(&path).await?;
    let file_name = std::path::Path::new(&path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload.bin")
        .to_string();
    let file = client
        .files()
        .upload(FileUpload::new(file_name, content))
        .await?;
    info!(file.id = %file.id, file.name = %file.filename, "file uploaded");

    // 2. Process
    let output = client
        .process_uploaded_file(&file.id, PromptMode::LayoutAllEn)
        .await?;
    info!(chars = output.markdown().map(str::len), "file processed");

    // 3. Fetch stored results and the rendered output
    let results = client.get_results(&file.id).await?;
    println!("{}", results.into_text());

    let markdown = client
        .download_file(&file.id, &format!("{}.md", file.filename))
        .await?;
    info!(size = markdown.len(), "output downloaded");

    // 4. Clean up
    match client.delete_file(&file.id).await {
        Ok(response) => info!(status = %response.status, "file deleted"),
        Err(e) => error!(error = %e, "failed to delete file"),
    }

    Ok(())
}
