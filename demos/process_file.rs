//! Upload a local PDF or image and print the recognized markdown.
//!
//! ```sh
//! NVOCR_API_KEY=... cargo run --example process_file -- invoice.pdf
//! ```
use std::process::ExitCode;

use display_error_chain::DisplayErrorChain;
use nvocr::{ClientError, NvOcr, PromptMode};

async fn do_main(path: &str) -> Result<(), ClientError> {
    let client = NvOcr::from_env()?;

    println!("Supported formats: {:?}", client.get_supported_formats());

    let output = client
        .process_file_direct(path, PromptMode::LayoutAllEn)
        .await?;

    match output.markdown() {
        Some(markdown) => println!("{markdown}"),
        None => println!("{}", output.into_text()),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: process_file <path>");
        return ExitCode::FAILURE;
    };

    if let Err(err) = do_main(&path).await {
        let formated = DisplayErrorChain::new(err).to_string();
        eprintln!("{formated}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
