use base64::{engine::general_purpose::STANDARD, Engine as _};
use dotenvy::dotenv;
use std::{env, fs, path::Path};
use stockmeta::{
    providers::ai::{
        local::LocalAiProvider,
        openai::{OpenAiProvider, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_OPENAI_API_URL},
        AiProvider,
    },
    AnalyzeImageOptions, MetadataClientBuilder,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging and load .env file
    tracing_subscriber::fmt::init();
    dotenv().ok();

    // --- Command-line argument parsing ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image-file>", args[0]);
        return Ok(());
    }
    let path = Path::new(&args[1]);
    let image_base64 = STANDARD.encode(fs::read(path)?);

    // --- Configuration from environment variables ---
    let ai_provider_name = env::var("AI_PROVIDER").unwrap_or_else(|_| "openai".to_string());
    let api_key = env::var("OPENAI_API_KEY").ok();
    let ai_model = env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());

    // --- Build AI Provider ---
    let ai_provider: Box<dyn AiProvider> = match ai_provider_name.as_str() {
        "openai" => {
            let api_url =
                env::var("AI_API_URL").unwrap_or_else(|_| DEFAULT_OPENAI_API_URL.to_string());
            Box::new(OpenAiProvider::new(
                api_url,
                api_key,
                ai_model,
                DEFAULT_MAX_OUTPUT_TOKENS,
            )?)
        }
        "local" => {
            let api_url = env::var("AI_API_URL")?;
            Box::new(LocalAiProvider::new(api_url, api_key, Some(ai_model))?)
        }
        _ => return Err(format!("Unsupported AI provider: {ai_provider_name}").into()),
    };

    let client = MetadataClientBuilder::new()
        .ai_provider(ai_provider)
        .build()?;

    let outcome = client
        .analyze_image(AnalyzeImageOptions {
            image_base64,
            filename: path.file_name().map(|n| n.to_string_lossy().into_owned()),
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&outcome.record)?);
    if outcome.model_category != outcome.record.category {
        eprintln!(
            "Category changed from '{}' to '{}'",
            outcome.model_category, outcome.record.category
        );
    }

    Ok(())
}
