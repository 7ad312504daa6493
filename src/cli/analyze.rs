//! Damage analysis command

use crate::settings::AppConfig;
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::path::Path;
use stormline_ai::vision::summarize_damage;
use stormline_ai::{DamageAnalyzer, ImageInput};

pub async fn run(config: &AppConfig, image: &str, context: Option<&str>, json: bool) -> Result<()> {
    let analyzer = DamageAnalyzer::from_env()
        .context("Failed to initialize damage analyzer")?
        .with_fetch_timeout(config.vision.fetch_timeout());

    if analyzer.backend_models().is_empty() {
        println!("⚠️  No vision backend configured (OPENAI_API_KEY / ANTHROPIC_API_KEY). Showing a placeholder report.");
    }

    let input = image_input(image)?;
    let report = analyzer
        .analyze(&input, context)
        .await
        .context("Damage analysis failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", summarize_damage(&report));
    for item in &report.damage_items {
        println!(
            "  - {} ({}) at {}: {}",
            item.kind,
            item.severity.as_str(),
            if item.location.is_empty() { "unspecified" } else { &item.location },
            item.description
        );
    }
    for observation in &report.observations {
        println!("  • {observation}");
    }
    println!("model: {}", report.model);
    Ok(())
}

fn image_input(image: &str) -> Result<ImageInput> {
    if image.starts_with("http://") || image.starts_with("https://") {
        return Ok(ImageInput::url(image));
    }

    let path = Path::new(image);
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))?;
    Ok(ImageInput::base64(BASE64.encode(bytes), media_type(path)))
}

fn media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_image_is_passed_through() {
        match image_input("https://photos.example.com/roof.jpg").unwrap() {
            ImageInput::Url(url) => assert_eq!(url, "https://photos.example.com/roof.jpg"),
            other => panic!("expected url input, got {other:?}"),
        }
    }

    #[test]
    fn test_media_type_from_extension() {
        assert_eq!(media_type(Path::new("front.PNG")), "image/png");
        assert_eq!(media_type(Path::new("ridge")), "image/jpeg");
    }

    #[test]
    fn test_missing_file() {
        assert!(image_input("/nonexistent/roof.jpg").is_err());
    }
}
