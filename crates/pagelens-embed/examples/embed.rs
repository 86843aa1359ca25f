use pagelens_core::config::EmbeddingSettings;
use pagelens_embed::EmbeddingService;

fn main() -> anyhow::Result<()> {
    let service = EmbeddingService::build_default(&EmbeddingSettings::default())?;
    let texts = vec!["hello world".to_string(), "rust embeddings".to_string()];
    let embs = service.encode(&texts)?;
    println!("backend={} B={} dim={}", service.name(), embs.len(), service.dim());
    Ok(())
}
