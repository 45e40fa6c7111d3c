#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = toeicgenius_rust::run().await {
        eprintln!("toeicgenius-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
