#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = achievo::run().await {
        eprintln!("achievo fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
