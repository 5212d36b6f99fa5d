#[tokio::main]
async fn main() -> anyhow::Result<()> {
    firco_disposition::cli::app::run().await
}
