#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cricetl::run_cli().await
}
