#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pgmirror::cli::init_tracing();
    pgmirror::cli::dbaugment_main().await
}
