#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pgmirror::cli::init_tracing();
    pgmirror::cli::dbtoyaml_main().await
}
