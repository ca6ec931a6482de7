#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    bricks_agent::host::run().await
}
