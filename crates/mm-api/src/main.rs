#[tokio::main]
async fn main() {
    if let Err(err) = mm_api::run().await {
        tracing::error!(error = %err, "mm-api failed");
        eprintln!("mm-api failed: {err}");
        std::process::exit(1);
    }
}
