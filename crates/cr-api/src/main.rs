#[tokio::main]
async fn main() {
    if let Err(err) = cr_api::run().await {
        tracing::error!(error = %err, "cr-api failed");
        std::process::exit(1);
    }
}
