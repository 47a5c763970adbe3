#[tokio::main]
async fn main() {
    if let Err(e) = mediacore::run().await {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
