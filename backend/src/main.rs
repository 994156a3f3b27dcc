#[tokio::main]
async fn main() -> std::io::Result<()> {
    lookup::start_server().await
}
