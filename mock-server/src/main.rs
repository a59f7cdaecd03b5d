use tokio::net::TcpListener;

/// Port comes from the first argument, then `PORT`, then 3000.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    println!("mock courier backend listening on {}", listener.local_addr()?);
    mock_server::run(listener).await
}
