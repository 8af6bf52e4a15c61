#[tokio::main]
async fn main() {
    if lib_dispatch::init().await.is_err() {
        std::process::exit(1);
    }
}
