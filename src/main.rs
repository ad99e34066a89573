mod balance;
mod capacity;
mod data;
mod error;
mod extract;
mod model;
mod search;
mod server;
mod solver;
mod validate;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    server::run_server().await;
}
