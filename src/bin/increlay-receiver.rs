use increlay::config::{ReceiverConfig, RelayGlobalConfig, initiate};
use increlay::services::receiver;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    initiate(RelayGlobalConfig::default());
    let cfg = ReceiverConfig::from_env();
    receiver::serve(cfg).await
}
