use micro_client::{Body, RequestOptions, ResponseType, post};
use serde_json::json;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let opts = RequestOptions { response_type: Some(ResponseType::Json), ..RequestOptions::default() };

    let payload = Body::Json(json!({
        "name": "micro",
        "kind": "client",
    }));

    match post("http://127.0.0.1:8080/things", payload, opts).await {
        Ok(response) => {
            info!(status = %response.status, "created");
            info!("reply: {:?}", response.data);
        }
        Err(e) => {
            error!("request failed: {e}");
        }
    }
}
