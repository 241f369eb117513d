use micro_client::{RequestOptions, ResponseType, send};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let opts = RequestOptions {
        response_type: Some(ResponseType::Text),
        max_redirects: Some(5),
        ..RequestOptions::new("http://example.com/")
    };

    match send(opts).await {
        Ok(response) => {
            info!(status = %response.status, redirects = response.redirects.len(), "request finished");
            info!("body: {:?}", response.data.as_text().map(|text| &text[..text.len().min(200)]));
        }
        Err(e) => {
            error!("request failed: {e}");
        }
    }
}
