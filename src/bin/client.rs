use argh::FromArgs;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use captionist::messages::DescribeRequest;
use std::path::PathBuf;

// defaults for the client
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 3000;

#[derive(FromArgs)]
/// Captionist client for describing an image
struct ClientArgs {
    /// the host to connect to
    #[argh(option, short = 'h', default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port to connect to
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// the path to the image
    #[argh(option, short = 'i')]
    image_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: ClientArgs = argh::from_env();

    let bytes = tokio::fs::read(&args.image_path).await?;
    log::debug!("Read {} bytes from {}", bytes.len(), args.image_path.display());

    let client = reqwest::Client::new();

    // format the host and port
    let addr = format!("{}:{}", args.host, args.port);

    let response = client
        .post(format!("http://{}/describe", addr))
        .json(&DescribeRequest {
            image: Some(BASE64_STANDARD.encode(&bytes)),
        })
        .send()
        .await?;

    let status = response.status();
    let result = response.json::<serde_json::Value>().await?;
    println!("Status: {}", status);
    println!("Result: {}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
