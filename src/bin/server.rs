use argh::FromArgs;
use captionist::{
    GenerationConfig, HttpLabelDetector, HttpTextGenerator, Pipeline, PipelineConfig,
    server::{self, AppState},
};
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

// defaults for the server
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DETECTOR_URL: &str = "http://localhost:4000/detect-labels";
const DEFAULT_GENERATOR_URL: &str = "http://localhost:4001";
const DEFAULT_MAX_LABELS: usize = 10;
const DEFAULT_MIN_CONFIDENCE: f32 = 80.0;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(FromArgs)]
/// Captionist describes uploaded images with a label detector and a text generator.
struct ServerArgs {
    /// the host to run the server on
    #[argh(option, short = 'h', default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port to run the server on
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// the label detection endpoint
    #[argh(option, default = "DEFAULT_DETECTOR_URL.to_string()")]
    detector_url: String,

    /// the base url of the text generation service
    #[argh(option, default = "DEFAULT_GENERATOR_URL.to_string()")]
    generator_url: String,

    /// maximum number of labels to keep
    #[argh(option, default = "DEFAULT_MAX_LABELS")]
    max_labels: usize,

    /// minimum label confidence, between 0 and 100
    #[argh(option, default = "DEFAULT_MIN_CONFIDENCE")]
    min_confidence: f32,

    /// timeout in seconds for each outbound call
    #[argh(option, default = "DEFAULT_TIMEOUT_SECS")]
    timeout_secs: u64,

    /// maximum number of generated tokens
    #[argh(option)]
    max_tokens: Option<u32>,

    /// sampling temperature
    #[argh(option)]
    temperature: Option<f32>,

    /// nucleus sampling cutoff
    #[argh(option)]
    top_p: Option<f32>,

    /// stop sequence, may be repeated
    #[argh(option)]
    stop: Vec<String>,
}

impl ServerArgs {
    fn pipeline_config(&self) -> PipelineConfig {
        let defaults = GenerationConfig::default();
        PipelineConfig {
            max_labels: self.max_labels,
            min_confidence: self.min_confidence,
            call_timeout: Duration::from_secs(self.timeout_secs),
            generation: GenerationConfig {
                max_token_count: self.max_tokens.unwrap_or(defaults.max_token_count),
                temperature: self.temperature.unwrap_or(defaults.temperature),
                top_p: self.top_p.unwrap_or(defaults.top_p),
                stop_sequences: self.stop.clone(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: ServerArgs = argh::from_env();

    // format the host and port
    let addr = format!("{}:{}", args.host, args.port);

    let config = args.pipeline_config();
    let detector = HttpLabelDetector::new(&args.detector_url, config.call_timeout)?;
    let generator = HttpTextGenerator::new(&args.generator_url, config.call_timeout)?;
    log::info!("Label detector: {}", args.detector_url);
    log::info!("Text generator: {}", generator.invoke_url());

    let pipeline = Arc::new(Pipeline::new(detector, generator, config));
    let shutdown = CancellationToken::new();
    let app = server::router(AppState::new(pipeline, shutdown.clone()));

    log::info!("🚀 Starting the server");
    log::info!("🔥 Listening on: {}", addr);
    log::info!("🔧 Press Ctrl+C to stop the server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for Ctrl+C: {}", e);
            }
            log::info!("Shutting down, cancelling requests in flight");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
