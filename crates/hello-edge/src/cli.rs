//! Command line interface for the native runner.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use edge_handler::{Backend, EdgeHandler, IncomingRequest, ResponseOutparam, StubHost};
use http::{HeaderName, HeaderValue, Method, Uri};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Send one request through the edge handler.
///
/// Outbound fetches go to a stub host that logs them; set
/// `EDGE_FETCH_OUTCOME` (`ok`, `dns-error`, `refused`, `timeout`, `hang`) and
/// `EDGE_FETCH_STATUS` to choose how they resolve.
#[derive(Debug, Parser)]
#[command(name = "hello-edge", version, about)]
pub struct Cli {
    /// The request target, e.g. `https://example.com/x`.
    pub uri: Uri,

    /// The request method.
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: Method,

    /// A request header as `name: value`. May be repeated.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

/// Parse the command line, run the request and print the response.
///
/// # Errors
///
/// Returns an error if telemetry or the stub host cannot be initialized, or
/// the handler does not deliver a complete response.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_telemetry()?;

    let host = StubHost::connect().await.context("connecting stub host")?;
    let handler = EdgeHandler::new(host);

    let mut builder = http::Request::builder().method(cli.method).uri(cli.uri);
    for (name, value) in cli.headers {
        builder = builder.header(name, value);
    }
    let request = builder.body(()).context("building request")?;

    let (response_out, receiver) = ResponseOutparam::new();
    handler.handle(IncomingRequest::from(request), response_out);

    let response = receiver.await.context("handler did not deliver a response")?;
    let response = response.into_http().context("converting response")?;
    tracing::debug!(fetches = handler.host().fetch_count(), "request complete");

    println!("{:?} {}", response.version(), response.status());
    for (name, value) in response.headers() {
        println!("{name}: {}", value.to_str().unwrap_or_default());
    }
    println!();
    println!("{}", String::from_utf8_lossy(response.body()));

    Ok(())
}

fn init_telemetry() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    Registry::default()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("initializing tracing")
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue)> {
    let Some((name, value)) = raw.split_once(':') else {
        return Err(anyhow!("expected `name: value`, got `{raw}`"));
    };
    let name = HeaderName::try_from(name.trim()).context("invalid header name")?;
    let value = HeaderValue::try_from(value.trim()).context("invalid header value")?;
    Ok((name, value))
}
