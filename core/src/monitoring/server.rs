//! HTTP server exposing the Prometheus registry for scraping
//! (spec.md §6 `LATENTSPEED_METRICS_ADDR`).

use super::ExecutionMetrics;
use anyhow::{Context, Result};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

const METRICS_PATH: &str = "/metrics";

/// Serves `/metrics` and `/healthz` on `listen_addr` until the process
/// exits. Intended to run on the adapter's own Tokio runtime alongside the
/// WS reader task, not on the Receiver/Publisher threads.
pub async fn serve(listen_addr: SocketAddr, metrics: Arc<ExecutionMetrics>) -> Result<()> {
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind metrics server on {listen_addr}"))?;
    info!(%listen_addr, "metrics server listening");

    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                error!(error = %err, "metrics server accept failed");
                continue;
            }
        };

        let metrics = metrics.clone();
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let metrics = metrics.clone();
                async move { handle_request(req, metrics) }
            });
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                debug!(error = %err, %remote_addr, "metrics connection closed");
            }
        });
    }
}

fn handle_request(
    req: Request<hyper::body::Incoming>,
    metrics: Arc<ExecutionMetrics>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let path = req.uri().path();
    let response = match path {
        "/healthz" | "/health" => Response::builder()
            .status(StatusCode::OK)
            .body(Full::new(Bytes::from("OK")))
            .unwrap(),
        METRICS_PATH => match encode_metrics(&metrics) {
            Ok(text) => Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "text/plain; version=0.0.4")
                .body(Full::new(Bytes::from(text)))
                .unwrap(),
            Err(err) => Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::new(Bytes::from(err.to_string())))
                .unwrap(),
        },
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("Not Found")))
            .unwrap(),
    };
    Ok(response)
}

fn encode_metrics(metrics: &ExecutionMetrics) -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = metrics.registry().gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("failed to encode metrics")?;
    String::from_utf8(buffer).context("metrics output was not valid utf-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_registered_counters_in_prometheus_text_format() {
        let metrics = ExecutionMetrics::new().unwrap();
        metrics.orders_received.inc();
        metrics.record_reject("invalid_params");

        let text = encode_metrics(&metrics).unwrap();
        assert!(text.contains("latentspeed_orders_received_total"));
        assert!(text.contains("latentspeed_orders_rejected_total"));
        assert!(text.contains("TYPE"));
    }
}
