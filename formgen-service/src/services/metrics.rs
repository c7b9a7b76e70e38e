//! Prometheus metrics for formgen-service.
//!
//! Provides HTTP and LLM-specific metrics for observability.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{Once, OnceLock};

static INIT: Once = Once::new();

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// HTTP metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

// LLM metrics
pub static LLM_TOKENS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static LLM_PROVIDER_LATENCY_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static LLM_PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static LLM_DECODE_FAILURES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

// Generation outcome metrics
pub static GENERATION_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Safe to call more than once; only the first call wins.
pub fn init_metrics() {
    INIT.call_once(|| match build_metrics() {
        Ok(()) => tracing::info!("Prometheus metrics initialized"),
        Err(e) => tracing::error!(error = %e, "Failed to initialize Prometheus metrics"),
    });
}

fn build_metrics() -> Result<(), prometheus::Error> {
    let registry = Registry::new();

    // HTTP request counter
    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )?;

    // HTTP request duration histogram
    let http_request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["method", "path"],
    )?;

    // Token counter (prompt/completion by model)
    let llm_tokens = IntCounterVec::new(
        Opts::new("llm_tokens_total", "Total tokens reported by the LLM provider"),
        &["model", "type"], // type: prompt, completion
    )?;

    // Provider latency histogram
    let provider_latency = HistogramVec::new(
        HistogramOpts::new(
            "llm_provider_latency_seconds",
            "LLM provider API latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["provider", "model"],
    )?;

    // Provider error counter
    let provider_errors = IntCounterVec::new(
        Opts::new("llm_provider_errors_total", "Total LLM provider errors"),
        &["provider", "error_type"],
    )?;

    // Replies that could not be decoded into the expected shape
    let decode_failures = IntCounterVec::new(
        Opts::new(
            "llm_decode_failures_total",
            "Total LLM replies that failed structured decoding",
        ),
        &["operation"],
    )?;

    // Generation outcome counter
    let generation_requests = IntCounterVec::new(
        Opts::new("generation_requests_total", "Total generation operations"),
        &["operation", "outcome"],
    )?;

    // Register all metrics
    registry.register(Box::new(http_requests_total.clone()))?;
    registry.register(Box::new(http_request_duration.clone()))?;
    registry.register(Box::new(llm_tokens.clone()))?;
    registry.register(Box::new(provider_latency.clone()))?;
    registry.register(Box::new(provider_errors.clone()))?;
    registry.register(Box::new(decode_failures.clone()))?;
    registry.register(Box::new(generation_requests.clone()))?;

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(http_requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(http_request_duration);
    let _ = LLM_TOKENS_TOTAL.set(llm_tokens);
    let _ = LLM_PROVIDER_LATENCY_SECONDS.set(provider_latency);
    let _ = LLM_PROVIDER_ERRORS_TOTAL.set(provider_errors);
    let _ = LLM_DECODE_FAILURES_TOTAL.set(decode_failures);
    let _ = GENERATION_REQUESTS_TOTAL.set(generation_requests);

    Ok(())
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

// Helper functions for recording metrics

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, path: &str, status: &str, duration_secs: f64) {
    if let Some(counter) = HTTP_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[method, path, status]).inc();
    }
    if let Some(histogram) = HTTP_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }
}

/// Record token usage reported by the provider.
pub fn record_tokens(model: &str, prompt_tokens: u64, completion_tokens: u64) {
    if let Some(counter) = LLM_TOKENS_TOTAL.get() {
        counter
            .with_label_values(&[model, "prompt"])
            .inc_by(prompt_tokens);
        counter
            .with_label_values(&[model, "completion"])
            .inc_by(completion_tokens);
    }
}

/// Record provider latency.
pub fn record_provider_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(histogram) = LLM_PROVIDER_LATENCY_SECONDS.get() {
        histogram
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(counter) = LLM_PROVIDER_ERRORS_TOTAL.get() {
        counter.with_label_values(&[provider, error_type]).inc();
    }
}

/// Record a reply that did not decode.
pub fn record_decode_failure(operation: &str) {
    if let Some(counter) = LLM_DECODE_FAILURES_TOTAL.get() {
        counter.with_label_values(&[operation]).inc();
    }
}

/// Record the outcome of a generation operation.
pub fn record_generation(operation: &str, outcome: &str) {
    if let Some(counter) = GENERATION_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[operation, outcome]).inc();
    }
}
