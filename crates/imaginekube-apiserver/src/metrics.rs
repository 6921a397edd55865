//! 指标收集与导出模块
//!
//! 统计 API 请求数量与耗时，以 Prometheus 文本格式导出。

use crate::kapis::AppState;
use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Instant;

/// API 请求指标
pub struct ApiMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
}

impl ApiMetrics {
    /// 创建并注册指标
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("imaginekube_apiserver_requests_total", "Total number of API requests"),
            &["method", "route", "status"],
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "imaginekube_apiserver_request_duration_seconds",
                "API request latency in seconds",
            ),
            &["method", "route"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
        })
    }

    /// 记录一次请求
    pub fn observe(&self, method: &str, route: &str, status: u16, seconds: f64) {
        self.requests_total
            .with_label_values(&[method, route, &status.to_string()])
            .inc();
        self.request_duration
            .with_label_values(&[method, route])
            .observe(seconds);
    }

    /// 导出 Prometheus 文本格式
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// 请求计数中间件，按匹配到的路由模板聚合
pub async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let started = Instant::now();

    let response = next.run(req).await;

    state.metrics.observe(
        &method,
        &route,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_and_render() {
        let metrics = ApiMetrics::new().unwrap();
        metrics.observe("GET", "/healthz", 200, 0.01);
        metrics.observe("GET", "/healthz", 200, 0.02);

        let text = metrics.render().unwrap();
        assert!(text.contains("imaginekube_apiserver_requests_total"));
        assert!(text.contains("route=\"/healthz\""));
        assert!(text.contains("imaginekube_apiserver_request_duration_seconds_count"));
        assert!(text.contains("imaginekube_apiserver_requests_total{method=\"GET\",route=\"/healthz\",status=\"200\"} 2"));
    }
}
