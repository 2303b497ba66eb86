// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// 初始化Prometheus指标导出器并登记任务生命周期计数器
///
/// 端口被占用时（开发或测试环境常见）只记录警告，不影响服务启动
pub fn init_metrics() {
    let addr: SocketAddr = "0.0.0.0:9000".parse().expect("Invalid metrics address");

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::warn!("Failed to install Prometheus recorder: {}", e);
        return;
    }

    describe_counter!(
        "animagen_tasks_created_total",
        "Animation tasks created since startup"
    );
    describe_counter!(
        "animagen_tasks_completed_total",
        "Animation tasks that reached the completed state"
    );
    describe_counter!(
        "animagen_tasks_failed_total",
        "Animation tasks that reached the failed state"
    );

    info!("Metrics exporter listening on {}", addr);
}
