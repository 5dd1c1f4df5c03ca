// Copyright PingCAP Inc. 2025.
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; version 2 of the License.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

/// Prometheus metrics definitions for clipstore
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

lazy_static! {
    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "endpoint", "status"],
        vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0]
    ).unwrap();

    /// HTTP request count
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "endpoint", "status"]
    ).unwrap();

    /// Bytes accepted by upload endpoints, per container
    pub static ref UPLOADED_BYTES_TOTAL: CounterVec = register_counter_vec!(
        "uploaded_bytes_total",
        "Total bytes accepted by upload endpoints",
        &["container"]
    ).unwrap();

    /// Uploaded object count, per container
    pub static ref UPLOADED_OBJECTS_TOTAL: CounterVec = register_counter_vec!(
        "uploaded_objects_total",
        "Total objects accepted by upload endpoints",
        &["container"]
    ).unwrap();

    /// Signed read URLs handed out, per container
    pub static ref ACCESS_GRANTS_ISSUED: CounterVec = register_counter_vec!(
        "access_grants_issued_total",
        "Total signed read URLs issued",
        &["container"]
    ).unwrap();

    /// Catalog mutations by collection and operation
    pub static ref CATALOG_OPS_TOTAL: CounterVec = register_counter_vec!(
        "catalog_operations_total",
        "Total catalog mutations",
        &["collection", "operation"]
    ).unwrap();
}

/// Increment HTTP request counter
pub fn increment_http_request(method: &str, endpoint: &str, status: &str) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, status])
        .inc();
}

/// Record HTTP request duration
pub fn record_http_duration(method: &str, endpoint: &str, status: &str, duration: f64) {
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, endpoint, status])
        .observe(duration);
}

/// Record a completed upload
pub fn record_upload(container: &str, bytes: u64) {
    UPLOADED_BYTES_TOTAL
        .with_label_values(&[container])
        .inc_by(bytes as f64);
    UPLOADED_OBJECTS_TOTAL.with_label_values(&[container]).inc();
}

/// Record an issued signed read URL
pub fn record_grant_issued(container: &str) {
    ACCESS_GRANTS_ISSUED.with_label_values(&[container]).inc();
}

/// Record a catalog mutation
pub fn record_catalog_op(collection: &str, operation: &str) {
    CATALOG_OPS_TOTAL
        .with_label_values(&[collection, operation])
        .inc();
}

/// Gather all metrics for Prometheus text exposition
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    // Default registry: everything above is registered there.
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_metrics() {
        record_upload("videos", 1024);
        record_upload("videos", 1024);

        assert_eq!(
            UPLOADED_BYTES_TOTAL.with_label_values(&["videos"]).get(),
            2048.0
        );
        assert_eq!(
            UPLOADED_OBJECTS_TOTAL.with_label_values(&["videos"]).get(),
            2.0
        );
    }

    #[test]
    fn test_grant_metrics() {
        record_grant_issued("thumbnails");
        assert_eq!(
            ACCESS_GRANTS_ISSUED
                .with_label_values(&["thumbnails"])
                .get(),
            1.0
        );
    }

    #[test]
    fn test_catalog_metrics() {
        record_catalog_op("metadata", "create");
        record_catalog_op("metadata", "delete");

        assert_eq!(
            CATALOG_OPS_TOTAL
                .with_label_values(&["metadata", "create"])
                .get(),
            1.0
        );
    }

    #[test]
    fn test_render() {
        increment_http_request("GET", "/test", "200");

        let output = render().unwrap();
        assert!(!output.is_empty(), "Metrics output should not be empty");
    }
}
