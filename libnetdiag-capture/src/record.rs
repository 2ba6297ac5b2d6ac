use libnetdiag_tools::Duration;
use serde::Serialize;

/// One decoded frame, as exposed to the presentation layer.
///
/// All fields are best-effort: a missing layer leaves the corresponding
/// fields at their zero value. `protocol` names the highest transport layer
/// actually decoded; ports are meaningful only for TCP and UDP.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PacketRecord {
    #[serde(rename = "timestamp")]
    pub ts: Duration,
    pub protocol: String,
    #[serde(rename = "srcIP")]
    pub src_ip: String,
    #[serde(rename = "dstIP")]
    pub dst_ip: String,
    #[serde(rename = "srcPort")]
    pub src_port: u16,
    #[serde(rename = "dstPort")]
    pub dst_port: u16,
    /// On-wire length in bytes
    pub length: u32,
    /// Free-text annotation (e.g. TCP flags)
    pub info: String,
    /// Human-readable payload rendering
    pub payload: String,
    /// Application-layer bytes as hex text
    #[serde(rename = "rawData")]
    pub raw_data: String,
    #[serde(rename = "httpInfo")]
    pub http: Option<HttpInfo>,
}

/// Reduced HTTP request/response header set.
///
/// Exactly one of (method, path) or (status_code, status_text) is populated,
/// depending on `is_request`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpInfo {
    pub method: String,
    pub path: String,
    pub version: String,
    pub status_code: u16,
    pub status_text: String,
    pub content_type: String,
    pub host: String,
    pub is_request: bool,
}

/// Aggregate statistics, recomputed on demand from the buffer contents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureStats {
    pub total_packets: usize,
    pub tcp_packets: usize,
    pub udp_packets: usize,
    pub icmp_packets: usize,
    pub total_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use libnetdiag_tools::Duration;

    #[test]
    fn packet_record_json_keys() {
        let record = PacketRecord {
            ts: Duration::new(1, 2),
            protocol: "TCP".to_owned(),
            http: Some(HttpInfo::default()),
            ..Default::default()
        };
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "timestamp", "protocol", "srcIP", "dstIP", "srcPort", "dstPort", "length", "info",
            "payload", "rawData", "httpInfo",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        let http = obj["httpInfo"].as_object().unwrap();
        for key in [
            "method",
            "path",
            "version",
            "statusCode",
            "statusText",
            "contentType",
            "host",
            "isRequest",
        ] {
            assert!(http.contains_key(key), "missing httpInfo key {key}");
        }
    }

    #[test]
    fn capture_stats_json_keys() {
        let stats = CaptureStats::default();
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&stats).unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "totalPackets",
            "tcpPackets",
            "udpPackets",
            "icmpPackets",
            "totalBytes",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
    }
}
