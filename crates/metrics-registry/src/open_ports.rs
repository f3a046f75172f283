use crate::OPEN_PORTS_METRIC;
use prometheus_client::collector::Collector;
use prometheus_client::encoding::{DescriptorEncoder, EncodeLabelSet, EncodeMetric};
use prometheus_client::metrics::gauge::ConstGauge;
use prometheus_client::metrics::MetricType;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

const HELP: &str = "Total count of open ports found by nmap for an IP";

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct HostLabels {
    ip: String,
}

/// Per-host gauge keyed by host identifier. Encoded under a single read lock so
/// a render never observes half an update, and in key order.
#[derive(Clone, Debug, Default)]
pub(crate) struct OpenPortsGauge {
    samples: Arc<RwLock<BTreeMap<String, i64>>>,
}

impl OpenPortsGauge {
    pub(crate) fn set(&self, host: &str, value: i64) {
        let mut samples = self.samples.write().unwrap_or_else(PoisonError::into_inner);
        samples.insert(host.to_string(), value);
    }

    pub(crate) fn get(&self, host: &str) -> Option<i64> {
        self.samples.read().unwrap_or_else(PoisonError::into_inner).get(host).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.samples.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// The text encoder writes label values as-is, so quote, backslash and newline
/// are escaped here to keep the exposition parseable.
fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

impl Collector for OpenPortsGauge {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), std::fmt::Error> {
        let samples = self.samples.read().unwrap_or_else(PoisonError::into_inner);
        let mut family = encoder.encode_descriptor(OPEN_PORTS_METRIC, HELP, None, MetricType::Gauge)?;
        for (host, value) in samples.iter() {
            let labels = HostLabels { ip: escape_label_value(host) };
            ConstGauge::new(*value).encode(family.encode_family(&labels)?)?;
        }
        Ok(())
    }
}
