use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub parcels_created_total: IntCounter,
    pub tracking_lookups_total: IntCounterVec,
    pub history_events_total: IntCounterVec,
    pub parcels_suspended: IntGauge,
    pub snapshot_writes_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let parcels_created_total =
            IntCounter::new("parcels_created_total", "Parcels generated by admins")
                .expect("valid parcels_created_total metric");

        let tracking_lookups_total = IntCounterVec::new(
            Opts::new("tracking_lookups_total", "Tracking lookups by outcome"),
            &["outcome"],
        )
        .expect("valid tracking_lookups_total metric");

        let history_events_total = IntCounterVec::new(
            Opts::new("history_events_total", "History events appended by status"),
            &["status"],
        )
        .expect("valid history_events_total metric");

        let parcels_suspended =
            IntGauge::new("parcels_suspended", "Parcels currently suspended")
                .expect("valid parcels_suspended metric");

        let snapshot_writes_total = IntCounterVec::new(
            Opts::new("snapshot_writes_total", "Snapshot writes by outcome"),
            &["outcome"],
        )
        .expect("valid snapshot_writes_total metric");

        registry
            .register(Box::new(parcels_created_total.clone()))
            .expect("register parcels_created_total");
        registry
            .register(Box::new(tracking_lookups_total.clone()))
            .expect("register tracking_lookups_total");
        registry
            .register(Box::new(history_events_total.clone()))
            .expect("register history_events_total");
        registry
            .register(Box::new(parcels_suspended.clone()))
            .expect("register parcels_suspended");
        registry
            .register(Box::new(snapshot_writes_total.clone()))
            .expect("register snapshot_writes_total");

        Self {
            registry,
            parcels_created_total,
            tracking_lookups_total,
            history_events_total,
            parcels_suspended,
            snapshot_writes_total,
        }
    }

    pub fn record_history(&self, status: &str) {
        self.history_events_total.with_label_values(&[status]).inc();
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
