use async_trait::async_trait;
use cs_core::{Category, ConfigProvider, ConfigResult, Coordinate, Properties, Scope, ServiceRef};
use errors::ProviderError;
use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Wraps a provider and records operation metrics.
///
/// - `config_provider_operation_duration_seconds` (histogram)
/// - `config_provider_operations_total` (counter)
/// - `config_provider_errors_total` (counter, with `kind`)
/// - `config_provider_properties_count` (histogram)
///
/// All carry `provider` and `operation` labels.
pub struct InstrumentedProvider<P: ConfigProvider> {
    inner: P,
}

impl<P: ConfigProvider> InstrumentedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn record<T>(&self, operation: &'static str, duration: Duration, result: &Result<T, ProviderError>) {
        let provider = self.inner.provider_name();
        histogram!("config_provider_operation_duration_seconds", "provider" => provider, "operation" => operation)
            .record(duration.as_secs_f64());
        counter!("config_provider_operations_total", "provider" => provider, "operation" => operation)
            .increment(1);
        if let Err(e) = result {
            counter!(
                "config_provider_errors_total",
                "provider" => provider,
                "operation" => operation,
                "kind" => e.kind().to_string()
            )
            .increment(1);
        }
    }

    fn record_properties(&self, operation: &'static str, count: usize) {
        let provider = self.inner.provider_name();
        histogram!("config_provider_properties_count", "provider" => provider, "operation" => operation)
            .record(count as f64);
    }
}

#[async_trait]
impl<P: ConfigProvider> ConfigProvider for InstrumentedProvider<P> {
    async fn login(&self, authorization: Option<&str>) -> Result<Option<String>, ProviderError> {
        let start = Instant::now();
        let result = self.inner.login(authorization).await;
        self.record("login", start.elapsed(), &result);
        result
    }

    async fn fetch_scope(
        &self,
        token: Option<&str>,
        coordinate: &Coordinate,
        category: Category,
        scope: Scope,
    ) -> Result<Properties, ProviderError> {
        self.inner
            .fetch_scope(token, coordinate, category, scope)
            .await
    }

    async fn fetch_category(
        &self,
        token: Option<&str>,
        coordinate: &Coordinate,
        category: Category,
    ) -> Result<ConfigResult, ProviderError> {
        let operation = match category {
            Category::Configs => "fetch_configs",
            Category::Certs => "fetch_certificates",
            Category::Files => "fetch_files",
        };

        let start = Instant::now();
        let result = self.inner.fetch_category(token, coordinate, category).await;
        self.record(operation, start.elapsed(), &result);
        if let Ok(found) = &result {
            self.record_properties(operation, found.config_properties.len());
        }
        result
    }

    async fn search_services(
        &self,
        token: Option<&str>,
        project_name: Option<&str>,
    ) -> Result<Vec<ServiceRef>, ProviderError> {
        let start = Instant::now();
        let result = self.inner.search_services(token, project_name).await;
        self.record("search_services", start.elapsed(), &result);
        result
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::CompositeKey;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use serde_json::json;

    type SnapshotVec = Vec<(
        CompositeKey,
        Option<metrics::Unit>,
        Option<metrics::SharedString>,
        DebugValue,
    )>;

    struct FixedProvider {
        fail: bool,
    }

    #[async_trait]
    impl ConfigProvider for FixedProvider {
        async fn login(&self, authorization: Option<&str>) -> Result<Option<String>, ProviderError> {
            Ok(authorization.map(str::to_string))
        }

        async fn fetch_scope(
            &self,
            _token: Option<&str>,
            _coordinate: &Coordinate,
            _category: Category,
            scope: Scope,
        ) -> Result<Properties, ProviderError> {
            if self.fail {
                return Err(ProviderError::parse("values.yml", "bad indent"));
            }
            let mut props = Properties::new();
            props.insert(scope.to_string(), json!(true));
            Ok(props)
        }

        fn provider_name(&self) -> &'static str {
            "fixed"
        }
    }

    /// Runs one provider call under a scoped recorder.
    fn with_test_recorder<T>(
        fail: bool,
        call: impl FnOnce(InstrumentedProvider<FixedProvider>) -> T,
    ) -> (T, SnapshotVec) {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        let result = metrics::with_local_recorder(&recorder, || {
            call(InstrumentedProvider::new(FixedProvider { fail }))
        });
        (result, snapshotter.snapshot().into_vec())
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
        snapshot
            .iter()
            .filter(|(k, _, _, _)| k.key().name() == name)
            .map(|(_, _, _, value)| match value {
                DebugValue::Counter(v) => *v,
                _ => 0,
            })
            .sum()
    }

    fn has_metric_with_labels(snapshot: &SnapshotVec, name: &str, labels: &[(&str, &str)]) -> bool {
        snapshot.iter().any(|(k, _, _, _)| {
            if k.key().name() != name {
                return false;
            }
            let key_labels: Vec<_> = k.key().labels().collect();
            labels.iter().all(|(label_name, label_value)| {
                key_labels
                    .iter()
                    .any(|l| l.key() == *label_name && l.value() == *label_value)
            })
        })
    }

    fn coordinate() -> Coordinate {
        Coordinate::new("retail", "v1", "api-customers", "v2", "dev")
    }

    #[test]
    fn test_success_records_operation_without_error() {
        let (result, snapshot) = with_test_recorder(false, |provider| {
            block_on(async move { provider.fetch_configs(None, &coordinate()).await })
        });

        assert_eq!(result.unwrap().config_properties.len(), 2);
        assert_eq!(counter_total(&snapshot, "config_provider_operations_total"), 1);
        assert_eq!(counter_total(&snapshot, "config_provider_errors_total"), 0);
        assert!(has_metric_with_labels(
            &snapshot,
            "config_provider_properties_count",
            &[("provider", "fixed"), ("operation", "fetch_configs")]
        ));
    }

    #[test]
    fn test_failure_records_error_kind() {
        let (result, snapshot) = with_test_recorder(true, |provider| {
            block_on(async move { provider.fetch_files(None, &coordinate()).await })
        });

        assert!(result.is_err());
        assert_eq!(counter_total(&snapshot, "config_provider_errors_total"), 1);
        assert!(has_metric_with_labels(
            &snapshot,
            "config_provider_errors_total",
            &[("operation", "fetch_files"), ("kind", "parse_error")]
        ));
    }

    #[test]
    fn test_login_is_timed() {
        let (token, snapshot) = with_test_recorder(false, |provider| {
            block_on(async move { provider.login(Some("Bearer t")).await })
        });

        assert_eq!(token.unwrap().as_deref(), Some("Bearer t"));
        assert!(has_metric_with_labels(
            &snapshot,
            "config_provider_operation_duration_seconds",
            &[("operation", "login")]
        ));
    }

    #[test]
    fn test_provider_name_is_delegated() {
        let provider = InstrumentedProvider::new(FixedProvider { fail: false });
        assert_eq!(provider.provider_name(), "fixed");
        assert_eq!(provider.inner().provider_name(), "fixed");
    }
}
