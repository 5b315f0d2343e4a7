//! # Integration Tests
//!
//! Cross-crate scenarios.
//!
//! - Batch scenarios over scripted collaborators
//! - Cache staleness and single-flight behaviour seen from the dispatcher
//! - HTTP end to end against mock provider and node servers

#[cfg(test)]
mod support {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::NaiveDate;
    use config_cache::ConfigCache;
    use contracts::{
        CachePayload, Clock, ConfigFetchError, ConfigProvider, CreditorInstitutionStation,
        FixedClock, RetrySettings, Station,
    };
    use dispatcher::{BatchDispatcher, MemoryFlowProcessor, MemoryQueue, RetryScheduler};
    use node_client::MockFlowListClient;

    /// One provider answer
    #[derive(Clone)]
    pub enum Step {
        Payload(CachePayload),
        Status(u16),
        Refused,
    }

    /// Provider answering scripted steps in order, then repeating the fallback
    pub struct ScriptedProvider {
        steps: Mutex<VecDeque<Step>>,
        fallback: Step,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedProvider {
        pub fn always(step: Step) -> Self {
            Self {
                steps: Mutex::new(VecDeque::new()),
                fallback: step,
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        pub fn then(self, step: Step) -> Self {
            self.steps.lock().unwrap().push_back(step);
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ConfigProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch(&self) -> Result<CachePayload, ConfigFetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let step = self
                .steps
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone());
            match step {
                Step::Payload(payload) => Ok(payload),
                Step::Status(status) => Err(ConfigFetchError::from_status(status, "scripted").unwrap()),
                Step::Refused => Err(ConfigFetchError::transport("scripted", "connection refused")),
            }
        }
    }

    /// Payload builder: links and stations in insertion order
    #[derive(Default)]
    pub struct PayloadBuilder {
        payload: CachePayload,
    }

    impl PayloadBuilder {
        pub fn link(mut self, organization: &str, station: &str) -> Self {
            let key = format!("{organization}/{station}");
            self.payload.creditor_institution_stations.insert(
                key,
                CreditorInstitutionStation {
                    organization_id: organization.into(),
                    station_code: station.into(),
                },
            );
            self
        }

        pub fn station(mut self, code: &str, broker: &str, enabled: bool) -> Self {
            self.payload.stations.insert(
                code.into(),
                Station {
                    station_code: code.into(),
                    broker_code: broker.into(),
                    enabled,
                },
            );
            self
        }

        pub fn build(self) -> CachePayload {
            self.payload
        }
    }

    /// Routing for organizations "1", "2", "3", one enabled station each
    pub fn three_organizations() -> CachePayload {
        PayloadBuilder::default()
            .link("1", "S1")
            .link("2", "S2")
            .link("3", "S3")
            .station("S1", "B1", true)
            .station("S2", "B2", true)
            .station("S3", "B3", true)
            .build()
    }

    pub fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    pub type Harness =
        BatchDispatcher<ScriptedProvider, MockFlowListClient, MemoryQueue, MemoryFlowProcessor>;

    pub fn harness(
        provider: ScriptedProvider,
        client: MockFlowListClient,
        max_retry: u32,
        clock: &Arc<FixedClock>,
    ) -> Harness {
        let cache = Arc::new(ConfigCache::with_clock(
            provider,
            Arc::clone(clock) as Arc<dyn Clock>,
        ));
        let settings = RetrySettings {
            max_retry,
            ..RetrySettings::default()
        };
        BatchDispatcher::new(
            cache,
            client,
            RetryScheduler::new(MemoryQueue::new("organizations"), &settings),
            MemoryFlowProcessor::new("memory"),
        )
    }
}

#[cfg(test)]
mod contract_tests {
    use contracts::OrganizationBatch;

    #[test]
    fn test_requeue_message_shape() {
        let encoded = OrganizationBatch::single("77777777777", 1).encode().unwrap();
        let decoded = OrganizationBatch::decode(&encoded).unwrap();
        assert_eq!(decoded.organization_ids, vec!["77777777777"]);
        assert_eq!(decoded.retry, 1);
    }
}

#[cfg(test)]
mod scenario_tests {
    use std::sync::Arc;

    use contracts::{FixedClock, FlowListOutcome, OrganizationBatch};
    use dispatcher::OrganizationOutcome;
    use node_client::MockFlowListClient;

    use crate::support::*;

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(day(15)))
    }

    #[tokio::test]
    async fn test_every_resolvable_organization_gets_one_call() {
        let dispatcher = harness(
            ScriptedProvider::always(Step::Payload(three_organizations())),
            MockFlowListClient::new(),
            5,
            &clock(),
        );

        dispatcher.dispatch(r#"{"idPA":["1","2","3"]}"#).await.unwrap();

        let client = dispatcher.client();
        assert_eq!(client.call_count(), 3);
        for id in ["1", "2", "3"] {
            assert_eq!(client.calls_for(id), 1);
        }
    }

    #[tokio::test]
    async fn test_three_organizations_all_succeed() {
        let client = MockFlowListClient::new()
            .respond_flows("1", &["F1"])
            .respond_flows("2", &["F2a", "F2b"])
            .respond_flows("3", &[]);
        let dispatcher = harness(
            ScriptedProvider::always(Step::Payload(three_organizations())),
            client,
            5,
            &clock(),
        );

        let report = dispatcher.dispatch(r#"{"idPA":["1","2","3"]}"#).await.unwrap();

        assert_eq!(report.count("handed_off"), 3);
        let handoffs = dispatcher.processor().handoffs();
        assert_eq!(handoffs.len(), 3);
        assert_eq!(handoffs[1].flow_ids, vec!["F2a", "F2b"]);
        assert!(handoffs[2].flow_ids.is_empty());
        assert!(dispatcher.scheduler().queue().is_empty());
    }

    #[tokio::test]
    async fn test_business_fault_skips_only_that_organization() {
        let client = MockFlowListClient::new()
            .respond("1", FlowListOutcome::BusinessFault("PPT_DOMINIO_SCONOSCIUTO".into()))
            .respond_flows("2", &["F2"])
            .respond_flows("3", &["F3"]);
        let dispatcher = harness(
            ScriptedProvider::always(Step::Payload(three_organizations())),
            client,
            5,
            &clock(),
        );

        let report = dispatcher.dispatch(r#"{"idPA":["1","2","3"]}"#).await.unwrap();

        assert_eq!(
            report.outcome_of("1"),
            Some(&OrganizationOutcome::BusinessFault {
                description: "PPT_DOMINIO_SCONOSCIUTO".into()
            })
        );
        let handed: Vec<_> = dispatcher
            .processor()
            .handoffs()
            .into_iter()
            .map(|h| h.organization_id)
            .collect();
        assert_eq!(handed, vec!["2", "3"]);
        assert!(dispatcher.scheduler().queue().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_at_retry_zero_requeues_once() {
        let client = MockFlowListClient::new()
            .respond("2", FlowListOutcome::TransportError("connect timed out".into()));
        let dispatcher = harness(
            ScriptedProvider::always(Step::Payload(three_organizations())),
            client,
            5,
            &clock(),
        );

        let report = dispatcher.dispatch(r#"{"idPA":["1","2","3"]}"#).await.unwrap();

        assert_eq!(report.outcome_of("2"), Some(&OrganizationOutcome::Requeued { retry: 1 }));
        let messages = dispatcher.scheduler().queue().messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body, OrganizationBatch::single("2", 1));
        assert_eq!(dispatcher.processor().handoff_count(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_at_max_retry_is_dropped() {
        let client = MockFlowListClient::with_default(FlowListOutcome::TransportError(
            "connection reset".into(),
        ));
        let dispatcher = harness(
            ScriptedProvider::always(Step::Payload(three_organizations())),
            client,
            5,
            &clock(),
        );

        let report = dispatcher.dispatch(r#"{"idPA":["1"],"retry":5}"#).await.unwrap();

        assert_eq!(
            report.outcome_of("1"),
            Some(&OrganizationOutcome::RetryExhausted { retry: 6 })
        );
        assert!(dispatcher.scheduler().queue().is_empty());
        assert_eq!(dispatcher.metrics().snapshot().retry_exhausted, 1);
    }

    #[tokio::test]
    async fn test_retry_chain_climbs_to_max_then_stops() {
        let client = MockFlowListClient::with_default(FlowListOutcome::TransportError("down".into()));
        let dispatcher = harness(
            ScriptedProvider::always(Step::Payload(three_organizations())),
            client,
            3,
            &clock(),
        );

        let mut message = r#"{"idPA":["1"]}"#.to_string();
        let mut seen = Vec::new();
        loop {
            dispatcher.dispatch(&message).await.unwrap();
            let Some(next) = dispatcher.scheduler().queue().drain().pop() else {
                break;
            };
            seen.push(next.body.retry);
            message = next.body.encode().unwrap();
        }

        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(dispatcher.client().call_count(), 4);
    }

    #[tokio::test]
    async fn test_first_enabled_station_in_stored_order() {
        let payload = PayloadBuilder::default()
            .link("1", "S-late")
            .link("1", "S-off")
            .link("1", "S-early")
            .link("2", "S-off")
            .station("S-off", "B-off", false)
            .station("S-early", "B-early", true)
            .station("S-late", "B-late", true)
            .build();
        let dispatcher = harness(
            ScriptedProvider::always(Step::Payload(payload)),
            MockFlowListClient::new(),
            5,
            &clock(),
        );

        let report = dispatcher.dispatch(r#"{"idPA":["1","2"]}"#).await.unwrap();

        let calls = dispatcher.client().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].station_code, "S-early");
        assert_eq!(calls[0].broker_code, "B-early");
        assert_eq!(report.outcome_of("2"), Some(&OrganizationOutcome::Unresolved));
    }

    #[tokio::test]
    async fn test_malformed_message_is_dropped_without_side_effects() {
        let dispatcher = harness(
            ScriptedProvider::always(Step::Payload(three_organizations())),
            MockFlowListClient::new(),
            5,
            &clock(),
        );

        assert!(dispatcher.dispatch(r#"{"idPA":"1"}"#).await.is_err());

        assert_eq!(dispatcher.cache().provider().calls(), 0);
        assert_eq!(dispatcher.client().call_count(), 0);
        assert!(dispatcher.scheduler().queue().is_empty());
    }
}

#[cfg(test)]
mod cache_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::FixedClock;
    use dispatcher::DispatchError;
    use node_client::MockFlowListClient;

    use crate::support::*;

    #[tokio::test]
    async fn test_stale_snapshot_refreshed_once_before_processing() {
        let yesterday_routing = PayloadBuilder::default()
            .link("1", "S1")
            .station("S1", "OLD-BROKER", true)
            .build();
        let today_routing = PayloadBuilder::default()
            .link("1", "S1")
            .station("S1", "NEW-BROKER", true)
            .build();
        let clock = Arc::new(FixedClock::new(day(14)));
        let dispatcher = harness(
            ScriptedProvider::always(Step::Payload(today_routing)).then(Step::Payload(yesterday_routing)),
            MockFlowListClient::new(),
            5,
            &clock,
        );
        dispatcher.dispatch(r#"{"idPA":["1"]}"#).await.unwrap();
        assert_eq!(dispatcher.client().calls()[0].broker_code, "OLD-BROKER");

        clock.advance_days(1);
        dispatcher.dispatch(r#"{"idPA":["1","1"]}"#).await.unwrap();
        dispatcher.dispatch(r#"{"idPA":["1"]}"#).await.unwrap();

        assert_eq!(dispatcher.cache().provider().calls(), 2);
        let brokers: Vec<_> = dispatcher
            .client()
            .calls()
            .into_iter()
            .skip(1)
            .map(|c| c.broker_code)
            .collect();
        assert_eq!(brokers, vec!["NEW-BROKER"; 3]);
        assert_eq!(
            dispatcher.cache().current().unwrap().retrieved_on(),
            day(15)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_invocations_share_one_fetch() {
        let clock = Arc::new(FixedClock::new(day(15)));
        let dispatcher = Arc::new(harness(
            ScriptedProvider::always(Step::Payload(three_organizations()))
                .with_delay(Duration::from_millis(50)),
            MockFlowListClient::new(),
            5,
            &clock,
        ));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..10 {
            let dispatcher = Arc::clone(&dispatcher);
            tasks.spawn(async move { dispatcher.dispatch(r#"{"idPA":["1","2","3"]}"#).await });
        }
        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap().unwrap().count("handed_off"), 3);
        }

        assert_eq!(dispatcher.cache().provider().calls(), 1);
        assert_eq!(dispatcher.client().call_count(), 30);
    }

    #[tokio::test]
    async fn test_provider_status_error_then_recovery() {
        let clock = Arc::new(FixedClock::new(day(15)));
        let dispatcher = harness(
            ScriptedProvider::always(Step::Payload(three_organizations())).then(Step::Status(503)),
            MockFlowListClient::new(),
            5,
            &clock,
        );

        let first = dispatcher.dispatch(r#"{"idPA":["1","2"]}"#).await.unwrap();
        assert_eq!(first.count("unresolved"), 2);
        assert!(dispatcher.cache().current().is_none());
        assert!(dispatcher.scheduler().queue().is_empty());

        let second = dispatcher.dispatch(r#"{"idPA":["1","2"]}"#).await.unwrap();
        assert_eq!(second.count("handed_off"), 2);
        assert_eq!(dispatcher.cache().provider().calls(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_provider_aborts_before_any_call() {
        let clock = Arc::new(FixedClock::new(day(15)));
        let dispatcher = harness(
            ScriptedProvider::always(Step::Refused),
            MockFlowListClient::new(),
            5,
            &clock,
        );

        let err = dispatcher.dispatch(r#"{"idPA":["1","2","3"]}"#).await.unwrap_err();

        assert!(matches!(err, DispatchError::Cache(_)));
        assert_eq!(dispatcher.client().call_count(), 0);
        assert!(dispatcher.cache().current().is_none());
    }
}

#[cfg(test)]
mod http_e2e_tests {
    use std::sync::Arc;

    use config_cache::{ApiConfigClient, ConfigCache, SUBSCRIPTION_KEY_HEADER};
    use config_loader::ConfigLoader;
    use contracts::{Clock, FixedClock};
    use dispatcher::{BatchDispatcher, FileFlowProcessor, FileQueue, RetryScheduler};
    use node_client::HttpFlowListClient;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::support::day;

    async fn provider_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cache"))
            .and(header(SUBSCRIPTION_KEY_HEADER, "k3y"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "creditorInstitutionStations": {
                    "1": {"creditorInstitutionCode": "77777777777", "stationCode": "77777777777_01"},
                    "2": {"creditorInstitutionCode": "88888888888", "stationCode": "88888888888_01"}
                },
                "stations": {
                    "77777777777_01": {"stationCode": "77777777777_01", "brokerCode": "77777777777", "enabled": true},
                    "88888888888_01": {"stationCode": "88888888888_01", "brokerCode": "88888888888", "enabled": true}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    async fn node_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"identificativoPA": "77777777777"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "elencoFlussiRendicontazione": {
                    "totRestituiti": 2,
                    "idRendicontazione": [
                        {"identificativoFlusso": "2024-04-15ABI-0001", "dataOraFlusso": "2024-04-15T06:00:00"},
                        {"identificativoFlusso": "2024-04-15ABI-0002", "dataOraFlusso": "2024-04-15T06:30:00"}
                    ]
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"identificativoPA": "88888888888"})))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_http_round_trip_spools_flows_and_retries() {
        let provider = provider_server().await;
        let node = node_server().await;
        let spool = tempfile::tempdir().unwrap();

        let env: HashMap<&str, String> = HashMap::from([
            ("CACHE_CLIENT_HOST", provider.uri()),
            ("CACHE_PATH", "/cache".to_string()),
            ("CACHE_API_KEY", "k3y".to_string()),
            ("NODE_URL", format!("{}/flows", node.uri())),
            ("NODE_TIMEOUT_MS", "2000".to_string()),
            ("FLOW_SA_CONNECTION_STRING", spool.path().display().to_string()),
            ("QUEUE_DELAY_SEC", "60".to_string()),
        ]);
        let lookup = move |key: &str| env.get(key).cloned();
        let settings = ConfigLoader::load_layered(None, &lookup).unwrap();

        let clock = Arc::new(FixedClock::new(day(15)));
        let cache = Arc::new(ConfigCache::with_clock(
            ApiConfigClient::new(&settings.cache).unwrap(),
            clock as Arc<dyn Clock>,
        ));
        let storage = &settings.storage;
        let queue = FileQueue::new(spool.path(), &storage.organizations_queue).unwrap();
        let processor =
            FileFlowProcessor::new(spool.path(), &storage.flows_queue, &storage.flows_table).unwrap();
        let dispatcher = BatchDispatcher::new(
            cache,
            HttpFlowListClient::new(&settings.node).unwrap(),
            RetryScheduler::new(queue, &settings.retry),
            processor,
        );

        let report = dispatcher
            .dispatch(r#"{"idPA":["77777777777","88888888888","99999999999"]}"#)
            .await
            .unwrap();
        dispatcher.dispatch(r#"{"idPA":["77777777777"]}"#).await.unwrap();

        assert_eq!(report.count("handed_off"), 1);
        assert_eq!(report.count("requeued"), 1);
        assert_eq!(report.count("unresolved"), 1);

        let requeued = dispatcher.scheduler().queue().read_all().unwrap();
        assert_eq!(requeued.len(), 1);
        assert_eq!(requeued[0].message.body.organization_ids, vec!["88888888888"]);
        assert_eq!(requeued[0].message.body.retry, 1);
        assert_eq!(requeued[0].message.visibility_delay_secs, 60);

        let handoffs = std::fs::read_to_string(dispatcher.processor().queue_path()).unwrap();
        assert_eq!(handoffs.lines().count(), 2);
        assert!(handoffs.contains("2024-04-15ABI-0002"));
        let rows = std::fs::read_to_string(dispatcher.processor().table_path()).unwrap();
        assert_eq!(rows.lines().count(), 4);

        provider.verify().await;
    }
}
