//! Entry operations.
//!
//! [`FeedConnector`] binds a [`FeedConfig`] to the collaborators it may need and exposes the
//! operations the host platform calls:
//!
//! - [`FeedConnector::get_feeds_from_url`] (server URL mode only)
//! - [`FeedConnector::get_feeds_from_attachment`] (attachment/file IRI modes only)
//! - [`FeedConnector::check_health`]
//!
//! Every operation normalizes its params with [`build_payload`], reports its outcome to the
//! configured [`FeedObserver`] and returns either a result or one typed [`FeedError`].
//!
//! # Example
//!
//! ```no_run
//! use csv_feed::{FeedConfig, FeedConnector, InputMode, RequestParams};
//!
//! # fn main() -> Result<(), csv_feed::FeedError> {
//! let config = FeedConfig::new("feeds.example.com/indicators.csv", true, InputMode::ServerUrl);
//! let params: RequestParams =
//!     serde_json::from_str(r#"{"col_name": "ip, first_seen", "n_rows": 50}"#)?;
//!
//! let records = FeedConnector::new(config).get_feeds_from_url(params)?;
//! println!("records={}", records.len());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::client::RequestClient;
use crate::collaborators::{AttachmentService, Environment, IngestionTrigger};
use crate::config::{FeedConfig, InputMode};
use crate::error::{FeedError, FeedResult};
use crate::feeds::observability::{FeedContext, FeedObserver, FeedOperation, FeedSeverity, FeedStats};
use crate::feeds::sniff::{HeaderSniffer, StructuralSniffer};
use crate::feeds::{attachment, server};
use crate::payload::{FeedRequest, ResponseMode, build_payload};
use crate::types::{FeedResponse, Record, RequestParams};

/// Batch size handed to the ingestion pipeline.
pub const INGEST_BATCH_SIZE: usize = 2000;

pub const FORWARDED_MESSAGE: &str = "Successfully triggered playbooks to create feed records";

const URL_MODE_MISMATCH: &str = "Server URL not provided in Configuration. This action doesn't work with Attachment/File IRI option in configuration";
const FILE_MODE_MISMATCH: &str = "Attachment/File IRI not provided in Configuration. This action doesn't work with Server URL option in configuration";

/// Options controlling entry-operation behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct FeedOptions {
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn FeedObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: FeedSeverity,
    /// Value aliases applied to string params during normalization.
    pub value_aliases: Option<HashMap<String, String>>,
}

impl fmt::Debug for FeedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedOptions")
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .field("value_aliases", &self.value_aliases)
            .finish()
    }
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            observer: None,
            alert_at_or_above: FeedSeverity::Critical,
            value_aliases: None,
        }
    }
}

/// Configured connector instance.
pub struct FeedConnector {
    config: FeedConfig,
    attachments: Option<Arc<dyn AttachmentService>>,
    ingestion: Option<Arc<dyn IngestionTrigger>>,
    sniffer: Arc<dyn HeaderSniffer>,
    options: FeedOptions,
}

impl fmt::Debug for FeedConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedConnector")
            .field("config", &self.config)
            .field("attachments_set", &self.attachments.is_some())
            .field("ingestion_set", &self.ingestion.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl FeedConnector {
    /// Connector with no collaborators and the [`StructuralSniffer`].
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            attachments: None,
            ingestion: None,
            sniffer: Arc::new(StructuralSniffer),
            options: FeedOptions::default(),
        }
    }

    pub fn with_attachment_service(mut self, service: Arc<dyn AttachmentService>) -> Self {
        self.attachments = Some(service);
        self
    }

    /// Provide the ingestion pipeline; without it, forwarding fails with
    /// [`FeedError::CapabilityUnavailable`].
    pub fn with_ingestion_trigger(mut self, trigger: Arc<dyn IngestionTrigger>) -> Self {
        self.ingestion = Some(trigger);
        self
    }

    pub fn with_sniffer(mut self, sniffer: Arc<dyn HeaderSniffer>) -> Self {
        self.sniffer = sniffer;
        self
    }

    pub fn with_options(mut self, options: FeedOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Fetch and parse CSV from the configured server URL.
    ///
    /// Fails with [`FeedError::Configuration`] (before any network call) unless the input mode
    /// is [`InputMode::ServerUrl`].
    pub fn get_feeds_from_url(&self, params: RequestParams) -> FeedResult<Vec<Record>> {
        let result = self.run_url(params);
        self.report(FeedOperation::FromUrl, &result, |records| FeedStats {
            records: records.len(),
            forwarded: false,
        });
        result
    }

    /// Fetch and parse CSV from an attachment or file IRI.
    ///
    /// With `process_response_as = "Return as JSON"` the records are returned. Otherwise they
    /// are forwarded to the ingestion pipeline in one call (batch size
    /// [`INGEST_BATCH_SIZE`]) and an acknowledgement message is returned.
    pub fn get_feeds_from_attachment(
        &self,
        params: RequestParams,
        env: &Environment,
    ) -> FeedResult<FeedResponse> {
        let mut forwarded_count = 0;
        let result = self.run_attachment(params, env, &mut forwarded_count);
        self.report(FeedOperation::FromAttachment, &result, |response| match response {
            FeedResponse::Records(records) => FeedStats {
                records: records.len(),
                forwarded: false,
            },
            FeedResponse::Message { .. } => FeedStats {
                records: forwarded_count,
                forwarded: true,
            },
        });
        result
    }

    /// Server URL mode: one GET against the base URL. Other modes are always healthy.
    pub fn check_health(&self) -> FeedResult<bool> {
        let result = match self.config.input_mode {
            InputMode::ServerUrl => RequestClient::new(&self.config).and_then(|c| c.check_health()),
            InputMode::AttachmentIri | InputMode::FileIri => Ok(true),
        };
        self.report(FeedOperation::HealthCheck, &result, |_| FeedStats {
            records: 0,
            forwarded: false,
        });
        result
    }

    /// Dispatch an operation by its platform name.
    pub fn execute(
        &self,
        operation: &str,
        params: RequestParams,
        env: &Environment,
    ) -> FeedResult<FeedResponse> {
        match operation {
            "get_feeds_from_url" => self.get_feeds_from_url(params).map(FeedResponse::Records),
            "get_feeds_from_attachment" => self.get_feeds_from_attachment(params, env),
            other => Err(FeedError::Configuration(format!("unknown operation: {other}"))),
        }
    }

    fn run_url(&self, params: RequestParams) -> FeedResult<Vec<Record>> {
        if self.config.input_mode != InputMode::ServerUrl {
            return Err(FeedError::Configuration(URL_MODE_MISMATCH.to_string()));
        }
        let params = build_payload(params, self.options.value_aliases.as_ref());
        server::fetch_and_parse(&self.config, &params)
    }

    fn run_attachment(
        &self,
        params: RequestParams,
        env: &Environment,
        forwarded_count: &mut usize,
    ) -> FeedResult<FeedResponse> {
        if self.config.input_mode == InputMode::ServerUrl {
            return Err(FeedError::Configuration(FILE_MODE_MISMATCH.to_string()));
        }
        let params = build_payload(params, self.options.value_aliases.as_ref());
        let request = FeedRequest::from_params(&params)?;

        let service = self.attachments.as_deref().ok_or_else(|| {
            FeedError::CapabilityUnavailable("attachment service not configured".to_string())
        })?;
        let records = attachment::fetch_and_parse(&self.config, &params, service, self.sniffer.as_ref())?;

        match request.response_mode {
            ResponseMode::ReturnAsJson => Ok(FeedResponse::Records(records)),
            ResponseMode::CreateFeedRecords => {
                let trigger = self.ingestion.as_deref().ok_or_else(|| {
                    FeedError::CapabilityUnavailable("ingestion trigger not available".to_string())
                })?;
                tracing::info!(
                    records = records.len(),
                    playbook = request.playbook_id.as_deref().unwrap_or_default(),
                    "forwarding records to ingestion"
                );
                trigger.trigger(&records, request.playbook_id.as_deref(), INGEST_BATCH_SIZE, env)?;
                *forwarded_count = records.len();
                Ok(FeedResponse::Message {
                    message: FORWARDED_MESSAGE.to_string(),
                })
            }
        }
    }

    fn report<T>(&self, operation: FeedOperation, result: &FeedResult<T>, stats: impl FnOnce(&T) -> FeedStats) {
        let ctx = FeedContext {
            operation,
            input_mode: self.config.input_mode,
        };
        if let Err(e) = result {
            tracing::error!(operation = operation.name(), error = %e, "feed operation failed");
        }

        let Some(obs) = self.options.observer.as_ref() else {
            return;
        };
        match result {
            Ok(value) => obs.on_success(&ctx, stats(value)),
            Err(e) => {
                let sev = FeedSeverity::for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= self.options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }
}
