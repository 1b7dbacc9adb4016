//! HTTP bindings of the VIN lookup service.
//!
//! GET binding: `?vin=<vin>` plus the configured fixed parameters.
//! POST binding: `{"vin": "<vin>"}` JSON body.
//! Both send the configured headers; header values may come from the
//! environment (`lookup.env_headers`).

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use vinrec_config::{LookupBinding, LookupSettings};
use vinrec_recon::{LookupError, LookupResponse, VinLookup};

use crate::exit_codes::EXIT_LOOKUP_SETUP;
use crate::http::{HttpClient, HttpFailure};
use crate::CliError;

pub(crate) struct HttpLookup {
    client: HttpClient,
    binding: LookupBinding,
    url: Url,
    params: Vec<(String, String)>,
    headers: HeaderMap,
}

impl HttpLookup {
    pub(crate) fn from_settings(settings: &LookupSettings) -> Result<Self, CliError> {
        Self::with_env(settings, |name| std::env::var(name).ok())
    }

    /// Build with an explicit environment resolver for `env_headers`.
    pub(crate) fn with_env(
        settings: &LookupSettings,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CliError> {
        let endpoint = settings.endpoint().map_err(|e| {
            setup_error(e.to_string()).with_hint("set lookup.url in the config, or pass --no-lookup")
        })?;
        let url = Url::parse(endpoint)
            .map_err(|e| setup_error(format!("lookup.url '{endpoint}' is invalid: {e}")))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &settings.headers {
            insert_header(&mut headers, name, value)?;
        }
        for (name, var) in &settings.env_headers {
            let value = env(var).ok_or_else(|| {
                setup_error(format!("header '{name}' needs environment variable {var}, which is not set"))
            })?;
            insert_header(&mut headers, name, &value)?;
        }

        let client = HttpClient::new("lookup", settings.timeout_secs, settings.max_retries)
            .map_err(setup_error)?;

        log::info!("lookup: {} {}", settings.binding, url);
        Ok(Self {
            client,
            binding: settings.binding,
            url,
            params: settings.params.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            headers,
        })
    }
}

impl VinLookup for HttpLookup {
    fn lookup(&self, vin: &str) -> Result<LookupResponse, LookupError> {
        let resp = self
            .client
            .send_with_retry(|c| match self.binding {
                LookupBinding::Get => c
                    .get(self.url.clone())
                    .headers(self.headers.clone())
                    .query(&self.params)
                    .query(&[("vin", vin)]),
                LookupBinding::Post => c
                    .post(self.url.clone())
                    .headers(self.headers.clone())
                    .json(&serde_json::json!({ "vin": vin })),
            })
            .map_err(|failure| match failure {
                HttpFailure::Status(code) => LookupError::Status(code),
                HttpFailure::Transport(msg) => LookupError::Transport(msg),
            })?;

        let body = resp.text().map_err(|e| LookupError::Transport(e.to_string()))?;
        LookupResponse::from_json(&body)
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), CliError> {
    let header = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| setup_error(format!("invalid header name '{name}': {e}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| setup_error(format!("invalid value for header '{name}': {e}")))?;
    headers.insert(header, value);
    Ok(())
}

fn setup_error(message: impl Into<String>) -> CliError {
    CliError { code: EXIT_LOOKUP_SETUP, message: message.into(), hint: None }
}
