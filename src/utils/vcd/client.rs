//! REST client for the Cloud Director API.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::{sleep, Duration};
use url::{form_urlencoded, Url};

use super::types::{
    upsert_extra_config, ErrorDocument, Org, OrgList, QueryResultRecords, Task, TaskState,
    TokenResponse, Vm,
};
use super::{ApiError, DirectorApi, EntityRef, PowerState, TaskRef};
use crate::utils::config::Config;
use crate::utils::extra_config::ExtraConfigEntry;
use crate::utils::output::{print_info, OutputLevel};

/// Media range and API version requested on every call
const ACCEPT_JSON: &str = "application/*+json;version=37.0";

/// Interval between task status checks (3 seconds)
const TASK_POLL_INTERVAL: Duration = Duration::from_secs(3);

const VIRTUAL_HARDWARE_SECTION_TYPE: &str =
    "application/vnd.vmware.vcloud.virtualHardwareSection+json";

/// Header carrying the bearer token after a password login
const ACCESS_TOKEN_HEADER: &str = "X-VMWARE-VCLOUD-ACCESS-TOKEN";

/// Authenticated session against one Cloud Director endpoint.
pub struct VcdClient {
    http: Client,
    base: Url,
    access_token: String,
    poll_interval: Duration,
}

impl VcdClient {
    /// Open a session using the credentials in `config`.
    ///
    /// With a user set the token is used as its password, otherwise it is
    /// exchanged as an API refresh token.
    pub async fn connect(config: &Config) -> Result<Self, ApiError> {
        let base = endpoint(&config.host)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        let http = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(config.insecure)
            .build()?;

        print_info(
            &format!("Connecting to {base} as org '{}'", config.org),
            OutputLevel::Verbose,
        );

        let access_token = match &config.user {
            Some(user) => {
                login_with_password(&http, &base, user, &config.org, &config.token).await?
            }
            None => exchange_api_token(&http, &base, &config.org, &config.token).await?,
        };

        Ok(Self {
            http,
            base,
            access_token,
            poll_interval: TASK_POLL_INTERVAL,
        })
    }

    /// Use `interval` between task status checks instead of the default.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn api_url(&self, path: &str) -> Result<Url, ApiError> {
        join(&self.base, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let response = check_status("GET", url, response).await?;
        Ok(response.json().await?)
    }

    async fn send_for_task(
        &self,
        method: &str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<Task, ApiError> {
        let response = request.bearer_auth(&self.access_token).send().await?;
        let response = check_status(method, url, response).await?;
        Ok(response.json().await?)
    }
}

impl DirectorApi for VcdClient {
    async fn find_org(&self, name: &str) -> Result<EntityRef, ApiError> {
        let url = self.api_url("api/org")?;
        let orgs: OrgList = self.get_json(url.as_str()).await?;

        orgs.org
            .into_iter()
            .find(|org| org.name == name)
            .map(|org| EntityRef::new(org.name, org.href))
            .ok_or_else(|| ApiError::NotFound {
                kind: "org",
                name: name.to_string(),
            })
    }

    async fn find_vdc(&self, org: &EntityRef, name: &str) -> Result<EntityRef, ApiError> {
        let document: Org = self.get_json(&org.href).await?;

        document
            .vdc_link(name)
            .map(|link| EntityRef::new(name, link.href.clone()))
            .ok_or_else(|| ApiError::NotFound {
                kind: "vdc",
                name: name.to_string(),
            })
    }

    async fn find_vm(&self, vdc: &EntityRef, name: &str) -> Result<EntityRef, ApiError> {
        let mut url = self.api_url("api/query")?;
        url.query_pairs_mut()
            .append_pair("type", "vm")
            .append_pair("format", "records")
            .append_pair(
                "filter",
                &format!("name=={name};vdc=={};isVAppTemplate==false", vdc.href),
            );

        let records: QueryResultRecords = self.get_json(url.as_str()).await?;
        let mut found: Vec<_> = records
            .record
            .into_iter()
            .filter(|record| record.name == name)
            .collect();

        match found.len() {
            0 => Err(ApiError::NotFound {
                kind: "vm",
                name: name.to_string(),
            }),
            1 => {
                let record = found.remove(0);
                Ok(EntityRef::new(record.name, record.href))
            }
            count => Err(ApiError::Ambiguous {
                kind: "vm",
                name: name.to_string(),
                count,
            }),
        }
    }

    async fn set_extra_config(
        &self,
        vm: &EntityRef,
        entry: &ExtraConfigEntry,
    ) -> Result<(), ApiError> {
        let url = format!("{}/virtualHardwareSection/", vm.href.trim_end_matches('/'));

        let mut section: Value = self.get_json(&url).await?;
        upsert_extra_config(&mut section, entry)?;

        let request = self
            .http
            .put(&url)
            .header(CONTENT_TYPE, VIRTUAL_HARDWARE_SECTION_TYPE)
            .body(serde_json::to_string(&section)?);
        let task = self.send_for_task("PUT", &url, request).await?;

        self.wait_task(&TaskRef {
            href: task.href,
            operation: task.operation,
        })
        .await
    }

    async fn power_state(&self, vm: &EntityRef) -> Result<PowerState, ApiError> {
        let document: Vm = self.get_json(&vm.href).await?;
        document.power_state()
    }

    async fn power_on(&self, vm: &EntityRef) -> Result<TaskRef, ApiError> {
        let url = format!("{}/power/action/powerOn", vm.href.trim_end_matches('/'));
        let request = self.http.post(&url);
        let task = self.send_for_task("POST", &url, request).await?;

        Ok(TaskRef {
            href: task.href,
            operation: task.operation,
        })
    }

    async fn wait_task(&self, task: &TaskRef) -> Result<(), ApiError> {
        let mut last_status = String::new();
        loop {
            let current: Task = self.get_json(&task.href).await?;
            if current.status != last_status {
                print_info(
                    &format!(
                        "Task '{}' is {}",
                        task.operation.as_deref().unwrap_or(&task.href),
                        current.status
                    ),
                    OutputLevel::Verbose,
                );
                last_status = current.status.clone();
            }

            match current.state() {
                TaskState::Succeeded => return Ok(()),
                TaskState::Failed(message) => {
                    return Err(ApiError::TaskFailed {
                        href: current.href,
                        status: current.status,
                        message,
                    })
                }
                TaskState::Pending => sleep(self.poll_interval).await,
            }
        }
    }
}

/// Base URL for `host`; bare host names get `https://`.
pub fn endpoint(host: &str) -> Result<Url, ApiError> {
    let trimmed = host.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix("/api").unwrap_or(trimmed);
    let with_scheme = if trimmed.contains("://") {
        format!("{trimmed}/")
    } else {
        format!("https://{trimmed}/")
    };

    Url::parse(&with_scheme).map_err(|e| ApiError::Endpoint(host.to_string(), e))
}

fn join(base: &Url, path: &str) -> Result<Url, ApiError> {
    base.join(path)
        .map_err(|e| ApiError::Endpoint(format!("{base}{path}"), e))
}

/// Path of the OAuth token endpoint; the `System` org uses the provider one.
fn token_path(org: &str) -> String {
    if org.eq_ignore_ascii_case("system") {
        "oauth/provider/token".to_string()
    } else {
        format!("oauth/tenant/{org}/token")
    }
}

async fn exchange_api_token(
    http: &Client,
    base: &Url,
    org: &str,
    token: &str,
) -> Result<String, ApiError> {
    let url = join(base, &token_path(org))?;
    let body = form_urlencoded::Serializer::new(String::new())
        .append_pair("grant_type", "refresh_token")
        .append_pair("refresh_token", token)
        .finish();

    let response = http
        .post(url.as_str())
        .header(ACCEPT, "application/json")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body)
        .send()
        .await?;
    let response = check_status("POST", url.as_str(), response).await?;
    let token: TokenResponse = response.json().await?;

    Ok(token.access_token)
}

async fn login_with_password(
    http: &Client,
    base: &Url,
    user: &str,
    org: &str,
    password: &str,
) -> Result<String, ApiError> {
    let url = join(base, "api/sessions")?;

    let response = http
        .post(url.as_str())
        .basic_auth(format!("{user}@{org}"), Some(password))
        .send()
        .await?;
    let response = check_status("POST", url.as_str(), response).await?;

    response
        .headers()
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Decode(format!("login response carried no {ACCESS_TOKEN_HEADER}")))
}

/// Turn a non-2xx response into `ApiError::Status` with the platform's message.
async fn check_status(method: &str, url: &str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("no details").to_string());

    Err(ApiError::Status {
        method: method.to_string(),
        url: url.to_string(),
        status: status.as_u16(),
        message,
    })
}

fn error_message(body: &str) -> Option<String> {
    if let Ok(document) = serde_json::from_str::<ErrorDocument>(body) {
        return Some(document.message);
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
