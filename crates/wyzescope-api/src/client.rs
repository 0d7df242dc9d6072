// Wyze cloud HTTP client
//
// Wraps `reqwest::Client` with the vendor's request envelope: per-
// endpoint sc/sv markers, app-emulation fields, and the `{code, msg,
// data}` response wrapper. All methods return unwrapped `data`
// payloads -- the envelope is stripped before the caller sees it.

use std::sync::RwLock;

use secrecy::ExposeSecret;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::auth::{Credentials, Session, hash_password};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Production auth service root.
pub const AUTH_API: &str = "https://auth-prod.api.wyze.com";
/// Production app API root.
pub const WYZE_API: &str = "https://api.wyzecam.com/app";

// These values emulate the vendor's iOS app; the cloud validates them.
const APP_VERSION: &str = "3.5.5.8";
const APP_NAME: &str = "com.hualai.WyzeCam";
pub(crate) const USER_AGENT: &str = "wyzescope/0.1.0";

/// Per-endpoint sc/sv request markers, copied from the app's traffic.
fn sc_sv(endpoint: &str) -> (&'static str, &'static str) {
    match endpoint {
        "get_device_Info" => (
            "01dd431d098546f9baf5233724fa2ee2",
            "0bc2c3bedf6c4be688754c9ad42bbf2e",
        ),
        "get_event_list" => (
            "9f275790cab94a72bd206c8876429f3c",
            "782ced6909a44d92a1f70d582bbe88be",
        ),
        _ => (
            "9f275790cab94a72bd206c8876429f3c",
            "e1fe392906d54888a9b99b88de4162d7",
        ),
    }
}

/// Async client for the Wyze cloud API.
///
/// Owns the session tokens: [`login`](Self::login) and the internal
/// refresh are the only writers. Authenticated calls transparently
/// refresh the session exactly once on a token-expiry response and
/// retry the original request once; a second expiry is surfaced as
/// [`Error::Authentication`].
pub struct WyzeClient {
    http: reqwest::Client,
    auth_base: Url,
    api_base: Url,
    credentials: Credentials,
    phone_id: String,
    session: RwLock<Option<Session>>,
}

impl WyzeClient {
    /// Create a client against the production endpoints.
    pub fn new(credentials: Credentials, transport: &TransportConfig) -> Result<Self, Error> {
        let auth_base = Url::parse(AUTH_API)?;
        let api_base = Url::parse(WYZE_API)?;
        Self::with_base_urls(credentials, auth_base, api_base, transport)
    }

    /// Create a client with explicit base URLs.
    ///
    /// Used by tests to point both API surfaces at a mock server.
    pub fn with_base_urls(
        credentials: Credentials,
        auth_base: Url,
        api_base: Url,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            auth_base,
            api_base,
            credentials,
            phone_id: uuid::Uuid::new_v4().to_string(),
            session: RwLock::new(None),
        })
    }

    /// The per-run phone identifier sent with every request.
    pub fn phone_id(&self) -> &str {
        &self.phone_id
    }

    /// A copy of the current session tokens, if logged in.
    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .expect("session lock poisoned")
            .clone()
    }

    // ── URL builders ─────────────────────────────────────────────────

    fn auth_url(&self, path: &str) -> Url {
        let base = self.auth_base.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{path}")).expect("invalid auth URL")
    }

    fn api_url(&self, path: &str) -> Url {
        let base = self.api_base.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{path}")).expect("invalid API URL")
    }

    // ── Login & refresh ──────────────────────────────────────────────

    /// Authenticate with email/password plus the api-key/key-id pair.
    ///
    /// Stores the returned tokens for subsequent calls. Accounts that
    /// answer without an `access_token` (multi-factor challenges) are
    /// rejected -- MFA is not supported.
    pub async fn login(&self) -> Result<Session, Error> {
        self.credentials
            .validate()
            .map_err(|message| Error::Authentication { message })?;

        let url = self.auth_url("api/user/login");
        debug!("logging in at {}", url);

        let body = json!({
            "email": self.credentials.email.trim(),
            "password": hash_password(self.credentials.password.expose_secret()),
        });

        let resp = self
            .http
            .post(url)
            .header("apikey", self.credentials.api_key.expose_secret())
            .header("keyid", self.credentials.key_id.trim())
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let data = Self::parse_envelope(resp).await?;

        let access_token = data
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Authentication {
                message: "login did not return an access_token \
                          (accounts with MFA enabled are not supported)"
                    .into(),
            })?
            .to_owned();

        let session = Session {
            access_token,
            refresh_token: data
                .get("refresh_token")
                .and_then(Value::as_str)
                .map(str::to_owned),
            user_id: data
                .get("user_id")
                .and_then(Value::as_str)
                .map(str::to_owned),
        };

        *self.session.write().expect("session lock poisoned") = Some(session.clone());
        debug!("login successful");
        Ok(session)
    }

    /// Exchange the stored refresh token for a new access token.
    async fn refresh_session(&self) -> Result<(), Error> {
        let refresh_token = self
            .session()
            .and_then(|s| s.refresh_token)
            .ok_or_else(|| Error::Authentication {
                message: "missing refresh_token; cannot refresh session".into(),
            })?;

        let mut payload = self.payload("default")?;
        payload.insert("refresh_token".into(), Value::String(refresh_token));

        let url = self.api_url("user/refresh_token");
        debug!("refreshing session at {}", url);

        let resp = self
            .http
            .post(url)
            .header("appversion", APP_VERSION)
            .header("env", "prod")
            .json(&payload)
            .send()
            .await
            .map_err(Error::Transport)?;

        let data = Self::parse_envelope(resp).await?;

        let mut guard = self.session.write().expect("session lock poisoned");
        if let Some(session) = guard.as_mut() {
            if let Some(token) = data.get("access_token").and_then(Value::as_str) {
                session.access_token = token.to_owned();
            }
            if let Some(token) = data.get("refresh_token").and_then(Value::as_str) {
                session.refresh_token = Some(token.to_owned());
            }
        }
        debug!("session refreshed");
        Ok(())
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the account's device listing, in service order.
    ///
    /// Duplicate macs are dropped (first occurrence wins) so the
    /// result is usable as a stable identity sequence.
    pub async fn get_object_list(&self) -> Result<Vec<crate::wire::DeviceSummary>, Error> {
        let data = self
            .authed_post("default", "v2/home_page/get_object_list", Map::new())
            .await?;

        // The service has historically used both keys.
        let devices = data
            .get("device_list")
            .or_else(|| data.get("device_info_list"))
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Api {
                code: "payload".into(),
                message: "device_list is missing or not a list".into(),
            })?;

        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::with_capacity(devices.len());
        for raw in devices {
            let Some(summary) = crate::wire::DeviceSummary::from_raw(raw) else {
                continue;
            };
            if !seen.insert(summary.mac.clone()) {
                warn!(mac = %summary.mac, "duplicate mac in device listing; keeping first");
                continue;
            }
            out.push(summary);
        }
        Ok(out)
    }

    /// Fetch extended device info, including the sparse property list.
    pub async fn get_device_info(
        &self,
        mac: &str,
        model: &str,
    ) -> Result<crate::wire::DeviceInfo, Error> {
        let mut extra = Map::new();
        extra.insert("device_mac".into(), Value::String(mac.to_owned()));
        extra.insert("device_model".into(), Value::String(model.to_owned()));

        let data = self
            .authed_post("get_device_Info", "v2/device/get_device_Info", extra)
            .await?;

        serde_json::from_value(data.clone()).map_err(|e| Error::Deserialization {
            message: format!("get_device_Info payload: {e}"),
            body: data.to_string(),
        })
    }

    /// Fetch up to `count` recent events for one device, newest first.
    pub async fn get_event_list(&self, mac: &str, count: u32) -> Result<Vec<Value>, Error> {
        if !(1..=20).contains(&count) {
            return Err(Error::Api {
                code: "params".into(),
                message: format!("count {count} must be between 1 and 20"),
            });
        }

        // The app asks with a padded end time; keep it for parity.
        let end_time = chrono::Utc::now().timestamp_millis() + 60_000;
        let begin_time = end_time - 86_400_000;

        let mut extra = Map::new();
        extra.insert(
            "device_mac_list".into(),
            Value::Array(vec![Value::String(mac.to_owned())]),
        );
        extra.insert("begin_time".into(), json!(begin_time));
        extra.insert("end_time".into(), json!(end_time));
        extra.insert("count".into(), json!(count));
        extra.insert("order_by".into(), json!(1));

        let data = self
            .authed_post("get_event_list", "v2/device/get_event_list", extra)
            .await?;

        let events = data
            .get("event_list")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(events.into_iter().filter(Value::is_object).collect())
    }

    // ── Request plumbing ─────────────────────────────────────────────

    /// The standard authenticated request payload for `endpoint`.
    fn payload(&self, endpoint: &str) -> Result<Map<String, Value>, Error> {
        let access_token = self
            .session()
            .map(|s| s.access_token)
            .ok_or_else(|| Error::Authentication {
                message: "not logged in (missing access_token)".into(),
            })?;

        let (sc, sv) = sc_sv(endpoint);
        let mut payload = Map::new();
        payload.insert("sc".into(), Value::String(sc.into()));
        payload.insert("sv".into(), Value::String(sv.into()));
        payload.insert(
            "app_ver".into(),
            Value::String(format!("{APP_NAME}___{APP_VERSION}")),
        );
        payload.insert("app_version".into(), Value::String(APP_VERSION.into()));
        payload.insert("app_name".into(), Value::String(APP_NAME.into()));
        payload.insert("phone_system_type".into(), json!(1));
        payload.insert("ts".into(), json!(chrono::Utc::now().timestamp_millis()));
        payload.insert("access_token".into(), Value::String(access_token));
        payload.insert("phone_id".into(), Value::String(self.phone_id.clone()));
        Ok(payload)
    }

    /// POST an authenticated envelope; refresh the session exactly once
    /// on token expiry and retry the original request once.
    async fn authed_post(
        &self,
        endpoint: &str,
        path: &str,
        extra: Map<String, Value>,
    ) -> Result<Value, Error> {
        let url = self.api_url(path);

        match self.post_envelope(&url, endpoint, &extra).await {
            Err(Error::AccessTokenExpired) => {
                debug!("access token expired; refreshing and retrying once");
                self.refresh_session().await?;
                match self.post_envelope(&url, endpoint, &extra).await {
                    Err(Error::AccessTokenExpired) => Err(Error::Authentication {
                        message: "access token rejected again after refresh".into(),
                    }),
                    other => other,
                }
            }
            other => other,
        }
    }

    /// Single POST with the standard payload plus `extra` fields.
    ///
    /// The payload is rebuilt per attempt so a refreshed token is
    /// picked up by the retry.
    async fn post_envelope(
        &self,
        url: &Url,
        endpoint: &str,
        extra: &Map<String, Value>,
    ) -> Result<Value, Error> {
        let mut payload = self.payload(endpoint)?;
        for (k, v) in extra {
            payload.insert(k.clone(), v.clone());
        }

        debug!("POST {}", url);
        let resp = self
            .http
            .post(url.clone())
            .header("appversion", APP_VERSION)
            .header("env", "prod")
            .json(&payload)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_envelope(resp).await
    }

    /// Parse the `{code, msg, data}` envelope, returning `data` on
    /// success. HTTP 429 maps to [`Error::RateLimited`]; vendor code
    /// 2001 maps to [`Error::AccessTokenExpired`].
    async fn parse_envelope(resp: reqwest::Response) -> Result<Value, Error> {
        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let remaining = resp
                .headers()
                .get("X-RateLimit-Remaining")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(Error::RateLimited {
                remaining,
                retry_after_secs,
            });
        }

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        let parsed: Value = serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..body.len().min(200)];
            Error::Deserialization {
                message: format!("{e} (HTTP {status}, body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;

        // `code` can be a string or a number depending on the endpoint;
        // a missing code means the auth service's bare-JSON shape.
        let code = parsed
            .get("code")
            .or_else(|| parsed.get("errorCode"))
            .map_or_else(|| "0".to_owned(), |v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });

        if code == "2001" {
            return Err(Error::AccessTokenExpired);
        }

        if code != "1" && code != "0" {
            let message = parsed
                .get("msg")
                .or_else(|| parsed.get("description"))
                .and_then(Value::as_str)
                .unwrap_or(&code)
                .to_owned();
            return Err(Error::Api { code, message });
        }

        // Success: prefer the `data` envelope when present.
        match parsed.get("data") {
            Some(data) if data.is_object() => Ok(data.clone()),
            _ => Ok(parsed),
        }
    }
}
