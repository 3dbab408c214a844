use chrono::Utc;
use connector_core::form_state::{FormState, SubscriptionId};
use connector_core::kv::{self, KvRow};

use crate::body::{self, BodyFields};
use crate::headers;
use crate::model::{BodyType, FormValues, HttpMethod, InitInfo, RequestSettings};
use crate::query;
use crate::reactor::{self, CertificateStatusRow, FetchSettings, ReactorClient};
use crate::transport::Transport;
use crate::validate::{self, FieldErrors};

// ── Tabs / row lists ─────────────────────────────────────────────────

/// Which tab of the request panel is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    QueryParams,
    Headers,
    Body,
}

impl Tab {
    pub fn label(self) -> &'static str {
        match self {
            Tab::QueryParams => "Query Params",
            Tab::Headers => "Headers",
            Tab::Body => "Body",
        }
    }

    /// Tabs shown for `method`. Bodiless methods hide the body tab.
    pub fn visible(method: HttpMethod) -> Vec<Tab> {
        if method.has_body() {
            vec![Tab::QueryParams, Tab::Headers, Tab::Body]
        } else {
            vec![Tab::QueryParams, Tab::Headers]
        }
    }
}

/// The editable key/value lists of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowList {
    QueryParams,
    Headers,
    BodyJsonPairs,
}

impl RowList {
    fn rows(self, values: &FormValues) -> &Vec<KvRow> {
        match self {
            RowList::QueryParams => &values.query_params,
            RowList::Headers => &values.headers,
            RowList::BodyJsonPairs => &values.body_json_pairs,
        }
    }

    fn rows_mut(self, values: &mut FormValues) -> &mut Vec<KvRow> {
        match self {
            RowList::QueryParams => &mut values.query_params,
            RowList::Headers => &mut values.headers,
            RowList::BodyJsonPairs => &mut values.body_json_pairs,
        }
    }
}

/// Re-encode the URL after a query param edit.
fn sync_url(values: &mut FormValues) {
    values.url = query::encode(&values.url, &values.query_params);
}

// ── Request panel state ──────────────────────────────────────────────

/// The send-data action view: form values plus UI state that is not
/// persisted (selected tab, last validation result, certificate table).
pub struct RequestPanel {
    form: FormState<FormValues>,
    pub selected_tab: Tab,
    pub errors: FieldErrors,
    pub initialized: bool,
    /// Endpoint and environment used for platform API calls.
    base_fetch_settings: FetchSettings,
    fetch_settings: FetchSettings,
    pub certificates: Option<Vec<CertificateStatusRow>>,
}

impl Default for RequestPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestPanel {
    pub fn new() -> Self {
        Self::with_fetch_settings(FetchSettings::default())
    }

    pub fn with_fetch_settings(base: FetchSettings) -> Self {
        Self {
            form: FormState::new(FormValues::default()),
            selected_tab: Tab::QueryParams,
            errors: FieldErrors::new(),
            initialized: false,
            fetch_settings: base.clone(),
            base_fetch_settings: base,
            certificates: None,
        }
    }

    // ── Host contract ────────────────────────────────────────────────

    /// Expand persisted settings into editable values.
    pub fn init(&mut self, info: InitInfo) {
        self.initialized = false;
        self.fetch_settings = FetchSettings::from_init_info(&info, &self.base_fetch_settings);
        self.form.reset(form_values(info.settings.unwrap_or_default()));
        self.selected_tab = Tab::QueryParams;
        self.errors.clear();
        self.certificates = None;
        self.initialized = true;
    }

    /// Collapse the current values into persisted settings.
    pub fn get_settings(&self) -> RequestSettings {
        settings_from_values(self.form.get())
    }

    /// Re-evaluate all fields. An empty map means the panel can be saved.
    pub fn validate(&mut self) -> FieldErrors {
        self.errors = validate::validate(self.form.get());
        self.errors.clone()
    }

    pub fn values(&self) -> &FormValues {
        self.form.get()
    }

    pub fn is_dirty(&self) -> bool {
        self.form.is_dirty()
    }

    pub fn subscribe(&mut self, f: impl FnMut(&FormValues) + 'static) -> SubscriptionId {
        self.form.subscribe(f)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.form.unsubscribe(id);
    }

    // ── Request section ──────────────────────────────────────────────

    pub fn set_method(&mut self, method: HttpMethod) {
        self.form.set(|v| v.method = method);
        if !Tab::visible(method).contains(&self.selected_tab) {
            self.selected_tab = Tab::QueryParams;
        }
    }

    /// Set the URL and re-parse its query params.
    pub fn set_url(&mut self, url: &str) {
        self.form.set(|v| {
            v.url = url.to_string();
            v.query_params = query::decode(url);
        });
    }

    pub fn select_tab(&mut self, tab: Tab) {
        if Tab::visible(self.form.get().method).contains(&tab) {
            self.selected_tab = tab;
        }
    }

    // ── Key-value lists ──────────────────────────────────────────────

    pub fn rows(&self, list: RowList) -> &[KvRow] {
        list.rows(self.form.get())
    }

    /// Whether the delete control is shown for rows of `list`.
    pub fn can_remove_row(&self, list: RowList) -> bool {
        kv::can_remove_row(self.rows(list))
    }

    pub fn kv_add_row(&mut self, list: RowList) -> usize {
        self.form.set(|v| kv::add_row(list.rows_mut(v)))
    }

    /// Remove a row. The only remaining row of a list cannot be removed.
    pub fn kv_remove_row(&mut self, list: RowList, index: usize) -> bool {
        if !self.can_remove_row(list) || index >= self.rows(list).len() {
            return false;
        }
        self.form.set(|v| {
            kv::remove_row(list.rows_mut(v), index);
            if list == RowList::QueryParams {
                sync_url(v);
            }
        });
        true
    }

    pub fn kv_set_key(&mut self, list: RowList, index: usize, key: &str) -> bool {
        if index >= self.rows(list).len() {
            return false;
        }
        self.form.set(|v| {
            kv::set_key(list.rows_mut(v), index, key);
            if list == RowList::QueryParams {
                sync_url(v);
            }
        });
        true
    }

    pub fn kv_set_value(&mut self, list: RowList, index: usize, value: &str) -> bool {
        if index >= self.rows(list).len() {
            return false;
        }
        self.form.set(|v| {
            kv::set_value(list.rows_mut(v), index, value);
            if list == RowList::QueryParams {
                sync_url(v);
            }
        });
        true
    }

    // ── Body ─────────────────────────────────────────────────────────

    /// Switch the body editor, converting the content to the new form.
    pub fn set_body_type(&mut self, body_type: BodyType) {
        if self.form.get().body_type == body_type {
            return;
        }
        self.form.set(|v| {
            match body_type {
                BodyType::Object => v.body_json_pairs = body::raw_to_pairs(&v.body_raw),
                BodyType::Raw => v.body_raw = body::pairs_to_raw(&v.body_json_pairs),
            }
            v.body_type = body_type;
        });
    }

    pub fn set_body_raw(&mut self, raw: &str) {
        self.form.set(|v| v.body_raw = raw.to_string());
    }

    // ── Advanced ─────────────────────────────────────────────────────

    pub fn set_save_response(&mut self, save: bool) {
        self.form.set(|v| v.save_response = save);
    }

    pub fn set_response_key(&mut self, key: &str) {
        self.form.set(|v| v.response_key = key.to_string());
    }

    /// Where a saved response ends up for the following actions of a rule.
    pub fn response_path_hint(&self) -> String {
        let key = &self.form.get().response_key;
        format!(
            "arc.ruleStash.{}.responses.{}",
            crate::executor::STASH_NAMESPACE,
            if key.is_empty() { "{keyName}" } else { key }
        )
    }

    /// Load the certificate status table. Failures are logged and leave the
    /// table absent; the saved settings do not depend on it.
    pub async fn load_certificates(&mut self, transport: &dyn Transport) {
        let client = ReactorClient::new(&self.fetch_settings, transport);
        match client.load_certificates().await {
            Ok(document) => {
                self.certificates = Some(reactor::certificate_status_rows(
                    &document,
                    &self.fetch_settings,
                    Utc::now(),
                ));
            }
            Err(e) => {
                log::warn!("Could not load certificate status: {e}");
            }
        }
    }
}

/// Editable values for persisted settings.
pub fn form_values(settings: RequestSettings) -> FormValues {
    let BodyFields {
        body_type,
        body_raw,
        body_json_pairs,
    } = body::from_settings(settings.body.as_ref());
    let response_key = settings.response_key.unwrap_or_default();

    FormValues {
        method: settings.method,
        query_params: query::decode(&settings.url),
        url: settings.url,
        headers: headers::decode(settings.headers.as_deref()),
        body_type,
        body_raw,
        body_json_pairs,
        save_response: !response_key.is_empty(),
        response_key,
    }
}

/// Persisted settings for editable values.
pub fn settings_from_values(values: &FormValues) -> RequestSettings {
    let body = if values.method.has_body() {
        body::to_settings(&BodyFields {
            body_type: values.body_type,
            body_raw: values.body_raw.clone(),
            body_json_pairs: values.body_json_pairs.clone(),
        })
    } else {
        None
    };

    let response_key = if values.save_response && !values.response_key.is_empty() {
        Some(values.response_key.clone())
    } else {
        None
    };

    RequestSettings {
        method: values.method,
        url: values.url.clone(),
        headers: headers::encode(&values.headers),
        body,
        response_key,
    }
}
