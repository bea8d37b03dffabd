//! The editable request as one immutable snapshot plus its reducer
//!
//! Every user edit is a [`DraftEdit`]; applying it consumes the old snapshot
//! and returns a new one. URL edits run through param sync here, so the URL
//! and the params table can only change together.

use crate::models::{Backend, BodyType, FormField, Header, HttpMethod, QueryParam};
use crate::params::{derive_params_from_url, derive_url_from_params};

/// Which tab of the request pane is showing. `Params` shows query params for
/// GET and the body editor for POST.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RequestTab {
    #[default]
    Headers,
    Params,
}

impl RequestTab {
    pub fn toggle(&self) -> RequestTab {
        match self {
            RequestTab::Headers => RequestTab::Params,
            RequestTab::Params => RequestTab::Headers,
        }
    }
}

/// What the request pane edits for the current method, body type and tab
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestEditor {
    Headers,
    Params,
    JsonBody,
    FormFields,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RequestDraft {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<Header>,
    pub params: Vec<QueryParam>,
    pub body_type: BodyType,
    pub json_body: String,
    pub form_fields: Vec<FormField>,
    pub backend: Backend,
    pub request_tab: RequestTab,
}

impl Default for RequestDraft {
    fn default() -> Self {
        RequestDraft {
            method: HttpMethod::GET,
            url: String::new(),
            headers: vec![Header::default()],
            params: vec![QueryParam::default()],
            body_type: BodyType::Json,
            json_body: String::new(),
            form_fields: vec![FormField::default()],
            backend: Backend::Native,
            request_tab: RequestTab::Headers,
        }
    }
}

/// One user edit. List edits always carry the whole replacement list.
#[derive(Clone, Debug, PartialEq)]
pub enum DraftEdit {
    SetMethod(HttpMethod),
    SetUrl(String),
    SetHeaders(Vec<Header>),
    SetParams(Vec<QueryParam>),
    SetBodyType(BodyType),
    SetJsonBody(String),
    SetFormFields(Vec<FormField>),
    SetBackend(Backend),
    SetRequestTab(RequestTab),
}

impl RequestDraft {
    pub fn new(url: impl Into<String>, backend: Backend) -> Self {
        RequestDraft {
            backend,
            ..RequestDraft::default()
        }
        .apply(DraftEdit::SetUrl(url.into()))
    }

    /// Produce the next snapshot
    pub fn apply(self, edit: DraftEdit) -> RequestDraft {
        match edit {
            DraftEdit::SetMethod(method) => RequestDraft { method, ..self },
            DraftEdit::SetUrl(url) => match derive_params_from_url(&url) {
                Some(extraction) => RequestDraft {
                    url: extraction.base_url,
                    params: extraction.params,
                    request_tab: RequestTab::Params,
                    ..self
                },
                None => RequestDraft { url, ..self },
            },
            DraftEdit::SetHeaders(headers) => RequestDraft { headers, ..self },
            DraftEdit::SetParams(params) => RequestDraft { params, ..self },
            DraftEdit::SetBodyType(body_type) => RequestDraft { body_type, ..self },
            DraftEdit::SetJsonBody(json_body) => RequestDraft { json_body, ..self },
            DraftEdit::SetFormFields(form_fields) => RequestDraft { form_fields, ..self },
            DraftEdit::SetBackend(backend) => RequestDraft { backend, ..self },
            DraftEdit::SetRequestTab(request_tab) => RequestDraft { request_tab, ..self },
        }
    }

    /// Apply several edits in order
    pub fn apply_all(self, edits: impl IntoIterator<Item = DraftEdit>) -> RequestDraft {
        edits.into_iter().fold(self, RequestDraft::apply)
    }

    pub fn editor(&self) -> RequestEditor {
        match (self.request_tab, self.method, self.body_type) {
            (RequestTab::Headers, _, _) => RequestEditor::Headers,
            (RequestTab::Params, HttpMethod::GET, _) => RequestEditor::Params,
            (RequestTab::Params, HttpMethod::POST, BodyType::Json) => RequestEditor::JsonBody,
            (RequestTab::Params, HttpMethod::POST, BodyType::FormData) => RequestEditor::FormFields,
        }
    }

    /// URL as it would look with the params table folded back in
    pub fn preview_url(&self) -> Option<String> {
        derive_url_from_params(&self.url, &self.params)
    }
}
