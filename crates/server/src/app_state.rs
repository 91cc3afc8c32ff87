use server_api::ApiContext;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) max_body_bytes: usize,
    pub(crate) allowed_origins: Vec<String>,
}
