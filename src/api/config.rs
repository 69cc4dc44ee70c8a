use axum::extract::State;
use axum::Json;

use crate::models::LlmConfigUpdate;
use crate::search::Strategy;
use crate::state::AppState;

/// Config response with API key redacted
#[derive(serde::Serialize)]
pub struct ConfigResponse {
    pub default_strategy: Strategy,
    pub default_top_n: usize,
    pub default_score_threshold: Option<f32>,
    pub provider: String,
    pub base_url: String,
    pub embedding_model: String,
    pub has_api_key: bool,
    pub strategies: Vec<Strategy>,
}

/// GET /api/config - Current ranking defaults and embedding settings
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let strategies = state.ranker().registry().available();
    let config = state.llm_config.read();
    Json(ConfigResponse {
        default_strategy: state.config.rank.strategy,
        default_top_n: state.config.rank.top_n,
        default_score_threshold: state.config.rank.score_threshold,
        provider: config.provider.clone(),
        base_url: config.base_url.clone(),
        embedding_model: config.embedding_model.clone(),
        has_api_key: config.api_key.is_some(),
        strategies,
    })
}

/// PUT /api/config - Update embedding provider settings
pub async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<LlmConfigUpdate>,
) -> Json<ConfigResponse> {
    {
        let mut config = state.llm_config.write();

        if let Some(provider) = update.provider {
            config.provider = provider;
        }
        // base_url is immutable at runtime (set via EMBEDDING_BASE_URL only)
        // to prevent SSRF: an attacker changing it could exfiltrate the API key
        if let Some(embedding_model) = update.embedding_model {
            config.embedding_model = embedding_model;
        }
        if let Some(api_key) = update.api_key {
            config.api_key = Some(api_key);
        }
    }

    get_config(State(state)).await
}
