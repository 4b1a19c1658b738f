use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{debug, warn};

use post_forge::config::GeneratorConfig;
use post_forge::generator::{
    parse_payload, ContentGenerator, GenerationError, GenerationRequest, PostPayload,
};

#[derive(Clone)]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    models: Vec<String>,
    temperature: f64,
}

impl OpenAiGenerator {
    pub fn from_env(config: &GeneratorConfig) -> Option<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .ok()?;
        Some(Self {
            client,
            api_key,
            api_base: config.api_base.clone(),
            models: config.model_sequence(),
            temperature: config.temperature,
        })
    }

    async fn complete(
        &self,
        model: &str,
        request: &GenerationRequest<'_>,
    ) -> Result<PostPayload, GenerationError> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let body = ChatRequest {
            model: model.to_string(),
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt(request),
                },
            ],
        };

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|err| GenerationError::Request(format!("request failed: {}", err)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let detail = error_body.trim();
            if detail.is_empty() {
                return Err(GenerationError::Request(format!("API error: {}", status)));
            }
            return Err(GenerationError::Request(format!(
                "API error: {} {}",
                status, detail
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|err| GenerationError::Malformed(format!("response parse failed: {}", err)))?;

        let content = body
            .choices
            .first()
            .ok_or_else(|| GenerationError::Malformed("response missing choices".to_string()))?
            .message
            .content
            .trim()
            .to_string();

        parse_payload(&content)
    }
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<PostPayload, GenerationError> {
        let mut last_err = GenerationError::Unavailable("no models configured".to_string());
        for model in &self.models {
            match self.complete(model, request).await {
                Ok(payload) => {
                    debug!(model = %model, style = %request.style.id, "generation succeeded");
                    return Ok(payload);
                }
                Err(err) => {
                    warn!(model = %model, error = %err, "model attempt failed");
                    last_err = err;
                }
            }
        }
        Err(last_err)
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: String,
}

fn system_prompt() -> String {
    let prompt = "You are a professional social media manager for a career brand. \
Your sole goal is growth via useful, engaging, on-brand posts. \
Write non-cringe, specific, action-first copy. Avoid dialogue markers like 'You:' or 'Them:'.";
    prompt.to_string()
}

fn user_prompt(request: &GenerationRequest<'_>) -> String {
    let mut prompt = format!(
        r#"STYLE: {style}
STYLE_DESC: {description}
TOPIC_SEED: "{topic}"

Return STRICT JSON with keys:
- style: echo the chosen style id ("{style}")
- cta_type: one of ["question","pollish","challenge","tip"]
- x_line: a SINGLE, self-contained line (<= 230 chars), no links, no hashtags, no dialogue markers.
  Include 2-4 tasteful emojis woven into the text. Avoid "You:"/"Them:"/"Q:"/"A:" labels.
- desc_title: concise hook (<= 80 chars) with 1-2 emojis.
- desc_points: 3-5 bullets, each <= 80 chars, with concrete steps/templates.
- desc_cta: 1 question inviting replies (<= 110 chars).
- tags: 2 short tags (<= 16 chars each, lowercase, no '#').

Constraints:
- Be specific (numbers, templates, examples). No deictic language ("this thread", "see below").
- Keep x_line self-contained: no references to external docs or links.
Return ONLY JSON.
"#,
        style = request.style.id,
        description = request.style.description,
        topic = request.topic,
    );

    if let Some(hint) = request.hint {
        prompt.push('\n');
        prompt.push_str(hint);
        prompt.push('\n');
    }
    prompt
}
