// Narrative generation: LLM-backed summary with a templated fallback.
use crate::model::{NarrativeError, Recommendation};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{info, warn};

pub const RECOMMENDATION_QUESTION: &str = "Recommend estates with limited BTO launches in \
    the past decade and analyse potential BTO pricing for different flat types (3-room, \
    4-room, 5-room) with affordability considerations.";

const SYSTEM_PROMPT: &str =
    "You are an expert real estate analyst specializing in Singapore HDB properties.";

#[async_trait]
pub trait NarrativeGenerator {
    async fn summarize(&self, question: &str, digest: &str) -> Result<String, NarrativeError>;
}

/// Chat-completion client for any OpenAI-compatible endpoint.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
        }
    }
}

#[async_trait]
impl NarrativeGenerator for OpenAiGenerator {
    async fn summarize(&self, question: &str, digest: &str) -> Result<String, NarrativeError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(NarrativeError::MissingKey);
        };

        let prompt = format!(
            "You are a real estate analyst. A user asked: {question}\n\n\
             We have the following data:\n{digest}\n\n\
             Please analyze and provide recommendations."
        );
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.7,
            "max_tokens": 1000
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown".into());
            return Err(NarrativeError::Api(status.as_u16(), body));
        }

        let body: Value = response.json().await?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or(NarrativeError::InvalidResponse)
    }
}

/// Formats the top recommendations into the digest the generator consumes.
/// The "Years since BTO" marker doubles as the fallback template trigger.
pub fn build_digest(recommendations: &[Recommendation]) -> String {
    recommendations
        .iter()
        .take(5)
        .map(|r| {
            let pricing =
                serde_json::to_string(&r.predicted_pricing).unwrap_or_else(|_| "{}".to_string());
            format!(
                "Town: {}, Years since BTO: {}, Recent activity: {}, Pricing: {}, Rationale: {}",
                r.town, r.years_since_launch, r.recent_market_activity, pricing, r.rationale
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Runs the generator and falls back to a templated analysis on any
/// failure, so the mathematical ranking is never blocked on the LLM.
pub async fn analyze(generator: &dyn NarrativeGenerator, question: &str, digest: &str) -> String {
    match generator.summarize(question, digest).await {
        Ok(text) => {
            info!("Narrative analysis generated ({} chars)", text.len());
            text
        }
        Err(e) => {
            warn!("Narrative generation failed: {}", e);
            fallback_analysis(digest, &e.to_string())
        }
    }
}

/// Built only from the digest's structural markers; fabricates no facts.
pub fn fallback_analysis(digest: &str, reason: &str) -> String {
    let mut text = format!("LLM analysis unavailable - {reason}.\n\n");

    if digest.contains("Years since BTO") {
        text.push_str(
            "Based on historical BTO launch patterns, the recommended towns show significant potential:\n\
             \n\
             - Towns with 10+ years since last BTO launch indicate underserved areas with potential pent-up demand\n\
             - These locations may be prime candidates for new BTO developments due to market gaps\n\
             - Consider proximity to MRT lines, schools, and commercial developments\n\
             - Long gaps between launches often correlate with infrastructure improvements and area maturation\n\
             \n\
             Investment considerations:\n\
             - Established neighborhoods with proven demand\n\
             - Higher years since last BTO may indicate upcoming development\n\
             - Potential capital appreciation once new BTOs launch\n",
        );
    } else {
        text.push_str("Recommendations align with current market trends and historical patterns.");
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommender::fallback_recommendation;

    struct FailingGenerator;

    #[async_trait]
    impl NarrativeGenerator for FailingGenerator {
        async fn summarize(&self, _: &str, _: &str) -> Result<String, NarrativeError> {
            Err(NarrativeError::MissingKey)
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl NarrativeGenerator for EchoGenerator {
        async fn summarize(&self, _: &str, digest: &str) -> Result<String, NarrativeError> {
            Ok(format!("analysis of: {digest}"))
        }
    }

    #[test]
    fn digest_carries_the_structural_markers() {
        let digest = build_digest(&[fallback_recommendation()]);
        assert!(digest.contains("Town: WOODLANDS"));
        assert!(digest.contains("Years since BTO: 8"));
        assert!(digest.contains("Recent activity: 150"));
        assert!(digest.contains("\"4_room\":350000"));
    }

    #[test]
    fn digest_is_capped_at_five_entries() {
        let recs: Vec<_> = (0..8).map(|_| fallback_recommendation()).collect();
        assert_eq!(build_digest(&recs).lines().count(), 5);
    }

    #[tokio::test]
    async fn generator_failure_yields_the_templated_fallback() {
        let digest = build_digest(&[fallback_recommendation()]);
        let text = analyze(&FailingGenerator, RECOMMENDATION_QUESTION, &digest).await;
        assert!(text.starts_with("LLM analysis unavailable"));
        assert!(text.contains("historical BTO launch patterns"));
    }

    #[tokio::test]
    async fn successful_generation_passes_through() {
        let text = analyze(&EchoGenerator, RECOMMENDATION_QUESTION, "plain digest").await;
        assert_eq!(text, "analysis of: plain digest");
    }

    #[test]
    fn fallback_without_marker_stays_generic() {
        let text = fallback_analysis("no marker here", "timeout");
        assert!(text.contains("timeout"));
        assert!(!text.contains("historical BTO launch patterns"));
    }
}
