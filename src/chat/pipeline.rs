use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::catalog_client::{format_track_info, CatalogClient, NOT_FOUND_MESSAGE};
use crate::dialogue::DialogueGenerator;
use crate::error::ServiceError;
use crate::intent::IntentClassifier;
use crate::server::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    CatalogSearch,
    Dialogue,
}

impl ReplyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyKind::CatalogSearch => "catalog_search",
            ReplyKind::Dialogue => "dialogue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub kind: ReplyKind,
}

/// Routes each message either to the catalog or to the dialogue model.
pub struct ChatPipeline {
    classifier: Arc<dyn IntentClassifier>,
    catalog: Arc<dyn CatalogClient>,
    generator: Arc<dyn DialogueGenerator>,
}

impl ChatPipeline {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        catalog: Arc<dyn CatalogClient>,
        generator: Arc<dyn DialogueGenerator>,
    ) -> Self {
        Self {
            classifier,
            catalog,
            generator,
        }
    }

    pub fn classifier(&self) -> &dyn IntentClassifier {
        self.classifier.as_ref()
    }

    pub async fn respond(&self, text: &str) -> Result<ChatReply, ServiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::Validation("message is required".to_string()));
        }

        let kind = if self.classifier.is_catalog_search(text) {
            ReplyKind::CatalogSearch
        } else {
            ReplyKind::Dialogue
        };
        metrics::record_intent(kind.as_str());
        debug!(kind = kind.as_str(), "Classified chat message");

        let reply = match kind {
            ReplyKind::CatalogSearch => {
                let phrase = self.classifier.extract_search_phrase(text);
                let query = if phrase.is_empty() { text } else { phrase.as_str() };
                match self.catalog.search_track(query).await? {
                    Some(track) => format_track_info(&track),
                    None => NOT_FOUND_MESSAGE.to_string(),
                }
            }
            ReplyKind::Dialogue => self.generator.generate(text).await?,
        };

        Ok(ChatReply { reply, kind })
    }
}
