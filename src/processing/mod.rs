use serde::{Deserialize, Serialize};

use crate::domain::assessment::RecommendedAssessment;
use crate::processing::recommender::Recommender;
use crate::{DEFAULT_TOP_K, MAX_TOP_K, MIN_TOP_K};

pub mod coverage;
pub mod crawler;
pub mod embedding;
pub mod index;
pub mod indexer;
pub mod lexical;
pub mod normalizer;
pub mod recommender;
pub mod strategy;
mod stop_words;

#[derive(Deserialize, Debug)]
pub enum ZMQMessage {
    Recommend(RecommendationRequest),
    Health,
}

#[derive(Deserialize, Debug)]
pub struct RecommendationRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<i64>,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(untagged)]
pub enum ZMQReply {
    Recommendations {
        recommended_assessments: Vec<RecommendedAssessment>,
    },
    Health {
        status: String,
        message: String,
    },
    Error {
        error: String,
    },
}

/// Clamps a requested result count into `[MIN_TOP_K, MAX_TOP_K]`.
pub fn clamp_top_k(top_k: Option<i64>) -> usize {
    let requested = top_k.unwrap_or(DEFAULT_TOP_K as i64);
    requested.clamp(MIN_TOP_K as i64, MAX_TOP_K as i64) as usize
}

/// Decodes one request, runs it against the shared recommender and builds
/// the reply. Never fails; problems are reported in the reply body.
pub fn handle_message(recommender: &Recommender, msg: &[u8]) -> ZMQReply {
    let parsed = match serde_json::from_slice::<ZMQMessage>(msg) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::error!("Failed to parse JSON: {e}");
            return ZMQReply::Error {
                error: format!("invalid request: {e}"),
            };
        }
    };

    match parsed {
        ZMQMessage::Health => ZMQReply::Health {
            status: "ok".to_string(),
            message: format!(
                "Recommender is running with {} catalog items",
                recommender.corpus().len()
            ),
        },
        ZMQMessage::Recommend(request) => {
            let top_k = clamp_top_k(request.top_k);
            log::info!("Received recommend request: top_k={top_k}");
            match recommender.recommend(&request.query, top_k) {
                Ok(results) => ZMQReply::Recommendations {
                    recommended_assessments: results.iter().map(RecommendedAssessment::from).collect(),
                },
                Err(e) => {
                    log::error!("Recommendation failed: {e}");
                    ZMQReply::Error {
                        error: e.to_string(),
                    }
                }
            }
        }
    }
}
