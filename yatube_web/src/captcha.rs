//! Human check in front of comment submission.
//!
//! Only the seam lives here: a verifier that can hand out a challenge for
//! the form and later check the submitted answer.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use rand::{
    distr::{Alphanumeric, SampleString},
    Rng,
};
use tracing::debug;

const CHALLENGE_TTL: Duration = Duration::from_secs(5 * 60);
const CHALLENGE_KEY_LEN: usize = 32;

/// A question rendered into the comment form. `answer` never leaves the
/// server.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub key: String,
    pub question: String,
    pub answer: String,
}

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// `None` means the form needs no captcha field.
    async fn issue(&self) -> Option<Challenge>;

    async fn verify(&self, key: &str, answer: &str) -> bool;
}

/// Accepts everything.
pub struct DisabledCaptcha;

#[async_trait]
impl CaptchaVerifier for DisabledCaptcha {
    async fn issue(&self) -> Option<Challenge> {
        None
    }

    async fn verify(&self, _key: &str, _answer: &str) -> bool {
        true
    }
}

/// Small arithmetic questions, each answerable once within five minutes.
pub struct ChallengeCaptcha {
    pending: Cache<String, String>,
}

impl ChallengeCaptcha {
    pub fn new() -> Self {
        Self {
            pending: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(CHALLENGE_TTL)
                .build(),
        }
    }
}

impl Default for ChallengeCaptcha {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptchaVerifier for ChallengeCaptcha {
    async fn issue(&self) -> Option<Challenge> {
        let (key, left, right) = {
            let mut rng = rand::rng();
            (
                Alphanumeric.sample_string(&mut rng, CHALLENGE_KEY_LEN),
                rng.random_range(1..10),
                rng.random_range(1..10),
            )
        };

        let challenge = Challenge {
            key,
            question: format!("{left} + {right} = ?"),
            answer: (left + right).to_string(),
        };
        self.pending
            .insert(challenge.key.clone(), challenge.answer.clone())
            .await;

        Some(challenge)
    }

    async fn verify(&self, key: &str, answer: &str) -> bool {
        // single use: the key is consumed whatever the answer
        match self.pending.remove(key).await {
            Some(expected) => expected == answer.trim(),
            None => {
                debug!("unknown or expired captcha key");
                false
            }
        }
    }
}
