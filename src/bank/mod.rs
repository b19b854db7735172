//! Flashcard bank: topics mapped to ordered question lists.
//!
//! Every operation is one load-mutate-persist cycle held under a single
//! process-wide lock. Questions are addressed by topic and index; deleting a
//! question shifts later indices down, so callers holding an older index must
//! re-fetch. Writers in other processes are not coordinated (last writer wins).

pub mod document;
pub mod models;

use rand::{seq::SliceRandom, Rng};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub use self::document::Document;
pub use self::models::{Question, Topic};

use crate::error::{Error, Result};

#[derive(Debug)]
pub struct FlashcardBank {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FlashcardBank {
    /// Bank backed by the JSON document at `path`. A missing file reads as an
    /// empty bank until the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the built-in topics if no bank file exists yet. Returns whether
    /// it seeded.
    ///
    /// # Errors
    /// Returns `Storage` on I/O failure.
    pub async fn seed_defaults_if_missing(&self) -> Result<bool> {
        let _guard = self.lock.lock().await;
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(false);
        }
        let document = Document {
            topics: models::default_topics(),
        };
        document.save(&self.path).await?;
        info!(path = %self.path.display(), "seeded flashcard bank with default topics");
        Ok(true)
    }

    async fn read(&self) -> Result<Document> {
        let _guard = self.lock.lock().await;
        Document::load(&self.path).await
    }

    /// Run `mutate` on the freshly loaded document and persist the result.
    /// Nothing is written when `mutate` fails.
    async fn transact<T>(&self, mutate: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        let _guard = self.lock.lock().await;
        let mut document = Document::load(&self.path).await?;
        let value = mutate(&mut document)?;
        document.save(&self.path).await?;
        Ok(value)
    }

    /// Topic names in stored order.
    ///
    /// # Errors
    /// Returns `Storage` if the bank cannot be read.
    pub async fn list_topics(&self) -> Result<Vec<String>> {
        Ok(self.read().await?.topics.into_iter().map(|t| t.name).collect())
    }

    /// Every topic with its questions, in stored order.
    ///
    /// # Errors
    /// Returns `Storage` if the bank cannot be read.
    pub async fn topics(&self) -> Result<Vec<Topic>> {
        Ok(self.read().await?.topics)
    }

    /// # Errors
    /// `NotFound` if the topic is absent or `index` is out of bounds.
    pub async fn get_question(&self, topic: &str, index: usize) -> Result<Question> {
        let document = self.read().await?;
        document
            .topic(topic)
            .and_then(|t| t.questions.get(index))
            .cloned()
            .ok_or_else(|| invalid_index(topic, index))
    }

    /// Append a question, creating the topic if needed.
    ///
    /// # Errors
    /// `Validation` if any field is blank.
    pub async fn add_question(&self, topic: &str, question: &str, answer: &str) -> Result<()> {
        require_text("topic", topic)?;
        require_text("question", question)?;
        require_text("answer", answer)?;

        let index = self
            .transact(|document| {
                let entry = document.topic_or_insert(topic);
                entry.questions.push(Question::new(question, answer));
                Ok(entry.questions.len() - 1)
            })
            .await?;
        debug!(topic, index, "question added");
        Ok(())
    }

    /// Replace the question at `index`.
    ///
    /// # Errors
    /// `Validation` for blank fields, `NotFound` if the topic is absent or the
    /// index is out of bounds; the bank is left unchanged.
    pub async fn edit_question(
        &self,
        topic: &str,
        index: usize,
        question: &str,
        answer: &str,
    ) -> Result<()> {
        require_text("question", question)?;
        require_text("answer", answer)?;

        self.transact(|document| {
            let slot = document
                .topic_mut(topic)
                .and_then(|t| t.questions.get_mut(index))
                .ok_or_else(|| invalid_index(topic, index))?;
            *slot = Question::new(question, answer);
            Ok(())
        })
        .await?;
        debug!(topic, index, "question edited");
        Ok(())
    }

    /// Remove the question at `index`; later questions shift down by one. The
    /// topic stays even when it becomes empty.
    ///
    /// # Errors
    /// `NotFound` if the topic is absent or the index is out of bounds.
    pub async fn delete_question(&self, topic: &str, index: usize) -> Result<Question> {
        let removed = self
            .transact(|document| {
                let entry = document
                    .topic_mut(topic)
                    .filter(|t| index < t.questions.len())
                    .ok_or_else(|| invalid_index(topic, index))?;
                Ok(entry.questions.remove(index))
            })
            .await?;
        debug!(topic, index, "question deleted");
        Ok(removed)
    }

    /// Remove a topic and all of its questions. Deleting an absent topic is a
    /// no-op that logs a warning; returns whether anything was removed.
    ///
    /// # Errors
    /// Returns `Storage` if the bank cannot be read or written.
    pub async fn delete_topic(&self, name: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut document = Document::load(&self.path).await?;
        if !document.remove_topic(name) {
            warn!(topic = name, "delete requested for unknown topic");
            return Ok(false);
        }
        document.save(&self.path).await?;
        info!(topic = name, "topic deleted");
        Ok(true)
    }

    /// Draw up to `count` distinct questions from `topic`, uniformly and in
    /// random order. Absent or empty topics and a zero count yield nothing.
    ///
    /// # Errors
    /// Returns `Storage` if the bank cannot be read.
    pub async fn sample(&self, topic: &str, count: usize) -> Result<Vec<Question>> {
        let document = self.read().await?;
        let questions = document
            .topic(topic)
            .map_or(&[][..], |t| t.questions.as_slice());
        Ok(draw(questions, count, &mut rand::thread_rng()))
    }
}

/// Uniform selection without replacement, shuffled.
pub fn draw<R: Rng + ?Sized>(questions: &[Question], count: usize, rng: &mut R) -> Vec<Question> {
    let amount = count.min(questions.len());
    let mut picked: Vec<Question> = questions.choose_multiple(rng, amount).cloned().collect();
    picked.shuffle(rng);
    picked
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("The {field} must not be blank")));
    }
    Ok(())
}

fn invalid_index(topic: &str, index: usize) -> Error {
    Error::NotFound(format!("Invalid question index {index} for topic {topic}"))
}
