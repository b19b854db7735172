//! On-disk form of the bank: one pretty-printed JSON object mapping topic
//! names to question arrays, key order preserved.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};

use super::models::{Question, Topic};
use crate::error::{Error, Result};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Document {
    pub topics: Vec<Topic>,
}

impl Document {
    #[must_use]
    pub fn topic(&self, name: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.name == name)
    }

    pub fn topic_mut(&mut self, name: &str) -> Option<&mut Topic> {
        self.topics.iter_mut().find(|t| t.name == name)
    }

    /// Return the named topic, appending an empty one first if absent.
    pub fn topic_or_insert(&mut self, name: &str) -> &mut Topic {
        let index = match self.topics.iter().position(|t| t.name == name) {
            Some(index) => index,
            None => {
                self.topics.push(Topic {
                    name: name.to_string(),
                    questions: Vec::new(),
                });
                self.topics.len() - 1
            }
        };
        &mut self.topics[index]
    }

    /// Remove the topic and all its questions. Returns whether it existed.
    pub fn remove_topic(&mut self, name: &str) -> bool {
        let before = self.topics.len();
        self.topics.retain(|t| t.name != name);
        self.topics.len() != before
    }

    /// # Errors
    /// Returns `Storage` if the text is not a topic → question-list object.
    pub fn from_json(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let map: Map<String, Value> = serde_json::from_str(raw)?;
        let topics = map
            .into_iter()
            .map(|(name, value)| {
                let questions: Vec<Question> = serde_json::from_value(value)?;
                Ok(Topic { name, questions })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { topics })
    }

    /// # Errors
    /// Returns `Storage` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let mut map = Map::new();
        for topic in &self.topics {
            map.insert(topic.name.clone(), serde_json::to_value(&topic.questions)?);
        }
        Ok(serde_json::to_string_pretty(&Value::Object(map))?)
    }

    /// Read the document; a missing file is an empty bank.
    ///
    /// # Errors
    /// Returns `Storage` on I/O or parse failure.
    pub async fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path).await {
            Ok(raw) => Self::from_json(&raw),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Persist atomically: write a sibling `.tmp` file, flush it, then rename
    /// it over the target so a failed write never truncates the bank.
    ///
    /// # Errors
    /// Returns `Storage` on I/O failure; the previous file is left intact.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let body = self.to_json()?;
        let tmp_path = tmp_path_for(path);

        let write = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(body.as_bytes()).await?;
            file.sync_all().await?;
            fs::rename(&tmp_path, path).await
        };

        if let Err(err) = write.await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(Error::from(err));
        }
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_topic_order_from_the_file() {
        let raw = r#"{
            "zoology": [{"question": "Q1", "answer": "A1"}],
            "algebra": [],
            "music": [{"question": "Q2", "answer": "A2"}]
        }"#;
        let doc = Document::from_json(raw).expect("parse");
        let names: Vec<_> = doc.topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["zoology", "algebra", "music"]);

        let again = Document::from_json(&doc.to_json().expect("json")).expect("reparse");
        assert_eq!(again, doc);
    }

    #[test]
    fn blank_file_is_an_empty_bank() {
        assert_eq!(Document::from_json("  \n").expect("parse"), Document::default());
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(matches!(
            Document::from_json("[1, 2]"),
            Err(Error::Storage(_))
        ));
    }

    #[test]
    fn tmp_path_is_a_sibling() {
        assert_eq!(
            tmp_path_for(Path::new("/data/questions.json")),
            PathBuf::from("/data/questions.json.tmp")
        );
    }

    #[tokio::test]
    async fn save_replaces_file_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("questions.json");

        let mut doc = Document::default();
        doc.topic_or_insert("math")
            .questions
            .push(Question::new("2+2?", "4"));
        doc.save(&path).await.expect("save");

        assert!(!tmp_path_for(&path).exists());
        assert_eq!(Document::load(&path).await.expect("load"), doc);
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let doc = Document::load(&dir.path().join("absent.json"))
            .await
            .expect("load");
        assert!(doc.topics.is_empty());
    }
}
