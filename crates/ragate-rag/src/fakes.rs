//! Scripted collaborators for pipeline tests

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ragate_core::{
    Document, DocumentStore, Error, LanguageService, Message, Result, StructuredSchema,
};

/// Scripted reply to one grading call
#[derive(Debug, Clone)]
pub enum GradeReply {
    Label(&'static str),
    Raw(Value),
    SchemaError,
    TransportError,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub structured: bool,
    pub messages: Vec<Message>,
}

/// Language service that grades by document content and answers with a
/// fixed string. Unscripted documents are graded "no".
#[derive(Default)]
pub struct FakeLanguageService {
    grades: Vec<(String, GradeReply)>,
    delays: Vec<(String, u64)>,
    answer: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeLanguageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grade(mut self, content: &str, reply: GradeReply) -> Self {
        self.grades.push((content.to_string(), reply));
        self
    }

    pub fn delay(mut self, content: &str, millis: u64) -> Self {
        self.delays.push((content.to_string(), millis));
        self
    }

    pub fn answer(mut self, answer: &str) -> Self {
        self.answer = Some(answer.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn structured_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.structured).collect()
    }

    pub fn completion_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| !c.structured).collect()
    }

    fn record(&self, structured: bool, messages: &[Message]) {
        self.calls.lock().unwrap().push(Call {
            structured,
            messages: messages.to_vec(),
        });
    }

    fn lookup<'a, T>(table: &'a [(String, T)], messages: &[Message]) -> Option<&'a T> {
        let prompt = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        table
            .iter()
            .find(|(content, _)| prompt.contains(content.as_str()))
            .map(|(_, value)| value)
    }
}

#[async_trait]
impl LanguageService for FakeLanguageService {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.record(false, messages);
        self.answer
            .clone()
            .ok_or_else(|| Error::LanguageService("scripted completion failure".to_string()))
    }

    async fn complete_structured(
        &self,
        messages: &[Message],
        _schema: &StructuredSchema,
    ) -> Result<Value> {
        self.record(true, messages);

        if let Some(millis) = Self::lookup(self.delays.as_slice(), messages) {
            tokio::time::sleep(Duration::from_millis(*millis)).await;
        }

        match Self::lookup(self.grades.as_slice(), messages).cloned() {
            Some(GradeReply::Label(label)) => Ok(json!({ "binary_score": label })),
            Some(GradeReply::Raw(value)) => Ok(value),
            Some(GradeReply::SchemaError) => {
                Err(Error::SchemaViolation("output is not valid JSON".to_string()))
            }
            Some(GradeReply::TransportError) => {
                Err(Error::Network("connection reset".to_string()))
            }
            None => Ok(json!({ "binary_score": "no" })),
        }
    }

    fn model_id(&self) -> &str {
        "fake-model"
    }
}

/// Store returning a fixed list, or failing
pub struct StaticStore {
    documents: Option<Vec<Document>>,
    searches: AtomicUsize,
}

impl StaticStore {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents: Some(documents),
            searches: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            documents: None,
            searches: AtomicUsize::new(0),
        }
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for StaticStore {
    async fn search(&self, _query: &str) -> Result<Vec<Document>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.documents
            .clone()
            .ok_or_else(|| Error::Network("store unreachable".to_string()))
    }

    fn name(&self) -> &str {
        "static"
    }
}
