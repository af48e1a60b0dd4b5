use crate::domain::model::{GenerationResult, ResultId};

/// 只增不改的結果紀錄，最新的在最前面
#[derive(Debug, Clone, Default)]
pub struct ResultLog {
    entries: Vec<GenerationResult>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: GenerationResult) {
        self.entries.push(result);
    }

    pub fn get(&self, id: &ResultId) -> Option<&GenerationResult> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    /// 唯讀快照，新到舊
    pub fn snapshot(&self) -> Vec<GenerationResult> {
        self.entries.iter().rev().cloned().collect()
    }
}
