use std::path::Path;

use anyhow::Context;

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Task {
    pub prompt: String,
    pub reference: String,
}

/// The benchmark tasks and the system prompt they are asked with
#[derive(Clone, Debug, serde::Deserialize)]
pub struct TaskSet {
    /// Prompt template; `{prompt}` is replaced with the task prompt
    pub system_prompt: String,
    pub tasks: Vec<Task>,
}

impl TaskSet {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        crate::yaml::read(path).with_context(|| format!("loading tasks from {}", path.display()))
    }

    pub fn render_prompt(&self, task: &Task) -> String {
        self.system_prompt.replace("{prompt}", &task.prompt)
    }
}
