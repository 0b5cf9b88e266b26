use crate::pipeline::Task;

/// One successful extraction, as it travels to the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub url: String,
    pub id: i64,

    /// Extracted values, in query order
    pub fields: Vec<String>,
}

impl ResultRow {
    pub fn new(task: Task, fields: Vec<String>) -> Self {
        Self {
            url: task.url,
            id: task.id,
            fields,
        }
    }

    /// Flattens the row into `[url, id, field...]`
    pub fn into_record(self) -> Vec<String> {
        let mut record = Vec::with_capacity(self.fields.len() + 2);
        record.push(self.url);
        record.push(self.id.to_string());
        record.extend(self.fields);
        record
    }
}
