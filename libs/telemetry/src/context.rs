use metrics::Label;

/// Labels attached to routing metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteLabels {
    pub chatbot_id: Option<String>,
    pub kind: Option<String>,
    pub extra: Vec<(String, String)>,
}

impl RouteLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chatbot(mut self, chatbot_id: impl Into<String>) -> Self {
        self.chatbot_id = Some(chatbot_id.into());
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    pub fn tags(&self) -> Vec<(String, String)> {
        let mut tags = Vec::with_capacity(2 + self.extra.len());
        if let Some(chatbot_id) = &self.chatbot_id {
            tags.push(("chatbot_id".into(), chatbot_id.clone()));
        }
        if let Some(kind) = &self.kind {
            tags.push(("kind".into(), kind.clone()));
        }
        tags.extend(self.extra.iter().cloned());
        tags
    }

    pub fn labels(&self) -> Vec<Label> {
        self.tags()
            .into_iter()
            .map(|(key, value)| Label::new(key, value))
            .collect()
    }
}
