use crate::state::MessageEntry;

/// Ordered, append-only conversation history for the current session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<MessageEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: MessageEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MessageEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&MessageEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a MessageEntry;
    type IntoIter = std::slice::Iter<'a, MessageEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
