/// Append-only text fragments of one in-flight response.
#[derive(Debug, Clone, Default)]
pub struct StreamBuffer {
    fragments: Vec<String>,
}

impl StreamBuffer {
    pub fn push(&mut self, fragment: &str) {
        if !fragment.is_empty() {
            self.fragments.push(fragment.to_string());
        }
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn text(&self) -> String {
        self.fragments.concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_in_order_and_clears() {
        let mut buffer = StreamBuffer::default();
        buffer.push("[{\"name\":");
        buffer.push("");
        buffer.push(" \"A\"}]");
        assert_eq!(buffer.fragment_count(), 2);
        assert_eq!(buffer.text(), "[{\"name\": \"A\"}]");
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.text(), "");
    }
}
