use crate::error::{Result, ViewerError};

/// Text clipboard used by copy, paste and "import from clipboard".
pub trait TextClipboard {
    fn get_text(&mut self) -> Result<String>;
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The system clipboard, opened lazily on first use.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> Result<&mut arboard::Clipboard> {
        if self.inner.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| ViewerError::Clipboard(e.to_string()))?;
            self.inner = Some(clipboard);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| ViewerError::Clipboard("clipboard unavailable".to_string()))
    }
}

impl TextClipboard for SystemClipboard {
    fn get_text(&mut self) -> Result<String> {
        self.handle()?
            .get_text()
            .map_err(|e| ViewerError::Clipboard(e.to_string()))
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        self.handle()?
            .set_text(text.to_string())
            .map_err(|e| ViewerError::Clipboard(e.to_string()))
    }
}

/// In-process clipboard for headless runs and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl TextClipboard for MemoryClipboard {
    fn get_text(&mut self) -> Result<String> {
        self.contents
            .clone()
            .ok_or_else(|| ViewerError::Clipboard("clipboard is empty".to_string()))
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_clipboard_roundtrip() {
        let mut clipboard = MemoryClipboard::new();
        assert!(clipboard.get_text().is_err());
        clipboard.set_text("a\tb").unwrap();
        assert_eq!(clipboard.get_text().unwrap(), "a\tb");
    }
}
