use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::VulnscanError;

/// Status attributes carried by the root element of every GMP response.
#[derive(Debug, Deserialize)]
pub struct ResponseStatus {
    #[serde(rename = "@status", default)]
    pub status: String,
    #[serde(rename = "@status_text", default)]
    pub status_text: String,
    /// Set on `create_*` responses.
    #[serde(rename = "@id", default)]
    pub id: Option<String>,
}

/// Detects the end of a GMP response as it arrives.
///
/// Element depth and the offset of the last fully parsed event carry over
/// between calls, so each read only parses the bytes that are new.
#[derive(Debug, Default)]
pub struct ResponseFramer {
    offset: usize,
    depth: usize,
}

impl ResponseFramer {
    /// True once `buf` holds one complete XML element (the response root has closed).
    /// `buf` must be the same growing buffer on every call.
    pub fn is_complete(&mut self, buf: &[u8]) -> bool {
        let start = self.offset.min(buf.len());
        let mut reader = Reader::from_reader(&buf[start..]);
        // Elements opened before `start` are closed here, so names cannot be matched.
        reader.check_end_names(false);

        loop {
            match reader.read_event() {
                Ok(Event::Start(_)) => self.depth += 1,
                Ok(Event::End(_)) => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return true;
                    }
                }
                Ok(Event::Empty(_)) if self.depth == 0 => return true,
                Ok(Event::Eof) | Err(_) => return false,
                Ok(_) => {}
            }
            self.offset = start + reader.buffer_position();
        }
    }
}

pub fn decode<T: DeserializeOwned>(xml: &str) -> Result<T, VulnscanError> {
    quick_xml::de::from_str(xml).map_err(|e| VulnscanError::Xml(format!("Malformed scanner response: {}", e)))
}
