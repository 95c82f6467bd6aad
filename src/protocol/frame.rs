use base64::{engine::general_purpose::STANDARD, Engine};
use std::str::FromStr;

use crate::protocol::constants::{FIELD_DELIMITER, HEADER_FIELDS, POSITION_SEPARATOR};
use crate::protocol::error::FrameError;

/// Archive header: original base name and exact byte length.
///
/// Wire form is `base64("<name>:<size>:")`. The trailing delimiter is part of
/// the format and is always written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFrame {
    file_name: String,
    file_size: u64,
}

impl HeaderFrame {
    pub fn new(file_name: impl Into<String>, file_size: u64) -> Result<Self, FrameError> {
        let file_name = file_name.into();
        validate_file_name(&file_name)?;
        Ok(Self { file_name, file_size })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn encode(&self) -> String {
        let raw = format!(
            "{}{}{}{}",
            self.file_name, FIELD_DELIMITER, self.file_size, FIELD_DELIMITER
        );
        STANDARD.encode(raw.as_bytes())
    }

    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let raw = STANDARD
            .decode(text.trim())
            .map_err(|e| FrameError::MalformedHeader(format!("invalid base64: {}", e)))?;
        let raw = String::from_utf8(raw)
            .map_err(|_| FrameError::MalformedHeader("header is not valid UTF-8".to_string()))?;

        let fields: Vec<&str> = raw.splitn(HEADER_FIELDS, FIELD_DELIMITER).collect();
        if fields.len() < HEADER_FIELDS {
            return Err(FrameError::MalformedHeader(format!(
                "expected {} fields, found {}",
                HEADER_FIELDS,
                fields.len()
            )));
        }

        let file_size = parse_decimal::<u64>(fields[1])
            .ok_or_else(|| FrameError::MalformedHeader(format!("invalid file size {:?}", fields[1])))?;

        Self::new(fields[0], file_size)
    }
}

/// One positioned slice of the original payload.
///
/// Wire form is `"<index>/<total>:" + base64(payload)`; only the payload is
/// base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFrame {
    index: u32,
    total_chunks: u32,
    payload: Vec<u8>,
}

impl ChunkFrame {
    /// `index` is 1-based and must lie in `1..=total_chunks`.
    pub fn new(index: u32, total_chunks: u32, payload: Vec<u8>) -> Result<Self, FrameError> {
        if index == 0 || index > total_chunks {
            return Err(FrameError::MalformedChunk(format!(
                "position {}/{} out of range",
                index, total_chunks
            )));
        }
        Ok(Self {
            index,
            total_chunks,
            payload,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn encode(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.index,
            POSITION_SEPARATOR,
            self.total_chunks,
            FIELD_DELIMITER,
            STANDARD.encode(&self.payload)
        )
    }

    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let (position, encoded) = text
            .trim()
            .split_once(FIELD_DELIMITER)
            .ok_or_else(|| FrameError::MalformedChunk("missing position delimiter".to_string()))?;

        let (index, total) = position
            .split_once(POSITION_SEPARATOR)
            .ok_or_else(|| FrameError::MalformedChunk(format!("invalid position {:?}", position)))?;
        let index = parse_decimal::<u32>(index)
            .ok_or_else(|| FrameError::MalformedChunk(format!("invalid chunk index {:?}", index)))?;
        let total = parse_decimal::<u32>(total)
            .ok_or_else(|| FrameError::MalformedChunk(format!("invalid chunk total {:?}", total)))?;

        let payload = STANDARD
            .decode(encoded)
            .map_err(|e| FrameError::MalformedChunk(format!("invalid base64 payload: {}", e)))?;

        Self::new(index, total, payload)
    }
}

pub fn encode_header(file_name: &str, file_size: u64) -> Result<String, FrameError> {
    Ok(HeaderFrame::new(file_name, file_size)?.encode())
}

pub fn decode_header(text: &str) -> Result<(String, u64), FrameError> {
    let header = HeaderFrame::decode(text)?;
    Ok((header.file_name, header.file_size))
}

pub fn encode_chunk(index: u32, total: u32, payload: &[u8]) -> Result<String, FrameError> {
    Ok(ChunkFrame::new(index, total, payload.to_vec())?.encode())
}

pub fn decode_chunk(text: &str) -> Result<(u32, u32, Vec<u8>), FrameError> {
    let chunk = ChunkFrame::decode(text)?;
    Ok((chunk.index, chunk.total_chunks, chunk.payload))
}

/// Names are written unescaped, so anything that would break the header or
/// escape the restore directory is refused.
fn validate_file_name(name: &str) -> Result<(), FrameError> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.contains(FIELD_DELIMITER) {
        Some("name contains the ':' frame delimiter")
    } else if name.contains('/') || name.contains('\\') {
        Some("name contains a path separator")
    } else if name == "." || name == ".." {
        Some("name is a relative directory reference")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(FrameError::InvalidFileName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

fn parse_decimal<T: FromStr>(field: &str) -> Option<T> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}
