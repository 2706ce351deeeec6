//! The `.note.omnibor` ELF note.
//!
//! An object file points at its BOM document by carrying one note per
//! algorithm in a `.note.omnibor` section. Each note is a standard ELF note
//! in the target's byte order (native here):
//!
//! ```text
//! u32 namesz = 8
//! u32 descsz = 20 (SHA-1) | 32 (SHA-256)
//! u32 type   = 1 (SHA-1)  | 2  (SHA-256)
//! "OMNIBOR\0"
//! raw document digest, padded to 4 bytes
//! ```

use mkbom_types::{Gitoid, HashAlgorithm};

use crate::error::{StoreError, StoreResult};

/// Section the notes are emitted into.
pub const NOTE_SECTION: &str = ".note.omnibor";

/// Note owner name, NUL included.
pub const NOTE_NAME: &[u8] = b"OMNIBOR\0";

const HEADER_LEN: usize = 12;

/// One OmniBOR note naming a BOM document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OmniborNote {
    document: Gitoid,
}

impl OmniborNote {
    /// A note pointing at `document`.
    pub fn new(document: Gitoid) -> Self {
        Self { document }
    }

    /// The BOM document this note names.
    pub fn document(&self) -> &Gitoid {
        &self.document
    }

    /// Encode the note.
    pub fn encode(&self) -> Vec<u8> {
        let digest = self.document.as_bytes();
        let mut out = Vec::with_capacity(HEADER_LEN + padded(NOTE_NAME.len()) + padded(digest.len()));
        out.extend_from_slice(&(NOTE_NAME.len() as u32).to_ne_bytes());
        out.extend_from_slice(&(digest.len() as u32).to_ne_bytes());
        out.extend_from_slice(&self.document.algorithm().note_type().to_ne_bytes());
        push_padded(&mut out, NOTE_NAME);
        push_padded(&mut out, digest);
        out
    }

    /// Encode a whole section, one note per document.
    pub fn encode_section<'a>(documents: impl IntoIterator<Item = &'a Gitoid>) -> Vec<u8> {
        documents
            .into_iter()
            .flat_map(|id| Self::new(id.clone()).encode())
            .collect()
    }

    /// Decode one note from the front of `bytes`, returning it and the number
    /// of bytes it occupied.
    pub fn decode(bytes: &[u8]) -> StoreResult<(Self, usize)> {
        if bytes.len() < HEADER_LEN {
            return Err(StoreError::MalformedNote(format!(
                "{} bytes is shorter than a note header",
                bytes.len()
            )));
        }
        let namesz = read_u32(bytes, 0) as usize;
        let descsz = read_u32(bytes, 4) as usize;
        let note_type = read_u32(bytes, 8);

        let algorithm = HashAlgorithm::ALL
            .into_iter()
            .find(|alg| alg.note_type() == note_type)
            .ok_or_else(|| StoreError::MalformedNote(format!("unknown note type {note_type}")))?;
        if descsz != algorithm.digest_len() {
            return Err(StoreError::MalformedNote(format!(
                "{algorithm} note carries {descsz} bytes"
            )));
        }

        let name_start = HEADER_LEN;
        let desc_start = name_start + padded(namesz);
        let end = desc_start + padded(descsz);
        if bytes.len() < end {
            return Err(StoreError::MalformedNote("note is truncated".into()));
        }
        if &bytes[name_start..name_start + namesz] != NOTE_NAME {
            return Err(StoreError::MalformedNote("owner is not OMNIBOR".into()));
        }

        let document = Gitoid::from_digest(algorithm, &bytes[desc_start..desc_start + descsz])?;
        Ok((Self { document }, end))
    }

    /// Decode every note in a section.
    pub fn decode_section(mut bytes: &[u8]) -> StoreResult<Vec<Self>> {
        let mut notes = Vec::new();
        while !bytes.is_empty() {
            let (note, used) = Self::decode(bytes)?;
            notes.push(note);
            bytes = &bytes[used..];
        }
        Ok(notes)
    }
}

fn padded(len: usize) -> usize {
    (len + 3) & !3
}

fn push_padded(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(bytes);
    out.resize(out.len() + padded(bytes.len()) - bytes.len(), 0);
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[at..at + 4]);
    u32::from_ne_bytes(word)
}
