//! Content-type detection from leading signature bytes.
//!
//! Uploaded assets are classified by what they contain, not by the client's
//! file name or declared MIME type.

use std::fmt;

/// Content types accepted for movie assets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaType {
    Jpeg,
    Png,
    Bmp,
    Mp4,
    Mp3,
    Wav,
}

#[derive(Clone, Copy)]
enum Sig {
    Exact(u8),
    Any,
    Range(u8, u8),
}

impl Sig {
    fn matches(self, byte: u8) -> bool {
        match self {
            Sig::Exact(b) => b == byte,
            Sig::Any => true,
            Sig::Range(min, max) => (min..=max).contains(&byte),
        }
    }
}

use Sig::{Any, Exact as E, Range};

/// (type, offset, pattern). More specific patterns come first.
const SIGNATURES: &[(MediaType, usize, &[Sig])] = &[
    (
        MediaType::Png,
        0,
        &[E(0x89), E(b'P'), E(b'N'), E(b'G'), E(0x0D), E(0x0A), E(0x1A), E(0x0A)],
    ),
    (MediaType::Jpeg, 0, &[E(0xFF), E(0xD8), E(0xFF)]),
    (
        MediaType::Wav,
        0,
        &[
            E(b'R'), E(b'I'), E(b'F'), E(b'F'), Any, Any, Any, Any,
            E(b'W'), E(b'A'), E(b'V'), E(b'E'),
        ],
    ),
    (MediaType::Mp4, 4, &[E(b'f'), E(b't'), E(b'y'), E(b'p')]),
    (MediaType::Mp3, 0, &[E(b'I'), E(b'D'), E(b'3')]),
    // Bare MPEG audio frame: 11-bit sync word.
    (MediaType::Mp3, 0, &[E(0xFF), Range(0xE0, 0xFF)]),
    (MediaType::Bmp, 0, &[E(b'B'), E(b'M')]),
];

impl MediaType {
    pub const IMAGES: &'static [MediaType] = &[MediaType::Jpeg, MediaType::Png, MediaType::Bmp];
    pub const AUDIO_VIDEO: &'static [MediaType] = &[MediaType::Mp4, MediaType::Mp3, MediaType::Wav];

    /// Identify `bytes` by signature, or `None` if no known type matches.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        SIGNATURES
            .iter()
            .find(|(_, offset, pattern)| {
                bytes.len() >= offset + pattern.len()
                    && pattern
                        .iter()
                        .zip(&bytes[*offset..])
                        .all(|(sig, byte)| sig.matches(*byte))
            })
            .map(|(media_type, _, _)| *media_type)
    }

    /// Extension used for the stored blob.
    pub fn extension(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "jpg",
            MediaType::Png => "png",
            MediaType::Bmp => "bmp",
            MediaType::Mp4 => "mp4",
            MediaType::Mp3 => "mp3",
            MediaType::Wav => "wav",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
