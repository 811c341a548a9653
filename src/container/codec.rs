//! Container byte layout and revision-specific codecs.
//!
//! Every container starts with a 6-byte header: `PICO` magic followed by the
//! layout revision as `u16` little-endian. The body depends on the revision:
//!
//! - Revision 1 (legacy): `[len: u32-le][code][len][logical_name][len][payload]`.
//!   Has no room for a version.
//! - Revision 2 (current): `[count: u16-le]` then `count` tagged fields, each
//!   `[tag: u8][len: u32-le][bytes]`. Unknown tags are skipped so later
//!   revisions can add fields without breaking older readers.

use thiserror::Error;

use super::Container;

/// Magic bytes opening every container.
pub const MAGIC: [u8; 4] = *b"PICO";

/// Revision written by [`encode`].
pub const CURRENT_REVISION: u16 = 2;

const HEADER_LEN: usize = MAGIC.len() + 2;

const TAG_CODE: u8 = 1;
const TAG_LOGICAL_NAME: u8 = 2;
const TAG_VERSION: u8 = 3;
const TAG_PAYLOAD: u8 = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("bad magic: not a PICO container")]
    BadMagic,

    #[error("truncated container: need {needed} bytes for {what}, {available} available")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("unsupported container revision {0}")]
    UnsupportedRevision(u16),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("duplicate field '{0}'")]
    DuplicateField(&'static str),

    #[error("field '{0}' is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error("{0} trailing bytes after last field")]
    TrailingBytes(usize),

    #[error("field '{field}' is too large ({len} bytes)")]
    FieldTooLarge { field: &'static str, len: usize },

    #[error("revision {0} cannot store field '{1}'")]
    Unrepresentable(u16, &'static str),
}

/// Encoding strategy for one container revision.
pub trait ContainerCodec {
    /// Revision number written into the header.
    fn revision(&self) -> u16;

    /// Append the body for `container` to `out`.
    fn encode_body(&self, container: &Container, out: &mut Vec<u8>) -> Result<(), FormatError>;

    /// Decode a body (everything after the header).
    fn decode_body(&self, body: &[u8]) -> Result<Container, FormatError>;
}

/// Legacy layout: three length-prefixed fields in fixed order.
#[derive(Debug, Clone, Copy, Default)]
pub struct V1Codec;

impl ContainerCodec for V1Codec {
    fn revision(&self) -> u16 {
        1
    }

    fn encode_body(&self, container: &Container, out: &mut Vec<u8>) -> Result<(), FormatError> {
        if container.format_version.is_some() {
            return Err(FormatError::Unrepresentable(1, "version"));
        }
        put_prefixed(out, "code", container.code.as_bytes())?;
        put_prefixed(out, "logical_name", container.logical_name.as_bytes())?;
        put_prefixed(out, "payload", &container.payload)?;
        Ok(())
    }

    fn decode_body(&self, body: &[u8]) -> Result<Container, FormatError> {
        let mut reader = Reader::new(body);
        let code = utf8("code", reader.prefixed("code")?)?;
        let logical_name = utf8("logical_name", reader.prefixed("logical_name")?)?;
        let payload = reader.prefixed("payload")?.to_vec();
        reader.finish()?;
        Ok(Container { code, logical_name, format_version: None, payload })
    }
}

/// Current layout: tagged fields, version optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct V2Codec;

impl ContainerCodec for V2Codec {
    fn revision(&self) -> u16 {
        2
    }

    fn encode_body(&self, container: &Container, out: &mut Vec<u8>) -> Result<(), FormatError> {
        let count: u16 = if container.format_version.is_some() { 4 } else { 3 };
        out.extend_from_slice(&count.to_le_bytes());
        put_tagged(out, TAG_CODE, "code", container.code.as_bytes())?;
        put_tagged(out, TAG_LOGICAL_NAME, "logical_name", container.logical_name.as_bytes())?;
        if let Some(version) = &container.format_version {
            put_tagged(out, TAG_VERSION, "version", version.as_bytes())?;
        }
        put_tagged(out, TAG_PAYLOAD, "payload", &container.payload)?;
        Ok(())
    }

    fn decode_body(&self, body: &[u8]) -> Result<Container, FormatError> {
        let mut reader = Reader::new(body);
        let count = reader.u16("field count")?;

        let mut code = None;
        let mut logical_name = None;
        let mut version = None;
        let mut payload = None;

        for _ in 0..count {
            let tag = reader.u8("field tag")?;
            let bytes = reader.prefixed("field")?;
            match tag {
                TAG_CODE => set_once(&mut code, "code", utf8("code", bytes)?)?,
                TAG_LOGICAL_NAME => {
                    set_once(&mut logical_name, "logical_name", utf8("logical_name", bytes)?)?
                }
                TAG_VERSION => set_once(&mut version, "version", utf8("version", bytes)?)?,
                TAG_PAYLOAD => set_once(&mut payload, "payload", bytes.to_vec())?,
                _ => {}
            }
        }
        reader.finish()?;

        Ok(Container {
            code: code.ok_or(FormatError::MissingField("code"))?,
            logical_name: logical_name.ok_or(FormatError::MissingField("logical_name"))?,
            format_version: version,
            payload: payload.ok_or(FormatError::MissingField("payload"))?,
        })
    }
}

/// Get the codec for a given layout revision.
pub fn get_codec(revision: u16) -> Result<Box<dyn ContainerCodec + Send + Sync>, FormatError> {
    match revision {
        1 => Ok(Box::new(V1Codec)),
        2 => Ok(Box::new(V2Codec)),
        other => Err(FormatError::UnsupportedRevision(other)),
    }
}

/// Encode with the current revision.
pub fn encode(container: &Container) -> Result<Vec<u8>, FormatError> {
    encode_with(&V2Codec, container)
}

/// Encode with an explicit codec (header included).
pub fn encode_with(codec: &dyn ContainerCodec, container: &Container) -> Result<Vec<u8>, FormatError> {
    let mut out = Vec::with_capacity(
        HEADER_LEN + 32 + container.code.len() + container.logical_name.len() + container.payload.len(),
    );
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&codec.revision().to_le_bytes());
    codec.encode_body(container, &mut out)?;
    Ok(out)
}

/// Decode a container of any supported revision.
pub fn decode(bytes: &[u8]) -> Result<Container, FormatError> {
    decode_with_revision(bytes).map(|(_, container)| container)
}

/// Decode a container and report the layout revision it was stored with.
pub fn decode_with_revision(bytes: &[u8]) -> Result<(u16, Container), FormatError> {
    if bytes.len() < MAGIC.len() {
        return Err(FormatError::Truncated {
            what: "header",
            needed: HEADER_LEN,
            available: bytes.len(),
        });
    }
    if bytes[..MAGIC.len()] != MAGIC {
        return Err(FormatError::BadMagic);
    }
    if bytes.len() < HEADER_LEN {
        return Err(FormatError::Truncated {
            what: "header",
            needed: HEADER_LEN,
            available: bytes.len(),
        });
    }
    let revision = u16::from_le_bytes([bytes[4], bytes[5]]);
    let codec = get_codec(revision)?;
    let container = codec.decode_body(&bytes[HEADER_LEN..])?;
    Ok((revision, container))
}

fn put_len(out: &mut Vec<u8>, field: &'static str, len: usize) -> Result<(), FormatError> {
    let len32 = u32::try_from(len).map_err(|_| FormatError::FieldTooLarge { field, len })?;
    out.extend_from_slice(&len32.to_le_bytes());
    Ok(())
}

fn put_prefixed(out: &mut Vec<u8>, field: &'static str, bytes: &[u8]) -> Result<(), FormatError> {
    put_len(out, field, bytes.len())?;
    out.extend_from_slice(bytes);
    Ok(())
}

fn put_tagged(out: &mut Vec<u8>, tag: u8, field: &'static str, bytes: &[u8]) -> Result<(), FormatError> {
    out.push(tag);
    put_prefixed(out, field, bytes)
}

fn set_once<T>(slot: &mut Option<T>, field: &'static str, value: T) -> Result<(), FormatError> {
    if slot.is_some() {
        return Err(FormatError::DuplicateField(field));
    }
    *slot = Some(value);
    Ok(())
}

fn utf8(field: &'static str, bytes: &[u8]) -> Result<String, FormatError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| FormatError::InvalidUtf8(field))
}

/// Bounds-checked little-endian reader over a body slice.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, what: &'static str, n: usize) -> Result<&'a [u8], FormatError> {
        let available = self.buf.len() - self.pos;
        if n > available {
            return Err(FormatError::Truncated { what, needed: n, available });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, FormatError> {
        Ok(self.take(what, 1)?[0])
    }

    fn u16(&mut self, what: &'static str) -> Result<u16, FormatError> {
        let b = self.take(what, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, FormatError> {
        let b = self.take(what, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn prefixed(&mut self, what: &'static str) -> Result<&'a [u8], FormatError> {
        let len = self.u32(what)? as usize;
        self.take(what, len)
    }

    fn finish(&self) -> Result<(), FormatError> {
        let rest = self.buf.len() - self.pos;
        if rest != 0 {
            return Err(FormatError::TrailingBytes(rest));
        }
        Ok(())
    }
}
