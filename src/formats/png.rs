//! PNG container grammar
//!
//! Describes the chunk structure of a PNG file, without decompressing or
//! validating any of it:
//!
//! ```text
//! png    := bitCheck:u8 magicHeader:ascii[3] skip(4) chunks:repeat-to-end(chunk)
//! chunk  := length:u32be type:ascii[4] body(type, length) crc:u32be
//! ```
//!
//! The body of a chunk is chosen by its lower-cased type tag: `IHDR`,
//! `PLTE` and `pHYs` are decoded field by field, everything else is kept
//! as `length` raw bytes under `data`. Body fields are stored directly in
//! the chunk's record, next to `length`, `type` and `crc`.
//!
//! The CRC is read but never checked, and nothing prevents `length` from
//! disagreeing with what a known body actually consumes.

use lazy_static::lazy_static;

use crate::combinator::{
    bytes, fixed_ascii_string, repeat, repeat_to_end, sequence, skip, uint32_be, uint8,
    use_values, when, Cases,
};
use crate::error::ProjectResult;
use crate::parse::{Combinator, ParseResult};
use crate::project::{expect_record, FromValue};
use crate::value::{Record, Value};
use crate::FromRecord;

/// One palette entry: `red`, `green`, `blue`
pub fn rgb() -> Combinator {
    sequence([uint8("red"), uint8("green"), uint8("blue")])
}

/// Body of an `IHDR` chunk
pub fn header() -> Combinator {
    sequence([
        uint32_be("width"),
        uint32_be("height"),
        uint8("bitDepth"),
        uint8("colorType"),
        uint8("compressionMethod"),
        uint8("filterMethod"),
        uint8("interlaceMethod"),
    ])
}

/// Body of a `PLTE` chunk: `length / 3` entries, rounded down
pub fn palette() -> Combinator {
    use_values(|rec| Ok(repeat(rec.usize("length")? / 3, rgb(), "entries")))
}

/// Body of a `pHYs` chunk
pub fn physical_dimensions() -> Combinator {
    sequence([uint32_be("x"), uint32_be("y"), uint8("unit")])
}

/// Body of any chunk without a dedicated grammar
pub fn generic_chunk(length: usize) -> Combinator {
    bytes("data", length)
}

fn chunk_bodies() -> Cases<String> {
    Cases::new()
        .case("ihdr", header())
        .case("plte", palette())
        .case("phys", physical_dimensions())
}

lazy_static! {
    /// Known chunk bodies, keyed by lower-cased type tag
    pub static ref CHUNK_BODIES: Cases<String> = chunk_bodies();

    /// Shared instance of [`png`]
    pub static ref PNG: Combinator = png();
}

pub fn chunk() -> Combinator {
    sequence([
        uint32_be("length"),
        fixed_ascii_string("type", 4),
        use_values(|rec| {
            let tag = rec.text("type")?.to_ascii_lowercase();
            let length = rec.usize("length")?;
            Ok(when(tag.as_str(), &*CHUNK_BODIES, generic_chunk(length)))
        }),
        uint32_be("crc"),
    ])
}

pub fn png() -> Combinator {
    sequence([
        uint8("bitCheck"),
        fixed_ascii_string("magicHeader", 3),
        skip(4),
        repeat_to_end(chunk(), "chunks"),
    ])
}

/// Parses a complete PNG file into a generic [`Record`]
pub fn parse_png(buffer: &[u8]) -> ParseResult<Record> {
    PNG.parse(buffer)
}

/// Typed view of a parsed PNG file
#[derive(Debug, Clone, PartialEq, Eq, FromRecord)]
pub struct Png {
    pub bit_check: u8,
    pub magic_header: String,
    pub chunks: Vec<Chunk>,
}

impl Png {
    /// Parses `buffer` and projects the result onto a [`Png`]
    pub fn from_bytes(buffer: &[u8]) -> ParseResult<Self> {
        let record = parse_png(buffer)?;
        Ok(Self::from_record(&record)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRecord)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRecord)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRecord)]
pub struct PhysicalDimensions {
    pub x: u32,
    pub y: u32,
    pub unit: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkBody {
    Header(Header),
    Palette(Vec<Rgb>),
    PhysicalDimensions(PhysicalDimensions),
    Other(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub length: u32,
    /// Four-character type tag, e.g. `IHDR`
    pub kind: String,
    pub body: ChunkBody,
    pub crc: u32,
}

impl FromRecord for ChunkBody {
    fn from_record(record: &Record) -> ProjectResult<Self> {
        Ok(match record.text("type")?.to_ascii_lowercase().as_str() {
            "ihdr" => ChunkBody::Header(Header::from_record(record)?),
            "plte" => ChunkBody::Palette(record.project("entries")?),
            "phys" => ChunkBody::PhysicalDimensions(PhysicalDimensions::from_record(record)?),
            _ => ChunkBody::Other(record.project("data")?),
        })
    }
}

impl FromRecord for Chunk {
    fn from_record(record: &Record) -> ProjectResult<Self> {
        Ok(Self {
            length: record.project("length")?,
            kind: record.project("type")?,
            body: ChunkBody::from_record(record)?,
            crc: record.project("crc")?,
        })
    }
}

impl FromValue for Chunk {
    fn from_value(value: &Value) -> ProjectResult<Self> {
        Self::from_record(expect_record(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProjectError;
    use crate::parse::error::{ErrorKind, ParseError};
    use crate::parse::Context;

    const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    const IHDR: [u8; 13] = [0, 0, 0, 1, 0, 0, 0, 2, 8, 2, 0, 0, 0];

    fn chunk_bytes(tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = (data.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(tag);
        out.extend_from_slice(data);
        out.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        out
    }

    fn png_bytes(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
        let mut out = SIGNATURE.to_vec();
        for (tag, data) in chunks {
            out.extend(chunk_bytes(tag, data));
        }
        out
    }

    fn chunks_of(rec: &Record) -> &[Value] {
        rec.get("chunks").and_then(Value::as_seq).unwrap()
    }

    #[test]
    fn header_and_trailer() {
        let buf = png_bytes(&[(b"IHDR", &IHDR), (b"IEND", &[])]);
        let rec = parse_png(&buf).unwrap();
        assert_eq!(rec.get("bitCheck"), Some(&Value::U8(0x89)));
        assert_eq!(rec.get("magicHeader"), Some(&Value::Text("PNG".into())));

        let chunks = chunks_of(&rec);
        assert_eq!(chunks.len(), 2);
        let ihdr = chunks[0].as_record().unwrap();
        assert_eq!(
            ihdr.keys().collect::<Vec<_>>(),
            vec![
                "length",
                "type",
                "width",
                "height",
                "bitDepth",
                "colorType",
                "compressionMethod",
                "filterMethod",
                "interlaceMethod",
                "crc"
            ]
        );
        assert_eq!(ihdr.get("length"), Some(&Value::U32(13)));
        assert_eq!(ihdr.get("height"), Some(&Value::U32(2)));
        assert_eq!(ihdr.get("crc"), Some(&Value::U32(0xdeadbeef)));

        let iend = chunks[1].as_record().unwrap();
        assert_eq!(iend.keys().collect::<Vec<_>>(), vec!["length", "type", "data", "crc"]);
        assert_eq!(iend.get("data"), Some(&Value::Bytes(vec![])));
    }

    #[test]
    fn palette_floor() {
        for (length, expected) in [(9u32, 3usize), (10, 3), (2, 0)] {
            let buf = [7u8; 12];
            let mut values = Record::new();
            values.insert("length", length);
            let ctx = palette().apply(Context::new(&buf).with_values(values)).unwrap();
            assert_eq!(ctx.offset(), expected * 3);
            let entries = ctx.values().get("entries").and_then(Value::as_seq).unwrap();
            assert_eq!(entries.len(), expected);
        }
    }

    #[test]
    fn palette_and_physical_chunks() {
        let plte = [255u8, 0, 0, 0, 255, 0, 0, 0, 255];
        let phys = [0u8, 0, 0x0b, 0x13, 0, 0, 0x0b, 0x13, 1];
        let buf = png_bytes(&[(b"PLTE", &plte), (b"pHYs", &phys)]);
        let rec = parse_png(&buf).unwrap();
        let chunks = chunks_of(&rec);

        let entries = chunks[0].as_record().unwrap().get("entries").and_then(Value::as_seq).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].as_record().unwrap().get("green"), Some(&Value::U8(255)));

        let phys = chunks[1].as_record().unwrap();
        assert_eq!(phys.get("x"), Some(&Value::U32(2835)));
        assert_eq!(phys.get("unit"), Some(&Value::U8(1)));
        assert!(!phys.contains("data"));
    }

    #[test]
    fn terminates_at_end_of_buffer() {
        for n in 0..4 {
            let chunks: Vec<(&[u8; 4], &[u8])> = (0..n).map(|_| (b"tEXt", &b"abc"[..])).collect();
            let buf = png_bytes(&chunks);
            let ctx = PNG.run(&buf, 0).unwrap();
            assert_eq!(ctx.offset(), buf.len());
            assert_eq!(chunks_of(ctx.values()).len(), n);
        }
    }

    #[test]
    fn truncated_chunk() {
        let mut buf = png_bytes(&[(b"IHDR", &IHDR)]);
        buf.extend_from_slice(&[0, 0, 0]);
        let err = parse_png(&buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
        assert_eq!(err.field_path(), vec!["chunks[1]", "length"]);
    }

    #[test]
    fn short_signature() {
        let err = parse_png(&SIGNATURE[..2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);
        assert_eq!(err.field_path(), vec!["magicHeader"]);
    }

    #[test]
    fn typed_projection() {
        let plte = [1u8, 2, 3];
        let buf = png_bytes(&[(b"IHDR", &IHDR), (b"PLTE", &plte), (b"IEND", &[])]);
        let png = Png::from_bytes(&buf).unwrap();
        assert_eq!(png.bit_check, 0x89);
        assert_eq!(png.magic_header, "PNG");
        assert_eq!(png.chunks.len(), 3);
        assert_eq!(png.chunks[0].kind, "IHDR");
        assert_eq!(
            png.chunks[0].body,
            ChunkBody::Header(Header {
                width: 1,
                height: 2,
                bit_depth: 8,
                color_type: 2,
                compression_method: 0,
                filter_method: 0,
                interlace_method: 0,
            })
        );
        assert_eq!(
            png.chunks[1].body,
            ChunkBody::Palette(vec![Rgb {
                red: 1,
                green: 2,
                blue: 3
            }])
        );
        assert_eq!(png.chunks[2].body, ChunkBody::Other(vec![]));
        assert_eq!(png.chunks[2].crc, 0xdeadbeef);
    }

    #[test]
    fn projection_error_path() {
        let mut rec = parse_png(&png_bytes(&[(b"IHDR", &IHDR)])).unwrap();
        rec.insert("chunks", Value::Seq(vec![Value::U8(0)]));
        let err = Png::from_record(&rec).unwrap_err();
        assert_eq!(err.field(), "chunks[0]");
        let err = ParseError::from(err);
        assert_eq!(err.kind(), ErrorKind::Record);
        assert!(matches!(err, ParseError::Record(ProjectError::Mismatch { .. })));
    }

    #[test]
    fn shared_across_threads() {
        let buf = png_bytes(&[(b"IHDR", &IHDR), (b"IDAT", &[1, 2, 3, 4]), (b"IEND", &[])]);
        let expected = parse_png(&buf).unwrap();
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4).map(|_| s.spawn(|| parse_png(&buf))).collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap().unwrap(), expected);
            }
        });
    }
}
