//! Minimal store-only ZIP encoder.
//!
//! Produces a complete archive in memory: one local file header per entry
//! followed by its name and raw bytes, then the central directory, then the
//! end-of-central-directory record. Entries are never compressed and ZIP64
//! is not supported, so every size and offset must fit the classic 32-bit
//! fields.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::error::{Error, Result};
use crate::util::datetime_from_millis;

/// Size of the fixed part of a local file header.
pub const LOCAL_HEADER_LEN: usize = 30;
/// Size of the fixed part of a central directory header.
pub const CENTRAL_HEADER_LEN: usize = 46;
/// Size of the end-of-central-directory record without a comment.
pub const END_RECORD_LEN: usize = 22;

const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
const END_RECORD_SIGNATURE: u32 = 0x0605_4b50;
const VERSION: u16 = 20;
const METHOD_STORE: u16 = 0;
/// General-purpose flag bit 11: the entry name is UTF-8.
const FLAG_UTF8_NAME: u16 = 1 << 11;

const CRC_TABLE: [u32; 256] = build_crc_table();

/// A file to be placed in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    /// Archive path, forward-slash separated
    pub name: String,
    /// Raw file contents
    pub data: Vec<u8>,
    /// Modification time
    pub date: DateTime<Utc>,
}

impl ZipEntry {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>, date: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            date,
        }
    }

    /// Entry stamped with a Unix millisecond timestamp.
    pub fn from_millis(
        name: impl Into<String>,
        data: impl Into<Vec<u8>>,
        timestamp_ms: i64,
    ) -> Self {
        Self::new(name, data, datetime_from_millis(timestamp_ms))
    }
}

struct PreparedEntry<'a> {
    name: &'a [u8],
    data: &'a [u8],
    flags: u16,
    crc: u32,
    dos_time: u16,
    dos_date: u16,
    size: u32,
    name_len: u16,
    offset: u32,
}

/// Encode `entries` into a store-only ZIP archive.
///
/// Entry order is preserved in both the local section and the central
/// directory. Duplicate names are written as-is. Flags stay 0 unless a name
/// has non-ASCII characters, which sets the UTF-8 name bit.
pub fn build_zip(entries: &[ZipEntry]) -> Result<Vec<u8>> {
    if let Some(index) = entries.iter().position(|entry| entry.name.is_empty()) {
        return Err(Error::Validation(format!(
            "Zip entry at index {index} is missing a name"
        )));
    }

    let entry_count = u16::try_from(entries.len()).map_err(|_| {
        Error::Validation(format!(
            "Too many zip entries ({}); at most {} are supported",
            entries.len(),
            u16::MAX
        ))
    })?;

    let mut prepared = Vec::with_capacity(entries.len());
    let mut local_size: u64 = 0;
    let mut central_size: u64 = 0;

    for entry in entries {
        let name = entry.name.as_bytes();
        let name_len = u16::try_from(name.len()).map_err(|_| {
            Error::Validation(format!("Zip entry name is too long: {}", entry.name))
        })?;
        let size = u32::try_from(entry.data.len()).map_err(|_| {
            Error::Validation(format!("Zip entry is too large: {}", entry.name))
        })?;
        let offset = to_u32_offset(local_size)?;
        let (dos_time, dos_date) = dos_date_time(&entry.date);
        let flags = if entry.name.is_ascii() {
            0
        } else {
            FLAG_UTF8_NAME
        };

        local_size += (LOCAL_HEADER_LEN + name.len() + entry.data.len()) as u64;
        central_size += (CENTRAL_HEADER_LEN + name.len()) as u64;

        prepared.push(PreparedEntry {
            name,
            data: &entry.data,
            flags,
            crc: crc32(&entry.data),
            dos_time,
            dos_date,
            size,
            name_len,
            offset,
        });
    }

    let central_offset = to_u32_offset(local_size)?;
    let central_len = to_u32_offset(central_size)?;
    let total = local_size + central_size + END_RECORD_LEN as u64;
    let total = usize::try_from(total)
        .map_err(|_| Error::Validation("Archive does not fit in memory".to_string()))?;

    let mut out = Vec::with_capacity(total);

    for entry in &prepared {
        put_u32(&mut out, LOCAL_HEADER_SIGNATURE);
        put_u16(&mut out, VERSION);
        put_u16(&mut out, entry.flags);
        put_u16(&mut out, METHOD_STORE);
        put_u16(&mut out, entry.dos_time);
        put_u16(&mut out, entry.dos_date);
        put_u32(&mut out, entry.crc);
        put_u32(&mut out, entry.size);
        put_u32(&mut out, entry.size);
        put_u16(&mut out, entry.name_len);
        put_u16(&mut out, 0);
        out.extend_from_slice(entry.name);
        out.extend_from_slice(entry.data);
    }

    for entry in &prepared {
        put_u32(&mut out, CENTRAL_HEADER_SIGNATURE);
        put_u16(&mut out, VERSION);
        put_u16(&mut out, VERSION);
        put_u16(&mut out, entry.flags);
        put_u16(&mut out, METHOD_STORE);
        put_u16(&mut out, entry.dos_time);
        put_u16(&mut out, entry.dos_date);
        put_u32(&mut out, entry.crc);
        put_u32(&mut out, entry.size);
        put_u32(&mut out, entry.size);
        put_u16(&mut out, entry.name_len);
        put_u16(&mut out, 0); // extra field length
        put_u16(&mut out, 0); // comment length
        put_u16(&mut out, 0); // disk number start
        put_u16(&mut out, 0); // internal attributes
        put_u32(&mut out, 0); // external attributes
        put_u32(&mut out, entry.offset);
        out.extend_from_slice(entry.name);
    }

    put_u32(&mut out, END_RECORD_SIGNATURE);
    put_u16(&mut out, 0);
    put_u16(&mut out, 0);
    put_u16(&mut out, entry_count);
    put_u16(&mut out, entry_count);
    put_u32(&mut out, central_len);
    put_u32(&mut out, central_offset);
    put_u16(&mut out, 0);

    debug_assert_eq!(out.len(), total);
    tracing::debug!(entries = entries.len(), bytes = out.len(), "Built zip archive");

    Ok(out)
}

/// Standard IEEE 802.3 CRC-32.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        crc = CRC_TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8);
    }
    crc ^ 0xFFFF_FFFF
}

/// Pack a timestamp into MS-DOS `(time, date)` fields.
///
/// DOS dates cover 1980-01-01 through 2107-12-31; anything outside that
/// range is clamped to the nearest bound.
pub fn dos_date_time(date: &DateTime<Utc>) -> (u16, u16) {
    let year = date.year();
    if year < 1980 {
        return (0, (1 << 5) | 1);
    }
    if year > 2107 {
        return ((23 << 11) | (59 << 5) | 29, (127 << 9) | (12 << 5) | 31);
    }

    // Every component is range-checked above or bounded by chrono.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let dos_date = (((year - 1980) as u16) << 9) | ((date.month() as u16) << 5) | date.day() as u16;
    #[allow(clippy::cast_possible_truncation)]
    let dos_time = ((date.hour() as u16) << 11)
        | ((date.minute() as u16) << 5)
        | (date.second().min(59) as u16 / 2);

    (dos_time, dos_date)
}

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        #[allow(clippy::cast_possible_truncation)]
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 == 0 {
                c >> 1
            } else {
                0xEDB8_8320 ^ (c >> 1)
            };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

fn to_u32_offset(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        Error::Validation("Archive exceeds the 4 GiB limit of the ZIP format".to_string())
    })
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn read_u16(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    fn read_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn sample_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 13, 45, 30).unwrap()
    }

    fn sample_entries() -> Vec<ZipEntry> {
        vec![
            ZipEntry::new("hello.txt", b"Hello, world!".to_vec(), sample_date()),
            ZipEntry::new("dir/empty.bin", Vec::new(), sample_date()),
            ZipEntry::new("dir/data.bin", (0u8..=255).collect::<Vec<_>>(), sample_date()),
        ]
    }

    #[test]
    fn crc32_matches_known_vectors() {
        assert_eq!(crc32(b""), 0);
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(
            crc32(b"The quick brown fox jumps over the lazy dog"),
            0x414F_A339
        );
    }

    #[test]
    fn dos_date_time_packs_fields() {
        let (time, date) = dos_date_time(&sample_date());
        assert_eq!(time, (13 << 11) | (45 << 5) | 15);
        assert_eq!(date, (44 << 9) | (3 << 5) | 15);
    }

    #[test]
    fn dos_date_time_clamps_pre_1980() {
        let (time, date) = dos_date_time(&datetime_from_millis(0));
        assert_eq!(time, 0);
        assert_eq!(date, (1 << 5) | 1);
    }

    #[test]
    fn empty_archive_is_only_end_record() {
        let bytes = build_zip(&[]).unwrap();
        assert_eq!(bytes.len(), END_RECORD_LEN);
        assert_eq!(read_u32(&bytes, 0), END_RECORD_SIGNATURE);
        assert_eq!(read_u16(&bytes, 8), 0);
        assert_eq!(read_u16(&bytes, 10), 0);
        assert_eq!(read_u32(&bytes, 12), 0);
        assert_eq!(read_u32(&bytes, 16), 0);
    }

    #[test]
    fn missing_name_is_rejected() {
        let entries = vec![
            ZipEntry::new("ok.txt", b"ok".to_vec(), sample_date()),
            ZipEntry::new("", b"nope".to_vec(), sample_date()),
        ];
        assert!(matches!(build_zip(&entries), Err(Error::Validation(_))));
    }

    #[test]
    fn archive_reads_back_with_standard_reader() {
        let entries = sample_entries();
        let bytes = build_zip(&entries).unwrap();

        let mut archive = ::zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), entries.len());

        for (index, expected) in entries.iter().enumerate() {
            let mut file = archive.by_index(index).unwrap();
            assert_eq!(file.name(), expected.name);
            assert_eq!(file.compression(), ::zip::CompressionMethod::Stored);
            assert_eq!(file.crc32(), crc32(&expected.data));

            let mut contents = Vec::new();
            file.read_to_end(&mut contents).unwrap();
            assert_eq!(contents, expected.data);
        }
    }

    #[test]
    fn headers_carry_crc_and_offsets() {
        let entries = sample_entries();
        let bytes = build_zip(&entries).unwrap();

        let local_total: usize = entries
            .iter()
            .map(|entry| LOCAL_HEADER_LEN + entry.name.len() + entry.data.len())
            .sum();
        let central_total: usize = entries
            .iter()
            .map(|entry| CENTRAL_HEADER_LEN + entry.name.len())
            .sum();
        assert_eq!(bytes.len(), local_total + central_total + END_RECORD_LEN);

        let end = bytes.len() - END_RECORD_LEN;
        assert_eq!(read_u32(&bytes, end), END_RECORD_SIGNATURE);
        assert_eq!(usize::from(read_u16(&bytes, end + 8)), entries.len());
        assert_eq!(usize::from(read_u16(&bytes, end + 10)), entries.len());
        assert_eq!(read_u32(&bytes, end + 12) as usize, central_total);
        assert_eq!(read_u32(&bytes, end + 16) as usize, local_total);

        let mut expected_offset = 0usize;
        let mut cursor = local_total;
        for entry in &entries {
            let crc = crc32(&entry.data);

            assert_eq!(read_u32(&bytes, cursor), CENTRAL_HEADER_SIGNATURE);
            assert_eq!(read_u32(&bytes, cursor + 16), crc);
            assert_eq!(read_u32(&bytes, cursor + 42) as usize, expected_offset);

            let local = expected_offset;
            assert_eq!(read_u32(&bytes, local), LOCAL_HEADER_SIGNATURE);
            assert_eq!(read_u16(&bytes, local + 4), VERSION);
            assert_eq!(read_u16(&bytes, local + 6), 0);
            assert_eq!(read_u16(&bytes, local + 8), METHOD_STORE);
            assert_eq!(read_u32(&bytes, local + 14), crc);
            assert_eq!(read_u32(&bytes, local + 18) as usize, entry.data.len());
            assert_eq!(read_u32(&bytes, local + 22) as usize, entry.data.len());
            assert_eq!(usize::from(read_u16(&bytes, local + 26)), entry.name.len());
            assert_eq!(
                &bytes[local + LOCAL_HEADER_LEN..local + LOCAL_HEADER_LEN + entry.name.len()],
                entry.name.as_bytes()
            );

            expected_offset += LOCAL_HEADER_LEN + entry.name.len() + entry.data.len();
            cursor += CENTRAL_HEADER_LEN + entry.name.len();
        }
    }

    #[test]
    fn duplicate_names_are_both_written() {
        let entries = vec![
            ZipEntry::new("same.txt", b"one".to_vec(), sample_date()),
            ZipEntry::new("same.txt", b"two".to_vec(), sample_date()),
        ];
        let bytes = build_zip(&entries).unwrap();
        let end = bytes.len() - END_RECORD_LEN;
        assert_eq!(read_u16(&bytes, end + 10), 2);
    }

    #[test]
    fn output_is_deterministic() {
        let entries = sample_entries();
        assert_eq!(build_zip(&entries).unwrap(), build_zip(&entries).unwrap());
    }

    #[test]
    fn multibyte_names_read_back_unchanged() {
        let big = (0..70_000u32).map(|n| (n % 251) as u8).collect::<Vec<_>>();
        let entries = vec![
            ZipEntry::new("未命名笔记-n1.md", "正文".as_bytes().to_vec(), sample_date()),
            ZipEntry::new("big.bin", big, sample_date()),
            ZipEntry::new("résumé/メモ.txt", b"after the big entry".to_vec(), sample_date()),
        ];
        let bytes = build_zip(&entries).unwrap();

        assert_eq!(read_u16(&bytes, 6), FLAG_UTF8_NAME);

        let mut archive = ::zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert_eq!(names.len(), 3);
        for expected in &entries {
            assert!(names.contains(&expected.name.as_str()), "{}", expected.name);
        }

        for (index, expected) in entries.iter().enumerate() {
            let mut file = archive.by_index(index).unwrap();
            assert_eq!(file.name(), expected.name);
            let mut contents = Vec::new();
            file.read_to_end(&mut contents).unwrap();
            assert_eq!(contents, expected.data);
        }
    }
}
