use std::collections::HashMap;
use std::error::Error;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::catalog::index::{Posting, SongEntry};
use crate::fingerprinting::hashing::Fingerprint;

/// Magic number at the start of a serialized inverted index ("SPdb")
const INDEX_MAGIC: u32 = 0x5350_6462;

/// Current version of the index layout
const INDEX_VERSION: u8 = 1;

/// Derive the registry artifact path from the index base path.
///
/// The registry always lives next to the index, named after its stem:
/// `catalog.db` pairs with `catalog_song_list.json`.
pub fn song_list_path(index_path: &Path) -> PathBuf {
    let stem = index_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalog".to_string());

    index_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(format!("{}_song_list.json", stem))
}

/// Serialize the inverted index to its little-endian binary layout.
///
/// Layout: magic (u32), version (u8), CRC-32 of the payload (u32), then the
/// payload itself: an entry count (u32) followed by, per entry, the hash
/// triple (3 x u16), a posting count (u32) and the postings (u32 song id,
/// u16 anchor frame).
pub fn encode_index(
    pair_mapping: &HashMap<Fingerprint, Vec<Posting>>,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut payload: Vec<u8> = Vec::new();

    payload.write_u32::<LittleEndian>(pair_mapping.len() as u32)?;

    for (fingerprint, postings) in pair_mapping {
        payload.write_u16::<LittleEndian>(fingerprint.freq_anchor)?;
        payload.write_u16::<LittleEndian>(fingerprint.freq_target)?;
        payload.write_u16::<LittleEndian>(fingerprint.time_delta)?;

        payload.write_u32::<LittleEndian>(postings.len() as u32)?;
        for posting in postings {
            payload.write_u32::<LittleEndian>(posting.song_id)?;
            payload.write_u16::<LittleEndian>(posting.time)?;
        }
    }

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&payload);
    let checksum = hasher.finalize();

    let mut buffer: Vec<u8> = Vec::with_capacity(payload.len() + 9);
    buffer.write_u32::<LittleEndian>(INDEX_MAGIC)?;
    buffer.write_u8(INDEX_VERSION)?;
    buffer.write_u32::<LittleEndian>(checksum)?;
    buffer.extend_from_slice(&payload);

    Ok(buffer)
}

/// Decode a serialized inverted index, verifying magic, version and checksum.
pub fn decode_index(
    buffer: &[u8],
) -> Result<HashMap<Fingerprint, Vec<Posting>>, Box<dyn Error>> {
    let mut cursor = Cursor::new(buffer);

    let magic = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| "index file is truncated")?;
    if magic != INDEX_MAGIC {
        return Err("not a song catalog index file (bad magic number)".into());
    }

    let version = cursor.read_u8()?;
    if version != INDEX_VERSION {
        return Err(format!("unsupported index version: {}", version).into());
    }

    let expected_checksum = cursor.read_u32::<LittleEndian>()?;
    let payload = &buffer[cursor.position() as usize..];

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(payload);
    if hasher.finalize() != expected_checksum {
        return Err("index file is corrupt (checksum mismatch)".into());
    }

    let mut pair_mapping = HashMap::new();
    let entry_count = cursor.read_u32::<LittleEndian>()?;

    for _ in 0..entry_count {
        let fingerprint = Fingerprint {
            freq_anchor: cursor.read_u16::<LittleEndian>()?,
            freq_target: cursor.read_u16::<LittleEndian>()?,
            time_delta: cursor.read_u16::<LittleEndian>()?,
        };

        let posting_count = cursor.read_u32::<LittleEndian>()?;
        let mut postings = Vec::with_capacity(posting_count as usize);
        for _ in 0..posting_count {
            postings.push(Posting {
                song_id: cursor.read_u32::<LittleEndian>()?,
                time: cursor.read_u16::<LittleEndian>()?,
            });
        }

        pair_mapping.insert(fingerprint, postings);
    }

    Ok(pair_mapping)
}

/// Serialize the song registry. Tombstoned slots are kept as explicit nulls
/// so registry positions stay aligned with the song ids in the index.
pub fn encode_registry(song_list: &[Option<SongEntry>]) -> Result<Vec<u8>, Box<dyn Error>> {
    Ok(serde_json::to_vec(song_list)?)
}

/// Decode a serialized song registry; any shape other than a list of
/// nullable entries is a corruption error.
pub fn decode_registry(buffer: &[u8]) -> Result<Vec<Option<SongEntry>>, Box<dyn Error>> {
    let song_list: Vec<Option<SongEntry>> = serde_json::from_slice(buffer)
        .map_err(|e| format!("song registry is corrupt: {}", e))?;
    Ok(song_list)
}
