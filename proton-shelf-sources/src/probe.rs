//! Windows executable metadata probe.
//!
//! Walks a PE image down to its `VS_VERSIONINFO` resource and pulls out the
//! `ProductName` and `FileDescription` strings. Only the structures on that
//! path are touched: DOS header, COFF header, section table, the `.rsrc`
//! resource tree, and the UTF-16 version block itself. Anything structurally
//! surprising is a parse error; the resolver treats that as "no probe data".

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::SourceError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DOS_MAGIC: [u8; 2] = *b"MZ";
const PE_SIGNATURE: [u8; 4] = *b"PE\0\0";
/// File offset of `e_lfanew`, the pointer to the PE signature.
const E_LFANEW_OFFSET: usize = 0x3C;
const DOS_HEADER_SIZE: usize = 0x40;
const SECTION_HEADER_SIZE: usize = 40;
const RSRC_NAME: &[u8; 8] = b".rsrc\0\0\0";
/// Resource type id of version information.
const RT_VERSION: u32 = 16;
/// High bit of a resource entry offset marks a subdirectory.
const SUBDIR_FLAG: u32 = 0x8000_0000;
/// Ceiling on the `.rsrc` section we are willing to read.
const MAX_RSRC_SIZE: u32 = 32 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Strings probed from an executable's version resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExeMetadata {
    pub product_name: Option<String>,
    pub file_description: Option<String>,
}

/// One parsed version-info block: header key, raw value, children region.
struct Block<'a> {
    key: String,
    value: &'a [u8],
    children: &'a [u8],
}

// ---------------------------------------------------------------------------
// PE walking
// ---------------------------------------------------------------------------

/// Probe a Windows executable on disk.
pub fn probe_exe(path: &Path) -> Result<ExeMetadata, SourceError> {
    let mut file = File::open(path)?;
    probe_reader(&mut file)
}

/// Probe an open PE image.
pub fn probe_reader<R: Read + Seek>(reader: &mut R) -> Result<ExeMetadata, SourceError> {
    let mut dos = [0u8; DOS_HEADER_SIZE];
    reader.read_exact(&mut dos).map_err(eof_as_parse)?;
    if dos[0..2] != DOS_MAGIC {
        return Err(SourceError::parse("missing MZ signature"));
    }
    let e_lfanew = u32::from_le_bytes([
        dos[E_LFANEW_OFFSET],
        dos[E_LFANEW_OFFSET + 1],
        dos[E_LFANEW_OFFSET + 2],
        dos[E_LFANEW_OFFSET + 3],
    ]);

    // PE signature plus the 20-byte COFF header.
    reader.seek(SeekFrom::Start(e_lfanew as u64))?;
    let mut coff = [0u8; 24];
    reader.read_exact(&mut coff).map_err(eof_as_parse)?;
    if coff[0..4] != PE_SIGNATURE {
        return Err(SourceError::parse("missing PE signature"));
    }
    let section_count = u16::from_le_bytes([coff[6], coff[7]]) as usize;
    let optional_size = u16::from_le_bytes([coff[20], coff[21]]);

    // The optional header's layout varies (PE32 vs PE32+); the section
    // table right after it is what locates the resources.
    reader.seek(SeekFrom::Current(optional_size as i64))?;
    let mut rsrc_section = None;
    for _ in 0..section_count {
        let mut section = [0u8; SECTION_HEADER_SIZE];
        reader.read_exact(&mut section).map_err(eof_as_parse)?;
        if &section[0..8] == RSRC_NAME {
            let virtual_address =
                u32::from_le_bytes([section[12], section[13], section[14], section[15]]);
            let raw_size = u32::from_le_bytes([section[16], section[17], section[18], section[19]]);
            let raw_pointer =
                u32::from_le_bytes([section[20], section[21], section[22], section[23]]);
            rsrc_section = Some((virtual_address, raw_size, raw_pointer));
            break;
        }
    }
    let Some((virtual_address, raw_size, raw_pointer)) = rsrc_section else {
        return Err(SourceError::parse("no .rsrc section"));
    };
    if raw_size == 0 || raw_size > MAX_RSRC_SIZE {
        return Err(SourceError::parse("resource section size out of range"));
    }

    reader.seek(SeekFrom::Start(raw_pointer as u64))?;
    let mut rsrc = vec![0u8; raw_size as usize];
    reader.read_exact(&mut rsrc).map_err(eof_as_parse)?;

    let version = find_version_data(&rsrc, virtual_address)?;
    parse_version_block(version)
}

fn eof_as_parse(err: std::io::Error) -> SourceError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        SourceError::parse("file truncated inside a header")
    } else {
        SourceError::Io(err)
    }
}

// ---------------------------------------------------------------------------
// Resource tree
// ---------------------------------------------------------------------------

/// Walk type -> name -> language down to the version resource's bytes.
///
/// Each level takes the first entry; a version resource with several
/// languages carries the same strings in each.
fn find_version_data(rsrc: &[u8], section_va: u32) -> Result<&[u8], SourceError> {
    let type_entries = dir_entries(rsrc, 0)?;
    let (_, type_offset) = type_entries
        .iter()
        .find(|(id, _)| *id == RT_VERSION)
        .ok_or_else(|| SourceError::parse("no version resource"))?;

    let name_dir = subdir_offset(*type_offset)?;
    let (_, name_offset) = *dir_entries(rsrc, name_dir)?
        .first()
        .ok_or_else(|| SourceError::parse("empty version resource directory"))?;

    let lang_dir = subdir_offset(name_offset)?;
    let (_, leaf_offset) = *dir_entries(rsrc, lang_dir)?
        .first()
        .ok_or_else(|| SourceError::parse("empty version language directory"))?;
    if leaf_offset & SUBDIR_FLAG != 0 {
        return Err(SourceError::parse("resource tree deeper than expected"));
    }

    // IMAGE_RESOURCE_DATA_ENTRY: data RVA, size, code page, reserved.
    let leaf = leaf_offset as usize;
    let raw = rsrc
        .get(leaf..leaf + 16)
        .ok_or_else(|| SourceError::parse("resource data entry out of bounds"))?;
    let rva = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
    let size = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]) as usize;

    let start = rva
        .checked_sub(section_va)
        .ok_or_else(|| SourceError::parse("version resource points outside its section"))?
        as usize;
    let end = start
        .checked_add(size)
        .ok_or_else(|| SourceError::parse("version resource size overflows"))?;
    rsrc.get(start..end)
        .ok_or_else(|| SourceError::parse("version resource out of bounds"))
}

fn subdir_offset(entry_offset: u32) -> Result<usize, SourceError> {
    if entry_offset & SUBDIR_FLAG == 0 {
        return Err(SourceError::parse("resource tree shallower than expected"));
    }
    Ok((entry_offset & !SUBDIR_FLAG) as usize)
}

/// Entries of one IMAGE_RESOURCE_DIRECTORY as (id, offset) pairs; named
/// entries come first and carry the subdirectory flag in their id field.
fn dir_entries(rsrc: &[u8], dir_offset: usize) -> Result<Vec<(u32, u32)>, SourceError> {
    let header = rsrc
        .get(dir_offset..dir_offset + 16)
        .ok_or_else(|| SourceError::parse("resource directory out of bounds"))?;
    let named = u16::from_le_bytes([header[12], header[13]]) as usize;
    let ids = u16::from_le_bytes([header[14], header[15]]) as usize;

    let mut entries = Vec::with_capacity(named + ids);
    for i in 0..named + ids {
        let offset = dir_offset + 16 + i * 8;
        let raw = rsrc
            .get(offset..offset + 8)
            .ok_or_else(|| SourceError::parse("resource entry out of bounds"))?;
        entries.push((
            u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
        ));
    }
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Version block
// ---------------------------------------------------------------------------

/// Parse a `VS_VERSIONINFO` block and collect the two strings we care
/// about from every `StringFileInfo` table.
fn parse_version_block(data: &[u8]) -> Result<ExeMetadata, SourceError> {
    let (root, _) = read_block(data)?;
    if root.key != "VS_VERSION_INFO" {
        return Err(SourceError::parse("missing VS_VERSION_INFO header"));
    }

    let mut metadata = ExeMetadata::default();
    for child in iter_blocks(root.children) {
        let child = child?;
        if child.key != "StringFileInfo" {
            continue;
        }
        for table in iter_blocks(child.children) {
            for entry in iter_blocks(table?.children) {
                let entry = entry?;
                match entry.key.as_str() {
                    "ProductName" => metadata.product_name = non_empty(utf16_text(entry.value)),
                    "FileDescription" => {
                        metadata.file_description = non_empty(utf16_text(entry.value));
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(metadata)
}

/// Decode one length-prefixed block. Returns it and the aligned byte count
/// to skip to reach the next sibling.
fn read_block(data: &[u8]) -> Result<(Block<'_>, usize), SourceError> {
    if data.len() < 6 {
        return Err(SourceError::parse("version block header truncated"));
    }
    let length = u16::from_le_bytes([data[0], data[1]]) as usize;
    let value_length = u16::from_le_bytes([data[2], data[3]]) as usize;
    let value_type = u16::from_le_bytes([data[4], data[5]]);
    if length < 6 || length > data.len() {
        return Err(SourceError::parse("version block length out of range"));
    }
    let block = &data[..length];

    let (key, key_end) = read_utf16z(&block[6..])
        .ok_or_else(|| SourceError::parse("version block key is not terminated"))?;
    let value_start = align4(6 + key_end);
    // Text values store their length in UTF-16 units, binary ones in bytes.
    let value_bytes = if value_type == 1 {
        value_length * 2
    } else {
        value_length
    };
    let value_end = value_start.saturating_add(value_bytes);
    if value_end > length {
        return Err(SourceError::parse("version block value out of range"));
    }
    let children_start = align4(value_end).min(length);

    Ok((
        Block {
            key,
            value: &block[value_start..value_end],
            children: &block[children_start..],
        },
        align4(length),
    ))
}

/// Iterate sibling blocks in a children region, skipping alignment padding.
fn iter_blocks(region: &[u8]) -> impl Iterator<Item = Result<Block<'_>, SourceError>> {
    let mut data = region;
    std::iter::from_fn(move || {
        while data.len() >= 2 && data[0] == 0 && data[1] == 0 {
            data = &data[2..];
        }
        if data.len() < 6 {
            return None;
        }
        match read_block(data) {
            Ok((block, consumed)) => {
                data = &data[consumed.min(data.len())..];
                Some(Ok(block))
            }
            Err(err) => {
                data = &[];
                Some(Err(err))
            }
        }
    })
}

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

/// Read a null-terminated UTF-16LE string; returns it and the byte length
/// consumed including the terminator.
fn read_utf16z(data: &[u8]) -> Option<(String, usize)> {
    let mut units = Vec::new();
    let mut i = 0;
    while i + 1 < data.len() {
        let unit = u16::from_le_bytes([data[i], data[i + 1]]);
        i += 2;
        if unit == 0 {
            return Some((String::from_utf16_lossy(&units), i));
        }
        units.push(unit);
    }
    None
}

/// Decode a UTF-16LE value up to its terminator.
fn utf16_text(value: &[u8]) -> String {
    let units: Vec<u16> = value
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/probe_tests.rs"]
mod tests;
