use std::io::Cursor;

use super::*;

// ---- Fixture builders ----

fn utf16z(text: &str) -> Vec<u8> {
    text.encode_utf16().chain([0]).flat_map(u16::to_le_bytes).collect()
}

fn pad4(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

/// Length-prefixed version block with a UTF-16 text value (wType = 1).
fn block(key: &str, text_value: Option<&str>, children: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = vec![0u8; 6];
    buf.extend_from_slice(&utf16z(key));
    pad4(&mut buf);
    let value_words = match text_value {
        Some(text) => {
            let value = utf16z(text);
            buf.extend_from_slice(&value);
            (value.len() / 2) as u16
        }
        None => 0,
    };
    for child in children {
        pad4(&mut buf);
        buf.extend_from_slice(child);
    }
    let length = buf.len() as u16;
    buf[0..2].copy_from_slice(&length.to_le_bytes());
    buf[2..4].copy_from_slice(&value_words.to_le_bytes());
    buf[4..6].copy_from_slice(&1u16.to_le_bytes());
    buf
}

/// Root block carrying a zeroed VS_FIXEDFILEINFO binary value (wType = 0).
fn root_with_fixed_info(children: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = vec![0u8; 6];
    buf.extend_from_slice(&utf16z("VS_VERSION_INFO"));
    pad4(&mut buf);
    buf.extend_from_slice(&[0u8; 52]);
    for child in children {
        pad4(&mut buf);
        buf.extend_from_slice(child);
    }
    let length = buf.len() as u16;
    buf[0..2].copy_from_slice(&length.to_le_bytes());
    buf[2..4].copy_from_slice(&52u16.to_le_bytes());
    buf
}

fn version_info(entries: &[(&str, &str)]) -> Vec<u8> {
    let strings: Vec<Vec<u8>> = entries
        .iter()
        .map(|(key, value)| block(key, Some(value), &[]))
        .collect();
    let table = block("040904b0", None, &strings);
    let string_file_info = block("StringFileInfo", None, &[table]);
    block("VS_VERSION_INFO", None, &[string_file_info])
}

fn write_dir(rsrc: &mut [u8], offset: usize, id: u32, target: u32) {
    rsrc[offset + 14..offset + 16].copy_from_slice(&1u16.to_le_bytes());
    rsrc[offset + 16..offset + 20].copy_from_slice(&id.to_le_bytes());
    rsrc[offset + 20..offset + 24].copy_from_slice(&target.to_le_bytes());
}

const RSRC_VA: u32 = 0x1000;

/// Resource section with a single entry of the given type id leading to
/// the version block.
fn rsrc_section(type_id: u32, version_block: &[u8]) -> Vec<u8> {
    let mut rsrc = vec![0u8; 0x58];
    write_dir(&mut rsrc, 0x00, type_id, SUBDIR_FLAG | 0x18);
    write_dir(&mut rsrc, 0x18, 0, SUBDIR_FLAG | 0x30);
    write_dir(&mut rsrc, 0x30, 0x0409, 0x48);
    rsrc[0x48..0x4C].copy_from_slice(&(RSRC_VA + 0x58).to_le_bytes());
    rsrc[0x4C..0x50].copy_from_slice(&(version_block.len() as u32).to_le_bytes());
    rsrc.extend_from_slice(version_block);
    rsrc
}

/// Minimal PE image: DOS header, COFF header, one section at file
/// offset 0x200.
fn make_image(section_name: &[u8; 8], section_data: &[u8]) -> Vec<u8> {
    let mut image = vec![0u8; DOS_HEADER_SIZE];
    image[0..2].copy_from_slice(&DOS_MAGIC);
    image[E_LFANEW_OFFSET..E_LFANEW_OFFSET + 4]
        .copy_from_slice(&(DOS_HEADER_SIZE as u32).to_le_bytes());

    image.extend_from_slice(&PE_SIGNATURE);
    let mut coff = [0u8; 20];
    coff[2..4].copy_from_slice(&1u16.to_le_bytes());
    image.extend_from_slice(&coff);

    let mut section = [0u8; SECTION_HEADER_SIZE];
    section[0..8].copy_from_slice(section_name);
    section[12..16].copy_from_slice(&RSRC_VA.to_le_bytes());
    section[16..20].copy_from_slice(&(section_data.len() as u32).to_le_bytes());
    section[20..24].copy_from_slice(&0x200u32.to_le_bytes());
    image.extend_from_slice(&section);

    image.resize(0x200, 0);
    image.extend_from_slice(section_data);
    image
}

fn make_exe(entries: &[(&str, &str)]) -> Vec<u8> {
    make_image(RSRC_NAME, &rsrc_section(RT_VERSION, &version_info(entries)))
}

// ---- Tests ----

#[test]
fn test_probe_reads_product_strings() {
    let image = make_exe(&[
        ("ProductName", "Half-Life 2"),
        ("FileDescription", "Half-Life 2 launcher"),
        ("CompanyName", "Valve"),
    ]);
    let metadata = probe_reader(&mut Cursor::new(image)).unwrap();
    assert_eq!(metadata.product_name.as_deref(), Some("Half-Life 2"));
    assert_eq!(
        metadata.file_description.as_deref(),
        Some("Half-Life 2 launcher")
    );
}

#[test]
fn test_probe_missing_fields_are_none() {
    let image = make_exe(&[("CompanyName", "Valve")]);
    let metadata = probe_reader(&mut Cursor::new(image)).unwrap();
    assert_eq!(metadata.product_name, None);
    assert_eq!(metadata.file_description, None);
}

#[test]
fn test_probe_blank_value_is_none() {
    let image = make_exe(&[("ProductName", "   ")]);
    let metadata = probe_reader(&mut Cursor::new(image)).unwrap();
    assert_eq!(metadata.product_name, None);
}

#[test]
fn test_probe_decodes_non_ascii_strings() {
    let image = make_exe(&[("ProductName", "Café Noir™")]);
    let metadata = probe_reader(&mut Cursor::new(image)).unwrap();
    assert_eq!(metadata.product_name.as_deref(), Some("Café Noir™"));
}

#[test]
fn test_probe_skips_fixed_file_info_value() {
    let table = block("040904b0", None, &[block("ProductName", Some("Portal"), &[])]);
    let string_file_info = block("StringFileInfo", None, &[table]);
    let root = root_with_fixed_info(&[string_file_info]);
    let image = make_image(RSRC_NAME, &rsrc_section(RT_VERSION, &root));

    let metadata = probe_reader(&mut Cursor::new(image)).unwrap();
    assert_eq!(metadata.product_name.as_deref(), Some("Portal"));
}

#[test]
fn test_probe_rejects_junk() {
    let mut junk = Cursor::new(b"this is not an executable at all, not even close".to_vec());
    assert!(matches!(
        probe_reader(&mut junk),
        Err(SourceError::Parse(_))
    ));

    let mut empty = Cursor::new(Vec::new());
    assert!(matches!(
        probe_reader(&mut empty),
        Err(SourceError::Parse(_))
    ));
}

#[test]
fn test_probe_rejects_image_without_rsrc() {
    let image = make_image(b".text\0\0\0", &rsrc_section(RT_VERSION, &version_info(&[])));
    let err = probe_reader(&mut Cursor::new(image)).unwrap_err();
    assert!(err.to_string().contains(".rsrc"));
}

#[test]
fn test_probe_rejects_missing_version_resource() {
    // Icon resources only, no RT_VERSION entry.
    let image = make_image(RSRC_NAME, &rsrc_section(3, &version_info(&[])));
    let err = probe_reader(&mut Cursor::new(image)).unwrap_err();
    assert!(err.to_string().contains("version resource"));
}

#[test]
fn test_version_block_rejects_wrong_root_key() {
    let bogus = block("NOT_VERSION_INFO", None, &[]);
    assert!(parse_version_block(&bogus).is_err());
}

#[test]
fn test_version_block_rejects_truncated_header() {
    assert!(parse_version_block(&[0x10, 0x00, 0x00]).is_err());
}

#[test]
fn test_probe_exe_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("game.exe");
    std::fs::write(&path, make_exe(&[("ProductName", "Stray")])).unwrap();

    let metadata = probe_exe(&path).unwrap();
    assert_eq!(metadata.product_name.as_deref(), Some("Stray"));
}
