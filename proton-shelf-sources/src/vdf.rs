//! Line-based reader for Valve's KeyValues text format.
//!
//! Covers what Steam actually writes into `libraryfolders.vdf`,
//! `appmanifest_*.acf` and `localconfig.vdf`: quoted key/value pairs and
//! nested brace blocks, one element per line. Not the full KeyValues spec
//! (no conditionals, no includes).

/// A parsed VDF value: a string or a nested block.
#[derive(Debug, Clone, PartialEq)]
pub enum VdfValue {
    Str(String),
    Table(VdfTable),
}

/// An ordered key/value block. Keys repeat; lookups take the first match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VdfTable {
    entries: Vec<(String, VdfValue)>,
}

impl VdfTable {
    /// First value under `key`, compared case-insensitively; Steam's own
    /// files are inconsistent about key casing.
    pub fn get(&self, key: &str) -> Option<&VdfValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            VdfValue::Str(s) => Some(s),
            VdfValue::Table(_) => None,
        }
    }

    pub fn get_table(&self, key: &str) -> Option<&VdfTable> {
        match self.get(key)? {
            VdfValue::Table(t) => Some(t),
            VdfValue::Str(_) => None,
        }
    }

    /// Descend through nested tables along `path`.
    pub fn walk(&self, path: &[&str]) -> Option<&VdfTable> {
        let mut table = self;
        for key in path {
            table = table.get_table(key)?;
        }
        Some(table)
    }

    /// All entries in file order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &VdfValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a VDF document. Malformed lines are skipped; an unterminated block
/// attaches to its parent with what it has.
pub fn parse(src: &str) -> VdfTable {
    let mut root = VdfTable::default();
    let mut stack: Vec<(String, VdfTable)> = Vec::new();
    let mut pending_key: Option<String> = None;

    for raw in src.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if line == "{" {
            let key = pending_key.take().unwrap_or_default();
            stack.push((key, VdfTable::default()));
            continue;
        }
        if line == "}" {
            if let Some((key, table)) = stack.pop() {
                target(&mut root, &mut stack).entries.push((key, VdfValue::Table(table)));
            }
            continue;
        }
        if let Some((key, value)) = kv_pair(line) {
            pending_key = None;
            target(&mut root, &mut stack)
                .entries
                .push((key, VdfValue::Str(value)));
            continue;
        }
        if let Some(key) = lone_key(line) {
            pending_key = Some(key);
        }
    }

    while let Some((key, table)) = stack.pop() {
        target(&mut root, &mut stack).entries.push((key, VdfValue::Table(table)));
    }
    root
}

fn target<'a>(root: &'a mut VdfTable, stack: &'a mut [(String, VdfTable)]) -> &'a mut VdfTable {
    match stack.last_mut() {
        Some((_, table)) => table,
        None => root,
    }
}

/// Take one quoted token off the front of `s`, resolving `\"` and `\\`.
/// Returns the token and the remainder after the closing quote.
fn split_quoted(s: &str) -> Option<(String, &str)> {
    let body = s.strip_prefix('"')?;
    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((_, next)) = chars.next() {
                    out.push(next);
                }
            }
            '"' => return Some((out, &body[i + 1..])),
            _ => out.push(c),
        }
    }
    None
}

fn kv_pair(line: &str) -> Option<(String, String)> {
    let (key, rest) = split_quoted(line)?;
    let (value, _) = split_quoted(rest.trim_start())?;
    Some((key, value))
}

fn lone_key(line: &str) -> Option<String> {
    let (key, rest) = split_quoted(line)?;
    rest.trim().is_empty().then_some(key)
}
