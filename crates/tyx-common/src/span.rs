//! Interned source positions.
//!
//! Declarations carry positions both on the wire (delta-encoded, see the
//! importer) and on AST nodes. Rather than threading `(file, line, column)`
//! triples everywhere, positions are interned into a `FileSet` and passed
//! around as lightweight `Pos` handles.

use rustc_hash::FxHashMap;
use serde::Serialize;

/// A lightweight handle to an interned source position.
/// Equality check is O(1) - just compare the u32 values.
///
/// `Pos::NONE` (0) means "no position known".
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Default)]
pub struct Pos(pub u32);

impl Pos {
    /// The absent position.
    pub const NONE: Pos = Pos(0);

    pub fn is_some(self) -> bool {
        self != Pos::NONE
    }
}

/// A resolved position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Position {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// Interns `(file, line, column)` triples into `Pos` handles.
///
/// The set is append-only: once handed out, a handle stays valid and keeps
/// resolving to the same position. Files are registered on first sight with
/// whatever extent is needed, so any `(line, column)` pair can be encoded.
///
/// The set is not synchronized; callers that import from multiple threads
/// must confine it to one of them.
#[derive(Debug)]
pub struct FileSet {
    files: Vec<String>,
    file_index: FxHashMap<String, u32>,
    positions: Vec<(u32, u32, u32)>,
    position_index: FxHashMap<(u32, u32, u32), Pos>,
}

impl FileSet {
    pub fn new() -> Self {
        FileSet {
            // slot 0 is the nameless file backing Pos::NONE
            files: vec![String::new()],
            file_index: FxHashMap::default(),
            positions: vec![(0, 0, 0)],
            position_index: FxHashMap::default(),
        }
    }

    fn file_id(&mut self, file: &str) -> u32 {
        if file.is_empty() {
            return 0;
        }
        if let Some(&id) = self.file_index.get(file) {
            return id;
        }
        let id = self.files.len() as u32;
        self.files.push(file.to_string());
        self.file_index.insert(file.to_string(), id);
        id
    }

    /// Intern a position. The same triple always yields the same handle.
    pub fn pos(&mut self, file: &str, line: u32, column: u32) -> Pos {
        let key = (self.file_id(file), line, column);
        if let Some(&p) = self.position_index.get(&key) {
            return p;
        }
        let p = Pos(self.positions.len() as u32);
        self.positions.push(key);
        self.position_index.insert(key, p);
        p
    }

    /// Resolve a handle back to its position, or `None` for `Pos::NONE`
    /// and handles from another set.
    pub fn position(&self, pos: Pos) -> Option<Position> {
        if pos == Pos::NONE {
            return None;
        }
        let &(file, line, column) = self.positions.get(pos.0 as usize)?;
        Some(Position {
            file: self.files[file as usize].clone(),
            line,
            column,
        })
    }
}

impl Default for FileSet {
    fn default() -> Self {
        FileSet::new()
    }
}
