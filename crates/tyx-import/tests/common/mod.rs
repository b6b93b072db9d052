//! Test builder for export data.
//!
//! Assembles wire images the importer consumes: a string pool, the
//! package-list prefix, and declaration records addressed by offset.
//! Offsets that point at declarations are emitted in a padded four-byte
//! varint form so record sizes do not depend on the final layout; the
//! importer accepts non-canonical varints, like any LEB128 reader.

use std::collections::HashMap;
use tyx_import::reader::{write_uvarint, write_varint};

/// One token of a declaration record.
#[derive(Clone, Debug)]
pub enum Tok {
    /// Canonical unsigned varint.
    U(u64),
    /// Signed (zigzag) varint.
    V(i64),
    /// A raw byte (declaration tags).
    B(u8),
    /// Raw bytes (pre-encoded constant payloads).
    Raw(Vec<u8>),
    /// Reference to a declaration by builder index: its type offset
    /// (decl-pool offset shifted past the predeclared block).
    T(usize),
}

const PREDECL_RESERVED: u64 = 32;
const PADDED_LEN: usize = 4;

pub struct PkgEntry {
    pub path: String,
    pub name: String,
    pub syms: Vec<(String, usize)>,
}

pub struct ExportBuilder {
    version: u64,
    strings: Vec<u8>,
    string_index: HashMap<String, u64>,
    pkgs: Vec<PkgEntry>,
    decls: Vec<Vec<Tok>>,
}

impl ExportBuilder {
    pub fn new() -> ExportBuilder {
        ExportBuilder {
            version: 1,
            strings: Vec::new(),
            string_index: HashMap::new(),
            pkgs: Vec::new(),
            decls: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: u64) -> ExportBuilder {
        self.version = version;
        self
    }

    /// Intern a string, returning its pool offset.
    pub fn str_off(&mut self, s: &str) -> u64 {
        if let Some(&off) = self.string_index.get(s) {
            return off;
        }
        let off = self.strings.len() as u64;
        write_uvarint(&mut self.strings, s.len() as u64);
        self.strings.extend_from_slice(s.as_bytes());
        self.string_index.insert(s.to_string(), off);
        off
    }

    /// A string-pool reference token.
    pub fn s(&mut self, s: &str) -> Tok {
        Tok::U(self.str_off(s))
    }

    /// Register a package. The first registered package is the local one.
    pub fn add_pkg(&mut self, path: &str, name: &str) -> usize {
        self.str_off(path);
        self.str_off(name);
        self.pkgs.push(PkgEntry {
            path: path.to_string(),
            name: name.to_string(),
            syms: Vec::new(),
        });
        self.pkgs.len() - 1
    }

    /// Add a declaration record; the returned index is referenced by
    /// `Tok::T` and by symbol entries.
    pub fn add_decl(&mut self, toks: Vec<Tok>) -> usize {
        self.decls.push(toks);
        self.decls.len() - 1
    }

    /// Expose a declaration under a name in a package's symbol index.
    pub fn add_sym(&mut self, pkg: usize, name: &str, decl: usize) {
        self.str_off(name);
        self.pkgs[pkg].syms.push((name.to_string(), decl));
    }

    pub fn finish(&self) -> Vec<u8> {
        // prefix: package list with padded declaration offsets
        let mut prefix_len = uvarint_len(self.pkgs.len() as u64);
        for p in &self.pkgs {
            prefix_len += uvarint_len(self.string_index[&p.path]);
            prefix_len += uvarint_len(self.string_index[&p.name]);
            prefix_len += uvarint_len(0); // height
            prefix_len += uvarint_len(p.syms.len() as u64);
            for (name, _) in &p.syms {
                prefix_len += uvarint_len(self.string_index[name]);
                prefix_len += PADDED_LEN;
            }
        }

        let mut offsets = Vec::with_capacity(self.decls.len());
        let mut pos = prefix_len as u64;
        for d in &self.decls {
            offsets.push(pos);
            pos += toks_len(d);
        }

        let mut decl_pool = Vec::new();
        write_uvarint(&mut decl_pool, self.pkgs.len() as u64);
        for p in &self.pkgs {
            write_uvarint(&mut decl_pool, self.string_index[&p.path]);
            write_uvarint(&mut decl_pool, self.string_index[&p.name]);
            write_uvarint(&mut decl_pool, 0);
            write_uvarint(&mut decl_pool, p.syms.len() as u64);
            for (name, decl) in &p.syms {
                write_uvarint(&mut decl_pool, self.string_index[name]);
                write_padded_uvarint(&mut decl_pool, offsets[*decl]);
            }
        }
        assert_eq!(decl_pool.len(), prefix_len, "prefix layout drifted");
        for d in &self.decls {
            emit_toks(&mut decl_pool, d, &offsets);
        }

        let mut out = Vec::new();
        write_uvarint(&mut out, self.version);
        write_uvarint(&mut out, self.strings.len() as u64);
        write_uvarint(&mut out, decl_pool.len() as u64);
        out.extend_from_slice(&self.strings);
        out.extend_from_slice(&decl_pool);
        out
    }
}

fn uvarint_len(v: u64) -> usize {
    let mut buf = Vec::new();
    write_uvarint(&mut buf, v);
    buf.len()
}

fn varint_len(v: i64) -> usize {
    let mut buf = Vec::new();
    write_varint(&mut buf, v);
    buf.len()
}

fn toks_len(toks: &[Tok]) -> u64 {
    toks.iter()
        .map(|t| match t {
            Tok::U(v) => uvarint_len(*v),
            Tok::V(v) => varint_len(*v),
            Tok::B(_) => 1,
            Tok::Raw(bytes) => bytes.len(),
            Tok::T(_) => PADDED_LEN,
        })
        .sum::<usize>() as u64
}

fn emit_toks(out: &mut Vec<u8>, toks: &[Tok], offsets: &[u64]) {
    for t in toks {
        match t {
            Tok::U(v) => write_uvarint(out, *v),
            Tok::V(v) => write_varint(out, *v),
            Tok::B(b) => out.push(*b),
            Tok::Raw(bytes) => out.extend_from_slice(bytes),
            Tok::T(i) => write_padded_uvarint(out, offsets[*i] + PREDECL_RESERVED),
        }
    }
}

/// Emit a value in exactly four LEB128 bytes (values below 2^28).
fn write_padded_uvarint(out: &mut Vec<u8>, v: u64) {
    assert!(v < 1 << 28, "offset too large for padded encoding");
    out.push((v & 0x7f) as u8 | 0x80);
    out.push(((v >> 7) & 0x7f) as u8 | 0x80);
    out.push(((v >> 14) & 0x7f) as u8 | 0x80);
    out.push(((v >> 21) & 0x7f) as u8);
}

// ----- constant payload encoders ------------------------------------

/// Encode an integer in the width-dependent small/large scheme.
pub fn mpint(out: &mut Vec<u8>, neg: bool, mag: &[u8], signed: bool, max_bytes: u32) {
    assert!(!(!signed && neg), "negative unsigned constant");
    let mag = {
        let start = mag.iter().position(|&b| b != 0).unwrap_or(mag.len());
        &mag[start..]
    };
    assert!(mag.len() as u32 <= max_bytes, "magnitude too wide");

    let mut max_small: u32 = 256 - max_bytes;
    if signed {
        max_small = 256 - 2 * max_bytes;
    }
    if max_bytes == 1 {
        max_small = 256;
    }

    if mag.len() <= 1 {
        let mut ux: u32 = mag.first().copied().map_or(0, u32::from);
        if signed {
            ux <<= 1;
            if neg {
                ux -= 1;
            }
        }
        if ux < max_small {
            out.push(ux as u8);
            return;
        }
    }

    let mut n: u32 = 256 - mag.len() as u32;
    if signed {
        n = 256 - 2 * mag.len() as u32;
        if neg {
            n |= 1;
        }
    }
    assert!(n >= max_small && n < 256, "magnitude encoding out of range");
    out.push(n as u8);
    out.extend_from_slice(mag);
}

/// Encode an i64 with the scheme of `mpint`.
pub fn mpint_i64(out: &mut Vec<u8>, v: i64, signed: bool, max_bytes: u32) {
    let neg = v < 0;
    let mag = (v as i128).unsigned_abs().to_be_bytes();
    mpint(out, neg, &mag[8..], signed, max_bytes);
}

/// Encode a float as mantissa and, when non-zero, a binary exponent.
pub fn mpfloat(out: &mut Vec<u8>, mant: i64, exp: i64, max_bytes: u32) {
    mpint_i64(out, mant, true, max_bytes);
    if mant != 0 {
        write_varint(out, exp);
    }
}
