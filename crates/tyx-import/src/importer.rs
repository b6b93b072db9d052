//! The import driver.
//!
//! Export data is a version header followed by two pools: interned
//! strings, then declarations. Declarations are addressed by byte offset
//! and materialised lazily; the driver walks the local package's name
//! index in sorted order so that decoding is deterministic, then finishes
//! the deferred work (interface completion, import list attachment).

use crate::decode::DeclState;
use crate::error::{consistency_err, format_err, ImportError};
use crate::reader::DeclReader;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;
use tyx_common::FileSet;
use tyx_types::{Package, PackageId, TypeId, Universe};

/// Versions of the export data format.
///
/// The generics extensions shipped under the same number as the
/// column-position revision; feature gating therefore keys on
/// `Importer::allow_generics` rather than on the raw version.
pub const VERSION_INITIAL: u64 = 0;
pub const VERSION_POS_COL: u64 = 1;
pub const VERSION_GENERICS: u64 = VERSION_POS_COL;
pub const VERSION_CURRENT: u64 = VERSION_GENERICS;

/// Offsets below this index the predeclared types instead of the
/// declaration pool.
pub const PREDECL_RESERVED: u64 = 32;

/// Caller-maintained table of already-imported packages, keyed by path.
pub type ImportMap = FxHashMap<String, PackageId>;

pub(crate) struct Importer<'a> {
    pub(crate) uni: &'a mut Universe,
    pub(crate) fset: &'a mut FileSet,
    pub(crate) imports: &'a mut ImportMap,
    pub(crate) path: String,
    pub(crate) version: u64,
    pub(crate) allow_generics: bool,

    pub(crate) string_data: Arc<[u8]>,
    pub(crate) decl_data: Arc<[u8]>,

    pub(crate) string_cache: FxHashMap<u64, String>,
    pub(crate) pkg_cache: FxHashMap<u64, PackageId>,
    pub(crate) pkg_index: FxHashMap<PackageId, FxHashMap<String, u64>>,
    pub(crate) typ_cache: FxHashMap<u64, TypeId>,
    /// Type parameters in flight or done, keyed by (package name, full
    /// name including subscript).
    pub(crate) tparam_index: FxHashMap<(String, String), TypeId>,
    /// Interfaces to finalise once no recursive decode can add methods.
    pub(crate) interface_list: Vec<TypeId>,
}

/// Import a package from serialized export data.
///
/// `imports` maps already-known package paths to their handles; packages
/// referenced by the data are reused from it or created into it. The
/// returned id is the local (first) package of the data, fully populated
/// and marked complete.
pub fn import_package(
    uni: &mut Universe,
    fset: &mut FileSet,
    imports: &mut ImportMap,
    data: &[u8],
    path: &str,
) -> Result<PackageId, ImportError> {
    let whole: Arc<[u8]> = Arc::from(data);
    let mut r = DeclReader::new(whole.clone(), 0);

    let version = r.read_uvarint()?;
    match version {
        VERSION_INITIAL | VERSION_POS_COL => {}
        v if v > VERSION_CURRENT => return Err(ImportError::NewerVersion(v)),
        v => return Err(ImportError::UnknownVersion(v)),
    }

    let s_len = r.read_uvarint()? as usize;
    let d_len = r.read_uvarint()? as usize;
    let start = r.offset();
    let need = s_len
        .checked_add(d_len)
        .ok_or_else(|| format_err("pool lengths overflow"))?;
    if whole.len() - start < need {
        return Err(format_err(format!(
            "cannot read {} bytes of string and declaration data",
            need
        )));
    }
    let string_data: Arc<[u8]> = Arc::from(&whole[start..start + s_len]);
    let decl_data: Arc<[u8]> = Arc::from(&whole[start + s_len..start + s_len + d_len]);

    let mut imp = Importer {
        uni,
        fset,
        imports,
        path: path.to_string(),
        version,
        allow_generics: version >= VERSION_GENERICS,
        string_data,
        decl_data,
        string_cache: FxHashMap::default(),
        pkg_cache: FxHashMap::default(),
        pkg_index: FxHashMap::default(),
        typ_cache: FxHashMap::default(),
        tparam_index: FxHashMap::default(),
        interface_list: Vec::new(),
    };

    // predeclared types occupy the reserved low offsets
    for i in 0..TypeId::NUM_PREDECLARED {
        imp.typ_cache.insert(u64::from(i), TypeId(i));
    }

    imp.run()
}

impl Importer<'_> {
    fn run(&mut self) -> Result<PackageId, ImportError> {
        let mut r = DeclReader::new(self.decl_data.clone(), 0);

        let pkg_count = r.read_uvarint()?;
        let mut pkg_list = Vec::with_capacity(pkg_count as usize);
        for _ in 0..pkg_count {
            let path_off = r.read_uvarint()?;
            let pkg_path = self.string_at(path_off)?;
            let name_off = r.read_uvarint()?;
            let pkg_name = self.string_at(name_off)?;
            let _height = r.read_uvarint()?;

            let pkg_path = if pkg_path.is_empty() {
                self.path.clone()
            } else {
                pkg_path
            };
            let pkg = match self.imports.get(&pkg_path) {
                Some(&p) => {
                    let known = &self.uni.packages.get(p).name;
                    if *known != pkg_name {
                        return Err(consistency_err(format!(
                            "conflicting names {} and {} for package {:?}",
                            known, pkg_name, pkg_path
                        )));
                    }
                    p
                }
                None => {
                    let p = self
                        .uni
                        .packages
                        .alloc(Package::new(pkg_path.clone(), pkg_name.clone()));
                    self.imports.insert(pkg_path.clone(), p);
                    p
                }
            };
            self.pkg_cache.insert(path_off, pkg);

            let n_syms = r.read_uvarint()?;
            let mut name_index = FxHashMap::default();
            for _ in 0..n_syms {
                let name_off = r.read_uvarint()?;
                let name = self.string_at(name_off)?;
                let decl_off = r.read_uvarint()?;
                name_index.insert(name, decl_off);
            }
            self.pkg_index.insert(pkg, name_index);
            pkg_list.push(pkg);
        }

        let local = *pkg_list
            .first()
            .ok_or_else(|| format_err("export data has no packages"))?;
        debug!(path = %self.path, packages = pkg_list.len(), "importing package");

        // Sorted order makes decoding deterministic; type parameter
        // numbering depends on encounter order.
        let mut names: Vec<String> = self.pkg_index[&local].keys().cloned().collect();
        names.sort();
        for name in &names {
            self.do_decl(local, name)?;
        }

        for t in std::mem::take(&mut self.interface_list) {
            self.uni.complete_interface(t);
        }

        let mut import_list = pkg_list[1..].to_vec();
        import_list.sort_by(|&a, &b| {
            self.uni
                .packages
                .get(a)
                .path
                .cmp(&self.uni.packages.get(b).path)
        });
        let local_pkg = self.uni.packages.get_mut(local);
        local_pkg.imports = import_list;
        local_pkg.complete = true;
        Ok(local)
    }

    /// Decode the named declaration of `pkg` unless it is already present
    /// in its scope. Idempotent.
    pub(crate) fn do_decl(&mut self, pkg: PackageId, name: &str) -> Result<(), ImportError> {
        if self.uni.lookup(pkg, name).is_some() {
            return Ok(());
        }
        let off = *self
            .pkg_index
            .get(&pkg)
            .and_then(|index| index.get(name))
            .ok_or_else(|| {
                consistency_err(format!(
                    "{}.{} not in index",
                    self.uni.packages.get(pkg).path,
                    name
                ))
            })?;
        debug!(name, off, "decoding declaration");
        let mut st = DeclState::new(
            DeclReader::new(self.decl_data.clone(), off as usize),
            Some(pkg),
        );
        self.decode_obj(&mut st, name)
    }

    /// Resolve a string pool offset, memoised.
    pub(crate) fn string_at(&mut self, off: u64) -> Result<String, ImportError> {
        if let Some(s) = self.string_cache.get(&off) {
            return Ok(s.clone());
        }
        let mut r = DeclReader::new(self.string_data.clone(), off as usize);
        let len = r.read_uvarint()?;
        let bytes = r.read_bytes(len as usize)?;
        let s = String::from_utf8(bytes)
            .map_err(|_| format_err(format!("string at offset {off} is not valid UTF-8")))?;
        self.string_cache.insert(off, s.clone());
        Ok(s)
    }

    /// Resolve a package by the string pool offset of its path. Every
    /// package must have been introduced by the package list prefix.
    pub(crate) fn pkg_at(&mut self, off: u64) -> Result<PackageId, ImportError> {
        if let Some(&pkg) = self.pkg_cache.get(&off) {
            return Ok(pkg);
        }
        let path = self.string_at(off)?;
        Err(consistency_err(format!(
            "missing package {:?} in {:?}",
            path, self.path
        )))
    }

    /// Materialise the type at `off`, caching by offset.
    ///
    /// An interface decoded with a non-null `base` is never cached (and a
    /// cached interface is not reused for such a request): its methods
    /// carry a synthetic receiver of type `base`, which must not leak to
    /// other use sites.
    pub(crate) fn typ_at(
        &mut self,
        off: u64,
        base: Option<TypeId>,
    ) -> Result<TypeId, ImportError> {
        if let Some(&t) = self.typ_cache.get(&off) {
            if base.is_none() || !self.uni.types.is_interface(t) {
                return Ok(t);
            }
        }
        if off < PREDECL_RESERVED {
            return Err(consistency_err(format!(
                "predeclared type missing from cache: {off}"
            )));
        }
        let mut st = DeclState::new(
            DeclReader::new(self.decl_data.clone(), (off - PREDECL_RESERVED) as usize),
            None,
        );
        let t = self.do_type(&mut st, base)?;
        if base.is_none() || !self.uni.types.is_interface(t) {
            self.typ_cache.insert(off, t);
        }
        Ok(t)
    }
}
