//! Structural type validity.
//!
//! Distinct from the colour-based cycle detection: a defined-type cycle
//! may be legal for the resolver yet still describe a type of infinite
//! size. This walk follows only the constructors whose size depends on
//! their element - array elements, struct fields, interface embeds, and
//! named-type expansion. Pointers, slices, maps, channels, and signatures
//! break the cycle.

use crate::checker::Checker;
use tyx_types::{NamedInfo, ObjectId, TypeData, TypeId};

impl Checker<'_> {
    /// Verify that `t` does not expand infinitely. Named types are marked
    /// while their expansion is walked; meeting a marked node again is a
    /// cycle, reported from its first occurrence on the path.
    pub(crate) fn valid_type(&mut self, t: TypeId, path: &mut Vec<ObjectId>) -> NamedInfo {
        match self.uni.types.get(t).clone() {
            TypeData::Array { elem, .. } => self.valid_type(elem, path),

            TypeData::Struct { fields, .. } => {
                for f in &fields {
                    if self.valid_type(f.typ, path) == NamedInfo::Invalid {
                        return NamedInfo::Invalid;
                    }
                }
                NamedInfo::Valid
            }

            TypeData::Interface(iface) => {
                for &e in &iface.embeddeds {
                    if self.valid_type(e, path) == NamedInfo::Invalid {
                        return NamedInfo::Invalid;
                    }
                }
                NamedInfo::Valid
            }

            TypeData::Named(n) => {
                // types from another package were validated with it
                if self.uni.objects.get(n.obj).pkg != self.pkg {
                    return NamedInfo::Valid;
                }

                // don't pile a second error onto a known-bad type
                if n.underlying == Some(TypeId::INVALID) {
                    self.uni.types.named_mut(t).info = NamedInfo::Invalid;
                    return NamedInfo::Invalid;
                }

                match n.info {
                    NamedInfo::Unknown => {
                        self.uni.types.named_mut(t).info = NamedInfo::Marked;
                        path.push(n.obj);
                        let info = match n.from_rhs {
                            Some(rhs) => self.valid_type(rhs, path),
                            None => NamedInfo::Valid,
                        };
                        path.pop();
                        self.uni.types.named_mut(t).info = info;
                        if info == NamedInfo::Invalid {
                            self.uni.types.named_mut(t).underlying = Some(TypeId::INVALID);
                        }
                    }
                    NamedInfo::Marked => {
                        // cycle: report it from where it started
                        match path.iter().position(|&o| o == n.obj) {
                            Some(i) => {
                                let cycle = path[i..].to_vec();
                                self.report_cycle(&cycle);
                            }
                            None => debug_assert!(false, "cycle start not found"),
                        }
                        self.uni.types.named_mut(t).info = NamedInfo::Invalid;
                        self.uni.types.named_mut(t).underlying = Some(TypeId::INVALID);
                    }
                    NamedInfo::Valid | NamedInfo::Invalid => {}
                }
                self.uni.types.named(t).info
            }

            // indirection: size does not depend on the element
            _ => NamedInfo::Valid,
        }
    }
}
