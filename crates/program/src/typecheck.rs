//! Type relations over a checked [`Program`]: underlying types, method
//! sets with embedding promotion, and interface satisfaction.

use crate::model::{FuncId, FuncKind, Object, Program, TypeId, TypeRef, Underlying};
use std::collections::{BTreeMap, HashSet};

/// Upper bound on `type A B` chains followed when computing underlying types
const MAX_UNDERLYING_HOPS: usize = 16;

impl Program {
    /// Underlying type of a named type, following defined-type chains
    pub fn underlying(&self, id: TypeId) -> &Underlying {
        let mut current = id;
        for _ in 0..MAX_UNDERLYING_HOPS {
            match &self.named(current).underlying {
                Underlying::Other(TypeRef::Named(next)) if *next != current => current = *next,
                other => return other,
            }
        }
        &self.named(current).underlying
    }

    pub fn is_interface(&self, id: TypeId) -> bool {
        matches!(self.underlying(id), Underlying::Interface { .. })
    }

    /// Resolve an interface declared as `name` in the package at `package_path`
    pub fn lookup_interface(&self, package_path: &str, name: &str) -> Option<TypeId> {
        let package = self.package_by_path(package_path)?;
        match package.lookup(name)? {
            Object::Type(id) if self.is_interface(id) => Some(id),
            _ => None,
        }
    }

    /// Full method set of an interface, including embedded interfaces.
    ///
    /// Returns `None` when an embedded element cannot be resolved inside the
    /// program, since the complete requirement is then unknown.
    pub fn interface_method_set(&self, iface: TypeId) -> Option<BTreeMap<String, FuncId>> {
        let mut out = BTreeMap::new();
        let mut visited = HashSet::new();
        if self.collect_interface_methods(iface, &mut visited, &mut out) {
            Some(out)
        } else {
            None
        }
    }

    fn collect_interface_methods(
        &self,
        id: TypeId,
        visited: &mut HashSet<TypeId>,
        out: &mut BTreeMap<String, FuncId>,
    ) -> bool {
        if !visited.insert(id) {
            return true;
        }
        let Underlying::Interface { methods, embeds } = self.underlying(id) else {
            return false;
        };
        for &method in methods {
            out.entry(self.func(method).name.clone()).or_insert(method);
        }
        embeds.iter().all(|embedded| match embedded {
            TypeRef::Named(inner) => self.collect_interface_methods(*inner, visited, out),
            _ => false,
        })
    }

    /// Method set of `T` (`pointer == false`) or `*T` (`pointer == true`).
    ///
    /// Methods promoted through embedded fields are included; shallower
    /// methods shadow deeper ones. Interface types yield their interface
    /// method set.
    pub fn method_set(&self, id: TypeId, pointer: bool) -> BTreeMap<String, FuncId> {
        if self.is_interface(id) {
            return self.interface_method_set(id).unwrap_or_default();
        }

        let mut out = BTreeMap::new();
        let mut visited = HashSet::new();
        let mut level = vec![(id, pointer)];

        while !level.is_empty() {
            let mut next = Vec::new();
            let mut found = BTreeMap::new();

            for (ty, addressable) in level {
                if !visited.insert(ty) {
                    continue;
                }
                if self.is_interface(ty) {
                    for (name, method) in self.interface_method_set(ty).unwrap_or_default() {
                        found.entry(name).or_insert(method);
                    }
                    continue;
                }
                for &method in &self.named(ty).methods {
                    let FuncKind::Method { pointer: ptr_recv, .. } = self.func(method).kind else {
                        continue;
                    };
                    if ptr_recv && !addressable {
                        continue;
                    }
                    found
                        .entry(self.func(method).name.clone())
                        .or_insert(method);
                }
                if let Underlying::Struct(fields) = self.underlying(ty) {
                    for field in fields.iter().filter(|f| f.embedded) {
                        match &field.ty {
                            TypeRef::Named(inner) => next.push((*inner, addressable)),
                            TypeRef::Pointer(inner) => {
                                if let TypeRef::Named(inner) = inner.as_ref() {
                                    next.push((*inner, true));
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }

            for (name, method) in found {
                out.entry(name).or_insert(method);
            }
            level = next;
        }

        out
    }

    /// Method `name` callable on an addressable value of type `id`.
    /// May return an abstract method when promoted from an embedded interface.
    pub fn lookup_method(&self, id: TypeId, name: &str) -> Option<FuncId> {
        self.method_set(id, true).get(name).copied()
    }

    /// Type of field `name` on struct type `id`, including promoted fields
    pub fn field_type(&self, id: TypeId, name: &str) -> Option<TypeRef> {
        let mut visited = HashSet::new();
        let mut level = vec![id];
        while !level.is_empty() {
            let mut next = Vec::new();
            for ty in level {
                if !visited.insert(ty) {
                    continue;
                }
                let Underlying::Struct(fields) = self.underlying(ty) else {
                    continue;
                };
                if let Some(field) = fields.iter().find(|f| f.name.as_deref() == Some(name)) {
                    return Some(field.ty.clone());
                }
                next.extend(
                    fields
                        .iter()
                        .filter(|f| f.embedded)
                        .filter_map(|f| f.ty.named()),
                );
            }
            level = next;
        }
        None
    }

    /// Whether `T` (or `*T` when `pointer`) satisfies interface `iface`:
    /// every required method is present with an identical signature.
    pub fn implements(&self, id: TypeId, pointer: bool, iface: TypeId) -> bool {
        let Some(required) = self.interface_method_set(iface) else {
            return false;
        };
        let available = self.method_set(id, pointer);
        required.iter().all(|(name, want)| {
            available
                .get(name)
                .is_some_and(|got| self.func(*got).signature == self.func(*want).signature)
        })
    }

    /// Non-interface named types, in declaration order
    pub fn concrete_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.types
            .iter()
            .map(|t| t.id)
            .filter(move |id| !self.is_interface(*id))
    }
}
