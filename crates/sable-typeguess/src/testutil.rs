//! A fake implementation of the three oracle traits (`spec.md` §6), used
//! only by this crate's own tests so the pass can be exercised without a
//! real resolver, type algebra, or symbol table.

use indexmap::{IndexMap, IndexSet};

use sable_ast::TypeNode;

use crate::model::ResolvedType;
use crate::oracle::{ConstantRef, DefCandidate, ForeignFnSig, ForeignLibrary, LookupRoot, OwnerKind, Resolver, SymbolTable, TypeAlgebra};

fn path_key(names: &[String]) -> String {
    names.join("::")
}

#[derive(Debug, Default)]
pub struct FakeResolver {
    pub types: IndexMap<String, ResolvedType>,
    pub owner_kinds: IndexMap<ResolvedType, OwnerKind>,
    pub abstract_roots: IndexSet<ResolvedType>,
    pub uninstantiated_generics: IndexSet<ResolvedType>,
    pub pointer_elements: IndexMap<ResolvedType, ResolvedType>,
    pub pointer_type_paths: IndexSet<String>,
    pub candidates: IndexMap<(String, String), Vec<DefCandidate>>,
    pub constants: IndexMap<String, ConstantRef>,
    pub libraries: IndexMap<String, ForeignLibrary>,
    pub foreign_fns: IndexMap<(String, String), ForeignFnSig>,
    pub foreign_vars: IndexMap<(String, String), ResolvedType>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_type(&mut self, name: impl Into<String>, ty: ResolvedType) -> &mut Self {
        self.types.insert(name.into(), ty);
        self
    }

    pub fn set_owner_kind(&mut self, owner: ResolvedType, kind: OwnerKind) -> &mut Self {
        self.owner_kinds.insert(owner, kind);
        self
    }

    pub fn mark_abstract_root(&mut self, ty: ResolvedType) -> &mut Self {
        self.abstract_roots.insert(ty);
        self
    }

    pub fn mark_uninstantiated_generic(&mut self, ty: ResolvedType) -> &mut Self {
        self.uninstantiated_generics.insert(ty);
        self
    }

    pub fn register_candidate(&mut self, owner_metaclass_name: impl Into<String>, method: impl Into<String>, candidate: DefCandidate) -> &mut Self {
        self.candidates
            .entry((owner_metaclass_name.into(), method.into()))
            .or_default()
            .push(candidate);
        self
    }

    pub fn register_constant(&mut self, name: impl Into<String>, constant: ConstantRef) -> &mut Self {
        self.constants.insert(name.into(), constant);
        self
    }

    pub fn register_library(&mut self, names: &[&str], lib: ForeignLibrary) -> &mut Self {
        self.libraries.insert(names.join("::"), lib);
        self
    }

    pub fn register_foreign_fn(&mut self, lib_id: impl Into<String>, name: impl Into<String>, sig: ForeignFnSig) -> &mut Self {
        self.foreign_fns.insert((lib_id.into(), name.into()), sig);
        self
    }

    pub fn register_foreign_var(&mut self, lib_id: impl Into<String>, name: impl Into<String>, ty: ResolvedType) -> &mut Self {
        self.foreign_vars.insert((lib_id.into(), name.into()), ty);
        self
    }
}

impl Resolver for FakeResolver {
    fn lookup(&self, _root: &LookupRoot, node: &TypeNode, allow_typeof: bool) -> Option<ResolvedType> {
        match node {
            TypeNode::Path { names, type_vars } => {
                let base = self.types.get(&path_key(names))?.clone();
                if type_vars.is_empty() {
                    Some(base)
                } else {
                    let generics = type_vars
                        .iter()
                        .map(|t| self.lookup(_root, &t.node, allow_typeof))
                        .collect::<Option<Vec<_>>>()?;
                    match base {
                        ResolvedType::Named { name, .. } => Some(ResolvedType::Named { name, generics }),
                        other => Some(other),
                    }
                }
            }
            TypeNode::Nilable(inner) => {
                let resolved = self.lookup(_root, &inner.node, allow_typeof)?;
                Some(ResolvedType::Nilable(Box::new(resolved)))
            }
            TypeNode::Proc { inputs, output } => {
                let ins = inputs
                    .iter()
                    .map(|t| self.lookup(_root, &t.node, allow_typeof))
                    .collect::<Option<Vec<_>>>()?;
                let out = match output {
                    Some(o) => self.lookup(_root, &o.node, allow_typeof)?,
                    None => ResolvedType::Nil,
                };
                Some(ResolvedType::Proc(ins, Box::new(out)))
            }
            TypeNode::Metaclass(inner) => {
                let resolved = self.lookup(_root, &inner.node, allow_typeof)?;
                Some(ResolvedType::Metaclass(Box::new(resolved)))
            }
            TypeNode::SelfType => None,
            TypeNode::TypeOf(_) => None,
        }
    }

    fn owner_kind(&self, owner: &ResolvedType) -> OwnerKind {
        self.owner_kinds.get(owner).copied().unwrap_or(OwnerKind::Concrete)
    }

    fn class_var_owner(&self, enclosing: &[ResolvedType], _name: &str) -> Option<ResolvedType> {
        enclosing.last().cloned()
    }

    fn candidate_defs(&self, owner_metaclass: &ResolvedType, name: &str, _has_block: bool, _arg_count: usize) -> Vec<DefCandidate> {
        let key_name = match owner_metaclass {
            ResolvedType::Metaclass(inner) => inner.to_string(),
            other => other.to_string(),
        };
        self.candidates.get(&(key_name, name.to_string())).cloned().unwrap_or_default()
    }

    fn pointer_element(&self, ty: &ResolvedType) -> Option<ResolvedType> {
        self.pointer_elements.get(ty).cloned()
    }

    fn is_pointer_type_path(&self, names: &[String]) -> bool {
        self.pointer_type_paths.contains(&path_key(names))
    }

    fn resolve_constant(&self, _root: &LookupRoot, names: &[String]) -> Option<ConstantRef> {
        self.constants.get(&path_key(names)).cloned()
    }

    fn foreign_library(&self, _root: &LookupRoot, names: &[String]) -> Option<ForeignLibrary> {
        self.libraries.get(&path_key(names)).cloned()
    }

    fn foreign_fn(&self, lib: &ForeignLibrary, name: &str) -> Option<ForeignFnSig> {
        self.foreign_fns.get(&(lib.id.clone(), name.to_string())).cloned()
    }

    fn foreign_var(&self, lib: &ForeignLibrary, name: &str) -> Option<ResolvedType> {
        self.foreign_vars.get(&(lib.id.clone(), name.to_string())).cloned()
    }

    fn is_abstract_root(&self, ty: &ResolvedType) -> bool {
        self.abstract_roots.contains(ty)
    }

    fn is_uninstantiated_generic(&self, ty: &ResolvedType) -> bool {
        self.uninstantiated_generics.contains(ty)
    }

    fn virtualized(&self, ty: &ResolvedType) -> ResolvedType {
        match ty {
            ResolvedType::Named { name, generics } if !name.ends_with('*') => ResolvedType::Named {
                name: format!("{name}*"),
                generics: generics.clone(),
            },
            other => other.clone(),
        }
    }

    fn metaclass_of(&self, ty: &ResolvedType) -> ResolvedType {
        ResolvedType::Metaclass(Box::new(ty.clone()))
    }
}

/// Merges by structural equality: identical types collapse to one, anything
/// else widens to a `Union` in first-seen order.
#[derive(Debug, Default)]
pub struct FakeAlgebra;

impl TypeAlgebra for FakeAlgebra {
    fn merge(&self, types: &[ResolvedType]) -> ResolvedType {
        let mut seen: Vec<ResolvedType> = Vec::new();
        for t in types {
            if !seen.contains(t) {
                seen.push(t.clone());
            }
        }
        match seen.len() {
            0 => ResolvedType::Nil,
            1 => seen.into_iter().next().unwrap(),
            _ => ResolvedType::Union(seen),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeSymbolTable {
    pub globals: IndexMap<String, ResolvedType>,
    pub class_vars: IndexMap<(ResolvedType, String), ResolvedType>,
}

impl SymbolTable for FakeSymbolTable {
    fn typed_global(&self, name: &str) -> Option<ResolvedType> {
        self.globals.get(name).cloned()
    }

    fn typed_class_var(&self, owner: &ResolvedType, name: &str) -> Option<ResolvedType> {
        self.class_vars.get(&(owner.clone(), name.to_string())).cloned()
    }
}
