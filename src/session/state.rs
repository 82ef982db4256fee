//! Session state and call resolution
//!
//! Both the checker and the interpreter resolve call targets through a
//! [`Linker`], so a call that type-checks always reaches the same method
//! when it runs.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use super::library::Library;
use super::natives::{self, NativeFunction};
use super::value::Value;
use crate::frontend::check::{check_arguments, Environment, Ty};
use crate::frontend::parser::ast::{ImportDecl, MethodDecl};

/// Variable slot: declared type and current value
#[derive(Debug, Clone)]
pub(crate) struct Variable {
    pub ty: Ty,
    pub value: Value,
}

/// Everything a session has accumulated
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub variables: IndexMap<String, Variable>,
    pub methods: IndexMap<String, Arc<MethodDecl>>,
    pub imports: IndexSet<ImportDecl>,
    pub libraries: IndexMap<String, Arc<Library>>,
    pub classpath: IndexSet<PathBuf>,
}

impl SessionState {
    pub fn linker(&self) -> Linker<'_> {
        Linker {
            libraries: &self.libraries,
            methods: &self.methods,
            imports: &self.imports,
        }
    }

    /// Bind a variable, moving a redeclared name to the end
    pub fn define_variable(
        &mut self,
        name: &str,
        variable: Variable,
    ) {
        self.variables.shift_remove(name);
        self.variables.insert(name.to_string(), variable);
    }

    /// Bind a method, replacing any method with the same name
    pub fn define_method(
        &mut self,
        method: Arc<MethodDecl>,
    ) {
        self.methods.shift_remove(&method.name);
        self.methods.insert(method.name.clone(), method);
    }
}

/// Where a piece of code was declared; decides unqualified lookup
#[derive(Debug, Clone)]
pub(crate) enum CallScope {
    /// Snippets and methods typed into the session
    Session,
    /// Methods of a classpath library
    Library(Arc<Library>),
}

/// Resolved call target
#[derive(Debug, Clone)]
pub(crate) enum Callee {
    Native {
        qualified: String,
        function: &'static NativeFunction,
    },
    Session(Arc<MethodDecl>),
    Library {
        library: Arc<Library>,
        method: Arc<MethodDecl>,
    },
}

impl Callee {
    /// Name shown in stack traces
    pub fn frame_name(&self) -> String {
        match self {
            Callee::Native { qualified, .. } => qualified.clone(),
            Callee::Session(method) => method.name.clone(),
            Callee::Library { library, method } => format!("{}.{}", library.package, method.name),
        }
    }
}

/// Borrowed view of the names a call can reach
#[derive(Clone, Copy)]
pub(crate) struct Linker<'a> {
    pub libraries: &'a IndexMap<String, Arc<Library>>,
    pub methods: &'a IndexMap<String, Arc<MethodDecl>>,
    pub imports: &'a IndexSet<ImportDecl>,
}

impl<'a> Linker<'a> {
    /// Resolve `path` as seen from code declared in `scope`
    ///
    /// Unqualified names try the scope's own methods, then its imports in
    /// order. Qualified names go straight to the named package.
    pub fn resolve(
        &self,
        scope: &CallScope,
        path: &[String],
    ) -> Option<Callee> {
        match path {
            [] => None,
            [name] => match scope {
                CallScope::Session => self
                    .methods
                    .get(name)
                    .map(|method| Callee::Session(method.clone()))
                    .or_else(|| {
                        self.imports
                            .iter()
                            .find_map(|import| self.imported(import, name))
                    }),
                CallScope::Library(library) => library
                    .methods
                    .get(name)
                    .map(|method| Callee::Library {
                        library: library.clone(),
                        method: method.clone(),
                    })
                    .or_else(|| {
                        library
                            .imports
                            .iter()
                            .find_map(|import| self.imported(import, name))
                    }),
            },
            [package @ .., member] => self.member(&package.join("."), member),
        }
    }

    fn imported(
        &self,
        import: &ImportDecl,
        name: &str,
    ) -> Option<Callee> {
        match &import.member {
            Some(member) if member != name => None,
            _ => self.member(&import.package, name),
        }
    }

    fn member(
        &self,
        package: &str,
        name: &str,
    ) -> Option<Callee> {
        if let Some(function) = natives::package(package).and_then(|p| p.get(name)) {
            return Some(Callee::Native {
                qualified: format!("{}.{}", package, name),
                function,
            });
        }
        let library = self.libraries.get(package)?;
        library.methods.get(name).map(|method| Callee::Library {
            library: library.clone(),
            method: method.clone(),
        })
    }

    /// Resolve and type a call for the checker
    pub fn type_call(
        &self,
        scope: &CallScope,
        path: &[String],
        args: &[Ty],
    ) -> Result<Ty, String> {
        let qualified = path.join(".");
        match self.resolve(scope, path) {
            Some(Callee::Native { function, .. }) => (function.signature)(&qualified, args),
            Some(Callee::Session(method)) | Some(Callee::Library { method, .. }) => {
                let params: Vec<Ty> = method
                    .params
                    .iter()
                    .map(|param| Ty::from_ref(param.ty).unwrap_or(Ty::Void))
                    .collect();
                check_arguments(&qualified, &params, args)?;
                Ok(Ty::from_ref(method.return_type).unwrap_or(Ty::Void))
            }
            None => {
                let found: Vec<String> = args.iter().map(Ty::to_string).collect();
                Err(format!(
                    "cannot find symbol: method {}({})",
                    qualified,
                    found.join(", ")
                ))
            }
        }
    }

    /// Whether `import` names an importable package (and member)
    pub fn check_import(
        &self,
        import: &ImportDecl,
    ) -> Result<(), String> {
        let exists = match natives::package(&import.package) {
            Some(package) => package.importable,
            None => self.libraries.contains_key(&import.package),
        };
        if !exists {
            return Err(format!("package {} does not exist", import.package));
        }
        match &import.member {
            Some(member) if self.member(&import.package, member).is_none() => Err(format!(
                "cannot find symbol: {} in package {}",
                member, import.package
            )),
            _ => Ok(()),
        }
    }
}

/// Checker environment for snippets typed into the session
pub(crate) struct SessionEnv<'a> {
    pub state: &'a SessionState,
}

impl Environment for SessionEnv<'_> {
    fn global(
        &self,
        name: &str,
    ) -> Option<Ty> {
        self.state.variables.get(name).map(|variable| variable.ty)
    }

    fn call(
        &self,
        path: &[String],
        args: &[Ty],
    ) -> Result<Ty, String> {
        self.state
            .linker()
            .type_call(&CallScope::Session, path, args)
    }

    fn import(
        &self,
        import: &ImportDecl,
    ) -> Result<(), String> {
        self.state.linker().check_import(import)
    }
}

/// Checker environment for library methods; libraries see no session variables
pub(crate) struct LibraryEnv<'a> {
    pub linker: Linker<'a>,
    pub library: Arc<Library>,
}

impl Environment for LibraryEnv<'_> {
    fn global(
        &self,
        _name: &str,
    ) -> Option<Ty> {
        None
    }

    fn call(
        &self,
        path: &[String],
        args: &[Ty],
    ) -> Result<Ty, String> {
        self.linker
            .type_call(&CallScope::Library(self.library.clone()), path, args)
    }

    fn import(
        &self,
        import: &ImportDecl,
    ) -> Result<(), String> {
        self.linker.check_import(import)
    }
}
