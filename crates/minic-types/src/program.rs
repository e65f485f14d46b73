//! The validated program representation handed to the evaluator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ast::Function;
use crate::error::{LoadError, ModelErrors};
use crate::validate;

/// Name of the observation builtin. No user function may take it.
pub const PRINT: &str = "print";

/// Entry function used when none is named explicitly.
pub const DEFAULT_ENTRY: &str = "main";

/// An immutable, validated set of functions with one designated entry point.
///
/// Construction runs every static check in [`crate::validate`], so a
/// `Program` always satisfies: unique function names, distinct parameter
/// names, a zero-parameter `int` entry function, and call sites that name
/// existing functions with matching arity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    functions: Vec<Function>,
    entry: String,
    #[serde(skip)]
    index: BTreeMap<String, usize>,
    #[serde(skip)]
    entry_index: usize,
}

/// Wire shape accepted from the front end before validation.
#[derive(Deserialize)]
struct RawProgram {
    functions: Vec<Function>,
    #[serde(default = "default_entry")]
    entry: String,
}

fn default_entry() -> String {
    DEFAULT_ENTRY.to_string()
}

impl Program {
    /// Build a program whose entry function is `main`.
    pub fn new(functions: Vec<Function>) -> Result<Self, ModelErrors> {
        Self::with_entry(functions, DEFAULT_ENTRY)
    }

    /// Build a program with an explicitly named entry function.
    pub fn with_entry(
        functions: Vec<Function>,
        entry: impl Into<String>,
    ) -> Result<Self, ModelErrors> {
        let entry = entry.into();
        let mut errors = ModelErrors::new();

        let index = validate::index_functions(&functions, &mut errors);
        let entry_index = validate::check_entry(&functions, &index, &entry, &mut errors);
        validate::check_bodies(&functions, &index, &mut errors);

        match entry_index {
            Some(entry_index) if !errors.has_errors() => Ok(Self {
                functions,
                entry,
                index,
                entry_index,
            }),
            _ => Err(errors),
        }
    }

    /// Deserialize and validate a program from its JSON representation.
    ///
    /// ```text
    /// { "entry": "main", "functions": [ { "name": "main", "returns": "int", "body": [..] } ] }
    /// ```
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let raw: RawProgram = serde_json::from_str(json)?;
        Ok(Self::with_entry(raw.functions, raw.entry)?)
    }

    /// Serialize to pretty-printed JSON in the shape [`Program::from_json`] accepts.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Look up a function by name.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.index.get(name).map(|&i| &self.functions[i])
    }

    /// All functions, in definition order.
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// The designated entry function.
    pub fn entry(&self) -> &Function {
        &self.functions[self.entry_index]
    }

    pub fn entry_name(&self) -> &str {
        &self.entry
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Give the function set back, e.g. to edit and re-validate.
    pub fn into_functions(self) -> Vec<Function> {
        self.functions
    }
}
