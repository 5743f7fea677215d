//! collection of stack documents ([StackConfig] and path to source file)
//!
//! [StackDocuments] keeps every loaded document together with the file it came from and defines a
//! numeric index for each. Once added those indices are stable (removal is not possible)
use crate::stack::StackConfig;
use std::path::{Path, PathBuf};

#[derive(Default, Debug)]
pub struct StackDocuments {
    sources: Vec<Source>,
    stacks: Vec<(usize, StackConfig)>,
}

impl StackDocuments {
    /// Inserts and indexes a stack document
    pub fn insert(&mut self, document: StackConfig, path: impl Into<Option<PathBuf>>) {
        let source_index = self.sources.len();
        self.sources.push(path.into());
        self.stacks.push((source_index, document));
    }

    pub fn get_stack(&self, index: usize) -> SourceStack {
        let (source_index, stack) = &self.stacks[index];
        (index, &self.sources[*source_index], stack)
    }

    /// Documents in load order
    pub fn stacks(&self) -> impl Iterator<Item = SourceStack> {
        self.stacks
            .iter()
            .enumerate()
            .map(|(index, (source_index, stack))| (index, &self.sources[*source_index], stack))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl StackDocuments {
    /// Loads a `.json` file as JSON and anything else as YAML
    pub fn load_file(&mut self, file_path: &Path) -> Result<(), LoadError> {
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(&file_path)?;
        let is_json = file_path.extension().is_some_and(|e| e == "json");
        let stack = if is_json {
            serde_json::from_str(&file_contents)?
        } else {
            parse_yaml(&file_contents)?
        };

        self.insert(stack, Some(file_path));
        Ok(())
    }

    /// Loads all `*stack.yaml`, `*stack.yml` and `*stack.json` files of a directory, sorted by name
    pub fn load_directory(&mut self, dir_path: &Path) -> Result<(), LoadError> {
        let mut file_paths = vec![];

        let read_dir = std::fs::read_dir(dir_path)?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_file() {
                continue;
            }

            let file_name = dir_entry.file_name().to_string_lossy().into_owned();
            let is_stack_file = STACK_FILE_SUFFIXES
                .iter()
                .any(|suffix| file_name.ends_with(suffix));
            if !is_stack_file {
                continue;
            }

            file_paths.push(dir_entry.path());
        }

        if file_paths.is_empty() {
            return Err(LoadError::NoFilesFound);
        }

        // read_dir order is platform dependent
        file_paths.sort();
        for file_path in file_paths {
            self.load_file(&file_path)?;
        }

        Ok(())
    }
}

const STACK_FILE_SUFFIXES: &[&str] = &["stack.yaml", "stack.yml", "stack.json"];

/// Parses a YAML stack document. An empty document is an empty stack.
pub fn parse_yaml(input: &str) -> Result<StackConfig, LoadError> {
    if input.trim().is_empty() {
        return Ok(StackConfig::default());
    }

    Ok(serde_yaml::from_str(input)?)
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("No files found in directory")]
    NoFilesFound,
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse yaml file")]
    YamlParseFailed(#[from] serde_yaml::Error),
    #[error("Unable to parse json file")]
    JsonParseFailed(#[from] serde_json::Error),
}

impl From<StackConfig> for StackDocuments {
    fn from(value: StackConfig) -> Self {
        let mut documents = StackDocuments::default();
        documents.insert(value, None);
        documents
    }
}

/// Utility macro to create [StackDocuments]
///
/// Create from a single document
/// ```
/// # use stackplan::stack_documents;
/// stack_documents!("variables: { env: dev }");
/// ```
///
/// Create from multiple documents (path required)
/// ```
/// # use stackplan::stack_documents;
/// stack_documents! {
///   "one.stack.yaml" => "variables: { env: dev }",
///   "two.stack.yaml" => "variables: { env: prod }"
/// };
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use stackplan::stack_documents;
/// stack_documents!("resources: [not, a, mapping]");
/// ```
#[macro_export]
macro_rules! stack_documents {
    // single document without source
    { $expr:expr } => {
        $crate::documents::StackDocuments::from($crate::documents::parse_yaml($expr).expect("stack must parse"))
    };
    // multi document with sources
    { $($source:expr => $expr:expr),+ } => {{
        let mut docs = $crate::documents::StackDocuments::default();
        $(
            docs.insert(
                $crate::documents::parse_yaml($expr).expect("stack must parse"),
                Some(::std::path::PathBuf::from($source)),
            );
        )+

        docs
    }};
}

pub type Source = Option<PathBuf>;
pub type SourceStack<'a> = (usize, &'a Source, &'a StackConfig);
