//! Parsing of `_NT_SYMBOL_PATH`-style search paths.
//!
//! A symbol path is a `;`-separated list of elements:
//!
//! - `srv*<store>*...*<server>`: symbol server chain; every component but a
//!   trailing URL is a downstream store (searched and populated in order)
//! - `symsrv*<dll>*<store>*...*<server>`: same, naming the server DLL explicitly
//! - `cache*<dir>`: cache directory for the elements that follow it
//! - anything else: a plain directory searched for the bare file name

use std::fmt;
use std::path::{Path, PathBuf};

/// Microsoft's public symbol server
pub const MICROSOFT_SYMBOL_SERVER: &str = "https://msdl.microsoft.com/download/symbols";

/// How files are laid out below a searchable directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreLayout
{
    /// `<dir>/<name>/<index key>/<name>`
    SymbolStore,
    /// `<dir>/<name>`
    Flat,
}

/// One element of a symbol path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolPathElement
{
    /// Symbol server chain (`srv*` / `symsrv*`), components in search order
    Server
    {
        /// Downstream stores and upstream servers, e.g. `["C:\\symbols", "https://..."]`
        chain: Vec<String>,
    },
    /// `cache*<dir>`; `None` selects the default cache
    Cache
    {
        directory: Option<PathBuf>,
    },
    /// Plain directory holding files by name
    Directory(PathBuf),
}

impl SymbolPathElement
{
    fn parse(element: &str) -> Self
    {
        let mut parts = element.split('*');
        let head = parts.next().unwrap_or_default();

        if head.eq_ignore_ascii_case("srv") {
            return SymbolPathElement::Server {
                chain: parts.filter(|part| !part.is_empty()).map(str::to_string).collect(),
            };
        }

        if head.eq_ignore_ascii_case("symsrv") {
            // First component names the server DLL
            return SymbolPathElement::Server {
                chain: parts.skip(1).filter(|part| !part.is_empty()).map(str::to_string).collect(),
            };
        }

        if head.eq_ignore_ascii_case("cache") {
            return SymbolPathElement::Cache {
                directory: parts.find(|part| !part.is_empty()).map(PathBuf::from),
            };
        }

        SymbolPathElement::Directory(PathBuf::from(element))
    }

    /// Local directories this element makes searchable, with their layout.
    fn local_directories(&self) -> Vec<(PathBuf, StoreLayout)>
    {
        match self {
            SymbolPathElement::Server { chain } => chain
                .iter()
                .filter(|component| !is_remote(component))
                .map(|component| (PathBuf::from(component), StoreLayout::SymbolStore))
                .collect(),
            SymbolPathElement::Cache { directory } => directory
                .iter()
                .map(|dir| (dir.clone(), StoreLayout::SymbolStore))
                .collect(),
            SymbolPathElement::Directory(dir) => vec![(dir.clone(), StoreLayout::Flat)],
        }
    }
}

impl fmt::Display for SymbolPathElement
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            SymbolPathElement::Server { chain } => {
                write!(f, "srv")?;
                for component in chain {
                    write!(f, "*{component}")?;
                }
                Ok(())
            }
            SymbolPathElement::Cache { directory: Some(dir) } => write!(f, "cache*{}", dir.display()),
            SymbolPathElement::Cache { directory: None } => write!(f, "cache*"),
            SymbolPathElement::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// Whether a symbol path component is a remote server rather than a directory.
fn is_remote(component: &str) -> bool
{
    let lower = component.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// A parsed symbol search path
///
/// ## Example
///
/// ```rust
/// use sosloader_core::symbols::{SymbolPath, SymbolPathElement};
///
/// let path = SymbolPath::parse("srv*C:\\symbols*https://msdl.microsoft.com/download/symbols;D:\\drops");
/// assert_eq!(path.elements().len(), 2);
/// assert!(matches!(path.elements()[1], SymbolPathElement::Directory(_)));
/// assert_eq!(path.to_string(), "srv*C:\\symbols*https://msdl.microsoft.com/download/symbols;D:\\drops");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolPath
{
    elements: Vec<SymbolPathElement>,
}

impl SymbolPath
{
    /// Parse a symbol path. Empty elements and surrounding whitespace are ignored.
    #[must_use]
    pub fn parse(path: &str) -> Self
    {
        let elements = path
            .split(';')
            .map(str::trim)
            .filter(|element| !element.is_empty())
            .map(SymbolPathElement::parse)
            .collect();
        Self { elements }
    }

    /// Microsoft's public server with a downstream store under `cache_root`.
    #[must_use]
    pub fn microsoft_public(cache_root: &Path) -> Self
    {
        Self {
            elements: vec![SymbolPathElement::Server {
                chain: vec![
                    cache_root.join("symbols").display().to_string(),
                    MICROSOFT_SYMBOL_SERVER.to_string(),
                ],
            }],
        }
    }

    /// Parse `path` if it has any elements, otherwise fall back to [`SymbolPath::microsoft_public`].
    #[must_use]
    pub fn parse_or_default(path: Option<&str>, cache_root: &Path) -> Self
    {
        match path.map(Self::parse) {
            Some(parsed) if !parsed.is_empty() => parsed,
            _ => Self::microsoft_public(cache_root),
        }
    }

    pub fn elements(&self) -> &[SymbolPathElement]
    {
        &self.elements
    }

    pub fn is_empty(&self) -> bool
    {
        self.elements.is_empty()
    }

    /// Local directories named by the path, in search order.
    #[must_use]
    pub fn local_directories(&self) -> Vec<(PathBuf, StoreLayout)>
    {
        self.elements
            .iter()
            .flat_map(SymbolPathElement::local_directories)
            .collect()
    }

    /// Whether any element reaches a remote symbol server.
    #[must_use]
    pub fn has_remote_server(&self) -> bool
    {
        self.elements.iter().any(|element| match element {
            SymbolPathElement::Server { chain } => chain.iter().any(|component| is_remote(component)),
            _ => false,
        })
    }
}

impl fmt::Display for SymbolPath
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        for (index, element) in self.elements.iter().enumerate() {
            if index > 0 {
                write!(f, ";")?;
            }
            write!(f, "{element}")?;
        }
        Ok(())
    }
}
