// crates/odx-converter/src/archive.rs

//! Read access to PDX containers.
//!
//! A PDX file is a ZIP archive holding ODX documents, an optional
//! `index.xml` catalog and auxiliary resources (images, flash data, ...).
//! Entries are read on demand; the archive is never modified.

use crate::error::ArchiveError;
use crate::model::Catalog;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// File extensions of ODX documents (`.odx-d`, `.odx-cs`, ...).
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "odx", "odx-d", "odx-c", "odx-cs", "odx-e", "odx-f", "odx-fd", "odx-m", "odx-v",
];

const CATALOG_ENTRY: &str = "index.xml";

/// One document read from the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Entry name inside the container, used as the document's logical name.
    pub name: String,
    pub data: Vec<u8>,
}

/// An opened PDX container.
pub struct PdxArchive<R> {
    zip: zip::ZipArchive<R>,
    name: String,
    catalog: Option<Catalog>,
    entry_names: Vec<String>,
    /// Positions of document entries, in archive order.
    documents: Vec<usize>,
    resources: Vec<usize>,
}

impl PdxArchive<BufReader<File>> {
    /// Opens the container at `path`. The archive name defaults to the file stem.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_reader(BufReader::new(file))?.with_name(stem))
    }
}

impl<R: Read + Seek> PdxArchive<R> {
    pub fn from_reader(reader: R) -> Result<Self, ArchiveError> {
        let mut zip = zip::ZipArchive::new(reader)?;

        let mut seen = HashSet::new();
        let mut entry_names = Vec::with_capacity(zip.len());
        let mut documents = Vec::new();
        let mut resources = Vec::new();
        for index in 0..zip.len() {
            let (name, is_dir) = {
                let entry = zip.by_index_raw(index)?;
                (entry.name().to_string(), entry.is_dir())
            };
            if !seen.insert(name.clone()) {
                return Err(ArchiveError::DuplicateEntry(name));
            }
            if !is_dir {
                if is_document_name(&name) {
                    documents.push(index);
                } else {
                    resources.push(index);
                }
            }
            entry_names.push(name);
        }

        Ok(Self {
            zip,
            name: String::new(),
            catalog: None,
            entry_names,
            documents,
            resources,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The catalog `SHORT-NAME` once [`Self::catalog`] has read one,
    /// otherwise the name given at open time.
    pub fn name(&self) -> &str {
        match &self.catalog {
            Some(catalog) if !catalog.short_name.trim().is_empty() => catalog.short_name.trim(),
            _ => &self.name,
        }
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Lazily reads every document entry, in archive order. May be called
    /// more than once.
    pub fn documents(&mut self) -> Documents<'_, R> {
        Documents {
            archive: self,
            position: 0,
        }
    }

    /// Names of the entries that are not ODX documents.
    pub fn resources(&self) -> Vec<&str> {
        self.resources
            .iter()
            .map(|&i| self.entry_names[i].as_str())
            .collect()
    }

    /// Reads and parses `index.xml`. `Ok(None)` when the container has no catalog.
    ///
    /// The catalog must sit at the container root; its name is matched
    /// ignoring ASCII case (`INDEX.XML` is accepted).
    pub fn catalog(&mut self) -> Result<Option<&Catalog>, ArchiveError> {
        if self.catalog.is_none() {
            let position = self
                .entry_names
                .iter()
                .position(|n| n.eq_ignore_ascii_case(CATALOG_ENTRY));
            let Some(index) = position else {
                return Ok(None);
            };
            let entry = self.read_entry(index)?;
            let text = String::from_utf8_lossy(&entry.data);
            let text = text.trim_start_matches('\u{feff}');
            let catalog: Catalog = quick_xml::de::from_str(text)
                .map_err(|e| ArchiveError::InvalidCatalog(e.to_string()))?;
            self.catalog = Some(catalog);
        }
        Ok(self.catalog.as_ref())
    }

    /// Files listed by the catalog that the container does not hold.
    pub fn missing_from_catalog(&self) -> Vec<String> {
        let Some(catalog) = &self.catalog else {
            return Vec::new();
        };
        catalog
            .files()
            .filter(|file| !file.is_empty())
            .filter(|file| !self.entry_names.iter().any(|n| n == file || entry_basename(n) == *file))
            .map(str::to_string)
            .collect()
    }

    fn read_entry(&mut self, index: usize) -> Result<ArchiveEntry, ArchiveError> {
        let mut file = self.zip.by_index(index)?;
        let name = file.name().to_string();
        // The declared size is untrusted; only use it as a capacity hint.
        let mut data = Vec::with_capacity(file.size().min(1 << 24) as usize);
        file.read_to_end(&mut data)
            .map_err(|source| ArchiveError::Corrupt {
                entry: name.clone(),
                source,
            })?;
        Ok(ArchiveEntry { name, data })
    }
}

/// Iterator returned by [`PdxArchive::documents`].
pub struct Documents<'a, R> {
    archive: &'a mut PdxArchive<R>,
    position: usize,
}

impl<R: Read + Seek> Iterator for Documents<'_, R> {
    type Item = Result<ArchiveEntry, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = *self.archive.documents.get(self.position)?;
        self.position += 1;
        Some(self.archive.read_entry(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.archive.documents.len() - self.position;
        (remaining, Some(remaining))
    }
}

fn is_document_name(name: &str) -> bool {
    match entry_basename(name).rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            DOCUMENT_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

fn entry_basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
