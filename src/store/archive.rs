use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use zip::ZipArchive;

use crate::error::{LcaError, Result};
use crate::model::{Entity, EntityKey, EntityKind};
use crate::store::traits::{Backend, Descriptor};

/// Read-only backend over an openLCA JSON-LD zip archive
pub struct ArchiveBackend {
    path: PathBuf,
    endpoint: String,
    state: Mutex<Option<ArchiveState>>,
}

struct ArchiveState {
    zip: ZipArchive<File>,
    index: Option<ArchiveIndex>,
}

/// Entry positions by key, built once per connection
#[derive(Debug, Default)]
struct ArchiveIndex {
    entries: HashMap<EntityKey, usize>,
    /// Per kind, in archive entry order
    by_kind: BTreeMap<EntityKind, Vec<(Uuid, usize)>>,
    kind_of: HashMap<Uuid, EntityKind>,
}

impl ArchiveIndex {
    fn build(zip: &mut ZipArchive<File>) -> Self {
        let mut index = ArchiveIndex::default();
        // `file_names` iterates a hash map; index order keeps listings stable
        for i in 0..zip.len() {
            let name = match zip.by_index_raw(i) {
                Ok(file) => file.name().to_string(),
                Err(e) => {
                    log::warn!("skipping unreadable archive entry {}: {}", i, e);
                    continue;
                }
            };
            let Some((kind, id)) = parse_entry_name(&name) else {
                continue;
            };
            let key = EntityKey::new(kind, id);
            if index.entries.insert(key, i).is_some() {
                log::warn!("duplicate archive entry for {}", key);
                continue;
            }
            index.by_kind.entry(kind).or_default().push((id, i));
            index.kind_of.entry(id).or_insert(kind);
        }
        index
    }
}

/// Root fields of a stored document, without the body
#[derive(Debug, Deserialize)]
struct EntryHeader {
    #[serde(rename = "@type", default)]
    type_tag: Option<String>,
    #[serde(rename = "@id")]
    id: Uuid,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

/// A missing `@type` is implied by the folder; a different one is not
fn check_type_tag(kind: EntityKind, id: Uuid, tag: Option<&str>) -> Result<()> {
    match tag {
        Some(tag) if tag != kind.type_name() => Err(LcaError::Schema(format!(
            "document {} filed under {} declares type {}",
            id,
            kind.folder(),
            tag
        ))),
        _ => Ok(()),
    }
}

fn check_id(kind: EntityKind, id: Uuid, found: Uuid) -> Result<()> {
    if found != id {
        return Err(LcaError::Schema(format!(
            "{} entry {} carries id {}",
            kind, id, found
        )));
    }
    Ok(())
}

/// `<folder>/<uuid>.json` to (kind, id); anything else is not a root document
fn parse_entry_name(name: &str) -> Option<(EntityKind, Uuid)> {
    let (folder, file) = name.split_once('/')?;
    let kind = EntityKind::from_folder(folder)?;
    let id = file.strip_suffix(".json")?;
    Uuid::parse_str(id).ok().map(|id| (kind, id))
}

impl ArchiveBackend {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let endpoint = path.display().to_string();
        let file = File::open(&path).map_err(|e| LcaError::connection(&endpoint, e))?;
        let zip = ZipArchive::new(file).map_err(|e| LcaError::connection(&endpoint, e))?;
        log::info!("opened archive {} ({} entries)", endpoint, zip.len());
        Ok(Self {
            path,
            endpoint,
            state: Mutex::new(Some(ArchiveState { zip, index: None })),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut ZipArchive<File>, &ArchiveIndex) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.state.lock();
        let state = guard
            .as_mut()
            .ok_or_else(|| LcaError::connection(&self.endpoint, "archive is closed"))?;
        if state.index.is_none() {
            let index = ArchiveIndex::build(&mut state.zip);
            log::debug!("indexed {} documents in {}", index.entries.len(), self.endpoint);
            state.index = Some(index);
        }
        let ArchiveState { zip, index } = state;
        match index {
            Some(index) => f(zip, index),
            None => Err(LcaError::connection(&self.endpoint, "archive index missing")),
        }
    }

    fn read_entry(&self, zip: &mut ZipArchive<File>, position: usize) -> Result<(String, String)> {
        let mut file = zip
            .by_index(position)
            .map_err(|e| LcaError::connection(&self.endpoint, e))?;
        let mut text = String::new();
        file.read_to_string(&mut text)?;
        Ok((file.name().to_string(), text))
    }

    fn read_document(&self, zip: &mut ZipArchive<File>, position: usize) -> Result<Value> {
        let (name, text) = self.read_entry(zip, position)?;
        serde_json::from_str(&text)
            .map_err(|e| LcaError::Schema(format!("{} is not valid JSON: {}", name, e)))
    }

    /// Listing only reads the root fields; the rest of the document is
    /// left to `fetch`
    fn read_descriptor(
        &self,
        zip: &mut ZipArchive<File>,
        kind: EntityKind,
        id: Uuid,
        position: usize,
    ) -> Result<Descriptor> {
        let (name, text) = self.read_entry(zip, position)?;
        let header: EntryHeader = serde_json::from_str(&text)
            .map_err(|e| LcaError::Schema(format!("{}: {}", name, e)))?;
        check_type_tag(kind, id, header.type_tag.as_deref())?;
        check_id(kind, id, header.id)?;
        Ok(Descriptor {
            kind,
            id,
            name: header.name,
            category: header.category,
        })
    }

    fn decode(&self, kind: EntityKind, id: Uuid, mut doc: Value) -> Result<Entity> {
        let Some(obj) = doc.as_object_mut() else {
            return Err(LcaError::Schema(format!("{} {} is not a JSON object", kind, id)));
        };
        let tag = obj.get("@type").and_then(Value::as_str);
        check_type_tag(kind, id, tag)?;
        let implied = tag.is_none();
        if implied {
            obj.insert("@type".into(), Value::String(kind.type_name().into()));
        }
        let entity: Entity = serde_json::from_value(doc)
            .map_err(|e| LcaError::Schema(format!("{} {}: {}", kind, id, e)))?;
        check_id(kind, id, entity.id())?;
        Ok(entity)
    }

    fn fetch_sync(&self, kind: EntityKind, id: Uuid) -> Result<Entity> {
        let doc = self.with_state(|zip, index| {
            let position = *index
                .entries
                .get(&EntityKey::new(kind, id))
                .ok_or(LcaError::NotFound { kind, id })?;
            self.read_document(zip, position)
        })?;
        self.decode(kind, id, doc)
    }

    fn list_sync(&self, kind: EntityKind) -> Result<Vec<Descriptor>> {
        self.with_state(|zip, index| {
            let Some(entries) = index.by_kind.get(&kind) else {
                return Ok(Vec::new());
            };
            let mut out = Vec::with_capacity(entries.len());
            for (id, position) in entries {
                out.push(self.read_descriptor(zip, kind, *id, *position)?);
            }
            Ok(out)
        })
    }
}

#[async_trait::async_trait]
impl Backend for ArchiveBackend {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn list(&self, kind: EntityKind) -> Result<Vec<Descriptor>> {
        self.list_sync(kind)
    }

    async fn fetch(&self, kind: EntityKind, id: Uuid) -> Result<Entity> {
        log::debug!("archive fetch {} {}", kind, id);
        self.fetch_sync(kind, id)
    }

    async fn write(&self, entity: &Entity) -> Result<()> {
        Err(LcaError::WriteUnsupported {
            endpoint: self.endpoint.clone(),
            kind: entity.kind(),
            id: entity.id(),
        })
    }

    async fn locate(&self, id: Uuid) -> Result<Option<EntityKind>> {
        self.with_state(|_, index| Ok(index.kind_of.get(&id).copied()))
    }

    async fn close(&self) -> Result<()> {
        if self.state.lock().take().is_some() {
            log::info!("closed archive {}", self.endpoint);
        }
        Ok(())
    }
}

/// Zip archives directly inside `dir`, sorted by file name
pub fn discover_archives(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("zip"))
            .unwrap_or(false);
        if path.is_file() && is_zip {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry_name() {
        let id = Uuid::new_v4();
        assert_eq!(
            parse_entry_name(&format!("processes/{}.json", id)),
            Some((EntityKind::Process, id))
        );
        assert_eq!(
            parse_entry_name(&format!("dq_systems/{}.json", id)),
            Some((EntityKind::DqSystem, id))
        );
        assert_eq!(parse_entry_name("olca-schema.json"), None);
        assert_eq!(parse_entry_name(&format!("bin/{}.json", id)), None);
        assert_eq!(parse_entry_name("flows/not-a-uuid.json"), None);
        assert_eq!(parse_entry_name(&format!("flows/sub/{}.json", id)), None);
    }

    #[test]
    fn test_open_missing_archive_is_connection_error() {
        let err = ArchiveBackend::open("/definitely/not/here.zip").err().unwrap();
        match err {
            LcaError::Connection { endpoint, .. } => assert!(endpoint.ends_with("here.zip")),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
