use super::protocol::{IndexObjectRequest, ObjectIndex, ObjectUpdateRequest};
use super::types::IndexedObject;
use crate::error::{SearchError, SearchResult};
use crate::query::compiler::{QueryPlan, Visibility};
use crate::query::guid::Guid;
use crate::registry::types::TypeDescriptor;

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

/// Reference index engine keeping every object in memory, keyed by GUID.
pub struct MemoryIndex {
    objects: DashMap<String, IndexedObject>,
    available: AtomicBool,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Takes the index in or out of service. While out of service every read
    /// fails with `TransientIndex` and status events are held back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        tracing::info!("Index availability set to {}", available);
    }

    pub fn ensure_available(&self) -> SearchResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SearchError::TransientIndex(
                "index is temporarily out of service".to_string(),
            ))
        }
    }

    /// Validates `request` against `schema` and stores the object.
    ///
    /// # Returns
    /// * `Ok(true)` if an object with the same GUID was replaced.
    /// * `Ok(false)` for a new object.
    /// * `InvalidArgument` for a malformed GUID, a type mismatch or an unknown key.
    pub fn index_object(
        &self,
        schema: &TypeDescriptor,
        request: IndexObjectRequest,
    ) -> SearchResult<bool> {
        if request.object_type != schema.type_name {
            return Err(SearchError::Internal(format!(
                "object of type {} indexed with schema of {}",
                request.object_type, schema.type_name
            )));
        }

        let guid = Guid::parse(&request.guid)?;
        let parent_guid = request
            .parent_guid
            .as_deref()
            .map(Guid::parse)
            .transpose()?;
        let access_group_id = request
            .access_group_id
            .or_else(|| guid.access_group_id())
            .ok_or_else(|| {
                SearchError::invalid(format!(
                    "No access group given and none encoded in GUID {}",
                    guid
                ))
            })?;

        let mut key_props = BTreeMap::new();
        for (key_name, value) in request.key_props {
            let key = schema.key(&key_name).ok_or_else(|| {
                SearchError::invalid(format!(
                    "Unknown key {} for type {}",
                    key_name, schema.type_name
                ))
            })?;
            let found = value.value_type();
            let value = value.coerce(key.key_value_type).ok_or_else(|| {
                SearchError::invalid(format!(
                    "Key {} expects {} values, got {}",
                    key_name, key.key_value_type, found
                ))
            })?;
            key_props.insert(key_name, value);
        }

        let mut object = IndexedObject {
            guid: guid.clone(),
            object_type: request.object_type,
            parent_guid,
            object_name: request.object_name,
            timestamp: request.timestamp,
            data: request.data,
            parent_data: request.parent_data,
            key_props,
            access_group_id,
            shared_groups: BTreeSet::new(),
            public_groups: BTreeSet::new(),
            is_public: request.is_public,
            deleted: false,
            tokens: Default::default(),
            name_tokens: Default::default(),
        };
        object.refresh_tokens();

        let replaced = self
            .objects
            .insert(guid.as_str().to_string(), object)
            .is_some();
        tracing::debug!("Indexed object {} (replaced: {})", guid, replaced);
        Ok(replaced)
    }

    /// Applies `request` and returns how many stored objects changed.
    pub fn apply_update(&self, request: ObjectUpdateRequest) -> SearchResult<usize> {
        let updated = match request {
            ObjectUpdateRequest::Share {
                guids,
                access_group_id,
                public_group,
            } => self.share_objects(&parse_all(&guids)?, access_group_id, public_group),
            ObjectUpdateRequest::Unshare {
                guids,
                access_group_id,
            } => self.unshare_objects(&parse_all(&guids)?, access_group_id),
            ObjectUpdateRequest::Publish { guids } => self.publish_objects(&parse_all(&guids)?),
            ObjectUpdateRequest::Unpublish { guids } => {
                self.unpublish_objects(&parse_all(&guids)?)
            }
            ObjectUpdateRequest::PublishExternally {
                guids,
                access_group_id,
            } => self.publish_objects_externally(&parse_all(&guids)?, access_group_id),
            ObjectUpdateRequest::UnpublishExternally {
                guids,
                access_group_id,
            } => self.unpublish_objects_externally(&parse_all(&guids)?, access_group_id),
            ObjectUpdateRequest::DeleteAllVersions { guid } => {
                self.delete_all_versions(&Guid::parse(&guid)?)
            }
            ObjectUpdateRequest::UndeleteAllVersions { guid } => {
                self.undelete_all_versions(&Guid::parse(&guid)?)
            }
            ObjectUpdateRequest::PublishAllVersions { guid } => {
                self.publish_all_versions(&Guid::parse(&guid)?)
            }
            ObjectUpdateRequest::UnpublishAllVersions { guid } => {
                self.unpublish_all_versions(&Guid::parse(&guid)?)
            }
            ObjectUpdateRequest::RenameAllVersions { guid, object_name } => {
                self.set_name_on_all_versions(&Guid::parse(&guid)?, &object_name)
            }
        };

        tracing::info!("Object update modified {} objects", updated);
        Ok(updated)
    }

    /// Shares objects into `access_group_id`. When the group is public the
    /// objects become publicly visible through it.
    pub fn share_objects(&self, guids: &[Guid], access_group_id: i64, public_group: bool) -> usize {
        self.update_each(guids, |o| {
            o.shared_groups.insert(access_group_id);
            if public_group {
                o.public_groups.insert(access_group_id);
            } else {
                o.public_groups.remove(&access_group_id);
            }
        })
    }

    /// Removes the share, including any public exposure through that group.
    pub fn unshare_objects(&self, guids: &[Guid], access_group_id: i64) -> usize {
        self.update_each(guids, |o| {
            o.shared_groups.remove(&access_group_id);
            o.public_groups.remove(&access_group_id);
        })
    }

    pub fn publish_objects(&self, guids: &[Guid]) -> usize {
        self.update_each(guids, |o| o.is_public = true)
    }

    pub fn unpublish_objects(&self, guids: &[Guid]) -> usize {
        self.update_each(guids, |o| o.is_public = false)
    }

    /// Declares `access_group_id` public for objects already shared into it.
    pub fn publish_objects_externally(&self, guids: &[Guid], access_group_id: i64) -> usize {
        self.update_each(guids, |o| {
            if o.shared_groups.contains(&access_group_id) {
                o.public_groups.insert(access_group_id);
            }
        })
    }

    pub fn unpublish_objects_externally(&self, guids: &[Guid], access_group_id: i64) -> usize {
        self.update_each(guids, |o| {
            o.public_groups.remove(&access_group_id);
        })
    }

    pub fn delete_all_versions(&self, guid: &Guid) -> usize {
        self.update_lineage(guid, |o| o.deleted = true)
    }

    pub fn undelete_all_versions(&self, guid: &Guid) -> usize {
        self.update_lineage(guid, |o| o.deleted = false)
    }

    pub fn publish_all_versions(&self, guid: &Guid) -> usize {
        self.update_lineage(guid, |o| o.is_public = true)
    }

    pub fn unpublish_all_versions(&self, guid: &Guid) -> usize {
        self.update_lineage(guid, |o| o.is_public = false)
    }

    pub fn set_name_on_all_versions(&self, guid: &Guid, object_name: &str) -> usize {
        self.update_lineage(guid, |o| {
            o.object_name = object_name.to_string();
            o.refresh_tokens();
        })
    }

    fn update_each<F>(&self, guids: &[Guid], mut update: F) -> usize
    where
        F: FnMut(&mut IndexedObject),
    {
        let mut updated = 0;
        for guid in guids {
            if let Some(mut object) = self.objects.get_mut(guid.as_str()) {
                update(object.value_mut());
                updated += 1;
            }
        }
        updated
    }

    fn update_lineage<F>(&self, guid: &Guid, mut update: F) -> usize
    where
        F: FnMut(&mut IndexedObject),
    {
        let lineage = guid.lineage();

        let mut updated = 0;
        for mut entry in self.objects.iter_mut() {
            if entry.guid.lineage() == lineage {
                update(entry.value_mut());
                updated += 1;
            }
        }
        updated
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_all(guids: &[String]) -> SearchResult<Vec<Guid>> {
    guids.iter().map(|g| Guid::parse(g)).collect()
}

/// Keeps the latest version of each lineage: greatest timestamp, then
/// greatest version, then greatest GUID.
pub fn latest_versions(objects: Vec<IndexedObject>) -> Vec<IndexedObject> {
    let mut latest: HashMap<String, IndexedObject> = HashMap::new();
    for object in objects {
        let lineage = object.guid.lineage();
        match latest.get(&lineage) {
            Some(current) if !is_newer(&object, current) => {}
            _ => {
                latest.insert(lineage, object);
            }
        }
    }
    latest.into_values().collect()
}

fn is_newer(candidate: &IndexedObject, current: &IndexedObject) -> bool {
    let key = |o: &IndexedObject| (o.timestamp, o.guid.version().unwrap_or(0));
    match key(candidate).cmp(&key(current)) {
        std::cmp::Ordering::Equal => candidate.guid > current.guid,
        ordering => ordering.is_gt(),
    }
}

#[async_trait]
impl ObjectIndex for MemoryIndex {
    async fn search(&self, plan: &QueryPlan) -> SearchResult<Vec<IndexedObject>> {
        self.ensure_available()?;
        if plan.matches_nothing() {
            return Ok(Vec::new());
        }

        let candidates: Vec<IndexedObject> = self
            .objects
            .iter()
            .filter(|entry| entry.object_type == plan.object_type() && !entry.deleted)
            .map(|entry| entry.value().clone())
            .collect();

        let candidates = if plan.latest_only() {
            latest_versions(candidates)
        } else {
            candidates
        };

        Ok(candidates
            .into_iter()
            .filter(|object| plan.matches(object))
            .collect())
    }

    async fn lookup(
        &self,
        guids: &[Guid],
        visibility: &Visibility,
    ) -> SearchResult<Vec<Option<IndexedObject>>> {
        self.ensure_available()?;

        Ok(guids
            .iter()
            .map(|guid| {
                self.objects
                    .get(guid.as_str())
                    .filter(|object| !object.deleted && visibility.admits(object))
                    .map(|object| object.value().clone())
            })
            .collect())
    }

    async fn object_count(&self) -> SearchResult<usize> {
        self.ensure_available()?;
        Ok(self.objects.iter().filter(|entry| !entry.deleted).count())
    }
}
