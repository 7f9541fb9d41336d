use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::LocalBoxFuture;
use indexmap::IndexMap;

use crate::config::ResourceTableConfig;
use crate::error::{BadResourceId, IdSpaceExhausted, RemoveError};
use crate::id::{IntoRawResourceId, ResourceId};
use crate::resource::{Close, CloseError, Resource, ResourceType};

/// A table of resources, addressed by small integer IDs.
///
/// IDs of removed resources are recycled first-in first-out, which keeps the range
/// of live IDs compact. When there is nothing to recycle, the table scans forward
/// from the last handed out ID for a free one, wrapping around at the configured
/// maximum.
///
/// # Thread Safety
///
/// `ResourceTable` has no internal synchronization. Hosts that share it between
/// threads must wrap the whole table in a single `Mutex`.
pub struct ResourceTable {
    /// The resources stored on the table, in insertion order.
    resources: IndexMap<ResourceId, Box<dyn Resource>>,

    /// Recycled IDs, handed out again before any new ID.
    dropped: VecDeque<ResourceId>,

    /// The suggested next ID.
    next: u64,

    /// The largest ID the table hands out, inclusive.
    max_id: u64,
}

impl ResourceTable {
    /// Creates an empty table with the default configuration.
    #[inline]
    pub fn new() -> Self {
        Self::with_config(ResourceTableConfig::default())
    }

    pub fn with_config(config: ResourceTableConfig) -> Self {
        Self {
            resources: IndexMap::with_capacity(config.capacity),
            dropped: VecDeque::new(),
            next: 0,
            max_id: config.max_id,
        }
    }

    /// The largest ID this table hands out.
    #[inline]
    pub fn max_id(&self) -> u64 {
        self.max_id
    }

    /// The number of live resources.
    #[inline]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Checks whether a resource is registered under the ID.
    #[inline]
    pub fn contains(&self, id: ResourceId) -> bool {
        self.resources.contains_key(&id)
    }

    /// Adds a resource to the table and returns its new ID.
    ///
    /// # Panics
    ///
    /// Panics when every ID up to the table's maximum is taken.
    pub fn add<T>(&mut self, resource: T) -> ResourceId
    where
        T: Resource,
    {
        self.add_boxed(Box::new(resource))
    }

    /// Adds an already boxed resource to the table and returns its new ID.
    ///
    /// # Panics
    ///
    /// Panics when every ID up to the table's maximum is taken.
    pub fn add_boxed(&mut self, resource: Box<dyn Resource>) -> ResourceId {
        match self.try_add_boxed(resource) {
            Ok(id) => id,
            Err(err) => id_space_exhausted(err),
        }
    }

    /// Adds a resource to the table, reporting exhaustion of the ID space instead
    /// of panicking.
    pub fn try_add<T>(&mut self, resource: T) -> Result<ResourceId, IdSpaceExhausted>
    where
        T: Resource,
    {
        self.try_add_boxed(Box::new(resource))
    }

    pub fn try_add_boxed(
        &mut self,
        resource: Box<dyn Resource>,
    ) -> Result<ResourceId, IdSpaceExhausted> {
        let id = self.next_id()?;
        log::trace!("adding resource {} as {id}", resource.name());
        self.resources.insert(id, resource);
        Ok(id)
    }

    /// Gets a resource, optionally only if it is a member of `ty`.
    ///
    /// Returns `Ok(None)` when nothing is registered under the ID or the resource is
    /// of another type.
    pub fn get(
        &self,
        id: impl IntoRawResourceId,
        ty: Option<ResourceType>,
    ) -> Result<Option<&dyn Resource>, BadResourceId> {
        let id = self.validate(id)?;
        Ok(self.lookup(id, ty))
    }

    pub fn get_mut(
        &mut self,
        id: impl IntoRawResourceId,
        ty: Option<ResourceType>,
    ) -> Result<Option<&mut dyn Resource>, BadResourceId> {
        let id = self.validate(id)?;
        Ok(self.lookup_mut(id, ty))
    }

    /// Gets a resource of type `T`.
    pub fn get_as<T>(&self, id: impl IntoRawResourceId) -> Result<Option<&T>, BadResourceId>
    where
        T: Resource,
    {
        let resource = self.get(id, Some(ResourceType::of::<T>()))?;
        Ok(resource.and_then(|resource| resource.downcast_ref::<T>()))
    }

    pub fn get_mut_as<T>(
        &mut self,
        id: impl IntoRawResourceId,
    ) -> Result<Option<&mut T>, BadResourceId>
    where
        T: Resource,
    {
        let resource = self.get_mut(id, Some(ResourceType::of::<T>()))?;
        Ok(resource.and_then(|resource| resource.downcast_mut::<T>()))
    }

    /// Gets a resource, treating a missing resource or a type mismatch as a bad ID.
    pub fn require(
        &self,
        id: impl IntoRawResourceId,
        ty: Option<ResourceType>,
    ) -> Result<&dyn Resource, BadResourceId> {
        let rid = id.into_raw_resource_id();
        self.get(rid, ty)?.ok_or(BadResourceId::new(rid))
    }

    pub fn require_mut(
        &mut self,
        id: impl IntoRawResourceId,
        ty: Option<ResourceType>,
    ) -> Result<&mut dyn Resource, BadResourceId> {
        let rid = id.into_raw_resource_id();
        self.get_mut(rid, ty)?.ok_or(BadResourceId::new(rid))
    }

    pub fn require_as<T>(&self, id: impl IntoRawResourceId) -> Result<&T, BadResourceId>
    where
        T: Resource,
    {
        let rid = id.into_raw_resource_id();
        self.get_as::<T>(rid)?.ok_or(BadResourceId::new(rid))
    }

    /// Removes a resource from the table and closes it.
    ///
    /// The ID is recycled and the resource's close is started before this returns,
    /// so the ID may be reused by another [`add`](Self::add) while an asynchronous
    /// close is still running. The returned [`Removal`] resolves once the close
    /// finishes, and reports its failure.
    ///
    /// Removing an ID with nothing behind it, or a resource that is not a member of
    /// `ty`, does nothing.
    pub fn remove(&mut self, id: impl IntoRawResourceId, ty: Option<ResourceType>) -> Removal {
        let id = match self.validate(id) {
            Ok(id) => id,
            Err(err) => return Removal::failed(err),
        };

        let Some(resource) = self.detach(id, ty) else {
            return Removal::done();
        };

        log::debug!("closing resource {id} ({})", resource.name());
        Removal::closing(resource.close())
    }

    /// Removes a resource from the table and hands it back without closing it.
    pub fn take(
        &mut self,
        id: impl IntoRawResourceId,
        ty: Option<ResourceType>,
    ) -> Result<Option<Box<dyn Resource>>, BadResourceId> {
        let id = self.validate(id)?;
        Ok(self.detach(id, ty))
    }

    /// Removes a resource of type `T` and hands it back without closing it.
    ///
    /// A resource that is a member of `T` without actually being a `T` stays in the
    /// table.
    pub fn take_as<T>(&mut self, id: impl IntoRawResourceId) -> Result<Option<Box<T>>, BadResourceId>
    where
        T: Resource,
    {
        let id = self.validate(id)?;
        let ty = ResourceType::of::<T>();

        match self.lookup(id, Some(ty)) {
            Some(resource) if resource.is::<T>() => {}
            _ => return Ok(None),
        }

        Ok(self
            .detach(id, Some(ty))
            .and_then(|resource| resource.downcast::<T>().ok()))
    }

    /// Iterates over all resources in insertion order.
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.resources.iter(),
        }
    }

    /// Iterates over the resources that are members of `ty`, in insertion order.
    #[inline]
    pub fn iter_of(&self, ty: ResourceType) -> IterOf<'_> {
        IterOf {
            inner: self.iter(),
            ty,
        }
    }

    /// Iterates over the resources of type `T`, in insertion order.
    pub fn iter_as<T>(&self) -> impl Iterator<Item = (ResourceId, &T)>
    where
        T: Resource,
    {
        self.iter_of(ResourceType::of::<T>())
            .filter_map(|(id, resource)| resource.downcast_ref::<T>().map(|resource| (id, resource)))
    }

    /// Iterates over the live IDs in insertion order.
    pub fn ids(&self) -> impl ExactSizeIterator<Item = ResourceId> + '_ {
        self.resources.keys().copied()
    }

    #[inline]
    fn validate(&self, id: impl IntoRawResourceId) -> Result<ResourceId, BadResourceId> {
        id.into_raw_resource_id().validate(self.max_id)
    }

    fn lookup(&self, id: ResourceId, ty: Option<ResourceType>) -> Option<&dyn Resource> {
        let resource = self.resources.get(&id)?;

        match ty {
            Some(ty) if !resource.is_type(ty) => None,
            _ => Some(&**resource),
        }
    }

    fn lookup_mut(&mut self, id: ResourceId, ty: Option<ResourceType>) -> Option<&mut dyn Resource> {
        let resource = self.resources.get_mut(&id)?;

        match ty {
            Some(ty) if !resource.is_type(ty) => None,
            _ => Some(&mut **resource),
        }
    }

    /// Deletes the entry and recycles its ID.
    fn detach(&mut self, id: ResourceId, ty: Option<ResourceType>) -> Option<Box<dyn Resource>> {
        self.lookup(id, ty)?;

        let resource = self.resources.shift_remove(&id)?;
        self.dropped.push_back(id);
        Some(resource)
    }

    /// Gets the next available resource ID.
    fn next_id(&mut self) -> Result<ResourceId, IdSpaceExhausted> {
        if let Some(id) = self.dropped.pop_front() {
            return Ok(id);
        }

        let mut wraps = 0;

        loop {
            if wraps == 2 && self.next == self.max_id {
                return Err(IdSpaceExhausted {
                    max_id: self.max_id,
                });
            }

            let id = ResourceId::new_unchecked(self.next);
            let taken = self.resources.contains_key(&id);

            if self.next == self.max_id {
                self.next = 0;

                if taken {
                    wraps += 1;
                    log::warn!("resource ID space wrapped around at {}", self.max_id);
                }
            } else {
                self.next += 1;
            }

            if !taken {
                return Ok(id);
            }
        }
    }
}

impl Default for ResourceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.resources.iter().map(|(id, resource)| (id.get(), resource.name())))
            .finish()
    }
}

impl<'a> IntoIterator for &'a ResourceTable {
    type Item = (ResourceId, &'a dyn Resource);
    type IntoIter = Iter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the resources of a [`ResourceTable`].
pub struct Iter<'a> {
    inner: indexmap::map::Iter<'a, ResourceId, Box<dyn Resource>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (ResourceId, &'a dyn Resource);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(id, resource)| (*id, &**resource))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

/// An iterator over the resources of a [`ResourceTable`] that are members of a
/// resource type.
pub struct IterOf<'a> {
    inner: Iter<'a>,
    ty: ResourceType,
}

impl<'a> Iterator for IterOf<'a> {
    type Item = (ResourceId, &'a dyn Resource);

    fn next(&mut self) -> Option<Self::Item> {
        let ty = self.ty;
        self.inner.find(|(_, resource)| resource.is_type(ty))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

/// The removal of a resource from a [`ResourceTable`].
///
/// The table is already updated by the time this exists. Awaiting it drives the
/// resource's close to completion.
#[must_use = "an asynchronous close only runs when the removal is awaited"]
pub struct Removal {
    state: RemovalState,
}

enum RemovalState {
    Ready(Option<Result<(), RemoveError>>),
    Closing(LocalBoxFuture<'static, Result<(), CloseError>>),
}

impl Removal {
    fn done() -> Self {
        Self {
            state: RemovalState::Ready(Some(Ok(()))),
        }
    }

    fn failed(err: impl Into<RemoveError>) -> Self {
        Self {
            state: RemovalState::Ready(Some(Err(err.into()))),
        }
    }

    fn closing(close: Close) -> Self {
        match close {
            Close::None => Self::done(),
            Close::Ready(Ok(())) => Self::done(),
            Close::Ready(Err(err)) => Self::failed(RemoveError::Close(err)),
            Close::Pending(future) => Self {
                state: RemovalState::Closing(future),
            },
        }
    }

    /// Checks whether the resource is still closing.
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, RemovalState::Closing(_))
    }
}

impl Future for Removal {
    type Output = Result<(), RemoveError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match &mut this.state {
            RemovalState::Ready(result) => match result.take() {
                Some(result) => Poll::Ready(result),
                None => removal_polled_after_completion(),
            },
            RemovalState::Closing(future) => {
                let result = std::task::ready!(future.as_mut().poll(cx));
                this.state = RemovalState::Ready(None);
                Poll::Ready(result.map_err(RemoveError::Close))
            }
        }
    }
}

impl fmt::Debug for Removal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            RemovalState::Ready(result) => f.debug_tuple("Removal::Ready").field(result).finish(),
            RemovalState::Closing(_) => f.write_str("Removal::Closing(..)"),
        }
    }
}

#[cold]
fn id_space_exhausted(err: IdSpaceExhausted) -> ! {
    log::error!("{err}");
    panic!("{err}")
}

#[cold]
fn removal_polled_after_completion() -> ! {
    panic!("Removal polled after completion")
}
