use std::any::TypeId;
use std::fmt;
use std::future::Future;

use downcast_rs::Downcast;
use futures::FutureExt;
use futures::future::LocalBoxFuture;

/// The error a resource reports when closing it fails.
pub type CloseError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A reified resource type.
///
/// Any `'static` type can act as a resource type: concrete resources, marker types
/// standing for a family of resources, or trait objects such as `dyn Stream`.
/// Whether a resource belongs to a type is up to [`Resource::is_type`].
#[derive(Clone, Copy)]
pub struct ResourceType {
    id: TypeId,
    name: &'static str,
}

impl ResourceType {
    #[inline]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Checks whether this is the resource type of `T`.
    #[inline]
    pub fn is<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.id == TypeId::of::<T>()
    }

    /// Checks whether the resource is a member of this type.
    #[inline]
    pub fn matches(&self, resource: &dyn Resource) -> bool {
        resource.is_type(*self)
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ResourceType {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResourceType {}

impl std::hash::Hash for ResourceType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceType({})", self.name)
    }
}

/// The outcome of closing a resource.
pub enum Close {
    /// The resource has nothing to tear down.
    None,
    /// The resource was closed synchronously.
    Ready(Result<(), CloseError>),
    /// The resource is closing. The table awaits the future on removal.
    Pending(LocalBoxFuture<'static, Result<(), CloseError>>),
}

impl Close {
    /// Wraps an asynchronous close.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<(), CloseError>> + 'static,
    {
        Self::Pending(future.boxed_local())
    }

    /// Wraps a failed synchronous close.
    pub fn failed(err: impl Into<CloseError>) -> Self {
        Self::Ready(Err(err.into()))
    }
}

impl From<Result<(), CloseError>> for Close {
    #[inline]
    fn from(result: Result<(), CloseError>) -> Self {
        Self::Ready(result)
    }
}

impl fmt::Debug for Close {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("Close::None"),
            Self::Ready(result) => f.debug_tuple("Close::Ready").field(result).finish(),
            Self::Pending(_) => f.write_str("Close::Pending(..)"),
        }
    }
}

/// A resource that can be stored inside of a [`ResourceTable`](crate::ResourceTable).
///
/// ```ignore
/// struct Stream;
///
/// #[derive(Resource)]
/// #[resource(is(Stream))]
/// struct TcpStream {
///     addr: SocketAddr,
/// }
/// ```
pub trait Resource: Downcast + 'static {
    /// A name for the resource, used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Checks whether the resource is a member of the given resource type.
    ///
    /// By default a resource is only a member of its own type. Override this to
    /// make the resource answer for broader types as well.
    fn is_type(&self, ty: ResourceType) -> bool {
        ty.is::<Self>()
    }

    /// Tears the resource down.
    ///
    /// Called by [`ResourceTable::remove`](crate::ResourceTable::remove) after the
    /// resource ID has already been recycled.
    fn close(self: Box<Self>) -> Close {
        Close::None
    }
}

downcast_rs::impl_downcast!(Resource);

impl fmt::Debug for dyn Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource({})", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Stream {}

    struct File;

    impl Resource for File {}

    struct Socket;

    impl Stream for Socket {}

    impl Resource for Socket {
        fn name(&self) -> &str {
            "socket"
        }

        fn is_type(&self, ty: ResourceType) -> bool {
            ty.is::<Self>() || ty.is::<dyn Stream>()
        }
    }

    #[test]
    fn test_default_membership_is_exact() {
        let file: Box<dyn Resource> = Box::new(File);
        assert!(ResourceType::of::<File>().matches(&*file));
        assert!(!ResourceType::of::<Socket>().matches(&*file));
        assert!(!ResourceType::of::<dyn Stream>().matches(&*file));
    }

    #[test]
    fn test_membership_can_include_broader_types() {
        let socket: Box<dyn Resource> = Box::new(Socket);
        assert!(socket.is_type(ResourceType::of::<Socket>()));
        assert!(socket.is_type(ResourceType::of::<dyn Stream>()));
        assert!(!socket.is_type(ResourceType::of::<File>()));
    }

    #[test]
    fn test_type_equality_ignores_name() {
        assert_eq!(ResourceType::of::<File>(), ResourceType::of::<File>());
        assert_ne!(ResourceType::of::<File>(), ResourceType::of::<Socket>());
        assert!(ResourceType::of::<File>().name().ends_with("File"));
    }

    #[test]
    fn test_name() {
        let file: Box<dyn Resource> = Box::new(File);
        let socket: Box<dyn Resource> = Box::new(Socket);
        assert!(file.name().ends_with("File"));
        assert_eq!(socket.name(), "socket");
        assert_eq!(format!("{socket:?}"), "Resource(socket)");
    }

    #[test]
    fn test_default_close_is_none() {
        let file: Box<dyn Resource> = Box::new(File);
        assert!(matches!(file.close(), Close::None));
    }

    #[test]
    fn test_pending_close_resolves() {
        let close = Close::pending(async { Err::<(), CloseError>("boom".into()) });
        let Close::Pending(future) = close else {
            panic!("expected a pending close");
        };

        let err = pollster::block_on(future).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
