use std::sync::Arc;

/// Reacts to one kind of notification.
///
/// Listeners make no storage assumptions of their own; the error type is
/// associated so each listener surfaces its collaborator's failures unchanged.
pub trait Listener<E>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn handle(&self, event: &E) -> Result<(), Self::Error>;
}

impl<E, L> Listener<E> for Arc<L>
where
    L: Listener<E> + ?Sized,
{
    type Error = L::Error;

    fn handle(&self, event: &E) -> Result<(), Self::Error> {
        (**self).handle(event)
    }
}
