//! Shared element pool abstraction.
//!
//! Media elements are expensive to create on some hosts (browsers cap the
//! number of decoding pipelines), so a graph usually provisions a small pool
//! up front and hands it to every source node. Ownership transfer is explicit:
//! a node that called [`ElementPool::acquire`] must hand the element back
//! through [`ElementPool::release`] when its bind episode ends, and must not
//! retain any reference afterwards.

use crate::{element::MediaElement, error::Result, platform::PlatformSendSync};
use std::sync::Arc;

/// Pool of reusable media elements shared across source nodes.
pub trait ElementPool: PlatformSendSync {
    /// Take an element out of the pool for exclusive use.
    ///
    /// Fails with [`BridgeError::Exhausted`](crate::error::BridgeError) when
    /// the pool has no element to give; provisioning headroom is the pool's
    /// policy, not the caller's.
    fn acquire(&self) -> Result<Arc<dyn MediaElement>>;

    /// Return a previously acquired element to the pool.
    ///
    /// The pool takes back ownership; callers must drop all remaining clones
    /// of the handle. Releasing is infallible so teardown paths never have an
    /// error to propagate.
    fn release(&self, element: Arc<dyn MediaElement>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{AttributeValue, MediaFault, ReadyState};
    use mockall::mock;
    use mockall::predicate::always;

    mock! {
        Pool {}

        impl ElementPool for Pool {
            fn acquire(&self) -> Result<Arc<dyn MediaElement>>;
            fn release(&self, element: Arc<dyn MediaElement>);
        }
    }

    struct InertElement;

    impl MediaElement for InertElement {
        fn duration(&self) -> f64 {
            f64::NAN
        }
        fn ended(&self) -> bool {
            false
        }
        fn ready_state(&self) -> ReadyState {
            ReadyState::HaveNothing
        }
        fn seeking(&self) -> bool {
            false
        }
        fn fault(&self) -> Option<MediaFault> {
            None
        }
        fn set_position(&self, _seconds: f64) {}
        fn set_volume(&self, _volume: f32) {}
        fn set_playback_rate(&self, _rate: f64) {}
        fn set_source(&self, _url: &str) {}
        fn clear_source(&self) {}
        fn attribute(&self, _name: &str) -> Option<AttributeValue> {
            None
        }
        fn set_attribute(&self, _name: &str, _value: &AttributeValue) {}
        fn remove_attribute(&self, _name: &str) {}
        fn play(&self) -> Result<()> {
            Ok(())
        }
        fn pause(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn acquire_release_round_trip() {
        let mut pool = MockPool::new();
        pool.expect_acquire()
            .times(1)
            .returning(|| Ok(Arc::new(InertElement)));
        pool.expect_release().with(always()).times(1).return_const(());

        let element = pool.acquire().expect("pool should supply an element");
        pool.release(element);
    }

    #[test]
    fn exhausted_pool_reports_error() {
        let mut pool = MockPool::new();
        pool.expect_acquire().times(1).returning(|| {
            Err(crate::error::BridgeError::Exhausted(
                "no element available".into(),
            ))
        });

        assert!(pool.acquire().is_err());
    }
}
